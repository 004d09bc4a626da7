pub mod auth;
pub mod binding;
pub mod cli;
pub mod context;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod logger;
pub mod poller;
pub mod prompt;

pub use error::{Error, ExitStatus, Result};
