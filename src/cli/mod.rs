pub mod api;
pub mod auth;
pub mod task_wait;

use crate::context::Context;
use crate::error::{ExitStatus, Result};
use api::ApiArgs;
use async_trait::async_trait;
use auth::AuthArgs;
use clap::{Parser, Subcommand};
use std::fmt::Debug;
use std::path::PathBuf;
use task_wait::TaskWaitArgs;

/// Trait for processing commands
#[async_trait]
pub trait ProcessCommand {
    async fn process_command(&self, context: &Context) -> Result<ExitStatus>;
}

#[derive(Debug, Parser)]
#[command(name = "cloudapi", version, about = "Command line client for the Cloud API.")]
pub struct CliArgs {
    /// Increase output verbosity; -vv echoes HTTP requests.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Never prompt; missing required values are an error.
    #[arg(short = 'n', long, global = true)]
    pub no_interaction: bool,

    /// Endpoint descriptor file.
    #[arg(long, env = "CLOUDAPI_SPEC", global = true)]
    pub spec: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Call a Cloud API endpoint.
    Api(ApiArgs),
    /// Wait for a task to complete.
    TaskWait(TaskWaitArgs),
    /// Manage stored credentials.
    Auth(AuthArgs),
}

#[async_trait]
impl ProcessCommand for Commands {
    async fn process_command(&self, context: &Context) -> Result<ExitStatus> {
        match self {
            Commands::Api(args) => args.process_command(context).await,
            Commands::TaskWait(args) => args.process_command(context).await,
            Commands::Auth(args) => args.subcommand.process_command(context).await,
        }
    }
}
