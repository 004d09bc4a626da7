use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Serde Json error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
    #[error("Toml error: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("Toml error: {0}")]
    TomlSerError(#[from] toml::ser::Error),
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("Api error ({status}): {body}")]
    ApiError {
        status: u16,
        body: serde_json::Value,
    },
    #[error("{0}")]
    InputError(String),
    #[error("Timed out after {timeout_secs} seconds waiting for task {id}")]
    TimeoutError { id: String, timeout_secs: u64 },
    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),
    #[error("Cast error: {0}")]
    CastError(String),
    #[error("Descriptor error: {0}")]
    DescriptorError(String),
    #[error("Config error: {0}")]
    ConfigError(String),
    #[error("Prompt error: {0}")]
    PromptError(#[from] dialoguer::Error),
    #[error("Logger error: {0}")]
    LoggerError(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("Regex error: {0}")]
    RegexError(#[from] regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Process outcome of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}
