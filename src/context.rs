use crate::auth::{
    override_token, ClientCredentialsProvider, CredentialProvider, RefreshTokenProvider,
    TokenCache,
};
use crate::dispatch::Dispatcher;
use crate::endpoint::{load_descriptors, EndpointDescriptor};
use crate::error::{Error, Result};
use crate::prompt::{Prompter, TerminalPrompter};
use directories::ProjectDirs;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_DIR_ENV: &str = "CLOUDAPI_CONFIG_DIR";
pub const CACHE_DIR_ENV: &str = "CLOUDAPI_CACHE_DIR";
pub const CONFIG_FILE: &str = "config.toml";
pub const DESCRIPTORS_FILE: &str = "descriptors.json";

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
}

impl Config {
    /// Reads `config_path`; a file that does not exist yields the defaults.
    pub fn from_toml(config_path: &Path) -> Result<Self> {
        let config_str = match std::fs::read_to_string(config_path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %config_path.display(), "No config file, using defaults");
                return Ok(Config::default());
            }
            Err(e) => return Err(e.into()),
        };

        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }

    pub fn save(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(config_path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CommonConfig {
    pub log_level: String,
    pub base_uri: String,
    pub token_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_path: Option<PathBuf>,
}

impl Default for CommonConfig {
    fn default() -> Self {
        CommonConfig {
            log_level: "info".to_string(),
            base_uri: "https://cloud.example.com/api".to_string(),
            token_url: "https://accounts.example.com/api/auth/oauth/token".to_string(),
            spec_path: None,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// How bearer tokens will be obtained for this invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialFlow {
    ClientCredentials { key: String, secret: String },
    RefreshToken(String),
    /// Only the environment override is available.
    OverrideOnly,
}

impl CredentialsConfig {
    /// Key and secret win over a refresh token.
    pub fn flow(&self) -> Option<CredentialFlow> {
        let present = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());

        if let (Some(key), Some(secret)) = (present(&self.key), present(&self.secret)) {
            return Some(CredentialFlow::ClientCredentials { key, secret });
        }
        if let Some(token) = present(&self.refresh_token) {
            return Some(CredentialFlow::RefreshToken(token));
        }
        override_token().map(|_| CredentialFlow::OverrideOnly)
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "cloudapi", "cloudapi")
        .ok_or_else(|| Error::ConfigError("Could not determine home directory".to_string()))
}

fn dir_from_env(var: &str) -> Option<PathBuf> {
    std::env::var_os(var)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub struct Context {
    config: Config,
    config_dir: PathBuf,
    cache_dir: PathBuf,
    verbosity: u8,
    interactive: bool,
    spec_path: Option<PathBuf>,
    prompter: Box<dyn Prompter>,
}

impl Context {
    /// Loads configuration from `$CLOUDAPI_CONFIG_DIR` or the platform config directory.
    pub fn init() -> Result<Self> {
        let config_dir = match dir_from_env(CONFIG_DIR_ENV) {
            Some(dir) => dir,
            None => project_dirs()?.config_dir().to_path_buf(),
        };
        let cache_dir = match dir_from_env(CACHE_DIR_ENV) {
            Some(dir) => dir,
            None => project_dirs()?.cache_dir().to_path_buf(),
        };

        Self::from_dirs(config_dir, cache_dir)
    }

    pub fn from_dirs(config_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let config_dir = config_dir.into();
        let config = Config::from_toml(&config_dir.join(CONFIG_FILE))?;

        Ok(Context {
            config,
            config_dir,
            cache_dir: cache_dir.into(),
            verbosity: 0,
            interactive: true,
            spec_path: None,
            prompter: Box::new(TerminalPrompter::new()),
        })
    }

    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_interaction(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_spec(mut self, spec_path: Option<PathBuf>) -> Self {
        self.spec_path = spec_path;
        self
    }

    pub fn with_prompter(mut self, prompter: Box<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    pub fn prompter(&self) -> &dyn Prompter {
        self.prompter.as_ref()
    }

    pub fn token_cache(&self) -> TokenCache {
        TokenCache::in_dir(&self.cache_dir)
    }

    /// `--spec`, then `spec_path` from the config, then `descriptors.json` beside it.
    pub fn descriptor_path(&self) -> PathBuf {
        self.spec_path
            .clone()
            .or_else(|| self.config.common.spec_path.clone())
            .unwrap_or_else(|| self.config_dir.join(DESCRIPTORS_FILE))
    }

    pub fn descriptors(&self) -> Result<Vec<EndpointDescriptor>> {
        load_descriptors(&self.descriptor_path())
    }

    pub fn credential_provider(&self) -> Result<Arc<dyn CredentialProvider>> {
        let client = Client::builder()
            .user_agent(concat!("cloudapi-cli/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let common = &self.config.common;

        let provider: Arc<dyn CredentialProvider> = match self.config.credentials.flow() {
            Some(CredentialFlow::ClientCredentials { key, secret }) => {
                tracing::debug!("Using client credentials");
                Arc::new(ClientCredentialsProvider::new(
                    key,
                    secret,
                    &common.base_uri,
                    client,
                    &common.token_url,
                    self.token_cache(),
                ))
            }
            Some(CredentialFlow::RefreshToken(token)) => {
                tracing::debug!("Using refresh token");
                Arc::new(RefreshTokenProvider::new(
                    token,
                    &common.base_uri,
                    client,
                    &common.token_url,
                    self.token_cache(),
                ))
            }
            // Never exchanges: the override short-circuits every token request.
            Some(CredentialFlow::OverrideOnly) => Arc::new(ClientCredentialsProvider::new(
                String::new(),
                String::new(),
                &common.base_uri,
                client,
                &common.token_url,
                self.token_cache(),
            )),
            None => {
                return Err(Error::AuthenticationError(
                    "No credentials configured. Run `cloudapi auth login` or set CLOUDAPI_ACCESS_TOKEN."
                        .to_string(),
                ))
            }
        };

        Ok(provider)
    }

    /// Requests are echoed when running very verbose (`-vv`).
    pub fn dispatcher(&self) -> Result<Dispatcher> {
        Ok(Dispatcher::new(self.credential_provider()?).with_debug(self.verbosity >= 2))
    }
}
