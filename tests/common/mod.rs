#![allow(dead_code)]

use assert_cmd::Command;
use httpmock::MockServer;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const DESCRIPTORS: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/descriptors.json");

/// Isolated config and cache directories pointed at a mock server.
pub struct Sandbox {
    pub dir: TempDir,
}

impl Sandbox {
    pub fn new(server: &MockServer, credentials: &str) -> Sandbox {
        let dir = tempfile::tempdir().expect("tempdir");
        let sandbox = Sandbox { dir };
        fs::create_dir_all(sandbox.config_dir()).expect("config dir");
        fs::write(
            sandbox.config_path(),
            format!(
                "[common]\nlog_level = \"debug\"\nbase_uri = \"{}\"\ntoken_url = \"{}\"\n\n{}\n",
                server.url("/api"),
                server.url("/oauth/token"),
                credentials
            ),
        )
        .expect("write config");
        sandbox
    }

    pub fn config_dir(&self) -> PathBuf {
        self.dir.path().join("config")
    }

    pub fn config_path(&self) -> PathBuf {
        self.config_dir().join("config.toml")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.dir.path().join("cache")
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("cloudapi").expect("cloudapi binary");
        cmd.env("CLOUDAPI_CONFIG_DIR", self.config_dir())
            .env("CLOUDAPI_CACHE_DIR", self.cache_dir())
            .env("NO_COLOR", "1")
            .env_remove("CLOUDAPI_ACCESS_TOKEN")
            .env_remove("CLOUDAPI_SPEC")
            .arg("--spec")
            .arg(DESCRIPTORS);
        cmd
    }
}
