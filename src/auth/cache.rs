use super::AccessToken;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedTokenEntry {
    pub key: String,
    pub token: AccessToken,
    pub stored_at: DateTime<Utc>,
    pub ttl_secs: u64,
}

impl CachedTokenEntry {
    fn is_fresh(&self) -> bool {
        let ttl = chrono::Duration::seconds(self.ttl_secs as i64);
        Utc::now() < self.stored_at + ttl && !self.token.has_expired()
    }
}

/// Filesystem-backed TTL cache, one JSON file per key.
///
/// Writes go to a process-unique temporary file that is renamed over the
/// entry, so concurrent invocations never read a torn entry. The last writer
/// wins.
#[derive(Debug, Clone)]
pub struct TokenCache {
    dir: PathBuf,
    ttl: Duration,
}

impl TokenCache {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        TokenCache {
            dir: dir.into(),
            ttl,
        }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, DEFAULT_TTL)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Returns the cached token for `key`, computing and storing it on a miss.
    pub async fn get<F, Fut>(&self, key: &str, compute: F) -> Result<AccessToken>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AccessToken>>,
    {
        if let Some(entry) = self.read(key).await {
            if entry.is_fresh() {
                tracing::debug!(key, "Token cache hit");
                return Ok(entry.token);
            }
        }

        tracing::debug!(key, "Token cache miss");
        let token = compute().await?;
        let entry = CachedTokenEntry {
            key: key.to_string(),
            token: token.clone(),
            stored_at: Utc::now(),
            ttl_secs: self.ttl.as_secs(),
        };

        // A token that cannot be cached is still a valid token.
        if let Err(e) = self.write(&entry).await {
            tracing::warn!(key, error = %e, "Failed to write token cache entry");
        }

        Ok(token)
    }

    pub async fn read(&self, key: &str) -> Option<CachedTokenEntry> {
        let raw = tokio::fs::read_to_string(self.entry_path(key)).await.ok()?;

        match serde_json::from_str::<CachedTokenEntry>(&raw) {
            Ok(entry) if entry.key == key => Some(entry),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Ignoring unreadable token cache entry");
                None
            }
        }
    }

    async fn write(&self, entry: &CachedTokenEntry) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let target = self.entry_path(&entry.key);
        let staging = self
            .dir
            .join(format!(".{}.{}.tmp", entry.key, std::process::id()));

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        // Owner-only: the entry holds a bearer token.
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&staging).await?;
        file.write_all(&serde_json::to_vec(entry)?).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&staging, &target).await?;

        Ok(())
    }

    pub async fn clear(&self, key: &str) -> Result<()> {
        match tokio::fs::remove_file(self.entry_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
