pub mod cache;
pub mod client_credentials;
pub mod refresh_token;
pub mod token_endpoint;

pub use cache::TokenCache;
pub use client_credentials::ClientCredentialsProvider;
pub use refresh_token::RefreshTokenProvider;
pub use token_endpoint::TokenEndpoint;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::Mutex;

/// When set, its value is sent as the bearer token and nothing is fetched or cached.
pub const ACCESS_TOKEN_ENV: &str = "CLOUDAPI_ACCESS_TOKEN";

/// Single key under which the current access token is cached.
pub const CACHE_KEY: &str = "cloudapi-token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    token: String,
    expires_at: Option<DateTime<Utc>>,
    refresh_token: Option<String>,
}

impl AccessToken {
    pub fn new(
        token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
        refresh_token: Option<String>,
    ) -> Self {
        AccessToken {
            token: token.into(),
            expires_at,
            refresh_token,
        }
    }

    /// A bare token with no expiry, as supplied through the override variable.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::new(token, None, None)
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn has_expired(&self) -> bool {
        self.expires_at.is_some_and(|expiry| Utc::now() >= expiry)
    }
}

/// Source of bearer tokens for the Cloud API.
///
/// Implementations differ only in how a fresh token is obtained; holding,
/// caching and the environment override are shared through [`TokenSlot`].
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn access_token(&self) -> Result<AccessToken>;

    fn base_uri(&self) -> &str;

    fn client(&self) -> &Client;

    /// Builds a request against `base_uri + path` carrying the current bearer token.
    async fn authenticated_request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        let token = self.access_token().await?;
        let url = format!("{}{}", self.base_uri().trim_end_matches('/'), path);

        Ok(self.client().request(method, url).bearer_auth(token.secret()))
    }
}

pub fn override_token() -> Option<AccessToken> {
    std::env::var(ACCESS_TOKEN_ENV)
        .ok()
        .filter(|value| !value.is_empty())
        .map(AccessToken::bearer)
}

/// In-memory token plus the on-disk cache behind it.
pub(crate) struct TokenSlot {
    held: Mutex<Option<AccessToken>>,
    cache: TokenCache,
}

impl TokenSlot {
    pub(crate) fn new(cache: TokenCache) -> Self {
        TokenSlot {
            held: Mutex::new(None),
            cache,
        }
    }

    pub(crate) async fn get_or_exchange<F, Fut>(&self, exchange: F) -> Result<AccessToken>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<AccessToken>> + Send,
    {
        if let Some(token) = override_token() {
            return Ok(token);
        }

        let mut held = self.held.lock().await;
        if let Some(token) = held.as_ref().filter(|token| !token.has_expired()) {
            return Ok(token.clone());
        }

        let token = self.cache.get(CACHE_KEY, exchange).await?;
        *held = Some(token.clone());

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_token_without_expiry_never_expires() {
        let token = AccessToken::bearer("abc123");

        // Validate
        assert!(!token.has_expired());
        assert_eq!(token.secret(), "abc123");
    }

    #[test]
    fn test_token_expiry() {
        let past = AccessToken::new("a", Some(Utc::now() - Duration::seconds(1)), None);
        let future = AccessToken::new("b", Some(Utc::now() + Duration::seconds(60)), None);

        // Validate
        assert!(past.has_expired());
        assert!(!future.has_expired());
    }
}
