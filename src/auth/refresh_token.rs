use super::{AccessToken, CredentialProvider, TokenCache, TokenEndpoint, TokenSlot};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// Exchanges a stored refresh token for access tokens.
pub struct RefreshTokenProvider {
    refresh_token: String,
    base_uri: String,
    client: Client,
    endpoint: TokenEndpoint,
    slot: TokenSlot,
}

impl RefreshTokenProvider {
    pub fn new(
        refresh_token: impl Into<String>,
        base_uri: impl Into<String>,
        client: Client,
        token_url: &str,
        cache: TokenCache,
    ) -> Self {
        RefreshTokenProvider {
            refresh_token: refresh_token.into(),
            base_uri: base_uri.into(),
            endpoint: TokenEndpoint::new(client.clone(), token_url),
            client,
            slot: TokenSlot::new(cache),
        }
    }
}

#[async_trait]
impl CredentialProvider for RefreshTokenProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        let form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", self.refresh_token.clone()),
        ];
        let endpoint = &self.endpoint;

        self.slot
            .get_or_exchange(move || endpoint.exchange(form))
            .await
    }

    fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn client(&self) -> &Client {
        &self.client
    }
}
