use super::{AccessToken, CredentialProvider, TokenCache, TokenEndpoint, TokenSlot};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;

/// Exchanges a long-lived API key/secret pair for access tokens.
pub struct ClientCredentialsProvider {
    key: String,
    secret: String,
    base_uri: String,
    client: Client,
    endpoint: TokenEndpoint,
    slot: TokenSlot,
}

impl ClientCredentialsProvider {
    pub fn new(
        key: impl Into<String>,
        secret: impl Into<String>,
        base_uri: impl Into<String>,
        client: Client,
        token_url: &str,
        cache: TokenCache,
    ) -> Self {
        ClientCredentialsProvider {
            key: key.into(),
            secret: secret.into(),
            base_uri: base_uri.into(),
            endpoint: TokenEndpoint::new(client.clone(), token_url),
            client,
            slot: TokenSlot::new(cache),
        }
    }
}

#[async_trait]
impl CredentialProvider for ClientCredentialsProvider {
    async fn access_token(&self) -> Result<AccessToken> {
        let form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", self.key.clone()),
            ("client_secret", self.secret.clone()),
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
