use super::AccessToken;
use crate::error::{Error, Result};
use chrono::Utc;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OAuth2 token endpoint. Every failure is reported as an authentication error.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    client: Client,
    url: String,
}

impl TokenEndpoint {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        TokenEndpoint {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Posts a form-encoded grant and parses the issued token.
    pub async fn exchange(&self, form: Vec<(&'static str, String)>) -> Result<AccessToken> {
        let grant = form
            .iter()
            .find(|(name, _)| *name == "grant_type")
            .map(|(_, value)| value.as_str())
            .unwrap_or("unknown");
        tracing::info!(grant, url = %self.url, "Requesting access token");

        let response = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                Error::AuthenticationError(format!("Token request to {} failed: {}", self.url, e))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            Error::AuthenticationError(format!("Failed to read token response: {}", e))
        })?;

        if !status.is_success() {
            tracing::warn!(grant, status = status.as_u16(), "Token request rejected");
            return Err(Error::AuthenticationError(describe_rejection(status, &body)));
        }

        let issued: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            Error::AuthenticationError(format!("Malformed token response: {}", e))
        })?;
        let expires_at = issued
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));

        Ok(AccessToken::new(
            issued.access_token,
            expires_at,
            issued.refresh_token,
        ))
    }
}

fn describe_rejection(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("{} ({}): {}", error, status.as_u16(), description),
        Ok(TokenErrorResponse { error, .. }) => format!("{} ({})", error, status.as_u16()),
        Err(_) => format!("Token endpoint returned {}", status),
    }
}
