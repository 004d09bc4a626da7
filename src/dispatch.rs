use crate::auth::CredentialProvider;
use crate::binding::{BoundRequest, MultipartField, RequestBody};
use crate::error::{Error, ExitStatus, Result};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;

/// A decoded Cloud API response, successful or not.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.is_success() {
            ExitStatus::Success
        } else {
            ExitStatus::Failure
        }
    }

    pub fn to_pretty_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.body)?)
    }
}

fn decode_body(status: StatusCode, text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) if status.is_success() => Value::String(text.to_string()),
        Err(_) => json!({"error": status.as_u16(), "message": text}),
    }
}

fn multipart_form(fields: &[MultipartField]) -> Form {
    fields.iter().fold(Form::new(), |form, field| match field {
        MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
        MultipartField::File {
            name,
            file_name,
            contents,
        } => form.part(
            name.clone(),
            Part::bytes(contents.clone()).file_name(file_name.clone()),
        ),
    })
}

/// Sends bound requests through an authenticated client.
pub struct Dispatcher {
    provider: Arc<dyn CredentialProvider>,
    debug: bool,
}

impl Dispatcher {
    pub fn new(provider: Arc<dyn CredentialProvider>) -> Self {
        Dispatcher {
            provider,
            debug: false,
        }
    }

    /// Echo request and response lines on stderr.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    /// Sends `request`. API-reported failures come back as a non-success
    /// [`ApiResponse`]; only authentication and transport problems are errors.
    pub async fn execute(&self, request: &BoundRequest) -> Result<ApiResponse> {
        let mut builder = self
            .provider
            .authenticated_request(request.method.clone(), &request.path)
            .await?
            .header(ACCEPT, "application/json");

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(map) => builder.json(map),
            RequestBody::Multipart(fields) => builder.multipart(multipart_form(fields)),
        };

        if self.debug {
            eprintln!("> {} {}", request.method, request.path);
            for (name, value) in &request.query {
                eprintln!(">   {}={}", name, value);
            }
        }
        tracing::info!(method = %request.method, path = %request.path, "Dispatching request");

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if self.debug {
            eprintln!("< {}", status);
        }
        tracing::info!(status = status.as_u16(), "Received response");

        Ok(ApiResponse {
            status: status.as_u16(),
            body: decode_body(status, &text),
        })
    }

    /// GETs `path`, turning a non-success response into [`Error::ApiError`].
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        let request = BoundRequest {
            method: Method::GET,
            path: path.to_string(),
            query: Vec::new(),
            body: RequestBody::Empty,
            parameters: Vec::new(),
        };

        let response = self.execute(&request).await?;
        if !response.is_success() {
            return Err(Error::ApiError {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }
}
