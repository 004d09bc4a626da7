use super::{Notification, NotificationSource};
use crate::dispatch::Dispatcher;
use crate::error::Result;
use async_trait::async_trait;

/// Reads notifications from the Cloud API.
pub struct Notifications<'a> {
    dispatcher: &'a Dispatcher,
}

impl<'a> Notifications<'a> {
    pub fn new(dispatcher: &'a Dispatcher) -> Self {
        Notifications { dispatcher }
    }
}

#[async_trait]
impl NotificationSource for Notifications<'_> {
    async fn fetch(&self, id: &str) -> Result<Notification> {
        let body = self
            .dispatcher
            .get_json(&format!("/notifications/{}", id))
            .await?;
        Ok(serde_json::from_value(body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::tests::StaticProvider;
    use crate::error::Error;
    use httpmock::prelude::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fetch_reads_notification() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/notifications/f47ac10b-58cc-4372-a567-0e02b2c3d479");
                then.status(200).json_body(serde_json::json!({
                    "uuid": "f47ac10b-58cc-4372-a567-0e02b2c3d479",
                    "label": "Environment created",
                    "status": "in-progress",
                    "progress": 30,
                    "created_at": "2024-05-01T12:00:00+00:00",
                    "completed_at": null
                }));
            })
            .await;
        let dispatcher = Dispatcher::new(Arc::new(StaticProvider::new(server.base_url())));

        // Test
        let notification = Notifications::new(&dispatcher)
            .fetch("f47ac10b-58cc-4372-a567-0e02b2c3d479")
            .await?;

        // Validate
        assert_eq!(notification.progress, 30);
        assert_eq!(notification.label, "Environment created");
        assert!(notification.completed_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_surfaces_api_error() -> anyhow::Result<()> {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/notifications/gone");
                then.status(404)
                    .json_body(serde_json::json!({"error": "not_found", "message": "Gone."}));
            })
            .await;
        let dispatcher = Dispatcher::new(Arc::new(StaticProvider::new(server.base_url())));

        // Test
        let result = Notifications::new(&dispatcher).fetch("gone").await;

        // Validate
        assert!(matches!(result, Err(Error::ApiError { status: 404, .. })));
        Ok(())
    }
}
