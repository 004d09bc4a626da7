pub mod notifications;
pub mod scheduler;

pub use notifications::Notifications;
pub use scheduler::{Scheduler, TimerId};

use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay before the first check.
    pub first_check: Duration,
    pub interval: Duration,
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        PollSettings {
            first_check: Duration::from_millis(100),
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(45),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Polling,
    Completed,
    TimedOut,
    Failed,
}

/// A server-side task notification as returned by `GET /notifications/{uuid}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Notification {
    pub uuid: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub status: String,
    pub progress: u8,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    pub id: String,
    pub progress: u8,
    pub status: String,
    pub label: String,
    pub created_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub phase: Phase,
}

impl PollState {
    fn new(id: &str) -> Self {
        PollState {
            id: id.to_string(),
            progress: 0,
            status: String::new(),
            label: String::new(),
            created_at: None,
            completed_at: None,
            phase: Phase::Idle,
        }
    }

    fn update(&mut self, notification: &Notification) {
        self.progress = notification.progress.min(100);
        self.status = notification.status.clone();
        self.label = notification.label.clone();
        self.created_at = Some(notification.created_at);
        self.completed_at = notification.completed_at;
    }

    pub fn message(&self) -> String {
        format!(
            "Task of type {} is {}% complete",
            self.label, self.progress
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub notification: Notification,
    pub duration_secs: i64,
}

impl Completion {
    fn from_notification(notification: Notification) -> Self {
        let duration_secs = notification
            .completed_at
            .map(|completed| (completed - notification.created_at).num_seconds())
            .unwrap_or(0);

        Completion {
            notification,
            duration_secs,
        }
    }
}

#[async_trait]
pub trait NotificationSource: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Notification>;
}

/// Waits for a notification to reach 100% progress.
pub struct TaskPoller<S> {
    source: S,
    settings: PollSettings,
}

impl<S: NotificationSource> TaskPoller<S> {
    pub fn new(source: S) -> Self {
        TaskPoller {
            source,
            settings: PollSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Runs the loop until the task completes, the timeout fires, or a
    /// check fails. `on_progress` sees the state after every check and once
    /// more when the loop reaches its final phase.
    pub async fn wait<F>(&self, id: &str, mut on_progress: F) -> Result<Completion>
    where
        F: FnMut(&PollState) + Send,
    {
        let mut scheduler = Scheduler::new();
        scheduler.add_timer(self.settings.first_check);
        scheduler.add_periodic_timer(self.settings.interval);
        let timeout = scheduler.add_timer(self.settings.timeout);

        let mut state = PollState::new(id);
        state.phase = Phase::Polling;
        tracing::info!(id, "Waiting for task");

        while let Some(timer) = scheduler.next().await {
            if timer == timeout {
                break;
            }

            let notification = match self.source.fetch(id).await {
                Ok(notification) => notification,
                Err(e) => {
                    scheduler.stop();
                    state.phase = Phase::Failed;
                    on_progress(&state);
                    tracing::error!(id, error = %e, "Task check failed");
                    return Err(e);
                }
            };
            state.update(&notification);

            if notification.progress >= 100 {
                scheduler.stop();
                state.phase = Phase::Completed;
                on_progress(&state);
                tracing::info!(id, status = %notification.status, "Task completed");
                return Ok(Completion::from_notification(notification));
            }
            tracing::debug!(id, progress = state.progress, "Task in progress");
            on_progress(&state);
        }

        scheduler.stop();
        state.phase = Phase::TimedOut;
        on_progress(&state);
        tracing::warn!(id, "Timed out waiting for task");
        Err(Error::TimeoutError {
            id: id.to_string(),
            timeout_secs: self.settings.timeout.as_secs(),
        })
    }
}
