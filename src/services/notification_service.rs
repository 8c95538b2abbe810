//! Notification Service
//!
//! Fire-and-forget delivery of user notifications and organization events.
//! Callers enqueue synchronously; a background worker drains a bounded queue
//! into a [`NotificationSink`]. Delivery failures are logged and dropped.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    User {
        recipient_id: Uuid,
        subject: String,
        body: String,
    },
    OrgEvent {
        organization_id: Uuid,
        entity: String,
        event_type: String,
    },
}

/// Interface the domain services notify through. Never fails the caller.
pub trait Notifier: Send + Sync {
    fn notify(&self, recipient_id: Uuid, subject: &str, body: &str);
    fn notify_org_event(&self, organization_id: Uuid, entity: &str, event_type: &str);
}

/// Final destination of a notification.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()>;
}

/// Writes notifications to the log. Used when no webhook is configured.
pub struct TracingNotificationSink;

#[async_trait]
impl NotificationSink for TracingNotificationSink {
    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
        match notification {
            Notification::User {
                recipient_id,
                subject,
                ..
            } => tracing::info!(
                recipient_id = %recipient_id,
                subject = %subject,
                "user notification"
            ),
            Notification::OrgEvent {
                organization_id,
                entity,
                event_type,
            } => tracing::info!(
                organization_id = %organization_id,
                entity = %entity,
                event_type = %event_type,
                "organization event"
            ),
        }
        Ok(())
    }
}

/// Posts each notification as JSON to a webhook endpoint.
pub struct WebhookNotificationSink {
    client: Client,
    url: String,
}

impl WebhookNotificationSink {
    pub fn new(url: String, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("grc-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                ApiError::Configuration(format!("Failed to build webhook client: {}", e))
            })?;

        Ok(Self { client, url })
    }
}

#[async_trait]
impl NotificationSink for WebhookNotificationSink {
    async fn deliver(&self, notification: &Notification) -> anyhow::Result<()> {
        self.client
            .post(&self.url)
            .json(notification)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Bounded queue in front of a sink, drained by a single worker task.
pub struct NotificationDispatcher {
    sender: mpsc::Sender<Notification>,
    worker: JoinHandle<()>,
}

impl NotificationDispatcher {
    /// Spawn the worker on the current tokio runtime.
    pub fn start(sink: Arc<dyn NotificationSink>, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Notification>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(notification) = receiver.recv().await {
                if let Err(e) = sink.deliver(&notification).await {
                    tracing::warn!(error = %e, ?notification, "notification delivery failed");
                }
            }
            tracing::debug!("notification queue closed, worker exiting");
        });

        Self { sender, worker }
    }

    fn enqueue(&self, notification: Notification) {
        match self.sender.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                tracing::warn!(?dropped, "notification queue full, dropping notification");
            }
            Err(TrySendError::Closed(dropped)) => {
                tracing::warn!(?dropped, "notification queue closed, dropping notification");
            }
        }
    }

    /// Stop accepting notifications and wait for queued ones to be delivered.
    pub async fn shutdown(self) {
        let Self { sender, worker } = self;
        drop(sender);
        if let Err(e) = worker.await {
            tracing::warn!(error = %e, "notification worker terminated abnormally");
        }
    }
}

impl Notifier for NotificationDispatcher {
    fn notify(&self, recipient_id: Uuid, subject: &str, body: &str) {
        self.enqueue(Notification::User {
            recipient_id,
            subject: subject.to_string(),
            body: body.to_string(),
        });
    }

    fn notify_org_event(&self, organization_id: Uuid, entity: &str, event_type: &str) {
        self.enqueue(Notification::OrgEvent {
            organization_id,
            entity: entity.to_string(),
            event_type: event_type.to_string(),
        });
    }
}
