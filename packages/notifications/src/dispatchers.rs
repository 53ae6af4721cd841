// ABOUTME: Concrete notification dispatchers
// ABOUTME: Structured log output, JSON webhook delivery, and an in-memory recorder for tests

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use tracing::info;

use crate::{DispatchError, DispatchResult, EventType, NotificationDispatcher, NotificationEvent};

/// Writes each event to the log. Used when no webhook is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogDispatcher;

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn dispatch(&self, event: &NotificationEvent) -> DispatchResult<()> {
        info!(
            event_type = %event.event_type,
            delivery_id = %event.delivery_id,
            client_id = %event.client_id,
            payload = %event.payload,
            "notification"
        );
        Ok(())
    }
}

/// POSTs each event as JSON to a fixed URL
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: Client,
    url: String,
}

impl WebhookDispatcher {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl NotificationDispatcher for WebhookDispatcher {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn dispatch(&self, event: &NotificationEvent) -> DispatchResult<()> {
        let response = self
            .client
            .post(&self.url)
            .header("content-type", "application/json")
            .header("x-engage-event", event.event_type.as_str())
            .json(event)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DispatchError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Keeps every dispatched event in memory
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    events: Mutex<Vec<NotificationEvent>>,
    failure: Option<String>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records events but reports every dispatch as failed
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    pub async fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().await.clone()
    }

    pub async fn count(&self, event_type: EventType) -> usize {
        self.events
            .lock()
            .await
            .iter()
            .filter(|event| event.event_type == event_type)
            .count()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn dispatch(&self, event: &NotificationEvent) -> DispatchResult<()> {
        self.events.lock().await.push(event.clone());
        match &self.failure {
            Some(message) => Err(DispatchError::Unavailable(message.clone())),
            None => Ok(()),
        }
    }
}
