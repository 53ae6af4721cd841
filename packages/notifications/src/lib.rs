// ABOUTME: Notification dispatch for delivery and revision lifecycle events
// ABOUTME: Dispatch is best-effort and bounded; failures become warnings, never errors

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engage_config::NotificationSettings;
use engage_core::{Dependency, DependencyFailure};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod dispatchers;

pub use dispatchers::{LogDispatcher, RecordingDispatcher, WebhookDispatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    DeliveryReady,
    RevisionRequested,
    RevisionCompleted,
    DeliveryApproved,
    /// The client approved their last outstanding delivery
    TestimonialPrompt,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::DeliveryReady => "delivery_ready",
            EventType::RevisionRequested => "revision_requested",
            EventType::RevisionCompleted => "revision_completed",
            EventType::DeliveryApproved => "delivery_approved",
            EventType::TestimonialPrompt => "testimonial_prompt",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub event_type: EventType,
    pub delivery_id: String,
    pub client_id: String,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(
        event_type: EventType,
        delivery_id: impl Into<String>,
        client_id: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_type,
            delivery_id: delivery_id.into(),
            client_id: client_id.into(),
            payload,
            occurred_at: Utc::now(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Webhook rejected event with status {0}")]
    Rejected(u16),

    #[error("{0}")]
    Unavailable(String),
}

pub type DispatchResult<T> = Result<T, DispatchError>;

/// Outbound side channel for lifecycle events
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    fn name(&self) -> &'static str;

    async fn dispatch(&self, event: &NotificationEvent) -> DispatchResult<()>;
}

/// Dispatcher wrapper that bounds every call and converts failures into warnings
#[derive(Clone)]
pub struct Notifier {
    dispatcher: Arc<dyn NotificationDispatcher>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(dispatcher: Arc<dyn NotificationDispatcher>, timeout: Duration) -> Self {
        Self {
            dispatcher,
            timeout,
        }
    }

    /// Webhook dispatcher when a URL is configured, log dispatcher otherwise
    pub fn from_settings(settings: &NotificationSettings) -> Self {
        let dispatcher: Arc<dyn NotificationDispatcher> = match &settings.webhook_url {
            Some(url) => Arc::new(WebhookDispatcher::new(url.clone())),
            None => Arc::new(LogDispatcher),
        };
        Self::new(dispatcher, settings.timeout)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Dispatch one event. Must only be called after the triggering change has committed.
    pub async fn notify(&self, event: NotificationEvent) -> Option<DependencyFailure> {
        debug!(
            "Dispatching {} for delivery {} via {}",
            event.event_type,
            event.delivery_id,
            self.dispatcher.name()
        );

        let message = match tokio::time::timeout(self.timeout, self.dispatcher.dispatch(&event))
            .await
        {
            Ok(Ok(())) => return None,
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {}ms", self.timeout.as_millis()),
        };

        warn!(
            "Notification {} for delivery {} not sent: {}",
            event.event_type, event.delivery_id, message
        );
        Some(DependencyFailure::new(
            Dependency::NotificationDispatcher,
            format!("{}: {}", event.event_type, message),
        ))
    }

    /// Dispatch several events in order, collecting every failure
    pub async fn notify_all(&self, events: Vec<NotificationEvent>) -> Vec<DependencyFailure> {
        let mut warnings = Vec::new();
        for event in events {
            warnings.extend(self.notify(event).await);
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    mock! {
        Dispatcher {}

        #[async_trait]
        impl NotificationDispatcher for Dispatcher {
            fn name(&self) -> &'static str;
            async fn dispatch(&self, event: &NotificationEvent) -> DispatchResult<()>;
        }
    }

    struct StalledDispatcher;

    #[async_trait]
    impl NotificationDispatcher for StalledDispatcher {
        fn name(&self) -> &'static str {
            "stalled"
        }

        async fn dispatch(&self, _event: &NotificationEvent) -> DispatchResult<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn event() -> NotificationEvent {
        NotificationEvent::new(
            EventType::DeliveryReady,
            "dlv-1",
            "client-1",
            json!({ "title": "Resume" }),
        )
    }

    #[tokio::test]
    async fn test_successful_dispatch_has_no_warning() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_name().return_const("mock");
        dispatcher
            .expect_dispatch()
            .withf(|event| event.event_type == EventType::DeliveryReady)
            .times(1)
            .returning(|_| Ok(()));

        let notifier = Notifier::new(Arc::new(dispatcher), Duration::from_secs(1));
        assert!(notifier.notify(event()).await.is_none());
    }

    #[tokio::test]
    async fn test_failed_dispatch_becomes_warning() {
        let mut dispatcher = MockDispatcher::new();
        dispatcher.expect_name().return_const("mock");
        dispatcher
            .expect_dispatch()
            .returning(|_| Err(DispatchError::Unavailable("smtp relay down".to_string())));

        let notifier = Notifier::new(Arc::new(dispatcher), Duration::from_secs(1));
        let warning = notifier.notify(event()).await.unwrap();

        assert_eq!(warning.dependency, Dependency::NotificationDispatcher);
        assert_eq!(warning.message, "delivery_ready: smtp relay down");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_dispatch_is_bounded() {
        let notifier = Notifier::new(Arc::new(StalledDispatcher), Duration::from_millis(250));
        let warning = notifier.notify(event()).await.unwrap();

        assert_eq!(warning.message, "delivery_ready: timed out after 250ms");
    }

    #[test]
    fn test_event_type_wire_names() {
        assert_eq!(
            serde_json::to_value(EventType::TestimonialPrompt).unwrap(),
            json!("testimonial_prompt")
        );
        assert_eq!(EventType::RevisionCompleted.to_string(), "revision_completed");
    }
}
