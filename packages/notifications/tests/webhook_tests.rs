// ABOUTME: Webhook dispatcher tests against a mock HTTP server
// ABOUTME: Covers the JSON body, rejected deliveries, and the notifier's warning conversion

use std::sync::Arc;
use std::time::Duration;

use engage_core::Dependency;
use engage_notifications::{
    EventType, NotificationDispatcher, NotificationEvent, Notifier, WebhookDispatcher,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn approved_event() -> NotificationEvent {
    NotificationEvent::new(
        EventType::DeliveryApproved,
        "dlv-42",
        "client-7",
        json!({ "title": "Resume - Revised 0" }),
    )
}

#[tokio::test]
async fn test_webhook_posts_event_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/engage"))
        .and(header("x-engage-event", "delivery_approved"))
        .and(body_partial_json(json!({
            "event_type": "delivery_approved",
            "delivery_id": "dlv-42",
            "client_id": "client-7",
            "payload": { "title": "Resume - Revised 0" }
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = WebhookDispatcher::new(format!("{}/hooks/engage", server.uri()));
    dispatcher.dispatch(&approved_event()).await.unwrap();
}

#[tokio::test]
async fn test_webhook_rejection_surfaces_as_warning() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let notifier = Notifier::new(
        Arc::new(WebhookDispatcher::new(server.uri())),
        Duration::from_secs(2),
    );
    let warning = notifier.notify(approved_event()).await.unwrap();

    assert_eq!(warning.dependency, Dependency::NotificationDispatcher);
    assert!(warning.message.contains("503"));
}

#[tokio::test]
async fn test_slow_webhook_is_cut_off() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let notifier = Notifier::new(
        Arc::new(WebhookDispatcher::new(server.uri())),
        Duration::from_millis(100),
    );
    let warning = notifier.notify(approved_event()).await.unwrap();

    assert!(warning.message.contains("timed out after 100ms"));
}
