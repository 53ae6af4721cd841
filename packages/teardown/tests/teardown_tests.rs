// ABOUTME: Teardown saga tests with a mocked identity provider
// ABOUTME: Phase 1 atomicity, phase 2 failure handling, bulk reporting, and orphan retry

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use engage_config::TeardownSettings;
use engage_core::{ClientCreateInput, DeliveryCreateInput, Dependency};
use engage_storage::{clients, deliveries, orphans, DeliverableStore};
use engage_teardown::{
    IdentityCleanup, IdentityDeletion, IdentityError, IdentityProvider, IdentityResult,
    TeardownError, TeardownOrchestrator,
};
use mockall::mock;
use mockall::predicate::eq;
use pretty_assertions::assert_eq;

mock! {
    Identity {}

    #[async_trait]
    impl IdentityProvider for Identity {
        async fn delete_identity(&self, identity_id: &str) -> IdentityResult<IdentityDeletion>;
    }
}

struct StalledIdentity;

#[async_trait]
impl IdentityProvider for StalledIdentity {
    async fn delete_identity(&self, _identity_id: &str) -> IdentityResult<IdentityDeletion> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(IdentityDeletion::Deleted)
    }
}

fn settings() -> TeardownSettings {
    TeardownSettings {
        concurrency: 2,
        call_timeout: Duration::from_millis(500),
        ..Default::default()
    }
}

async fn seed_client(store: &DeliverableStore, name: &str, auth_user_id: Option<&str>) -> String {
    let mut conn = store.acquire().await.unwrap();
    let client = clients::create_client(
        &mut conn,
        &ClientCreateInput {
            display_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            auth_user_id: auth_user_id.map(str::to_string),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    deliveries::insert_delivery(
        &mut conn,
        &DeliveryCreateInput {
            client_id: client.id.clone(),
            title: "Resume".to_string(),
            document_type: "resume".to_string(),
            file_url: "files/resume.pdf".to_string(),
            file_size: 100,
        },
    )
    .await
    .unwrap();
    client.id
}

async fn client_exists(store: &DeliverableStore, client_id: &str) -> bool {
    let mut conn = store.acquire().await.unwrap();
    clients::get_client(&mut conn, client_id).await.is_ok()
}

#[tokio::test]
async fn test_full_teardown_removes_data_and_identity() {
    let store = DeliverableStore::in_memory().await.unwrap();
    let client_id = seed_client(&store, "Ada", Some("auth-ada")).await;

    let mut identity = MockIdentity::new();
    identity
        .expect_delete_identity()
        .with(eq("auth-ada"))
        .times(1)
        .returning(|_| Ok(IdentityDeletion::Deleted));

    let orchestrator = TeardownOrchestrator::new(store.clone(), Arc::new(identity), &settings());
    let outcome = orchestrator.teardown_client(&client_id).await.unwrap();

    assert!(!outcome.has_warnings());
    assert_eq!(outcome.value.identity, IdentityCleanup::Deleted);
    assert_eq!(outcome.value.cascade.deliveries, 1);
    assert!(!client_exists(&store, &client_id).await);
}

#[tokio::test]
async fn test_client_without_identity_skips_phase_two() {
    let store = DeliverableStore::in_memory().await.unwrap();
    let client_id = seed_client(&store, "Ada", None).await;

    let mut identity = MockIdentity::new();
    identity.expect_delete_identity().never();

    let orchestrator = TeardownOrchestrator::new(store.clone(), Arc::new(identity), &settings());
    let outcome = orchestrator.teardown_client(&client_id).await.unwrap();

    assert_eq!(outcome.value.identity, IdentityCleanup::NoIdentity);
}

#[tokio::test]
async fn test_already_deleted_identity_counts_as_success() {
    let store = DeliverableStore::in_memory().await.unwrap();
    let client_id = seed_client(&store, "Ada", Some("auth-ada")).await;

    let mut identity = MockIdentity::new();
    identity
        .expect_delete_identity()
        .returning(|_| Ok(IdentityDeletion::NotFound));

    let orchestrator = TeardownOrchestrator::new(store.clone(), Arc::new(identity), &settings());
    let outcome = orchestrator.teardown_client(&client_id).await.unwrap();

    assert!(!outcome.has_warnings());
    assert_eq!(outcome.value.identity, IdentityCleanup::AlreadyAbsent);
    let mut conn = store.acquire().await.unwrap();
    assert!(orphans::list_orphans(&mut conn).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_phase_one_failure_deletes_nothing() {
    let store = DeliverableStore::in_memory().await.unwrap();
    let client_id = seed_client(&store, "Ada", Some("auth-ada")).await;

    // Block the last step of the cascade so earlier deletes must roll back
    sqlx::query(
        r#"
        CREATE TRIGGER block_client_delete BEFORE DELETE ON clients
        BEGIN
            SELECT RAISE(ABORT, 'simulated store failure');
        END
        "#,
    )
    .execute(store.pool())
    .await
    .unwrap();

    let mut identity = MockIdentity::new();
    identity.expect_delete_identity().never();

    let orchestrator = TeardownOrchestrator::new(store.clone(), Arc::new(identity), &settings());
    let err = orchestrator.teardown_client(&client_id).await.unwrap_err();

    assert!(matches!(err, TeardownError::CascadeFailure { .. }));
    assert!(client_exists(&store, &client_id).await);
    let mut conn = store.acquire().await.unwrap();
    assert_eq!(
        deliveries::list_deliveries_for_client(&mut conn, &client_id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_provider_outage_orphans_identity_then_retry_succeeds() {
    let store = DeliverableStore::in_memory().await.unwrap();
    let client_id = seed_client(&store, "Ada", Some("auth-ada")).await;

    let mut down = MockIdentity::new();
    down.expect_delete_identity()
        .returning(|_| Err(IdentityError::Unavailable("503 Service Unavailable".to_string())));
    let orchestrator = TeardownOrchestrator::new(store.clone(), Arc::new(down), &settings());

    let outcome = orchestrator.teardown_client(&client_id).await.unwrap();

    // Data removal is reported as successful, with a dependency warning
    assert_eq!(outcome.value.identity, IdentityCleanup::Orphaned);
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].dependency, Dependency::IdentityProvider);
    assert!(outcome.warnings[0].message.contains("503"));
    assert!(!client_exists(&store, &client_id).await);

    // Retrying while the provider is still down keeps the entry
    let report = orchestrator.retry_orphaned_identities().await.unwrap();
    assert_eq!(report.still_orphaned, vec!["auth-ada".to_string()]);
    {
        let mut conn = store.acquire().await.unwrap();
        let queued = orphans::list_orphans(&mut conn).await.unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].client_id, client_id);
        assert_eq!(queued[0].attempts, 2);
    }

    // Provider recovers
    let mut up = MockIdentity::new();
    up.expect_delete_identity()
        .with(eq("auth-ada"))
        .times(1)
        .returning(|_| Ok(IdentityDeletion::Deleted));
    let recovered = TeardownOrchestrator::new(store.clone(), Arc::new(up), &settings());

    let report = recovered.retry_orphaned_identities().await.unwrap();
    assert_eq!(report.resolved, vec!["auth-ada".to_string()]);
    assert!(report.still_orphaned.is_empty());

    let mut conn = store.acquire().await.unwrap();
    assert!(orphans::list_orphans(&mut conn).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stalled_provider_is_bounded_and_orphaned() {
    let store = DeliverableStore::in_memory().await.unwrap();
    let client_id = seed_client(&store, "Ada", Some("auth-ada")).await;

    let orchestrator =
        TeardownOrchestrator::new(store.clone(), Arc::new(StalledIdentity), &settings());
    let outcome = orchestrator.teardown_client(&client_id).await.unwrap();

    assert_eq!(outcome.value.identity, IdentityCleanup::Orphaned);
    assert!(outcome.warnings[0].message.contains("timed out after 500ms"));
}

#[tokio::test]
async fn test_bulk_teardown_reports_each_client() {
    let store = DeliverableStore::in_memory().await.unwrap();
    let ada = seed_client(&store, "Ada", Some("auth-ada")).await;
    let bob = seed_client(&store, "Bob", Some("auth-bob")).await;
    let cy = seed_client(&store, "Cy", None).await;

    let mut identity = MockIdentity::new();
    identity
        .expect_delete_identity()
        .with(eq("auth-ada"))
        .returning(|_| Ok(IdentityDeletion::Deleted));
    identity
        .expect_delete_identity()
        .with(eq("auth-bob"))
        .returning(|_| Err(IdentityError::Unavailable("connection reset".to_string())));

    let orchestrator = TeardownOrchestrator::new(store.clone(), Arc::new(identity), &settings());
    let ids = vec![
        ada.clone(),
        "client-missing".to_string(),
        bob.clone(),
        cy.clone(),
    ];
    let report = orchestrator.teardown_clients(&ids).await;

    assert_eq!(report.succeeded, 3);
    assert_eq!(report.failed, 1);
    let order: Vec<_> = report.outcomes.iter().map(|o| o.client_id.clone()).collect();
    assert_eq!(order, ids);

    assert!(report.outcomes[1].error.is_some());
    assert_eq!(report.outcomes[2].warnings.len(), 1);
    assert_eq!(
        report.outcomes[3].report.as_ref().unwrap().identity,
        IdentityCleanup::NoIdentity
    );

    for id in [&ada, &bob, &cy] {
        assert!(!client_exists(&store, id).await);
    }
}

#[tokio::test]
async fn test_orphan_queue_is_not_touched_by_unrelated_teardowns() {
    let store = DeliverableStore::in_memory().await.unwrap();
    {
        let mut conn = store.acquire().await.unwrap();
        orphans::enqueue_orphan(&mut conn, "auth-old", "client-old", "timeout")
            .await
            .unwrap();
    }
    let client_id = seed_client(&store, "Ada", None).await;

    let orchestrator = TeardownOrchestrator::new(
        store.clone(),
        Arc::new(MockIdentity::new()),
        &settings(),
    );
    orchestrator.teardown_client(&client_id).await.unwrap();

    let mut conn = store.acquire().await.unwrap();
    let queued = orphans::list_orphans(&mut conn).await.unwrap();
    assert_eq!(queued.len(), 1);
    assert!(queued[0].created_at <= Utc::now());
}
