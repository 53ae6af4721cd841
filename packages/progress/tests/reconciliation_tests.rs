// ABOUTME: Reconciliation tests across the store and both cache implementations
// ABOUTME: Local-first completion, server catch-up, crash recovery, and the staff mirror

use std::sync::Arc;

use engage_core::{ClientCreateInput, Milestone};
use engage_progress::{
    FileProgressCache, InMemoryProgressCache, LocalProgressCache, MergedProgress, ProgressError,
    ProgressService, ProgressSnapshot, ProgressStep,
};
use engage_storage::{clients, DeliverableStore};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

async fn setup(cache: Arc<dyn LocalProgressCache>) -> (ProgressService, String) {
    let store = DeliverableStore::in_memory().await.unwrap();
    let client_id = {
        let mut conn = store.acquire().await.unwrap();
        clients::create_client(
            &mut conn,
            &ClientCreateInput {
                display_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    };
    (ProgressService::new(store, cache), client_id)
}

#[tokio::test]
async fn test_fresh_client_starts_at_step_one() {
    let (service, client_id) = setup(Arc::new(InMemoryProgressCache::new())).await;

    let progress = service.get_merged_progress(&client_id).await.unwrap();
    assert_eq!(
        progress,
        MergedProgress {
            steps: [false; 5],
            current_step: 1
        }
    );
}

#[tokio::test]
async fn test_local_completion_shows_before_server_catches_up() {
    let cache = Arc::new(InMemoryProgressCache::new());
    let (service, client_id) = setup(cache.clone()).await;

    let local = service
        .record_local_step_completion(&client_id, ProgressStep::Intake)
        .await
        .unwrap();
    assert_eq!(local.current_step, 2);

    // Server has not recorded the intake yet, the merged view still shows it
    let merged = service.get_merged_progress(&client_id).await.unwrap();
    assert_eq!(merged.steps, [true, false, false, false, false]);
    assert_eq!(merged.current_step, 2);

    // Server catches up with a different milestone; nothing regresses
    let merged = service
        .confirm_milestone(&client_id, Milestone::ResumeUploaded)
        .await
        .unwrap();
    assert_eq!(merged.steps, [true, true, false, false, false]);
    assert_eq!(merged.current_step, 3);

    // The merge was written back to the local cache
    assert_eq!(
        cache.get(&client_id).await.unwrap(),
        Some(ProgressSnapshot::from_steps([true, true, false, false, false]))
    );
}

#[tokio::test]
async fn test_staff_steps_come_only_from_local_signal() {
    let (service, client_id) = setup(Arc::new(InMemoryProgressCache::new())).await;

    for milestone in Milestone::ALL {
        service
            .confirm_milestone(&client_id, milestone)
            .await
            .unwrap();
    }
    let merged = service.get_merged_progress(&client_id).await.unwrap();
    assert_eq!(merged.current_step, 4);

    service
        .record_local_step_completion(&client_id, ProgressStep::Production)
        .await
        .unwrap();
    service
        .record_local_step_completion(&client_id, ProgressStep::ReviewDelivery)
        .await
        .unwrap();
    let merged = service.get_merged_progress(&client_id).await.unwrap();
    assert_eq!(merged.steps, [true; 5]);
    assert_eq!(merged.current_step, 5);
}

#[tokio::test]
async fn test_reconciliation_is_idempotent_and_mirrored() {
    let (service, client_id) = setup(Arc::new(InMemoryProgressCache::new())).await;

    service
        .record_local_step_completion(&client_id, ProgressStep::SessionBooking)
        .await
        .unwrap();
    let first = service.get_merged_progress(&client_id).await.unwrap();
    let second = service.get_merged_progress(&client_id).await.unwrap();
    assert_eq!(first, second);

    let mirror = service.mirrored_progress(&client_id).await.unwrap().unwrap();
    assert_eq!(mirror.steps(), first.steps);
    assert_eq!(mirror.current_step, i64::from(first.current_step));
}

#[tokio::test]
async fn test_file_cache_survives_restart() {
    let temp_dir = TempDir::new().unwrap();
    let cache = Arc::new(FileProgressCache::new(temp_dir.path()));
    let (service, client_id) = setup(cache).await;

    service
        .record_local_step_completion(&client_id, ProgressStep::Intake)
        .await
        .unwrap();
    let before = service.get_merged_progress(&client_id).await.unwrap();

    // A new cache over the same directory sees the persisted state alone
    let reopened = FileProgressCache::new(temp_dir.path());
    let persisted = reopened.get(&client_id).await.unwrap().unwrap();
    assert_eq!(MergedProgress::from(persisted), before);
}

#[tokio::test]
async fn test_unknown_client_is_not_found() {
    let (service, _) = setup(Arc::new(InMemoryProgressCache::new())).await;

    let err = service.get_merged_progress("client-missing").await.unwrap_err();
    assert!(matches!(err, ProgressError::NotFound(id) if id == "client-missing"));
}

#[tokio::test]
async fn test_local_record_includes_server_milestones() {
    let (service, client_id) = setup(Arc::new(InMemoryProgressCache::new())).await;

    for milestone in Milestone::ALL {
        service
            .confirm_milestone(&client_id, milestone)
            .await
            .unwrap();
    }

    let recorded = service
        .record_local_step_completion(&client_id, ProgressStep::Production)
        .await
        .unwrap();
    assert_eq!(
        recorded,
        MergedProgress {
            steps: [true, true, true, true, false],
            current_step: 5
        }
    );
    assert_eq!(recorded, service.get_merged_progress(&client_id).await.unwrap());
}

#[tokio::test]
async fn test_local_record_for_unknown_client_is_not_found() {
    let cache = Arc::new(InMemoryProgressCache::new());
    let (service, _) = setup(cache.clone()).await;

    let err = service
        .record_local_step_completion("client-missing", ProgressStep::Intake)
        .await
        .unwrap_err();
    assert!(matches!(err, ProgressError::NotFound(id) if id == "client-missing"));
    assert_eq!(cache.get("client-missing").await.unwrap(), None);
}

#[tokio::test]
async fn test_mirror_does_not_regress_across_devices() {
    let store = DeliverableStore::in_memory().await.unwrap();
    let client_id = {
        let mut conn = store.acquire().await.unwrap();
        clients::create_client(
            &mut conn,
            &ClientCreateInput {
                display_name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
    };

    let laptop = ProgressService::new(store.clone(), Arc::new(InMemoryProgressCache::new()));
    let phone = ProgressService::new(store, Arc::new(InMemoryProgressCache::new()));

    laptop
        .record_local_step_completion(&client_id, ProgressStep::Intake)
        .await
        .unwrap();
    laptop.get_merged_progress(&client_id).await.unwrap();

    // The phone has never seen the intake completion
    let phone_view = phone.get_merged_progress(&client_id).await.unwrap();
    assert_eq!(phone_view.steps, [false; 5]);

    let mirror = phone.mirrored_progress(&client_id).await.unwrap().unwrap();
    assert_eq!(mirror.steps(), [true, false, false, false, false]);
    assert_eq!(mirror.current_step, 2);
}
