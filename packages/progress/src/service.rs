// ABOUTME: Progress reconciliation service
// ABOUTME: Merges server milestones with the local cache and mirrors the result for staff

use std::sync::Arc;

use engage_core::Milestone;
use engage_storage::{clients, progress, DeliverableStore, ProgressRecord, StorageError};
use thiserror::Error;
use tracing::{debug, info};

use crate::cache::{CacheError, LocalProgressCache};
use crate::snapshot::{MergedProgress, ProgressSnapshot, ProgressStep};

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Storage error: {0}")]
    Storage(StorageError),

    #[error("Local progress cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Client not found: {0}")]
    NotFound(String),
}

impl From<StorageError> for ProgressError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { id, .. } => ProgressError::NotFound(id),
            other => ProgressError::Storage(other),
        }
    }
}

pub type ProgressResult<T> = Result<T, ProgressError>;

#[derive(Clone)]
pub struct ProgressService {
    store: DeliverableStore,
    cache: Arc<dyn LocalProgressCache>,
}

impl ProgressService {
    pub fn new(store: DeliverableStore, cache: Arc<dyn LocalProgressCache>) -> Self {
        Self { store, cache }
    }

    /// Reconcile server milestones with the local cache.
    ///
    /// The merged snapshot is written back to the cache and mirrored into the progress
    /// record. Running this again on the same inputs changes nothing.
    pub async fn get_merged_progress(&self, client_id: &str) -> ProgressResult<MergedProgress> {
        let server = self.server_snapshot(client_id).await?;
        let local = self.cache.get(client_id).await?.unwrap_or_default();
        let merged = server.merge(&local);

        debug!(
            "Reconciled progress for {}: server {:?}, local {:?}",
            client_id,
            server.steps(),
            local.steps()
        );

        // Another writer may have added flags since the read; merge keeps them
        let persisted = self.cache.merge(client_id, merged).await?;

        let mut conn = self.store.acquire().await?;
        progress::upsert_progress(
            &mut conn,
            client_id,
            persisted.steps(),
            i64::from(persisted.current_step()),
        )
        .await?;

        Ok(persisted.into())
    }

    /// Record a step completed on the client. The server is read but not written.
    ///
    /// The returned view includes server milestones, so it never shows less than
    /// `get_merged_progress` would.
    pub async fn record_local_step_completion(
        &self,
        client_id: &str,
        step: ProgressStep,
    ) -> ProgressResult<MergedProgress> {
        let server = self.server_snapshot(client_id).await?;
        let update = server.merge(&ProgressSnapshot::default().with_completed(step));
        let local = self.cache.merge(client_id, update).await?;

        debug!("Recorded local completion of {} for {}", step, client_id);
        Ok(local.merge(&server).into())
    }

    /// Durably set a server milestone, then reconcile
    pub async fn confirm_milestone(
        &self,
        client_id: &str,
        milestone: Milestone,
    ) -> ProgressResult<MergedProgress> {
        {
            let mut tx = self.store.begin().await?;
            clients::confirm_milestone(&mut tx, client_id, milestone).await?;
            clients::append_history(
                &mut tx,
                client_id,
                "milestone_confirmed",
                Some(milestone.column()),
            )
            .await?;
            tx.commit().await.map_err(StorageError::from)?;
        }

        info!(
            "Confirmed milestone {} for client {}",
            milestone.column(),
            client_id
        );
        self.get_merged_progress(client_id).await
    }

    /// Last mirrored cursor, as staff see it
    pub async fn mirrored_progress(
        &self,
        client_id: &str,
    ) -> ProgressResult<Option<ProgressRecord>> {
        let mut conn = self.store.acquire().await?;
        Ok(progress::get_progress(&mut conn, client_id).await?)
    }

    async fn server_snapshot(&self, client_id: &str) -> ProgressResult<ProgressSnapshot> {
        let mut conn = self.store.acquire().await?;
        let milestones = clients::get_milestones(&mut conn, client_id).await?;
        Ok(ProgressSnapshot::from_milestones(milestones))
    }
}
