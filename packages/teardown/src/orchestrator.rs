// ABOUTME: Two-phase client teardown saga
// ABOUTME: Phase 1 removes store data atomically; phase 2 removes the identity and queues it on failure

use std::sync::Arc;
use std::time::Duration;

use engage_config::TeardownSettings;
use engage_core::{Dependency, DependencyFailure, Outcome};
use engage_storage::{orphans, CascadeSummary, DeliverableStore, StorageError};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::identity::{IdentityDeletion, IdentityProvider};

#[derive(Debug, Error)]
pub enum TeardownError {
    /// Phase 1 failed; nothing was deleted
    #[error("Cascade delete failed for client {client_id}: {source}")]
    CascadeFailure {
        client_id: String,
        #[source]
        source: StorageError,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type TeardownResult<T> = Result<T, TeardownError>;

/// What happened to the client's external identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityCleanup {
    /// The client had no linked identity
    NoIdentity,
    Deleted,
    AlreadyAbsent,
    /// Removal failed; the identity is queued for retry
    Orphaned,
}

#[derive(Debug, Clone, Serialize)]
pub struct TeardownReport {
    pub client_id: String,
    pub cascade: CascadeSummary,
    pub identity: IdentityCleanup,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientTeardownOutcome {
    pub client_id: String,
    pub report: Option<TeardownReport>,
    pub warnings: Vec<DependencyFailure>,
    pub error: Option<String>,
}

impl ClientTeardownOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkTeardownReport {
    pub succeeded: usize,
    pub failed: usize,
    /// One entry per requested client, in request order
    pub outcomes: Vec<ClientTeardownOutcome>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct OrphanRetryReport {
    pub resolved: Vec<String>,
    pub still_orphaned: Vec<String>,
}

#[derive(Clone)]
pub struct TeardownOrchestrator {
    store: DeliverableStore,
    identity: Arc<dyn IdentityProvider>,
    call_timeout: Duration,
    concurrency: usize,
}

impl TeardownOrchestrator {
    pub fn new(
        store: DeliverableStore,
        identity: Arc<dyn IdentityProvider>,
        settings: &TeardownSettings,
    ) -> Self {
        Self {
            store,
            identity,
            call_timeout: settings.call_timeout,
            concurrency: settings.concurrency.max(1),
        }
    }

    /// Remove a client and everything it owns, then its identity.
    ///
    /// An identity removal failure does not fail the teardown: the data is already gone, so the
    /// identity is queued in the orphan table and reported as a warning.
    pub async fn teardown_client(
        &self,
        client_id: &str,
    ) -> TeardownResult<Outcome<TeardownReport>> {
        let cascade = self
            .store
            .delete_client_cascade(client_id)
            .await
            .map_err(|source| {
                error!(
                    "Teardown of client {} failed in cascade: {}",
                    client_id, source
                );
                TeardownError::CascadeFailure {
                    client_id: client_id.to_string(),
                    source,
                }
            })?;

        let Some(identity_id) = cascade.auth_user_id.clone() else {
            info!("Client {} removed; no linked identity", client_id);
            return Ok(Outcome::new(TeardownReport {
                client_id: client_id.to_string(),
                cascade,
                identity: IdentityCleanup::NoIdentity,
            }));
        };

        let (identity, warning) = match self.delete_identity(&identity_id).await {
            Ok(IdentityDeletion::Deleted) => (IdentityCleanup::Deleted, None),
            Ok(IdentityDeletion::NotFound) => (IdentityCleanup::AlreadyAbsent, None),
            Err(message) => {
                warn!(
                    "Client {} removed but identity {} was not: {}",
                    client_id, identity_id, message
                );
                let message = self.queue_orphan(&identity_id, client_id, &message).await;
                (
                    IdentityCleanup::Orphaned,
                    Some(DependencyFailure::new(Dependency::IdentityProvider, message)),
                )
            }
        };

        info!("Client {} torn down (identity: {:?})", client_id, identity);

        Ok(Outcome::new(TeardownReport {
            client_id: client_id.to_string(),
            cascade,
            identity,
        })
        .with_warning(warning))
    }

    /// Tear down many clients independently, collecting per-client outcomes
    pub async fn teardown_clients(&self, client_ids: &[String]) -> BulkTeardownReport {
        let mut results: Vec<(usize, ClientTeardownOutcome)> =
            stream::iter(client_ids.iter().cloned().enumerate())
                .map(|(index, client_id)| async move {
                    let outcome = match self.teardown_client(&client_id).await {
                        Ok(outcome) => ClientTeardownOutcome {
                            client_id,
                            report: Some(outcome.value),
                            warnings: outcome.warnings,
                            error: None,
                        },
                        Err(e) => ClientTeardownOutcome {
                            client_id,
                            report: None,
                            warnings: Vec::new(),
                            error: Some(e.to_string()),
                        },
                    };
                    (index, outcome)
                })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        results.sort_by_key(|(index, _)| *index);

        let mut report = BulkTeardownReport::default();
        for (_, outcome) in results {
            if outcome.succeeded() {
                report.succeeded += 1;
            } else {
                report.failed += 1;
            }
            report.outcomes.push(outcome);
        }

        info!(
            "Bulk teardown finished: {} succeeded, {} failed",
            report.succeeded, report.failed
        );
        report
    }

    /// Retry every queued identity. Entries are removed once the identity is gone.
    pub async fn retry_orphaned_identities(&self) -> TeardownResult<OrphanRetryReport> {
        let queued = {
            let mut conn = self.store.acquire().await?;
            orphans::list_orphans(&mut conn).await?
        };

        let mut report = OrphanRetryReport::default();
        for orphan in queued {
            let result = self.delete_identity(&orphan.identity_id).await;
            let mut conn = self.store.acquire().await?;
            match result {
                Ok(_) => {
                    orphans::remove_orphan(&mut conn, &orphan.identity_id).await?;
                    info!("Orphaned identity {} removed", orphan.identity_id);
                    report.resolved.push(orphan.identity_id);
                }
                Err(message) => {
                    orphans::record_orphan_failure(&mut conn, &orphan.identity_id, &message)
                        .await?;
                    warn!(
                        "Orphaned identity {} still present after {} attempts: {}",
                        orphan.identity_id,
                        orphan.attempts + 1,
                        message
                    );
                    report.still_orphaned.push(orphan.identity_id);
                }
            }
        }

        Ok(report)
    }

    /// Phase 2 for one identity, bounded by the call timeout
    async fn delete_identity(&self, identity_id: &str) -> Result<IdentityDeletion, String> {
        match tokio::time::timeout(self.call_timeout, self.identity.delete_identity(identity_id))
            .await
        {
            Ok(Ok(deletion)) => Ok(deletion),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!(
                "timed out after {}ms",
                self.call_timeout.as_millis()
            )),
        }
    }

    /// Record the identity for out-of-band cleanup. Returns the warning message to report.
    async fn queue_orphan(&self, identity_id: &str, client_id: &str, message: &str) -> String {
        let queued = async {
            let mut conn = self.store.acquire().await?;
            orphans::enqueue_orphan(&mut conn, identity_id, client_id, message).await
        }
        .await;

        match queued {
            Ok(()) => format!("identity {} queued for retry: {}", identity_id, message),
            Err(e) => {
                error!("Could not queue orphaned identity {}: {}", identity_id, e);
                format!(
                    "identity {} not removed and not queued ({}): {}",
                    identity_id, e, message
                )
            }
        }
    }
}
