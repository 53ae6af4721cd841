// ABOUTME: Client directory used by staff tooling
// ABOUTME: Client creation, lookup, history, and bulk status changes with per-client outcomes

use engage_core::{validate_client_input, Client, ClientCreateInput, ClientStatus};
use engage_storage::clients::{self, HistoryEntry};
use engage_storage::{DeliverableStore, StorageError};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::DeliveryResult;

/// Per-client result of a bulk status change
#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkStatusReport {
    pub updated: Vec<String>,
    pub failed: Vec<BulkFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub client_id: String,
    pub error: String,
}

#[derive(Clone)]
pub struct ClientDirectory {
    store: DeliverableStore,
}

impl ClientDirectory {
    pub fn new(store: DeliverableStore) -> Self {
        Self { store }
    }

    pub async fn create_client(&self, input: ClientCreateInput) -> DeliveryResult<Client> {
        validate_client_input(&input)?;

        let mut tx = self.store.begin().await?;
        let client = clients::create_client(&mut tx, &input).await?;
        clients::append_history(&mut tx, &client.id, "client_created", None).await?;
        tx.commit().await.map_err(StorageError::from)?;

        info!("Created client {} ({})", client.id, client.display_name);
        Ok(client)
    }

    pub async fn get_client(&self, client_id: &str) -> DeliveryResult<Client> {
        let mut conn = self.store.acquire().await?;
        Ok(clients::get_client(&mut conn, client_id).await?)
    }

    pub async fn list_clients(&self) -> DeliveryResult<Vec<Client>> {
        let mut conn = self.store.acquire().await?;
        Ok(clients::list_clients(&mut conn).await?)
    }

    pub async fn history(&self, client_id: &str) -> DeliveryResult<Vec<HistoryEntry>> {
        let mut conn = self.store.acquire().await?;
        Ok(clients::list_history(&mut conn, client_id).await?)
    }

    /// Set the lifecycle status of many clients. Each client is updated independently and
    /// failures are collected rather than stopping the batch.
    pub async fn bulk_update_status(
        &self,
        client_ids: &[String],
        status: ClientStatus,
    ) -> BulkStatusReport {
        let mut report = BulkStatusReport::default();

        for client_id in client_ids {
            match self.update_status(client_id, status).await {
                Ok(()) => report.updated.push(client_id.clone()),
                Err(e) => {
                    warn!("Status update failed for client {}: {}", client_id, e);
                    report.failed.push(BulkFailure {
                        client_id: client_id.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        report
    }

    async fn update_status(&self, client_id: &str, status: ClientStatus) -> DeliveryResult<()> {
        let mut tx = self.store.begin().await?;
        clients::set_client_status(&mut tx, client_id, status).await?;
        clients::append_history(&mut tx, client_id, "status_changed", Some(status.as_str()))
            .await?;
        tx.commit().await.map_err(StorageError::from)?;
        Ok(())
    }
}
