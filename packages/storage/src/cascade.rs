// ABOUTME: Atomic removal of a client and every record that depends on it
// ABOUTME: Returns the linked identity so the caller can remove it from the identity provider

use serde::{Deserialize, Serialize};
use sqlx::{Sqlite, Transaction};
use tracing::{debug, info};

use crate::{DeliverableStore, StorageError, StorageResult};

/// Rows removed by one client cascade
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeSummary {
    pub client_id: String,
    /// Identity provider account linked to the client, if any
    pub auth_user_id: Option<String>,
    pub deliveries: u64,
    pub delivery_versions: u64,
    pub revision_requests: u64,
    pub progress_records: u64,
    pub history_entries: u64,
    pub messages: u64,
    pub files: u64,
}

impl DeliverableStore {
    /// Delete a client and all dependents in one transaction. Nothing is removed on error.
    pub async fn delete_client_cascade(&self, client_id: &str) -> StorageResult<CascadeSummary> {
        let mut tx = self.begin().await?;
        let summary = delete_client_cascade_in(&mut tx, client_id).await?;
        tx.commit().await?;

        info!(
            "Deleted client {} ({} deliveries, {} revision requests)",
            client_id, summary.deliveries, summary.revision_requests
        );
        Ok(summary)
    }
}

async fn delete_client_cascade_in(
    tx: &mut Transaction<'static, Sqlite>,
    client_id: &str,
) -> StorageResult<CascadeSummary> {
    let auth_user_id: Option<String> =
        sqlx::query_scalar::<_, Option<String>>("SELECT auth_user_id FROM clients WHERE id = ?")
            .bind(client_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| StorageError::not_found("client", client_id))?;

    debug!("Cascading delete for client: {}", client_id);

    // Children first, so the counts do not depend on foreign key enforcement
    let delivery_versions = sqlx::query(
        "DELETE FROM delivery_versions WHERE delivery_id IN (SELECT id FROM deliveries WHERE client_id = ?)",
    )
    .bind(client_id)
    .execute(&mut **tx)
    .await?
    .rows_affected();

    let revision_requests =
        delete_by_client(tx, "DELETE FROM revision_requests WHERE client_id = ?", client_id).await?;
    let deliveries =
        delete_by_client(tx, "DELETE FROM deliveries WHERE client_id = ?", client_id).await?;
    let progress_records =
        delete_by_client(tx, "DELETE FROM progress_records WHERE client_id = ?", client_id).await?;
    let history_entries =
        delete_by_client(tx, "DELETE FROM client_history WHERE client_id = ?", client_id).await?;
    let messages =
        delete_by_client(tx, "DELETE FROM client_messages WHERE client_id = ?", client_id).await?;
    let files =
        delete_by_client(tx, "DELETE FROM client_files WHERE client_id = ?", client_id).await?;

    let removed = sqlx::query("DELETE FROM clients WHERE id = ?")
        .bind(client_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    if removed == 0 {
        return Err(StorageError::Database(format!(
            "client {} vanished during cascade",
            client_id
        )));
    }

    Ok(CascadeSummary {
        client_id: client_id.to_string(),
        auth_user_id: auth_user_id.filter(|id| !id.trim().is_empty()),
        deliveries,
        delivery_versions,
        revision_requests,
        progress_records,
        history_entries,
        messages,
        files,
    })
}

async fn delete_by_client(
    tx: &mut Transaction<'static, Sqlite>,
    statement: &'static str,
    client_id: &str,
) -> StorageResult<u64> {
    Ok(sqlx::query(statement)
        .bind(client_id)
        .execute(&mut **tx)
        .await?
        .rows_affected())
}
