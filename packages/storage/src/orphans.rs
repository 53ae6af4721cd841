// ABOUTME: Queue of identity provider accounts left behind by a client teardown
// ABOUTME: Entries are removed once the identity is gone and bumped on each failed retry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;
use tracing::warn;

use crate::StorageResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrphanedIdentity {
    pub identity_id: String,
    pub client_id: String,
    pub last_error: String,
    pub attempts: i64,
    pub created_at: DateTime<Utc>,
    pub last_attempt_at: DateTime<Utc>,
}

/// Record a failed identity removal. Re-enqueueing an existing identity counts as another attempt.
pub async fn enqueue_orphan(
    conn: &mut SqliteConnection,
    identity_id: &str,
    client_id: &str,
    error: &str,
) -> StorageResult<()> {
    let now = Utc::now();

    warn!(
        "Queueing orphaned identity {} of deleted client {}",
        identity_id, client_id
    );

    sqlx::query(
        r#"
        INSERT INTO orphaned_identities (
            identity_id, client_id, last_error, attempts, created_at, last_attempt_at
        ) VALUES (?, ?, ?, 1, ?, ?)
        ON CONFLICT(identity_id) DO UPDATE SET
            last_error = excluded.last_error,
            attempts = orphaned_identities.attempts + 1,
            last_attempt_at = excluded.last_attempt_at
        "#,
    )
    .bind(identity_id)
    .bind(client_id)
    .bind(error)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Oldest first
pub async fn list_orphans(conn: &mut SqliteConnection) -> StorageResult<Vec<OrphanedIdentity>> {
    let orphans = sqlx::query_as::<_, OrphanedIdentity>(
        "SELECT * FROM orphaned_identities ORDER BY created_at, rowid",
    )
    .fetch_all(&mut *conn)
    .await?;

    Ok(orphans)
}

pub async fn remove_orphan(conn: &mut SqliteConnection, identity_id: &str) -> StorageResult<bool> {
    let result = sqlx::query("DELETE FROM orphaned_identities WHERE identity_id = ?")
        .bind(identity_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn record_orphan_failure(
    conn: &mut SqliteConnection,
    identity_id: &str,
    error: &str,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        UPDATE orphaned_identities
        SET attempts = attempts + 1, last_error = ?, last_attempt_at = ?
        WHERE identity_id = ?
        "#,
    )
    .bind(error)
    .bind(Utc::now())
    .bind(identity_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}
