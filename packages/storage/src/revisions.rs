// ABOUTME: Revision request storage functions
// ABOUTME: Open-revision uniqueness is enforced by a partial index and surfaced as a conflict

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use engage_core::{generate_id, RevisionRequest, RevisionRequestInput, RevisionStatus};

use crate::{json_list, StorageError, StorageResult};

pub async fn insert_revision(
    conn: &mut SqliteConnection,
    delivery_id: &str,
    client_id: &str,
    input: &RevisionRequestInput,
    due_date: DateTime<Utc>,
) -> StorageResult<RevisionRequest> {
    let revision_id = generate_id("rev");
    let now = Utc::now();

    debug!(
        "Creating revision request: {} for delivery: {}",
        revision_id, delivery_id
    );

    let reasons = serde_json::to_string(&input.reasons)?;
    let attachments = serde_json::to_string(&input.attachments)?;
    let custom_reason = input
        .custom_reason
        .as_deref()
        .map(str::trim)
        .filter(|reason| !reason.is_empty());

    let result = sqlx::query(
        r#"
        INSERT INTO revision_requests (
            id, delivery_id, client_id, reasons, custom_reason, description,
            attachments, status, due_date, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&revision_id)
    .bind(delivery_id)
    .bind(client_id)
    .bind(&reasons)
    .bind(custom_reason)
    .bind(input.description.trim())
    .bind(&attachments)
    .bind(RevisionStatus::Pending)
    .bind(due_date)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await;

    match result {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(StorageError::conflict(
                "delivery",
                delivery_id,
                "no open revision",
                "an open revision",
            ));
        }
        Err(e) => return Err(e.into()),
    }

    get_revision(conn, &revision_id).await
}

pub async fn get_revision(
    conn: &mut SqliteConnection,
    revision_id: &str,
) -> StorageResult<RevisionRequest> {
    let row = sqlx::query("SELECT * FROM revision_requests WHERE id = ?")
        .bind(revision_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StorageError::not_found("revision request", revision_id))?;

    row_to_revision(&row)
}

/// Move a revision from `from` to `to`, failing with a conflict if another writer got there first
pub async fn update_revision_status(
    conn: &mut SqliteConnection,
    revision_id: &str,
    from: RevisionStatus,
    to: RevisionStatus,
) -> StorageResult<RevisionRequest> {
    let now = Utc::now();
    let completed_at = (to == RevisionStatus::Completed).then_some(now);

    let result = sqlx::query(
        r#"
        UPDATE revision_requests
        SET status = ?, completed_at = COALESCE(?, completed_at), updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(to)
    .bind(completed_at)
    .bind(now)
    .bind(revision_id)
    .bind(from)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let actual = sqlx::query_scalar::<_, RevisionStatus>(
            "SELECT status FROM revision_requests WHERE id = ?",
        )
        .bind(revision_id)
        .fetch_optional(&mut *conn)
        .await?;

        return Err(match actual {
            None => StorageError::not_found("revision request", revision_id),
            Some(actual) => StorageError::conflict("revision request", revision_id, from, actual),
        });
    }

    get_revision(conn, revision_id).await
}

/// The single open (pending or in-progress) revision for a delivery, if any
pub async fn open_revision_for_delivery(
    conn: &mut SqliteConnection,
    delivery_id: &str,
) -> StorageResult<Option<RevisionRequest>> {
    let row = sqlx::query(
        "SELECT * FROM revision_requests WHERE delivery_id = ? AND status != ?",
    )
    .bind(delivery_id)
    .bind(RevisionStatus::Completed)
    .fetch_optional(&mut *conn)
    .await?;

    row.as_ref().map(row_to_revision).transpose()
}

pub async fn list_revisions_for_delivery(
    conn: &mut SqliteConnection,
    delivery_id: &str,
) -> StorageResult<Vec<RevisionRequest>> {
    let rows = sqlx::query(
        "SELECT * FROM revision_requests WHERE delivery_id = ? ORDER BY created_at, rowid",
    )
    .bind(delivery_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(row_to_revision).collect()
}

/// Open revisions for a client, soonest due first
pub async fn list_open_revisions_for_client(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> StorageResult<Vec<RevisionRequest>> {
    let rows = sqlx::query(
        r#"
        SELECT * FROM revision_requests
        WHERE client_id = ? AND status != ?
        ORDER BY due_date, rowid
        "#,
    )
    .bind(client_id)
    .bind(RevisionStatus::Completed)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(row_to_revision).collect()
}

fn row_to_revision(row: &SqliteRow) -> StorageResult<RevisionRequest> {
    let reasons: String = row.try_get("reasons")?;
    let attachments: String = row.try_get("attachments")?;

    Ok(RevisionRequest {
        id: row.try_get("id")?,
        delivery_id: row.try_get("delivery_id")?,
        client_id: row.try_get("client_id")?,
        reasons: json_list(&reasons)?,
        custom_reason: row.try_get("custom_reason")?,
        description: row.try_get("description")?,
        attachments: json_list(&attachments)?,
        status: row.try_get("status")?,
        due_date: row.try_get("due_date")?,
        completed_at: row.try_get("completed_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
