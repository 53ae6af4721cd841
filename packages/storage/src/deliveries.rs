// ABOUTME: Delivery storage functions
// ABOUTME: Status-guarded writes detect concurrent transitions instead of overwriting them

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteQueryResult, SqliteRow};
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use engage_core::{
    generate_id, Delivery, DeliveryCreateInput, DeliveryStatus, DeliveryVersion, VersioningScope,
};

use crate::{StorageError, StorageResult};

/// New content written onto a delivery when a revision is fulfilled
#[derive(Debug, Clone)]
pub struct FulfillmentWrite<'a> {
    pub title: &'a str,
    pub file_url: &'a str,
    pub file_size: i64,
    pub document_type: Option<&'a str>,
    pub revision_request_id: &'a str,
}

pub async fn insert_delivery(
    conn: &mut SqliteConnection,
    input: &DeliveryCreateInput,
) -> StorageResult<Delivery> {
    let delivery_id = generate_id("dlv");
    let now = Utc::now();

    debug!(
        "Creating delivery: {} for client: {}",
        delivery_id, input.client_id
    );

    sqlx::query(
        r#"
        INSERT INTO deliveries (
            id, client_id, title, document_type, file_url, file_size,
            status, current_version, delivered_at, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?, ?)
        "#,
    )
    .bind(&delivery_id)
    .bind(&input.client_id)
    .bind(input.title.trim())
    .bind(input.document_type.trim())
    .bind(&input.file_url)
    .bind(input.file_size)
    .bind(DeliveryStatus::Delivered)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    insert_version(
        conn,
        &delivery_id,
        1,
        input.title.trim(),
        &input.file_url,
        input.file_size,
        None,
        now,
    )
    .await?;

    get_delivery(conn, &delivery_id).await
}

pub async fn get_delivery(conn: &mut SqliteConnection, delivery_id: &str) -> StorageResult<Delivery> {
    debug!("Fetching delivery: {}", delivery_id);

    let row = sqlx::query("SELECT * FROM deliveries WHERE id = ?")
        .bind(delivery_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StorageError::not_found("delivery", delivery_id))?;

    row_to_delivery(&row)
}

pub async fn list_deliveries_for_client(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> StorageResult<Vec<Delivery>> {
    let rows = sqlx::query(
        "SELECT * FROM deliveries WHERE client_id = ? ORDER BY delivered_at DESC, rowid DESC",
    )
    .bind(client_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.iter().map(row_to_delivery).collect()
}

/// Titles of every delivery in scope except `exclude_id`
pub async fn list_titles_in_scope(
    conn: &mut SqliteConnection,
    scope: VersioningScope,
    client_id: &str,
    exclude_id: &str,
) -> StorageResult<Vec<String>> {
    let titles = match scope {
        VersioningScope::Global => {
            sqlx::query_scalar::<_, String>("SELECT title FROM deliveries WHERE id != ?")
                .bind(exclude_id)
                .fetch_all(&mut *conn)
                .await?
        }
        VersioningScope::Client => {
            sqlx::query_scalar::<_, String>(
                "SELECT title FROM deliveries WHERE client_id = ? AND id != ?",
            )
            .bind(client_id)
            .bind(exclude_id)
            .fetch_all(&mut *conn)
            .await?
        }
    };

    Ok(titles)
}

pub async fn delivery_status(
    conn: &mut SqliteConnection,
    delivery_id: &str,
) -> StorageResult<Option<DeliveryStatus>> {
    let status = sqlx::query_scalar::<_, DeliveryStatus>("SELECT status FROM deliveries WHERE id = ?")
        .bind(delivery_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(status)
}

/// delivered -> revision_requested
pub async fn mark_revision_requested(
    conn: &mut SqliteConnection,
    delivery_id: &str,
) -> StorageResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE deliveries
        SET status = ?, updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(DeliveryStatus::RevisionRequested)
    .bind(Utc::now())
    .bind(delivery_id)
    .bind(DeliveryStatus::Delivered)
    .execute(&mut *conn)
    .await?;

    ensure_transitioned(conn, delivery_id, DeliveryStatus::Delivered, result).await
}

/// delivered -> approved, stamping `approved_at`
pub async fn approve_delivery(
    conn: &mut SqliteConnection,
    delivery_id: &str,
    approved_at: DateTime<Utc>,
) -> StorageResult<Delivery> {
    let result = sqlx::query(
        r#"
        UPDATE deliveries
        SET status = ?, approved_at = ?, updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(DeliveryStatus::Approved)
    .bind(approved_at)
    .bind(approved_at)
    .bind(delivery_id)
    .bind(DeliveryStatus::Delivered)
    .execute(&mut *conn)
    .await?;

    ensure_transitioned(conn, delivery_id, DeliveryStatus::Delivered, result).await?;
    get_delivery(conn, delivery_id).await
}

/// revision_requested -> delivered, overwriting content in place and appending a version
pub async fn apply_fulfillment(
    conn: &mut SqliteConnection,
    delivery_id: &str,
    write: &FulfillmentWrite<'_>,
) -> StorageResult<Delivery> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE deliveries
        SET title = ?,
            file_url = ?,
            file_size = ?,
            document_type = COALESCE(?, document_type),
            status = ?,
            current_version = current_version + 1,
            delivered_at = ?,
            updated_at = ?
        WHERE id = ? AND status = ?
        "#,
    )
    .bind(write.title)
    .bind(write.file_url)
    .bind(write.file_size)
    .bind(write.document_type)
    .bind(DeliveryStatus::Delivered)
    .bind(now)
    .bind(now)
    .bind(delivery_id)
    .bind(DeliveryStatus::RevisionRequested)
    .execute(&mut *conn)
    .await?;

    ensure_transitioned(conn, delivery_id, DeliveryStatus::RevisionRequested, result).await?;

    let delivery = get_delivery(conn, delivery_id).await?;

    insert_version(
        conn,
        delivery_id,
        delivery.current_version,
        write.title,
        write.file_url,
        write.file_size,
        Some(write.revision_request_id),
        now,
    )
    .await?;

    Ok(delivery)
}

/// Deliveries of a client that are not yet approved
pub async fn count_unapproved(conn: &mut SqliteConnection, client_id: &str) -> StorageResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM deliveries WHERE client_id = ? AND status != ?",
    )
    .bind(client_id)
    .bind(DeliveryStatus::Approved)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

pub async fn list_versions(
    conn: &mut SqliteConnection,
    delivery_id: &str,
) -> StorageResult<Vec<DeliveryVersion>> {
    let versions = sqlx::query_as::<_, DeliveryVersion>(
        "SELECT * FROM delivery_versions WHERE delivery_id = ? ORDER BY version_number",
    )
    .bind(delivery_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(versions)
}

#[allow(clippy::too_many_arguments)]
async fn insert_version(
    conn: &mut SqliteConnection,
    delivery_id: &str,
    version_number: i64,
    title: &str,
    file_url: &str,
    file_size: i64,
    revision_request_id: Option<&str>,
    delivered_at: DateTime<Utc>,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO delivery_versions (
            id, delivery_id, version_number, title, file_url, file_size,
            revision_request_id, delivered_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(generate_id("ver"))
    .bind(delivery_id)
    .bind(version_number)
    .bind(title)
    .bind(file_url)
    .bind(file_size)
    .bind(revision_request_id)
    .bind(delivered_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Turn a zero-row guarded update into NotFound or Conflict
async fn ensure_transitioned(
    conn: &mut SqliteConnection,
    delivery_id: &str,
    expected: DeliveryStatus,
    result: SqliteQueryResult,
) -> StorageResult<()> {
    if result.rows_affected() > 0 {
        return Ok(());
    }

    match delivery_status(conn, delivery_id).await? {
        None => Err(StorageError::not_found("delivery", delivery_id)),
        Some(actual) => Err(StorageError::conflict(
            "delivery",
            delivery_id,
            expected,
            actual,
        )),
    }
}

fn row_to_delivery(row: &SqliteRow) -> StorageResult<Delivery> {
    Ok(Delivery {
        id: row.try_get("id")?,
        client_id: row.try_get("client_id")?,
        title: row.try_get("title")?,
        document_type: row.try_get("document_type")?,
        file_url: row.try_get("file_url")?,
        file_size: row.try_get("file_size")?,
        status: row.try_get("status")?,
        current_version: row.try_get("current_version")?,
        delivered_at: row.try_get("delivered_at")?,
        approved_at: row.try_get("approved_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
