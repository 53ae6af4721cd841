// ABOUTME: Client storage functions
// ABOUTME: Client records, forward-only milestone flags, and the per-client history log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use engage_core::{generate_id, Client, ClientCreateInput, ClientStatus, Milestone, PaymentStatus};

use crate::{StorageError, StorageResult};

/// One entry of a client's activity log
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct HistoryEntry {
    pub id: String,
    pub client_id: String,
    pub event_type: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub async fn create_client(
    conn: &mut SqliteConnection,
    input: &ClientCreateInput,
) -> StorageResult<Client> {
    let client_id = generate_id("client");
    let now = Utc::now();

    debug!("Creating client: {}", client_id);

    sqlx::query(
        r#"
        INSERT INTO clients (
            id, display_name, email, service_tier_id, is_rush, rush_deadline,
            estimated_delivery, status, payment_status, auth_user_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&client_id)
    .bind(input.display_name.trim())
    .bind(input.email.trim())
    .bind(&input.service_tier_id)
    .bind(input.is_rush)
    .bind(input.rush_deadline)
    .bind(input.estimated_delivery)
    .bind(ClientStatus::Onboarding)
    .bind(PaymentStatus::Pending)
    .bind(&input.auth_user_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    get_client(conn, &client_id).await
}

pub async fn get_client(conn: &mut SqliteConnection, client_id: &str) -> StorageResult<Client> {
    debug!("Fetching client: {}", client_id);

    let row = sqlx::query("SELECT * FROM clients WHERE id = ?")
        .bind(client_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StorageError::not_found("client", client_id))?;

    row_to_client(&row)
}

pub async fn list_clients(conn: &mut SqliteConnection) -> StorageResult<Vec<Client>> {
    let rows = sqlx::query("SELECT * FROM clients ORDER BY created_at DESC")
        .fetch_all(&mut *conn)
        .await?;

    rows.iter().map(row_to_client).collect()
}

pub async fn set_client_status(
    conn: &mut SqliteConnection,
    client_id: &str,
    status: ClientStatus,
) -> StorageResult<()> {
    let result = sqlx::query("UPDATE clients SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now())
        .bind(client_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("client", client_id));
    }
    Ok(())
}

/// Set a milestone flag. Flags only ever move from false to true.
pub async fn confirm_milestone(
    conn: &mut SqliteConnection,
    client_id: &str,
    milestone: Milestone,
) -> StorageResult<Client> {
    debug!("Confirming milestone {:?} for client: {}", milestone, client_id);

    // Pre-written statements keep column names out of string formatting
    let statement = match milestone {
        Milestone::IntakeSubmitted => {
            "UPDATE clients SET intake_submitted = 1, updated_at = ? WHERE id = ?"
        }
        Milestone::ResumeUploaded => {
            "UPDATE clients SET resume_uploaded = 1, updated_at = ? WHERE id = ?"
        }
        Milestone::SessionBooked => {
            "UPDATE clients SET session_booked = 1, updated_at = ? WHERE id = ?"
        }
    };

    let result = sqlx::query(statement)
        .bind(Utc::now())
        .bind(client_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(StorageError::not_found("client", client_id));
    }

    get_client(conn, client_id).await
}

/// Milestone flags for steps 1-3, in step order
pub async fn get_milestones(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> StorageResult<[bool; 3]> {
    let row = sqlx::query(
        "SELECT intake_submitted, resume_uploaded, session_booked FROM clients WHERE id = ?",
    )
    .bind(client_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| StorageError::not_found("client", client_id))?;

    Ok([
        row.try_get("intake_submitted")?,
        row.try_get("resume_uploaded")?,
        row.try_get("session_booked")?,
    ])
}

pub async fn append_history(
    conn: &mut SqliteConnection,
    client_id: &str,
    event_type: &str,
    detail: Option<&str>,
) -> StorageResult<()> {
    sqlx::query(
        "INSERT INTO client_history (id, client_id, event_type, detail, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(generate_id("hist"))
    .bind(client_id)
    .bind(event_type)
    .bind(detail)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn list_history(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> StorageResult<Vec<HistoryEntry>> {
    let entries = sqlx::query_as::<_, HistoryEntry>(
        "SELECT * FROM client_history WHERE client_id = ? ORDER BY created_at, rowid",
    )
    .bind(client_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(entries)
}

fn row_to_client(row: &SqliteRow) -> StorageResult<Client> {
    Ok(Client {
        id: row.try_get("id")?,
        display_name: row.try_get("display_name")?,
        email: row.try_get("email")?,
        service_tier_id: row.try_get("service_tier_id")?,
        is_rush: row.try_get("is_rush")?,
        rush_deadline: row.try_get("rush_deadline")?,
        estimated_delivery: row.try_get("estimated_delivery")?,
        intake_submitted: row.try_get("intake_submitted")?,
        resume_uploaded: row.try_get("resume_uploaded")?,
        session_booked: row.try_get("session_booked")?,
        status: row.try_get("status")?,
        payment_status: row.try_get("payment_status")?,
        auth_user_id: row.try_get("auth_user_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
