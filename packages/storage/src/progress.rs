// ABOUTME: Staff-visible mirror of each client's reconciled progress cursor
// ABOUTME: Written on every reconciliation, never read back as the server view

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::StorageResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProgressRecord {
    pub client_id: String,
    pub intake: bool,
    pub resume_upload: bool,
    pub session_booking: bool,
    pub production: bool,
    pub review_delivery: bool,
    pub current_step: i64,
    pub updated_at: DateTime<Utc>,
}

impl ProgressRecord {
    pub fn steps(&self) -> [bool; 5] {
        [
            self.intake,
            self.resume_upload,
            self.session_booking,
            self.production,
            self.review_delivery,
        ]
    }
}

/// Insert or widen the mirror. Flags only ever move from false to true, and the cursor
/// is recomputed from the combined flags.
pub async fn upsert_progress(
    conn: &mut SqliteConnection,
    client_id: &str,
    steps: [bool; 5],
    current_step: i64,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO progress_records (
            client_id, intake, resume_upload, session_booking, production,
            review_delivery, current_step, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(client_id) DO UPDATE SET
            intake = progress_records.intake OR excluded.intake,
            resume_upload = progress_records.resume_upload OR excluded.resume_upload,
            session_booking = progress_records.session_booking OR excluded.session_booking,
            production = progress_records.production OR excluded.production,
            review_delivery = progress_records.review_delivery OR excluded.review_delivery,
            current_step = MIN(
                5,
                1 + (progress_records.intake OR excluded.intake)
                  + (progress_records.resume_upload OR excluded.resume_upload)
                  + (progress_records.session_booking OR excluded.session_booking)
                  + (progress_records.production OR excluded.production)
                  + (progress_records.review_delivery OR excluded.review_delivery)
            ),
            updated_at = excluded.updated_at
        "#,
    )
    .bind(client_id)
    .bind(steps[0])
    .bind(steps[1])
    .bind(steps[2])
    .bind(steps[3])
    .bind(steps[4])
    .bind(current_step)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn get_progress(
    conn: &mut SqliteConnection,
    client_id: &str,
) -> StorageResult<Option<ProgressRecord>> {
    let record = sqlx::query_as::<_, ProgressRecord>(
        "SELECT * FROM progress_records WHERE client_id = ?",
    )
    .bind(client_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(record)
}
