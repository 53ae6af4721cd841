// ABOUTME: Deliverable store backed by SQLite
// ABOUTME: Connection setup, migrations, and transactional query functions for every entity

use std::str::FromStr;
use std::time::Duration;

use engage_config::StorageSettings;
use sqlx::migrate::MigrateDatabase;
use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use thiserror::Error;
use tracing::{debug, info};

pub mod cascade;
pub mod clients;
pub mod deliveries;
pub mod orphans;
pub mod progress;
pub mod revisions;

pub use cascade::CascadeSummary;
pub use orphans::OrphanedIdentity;
pub use progress::ProgressRecord;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
    /// A status-guarded write found the record in a different state
    #[error("{entity} {id} is {actual}, expected {expected}")]
    Conflict {
        entity: &'static str,
        id: String,
        expected: String,
        actual: String,
    },
}

pub type StorageResult<T> = Result<T, StorageError>;

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StorageError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn conflict(
        entity: &'static str,
        id: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        StorageError::Conflict {
            entity,
            id: id.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict { .. })
    }
}

/// Shared handle to the deliverable store
#[derive(Clone)]
pub struct DeliverableStore {
    pool: SqlitePool,
}

impl DeliverableStore {
    /// Wrap an existing pool. Migrations are not run.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) the database file and run migrations
    pub async fn open(settings: &StorageSettings) -> StorageResult<Self> {
        let database_path = &settings.database_path;

        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let database_url = format!("sqlite:{}", database_path.display());

        if !Sqlite::database_exists(&database_url).await? {
            debug!("Creating database at: {}", database_url);
            Sqlite::create_database(&database_url).await?;
        }

        let options = SqliteConnectOptions::from_str(&database_url)?
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(settings.busy_timeout_seconds));

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(Duration::from_secs(settings.busy_timeout_seconds))
            .connect_with(options)
            .await?;

        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;

        info!("Database connection established");

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// In-memory store with migrations applied. A single connection keeps every
    /// query on the same database.
    pub async fn in_memory() -> StorageResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        debug!("Database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a transaction. Every state transition runs inside one.
    pub async fn begin(&self) -> StorageResult<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Borrow a pooled connection for reads outside a transaction
    pub async fn acquire(&self) -> StorageResult<PoolConnection<Sqlite>> {
        Ok(self.pool.acquire().await?)
    }
}

/// Decode a JSON text column into a list
pub(crate) fn json_list<T: serde::de::DeserializeOwned>(raw: &str) -> StorageResult<Vec<T>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_creates_database_file() {
        let temp_dir = TempDir::new().unwrap();
        let settings = StorageSettings {
            database_path: temp_dir.path().join("nested").join("engage.db"),
            max_connections: 2,
            busy_timeout_seconds: 5,
        };

        let store = DeliverableStore::open(&settings).await.unwrap();
        assert!(settings.database_path.exists());

        // Migrations are idempotent
        store.migrate().await.unwrap();

        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('clients', 'deliveries', 'revision_requests', 'orphaned_identities')",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(tables, 4);
    }

    #[test]
    fn test_conflict_message() {
        let err = StorageError::conflict("delivery", "dlv-1", "delivered", "approved");
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "delivery dlv-1 is approved, expected delivered");
    }
}
