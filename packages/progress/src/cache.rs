// ABOUTME: Client-local progress cache abstraction
// ABOUTME: In-memory and file-backed implementations with read-merge-write updates

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::snapshot::ProgressSnapshot;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt cache entry: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Advisory per-identity progress store held by the client runtime
#[async_trait]
pub trait LocalProgressCache: Send + Sync {
    async fn get(&self, key: &str) -> CacheResult<Option<ProgressSnapshot>>;

    /// Overwrite the stored snapshot
    async fn set(&self, key: &str, snapshot: ProgressSnapshot) -> CacheResult<()>;

    /// OR `update` into the stored snapshot and return the result. Implementations must make
    /// this a single read-merge-write so concurrent writers cannot drop each other's flags.
    async fn merge(&self, key: &str, update: ProgressSnapshot) -> CacheResult<ProgressSnapshot>;
}

#[derive(Debug, Default)]
pub struct InMemoryProgressCache {
    entries: RwLock<HashMap<String, ProgressSnapshot>>,
}

impl InMemoryProgressCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocalProgressCache for InMemoryProgressCache {
    async fn get(&self, key: &str) -> CacheResult<Option<ProgressSnapshot>> {
        Ok(self.entries.read().await.get(key).copied())
    }

    async fn set(&self, key: &str, snapshot: ProgressSnapshot) -> CacheResult<()> {
        self.entries.write().await.insert(key.to_string(), snapshot);
        Ok(())
    }

    async fn merge(&self, key: &str, update: ProgressSnapshot) -> CacheResult<ProgressSnapshot> {
        let mut entries = self.entries.write().await;
        let merged = entries.get(key).copied().unwrap_or_default().merge(&update);
        entries.insert(key.to_string(), merged);
        Ok(merged)
    }
}

/// One JSON document per identity under a directory
#[derive(Debug)]
pub struct FileProgressCache {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl FileProgressCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> CacheResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(CacheError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }

    async fn read_entry(&self, path: &Path) -> CacheResult<Option<ProgressSnapshot>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write through a temp file and rename so readers never see a partial document
    async fn write_entry(&self, path: &Path, snapshot: &ProgressSnapshot) -> CacheResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serde_json::to_vec_pretty(snapshot)?).await?;
        tokio::fs::rename(&tmp_path, path).await?;
        debug!("Wrote progress cache entry: {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl LocalProgressCache for FileProgressCache {
    async fn get(&self, key: &str) -> CacheResult<Option<ProgressSnapshot>> {
        let path = self.entry_path(key)?;
        self.read_entry(&path).await
    }

    async fn set(&self, key: &str, snapshot: ProgressSnapshot) -> CacheResult<()> {
        let path = self.entry_path(key)?;
        let _guard = self.write_lock.lock().await;
        self.write_entry(&path, &snapshot).await
    }

    async fn merge(&self, key: &str, update: ProgressSnapshot) -> CacheResult<ProgressSnapshot> {
        let path = self.entry_path(key)?;
        let _guard = self.write_lock.lock().await;

        let current = self.read_entry(&path).await?.unwrap_or_default();
        let merged = current.merge(&update);
        if merged != current {
            self.write_entry(&path, &merged).await?;
        }
        Ok(merged)
    }
}
