//! Publish sinks: where canonical records go for downstream consumers.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use forecast_common::CanonicalRecord;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{StorageError, StorageResult};

/// Key-value document store the orchestrator publishes to.
///
/// Delivery is at-least-once: the same record may be put more than once.
#[async_trait]
pub trait PublishSink: Send + Sync {
    /// Store `record` under `key`, replacing any previous document.
    async fn put(&self, key: &str, record: &CanonicalRecord) -> StorageResult<()>;

    /// Short name for logs.
    fn name(&self) -> &'static str;
}

/// Writes each document to `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

#[async_trait]
impl PublishSink for DirectorySink {
    async fn put(&self, key: &str, record: &CanonicalRecord) -> StorageResult<()> {
        let json = serde_json::to_vec_pretty(&record.to_document()?)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(StorageError::io(&self.dir))?;
        tokio::fs::write(&tmp, &json).await.map_err(StorageError::io(&tmp))?;
        tokio::fs::rename(&tmp, &path).await.map_err(StorageError::io(&path))?;

        debug!(key = %key, path = %path.display(), "Published document");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "directory"
    }
}

/// In-memory sink that records every put. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    published: Mutex<Vec<(String, CanonicalRecord)>>,
    rejecting: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent puts fail until switched back.
    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    /// Every accepted put, oldest first.
    pub async fn published(&self) -> Vec<(String, CanonicalRecord)> {
        self.published.lock().await.clone()
    }

    /// Most recent record put under `key`.
    pub async fn latest(&self, key: &str) -> Option<CanonicalRecord> {
        self.published
            .lock()
            .await
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, r)| r.clone())
    }

    pub async fn put_count(&self) -> usize {
        self.published.lock().await.len()
    }
}

#[async_trait]
impl PublishSink for MemorySink {
    async fn put(&self, key: &str, record: &CanonicalRecord) -> StorageResult<()> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected {
                key: key.to_string(),
                message: "sink is rejecting writes".to_string(),
            });
        }
        self.published.lock().await.push((key.to_string(), record.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
