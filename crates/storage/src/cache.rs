//! File-backed last-known-good snapshot cache.
//!
//! One JSON file per source kind, overwritten on every successful cycle.
//! Writes go to a temporary sibling and are renamed into place, so a reader
//! sees either the previous snapshot or the new one, never a torn file.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use forecast_common::{CanonicalRecord, SourceKind};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::error::{StorageError, StorageResult};

/// The stored snapshot for one source kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub kind: SourceKind,
    pub stored_at: DateTime<Utc>,
    pub record: CanonicalRecord,
}

impl CacheEntry {
    /// Time elapsed since the entry was stored.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now - self.stored_at
    }
}

/// Snapshot cache rooted at a directory.
///
/// Each kind has its own lock, so writers of different kinds never contend
/// while overlapping cycles of the same kind are serialized.
#[derive(Debug)]
pub struct SnapshotCache {
    dir: PathBuf,
    short_range: Mutex<()>,
    seasonal: Mutex<()>,
}

impl SnapshotCache {
    /// Create a cache rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            short_range: Mutex::new(()),
            seasonal: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the snapshot file for `kind`.
    pub fn path_for(&self, kind: SourceKind) -> PathBuf {
        self.dir.join(kind.cache_file_name())
    }

    fn lock_for(&self, kind: SourceKind) -> &Mutex<()> {
        match kind {
            SourceKind::ShortRange => &self.short_range,
            SourceKind::Seasonal => &self.seasonal,
        }
    }

    /// Overwrite the snapshot for the record's kind, stamped now.
    #[instrument(skip(self, record), fields(kind = %record.kind()))]
    pub async fn write(&self, record: &CanonicalRecord) -> StorageResult<CacheEntry> {
        let kind = record.kind();
        let entry = CacheEntry {
            kind,
            stored_at: Utc::now(),
            record: record.clone(),
        };
        let json = serde_json::to_vec_pretty(&entry)?;

        let path = self.path_for(kind);
        let tmp = path.with_extension("json.tmp");

        let _guard = self.lock_for(kind).lock().await;

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(StorageError::io(&self.dir))?;
        tokio::fs::write(&tmp, &json).await.map_err(StorageError::io(&tmp))?;
        tokio::fs::rename(&tmp, &path).await.map_err(StorageError::io(&path))?;

        debug!(path = %path.display(), bytes = json.len(), "Wrote snapshot");
        Ok(entry)
    }

    /// Read the snapshot for `kind`. `Ok(None)` when none was ever written.
    #[instrument(skip(self))]
    pub async fn read(&self, kind: SourceKind) -> StorageResult<Option<CacheEntry>> {
        let path = self.path_for(kind);

        let bytes = {
            let _guard = self.lock_for(kind).lock().await;
            match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!(path = %path.display(), "No snapshot yet");
                    return Ok(None);
                }
                Err(e) => return Err(StorageError::Io { path, source: e }),
            }
        };

        let entry: CacheEntry = serde_json::from_slice(&bytes).map_err(|e| StorageError::Corrupt {
            path: path.clone(),
            message: e.to_string(),
        })?;

        for found in [entry.kind, entry.record.kind()] {
            if found != kind {
                return Err(StorageError::KindMismatch {
                    path,
                    expected: kind,
                    found,
                });
            }
        }

        Ok(Some(entry))
    }
}
