//! Error types for the snapshot cache and publish sinks.

use std::path::PathBuf;

use forecast_common::{ForecastError, SourceKind};
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    // === Snapshot Cache ===
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt snapshot {path}: {message}")]
    Corrupt { path: PathBuf, message: String },

    #[error("Snapshot {path} holds {found} data, expected {expected}")]
    KindMismatch {
        path: PathBuf,
        expected: SourceKind,
        found: SourceKind,
    },

    #[error("Serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    // === Publish Sinks ===
    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Publish of '{key}' rejected: {message}")]
    Rejected { key: String, message: String },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StorageError::Io { path, source }
    }
}

impl From<StorageError> for ForecastError {
    fn from(e: StorageError) -> Self {
        ForecastError::Storage(e.to_string())
    }
}
