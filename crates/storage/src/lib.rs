//! Storage for forecast snapshots.
//!
//! Provides:
//! - A file-backed last-known-good cache, one snapshot per source kind
//! - Publish sinks for downstream consumers (Redis, a directory, memory)

pub mod cache;
pub mod error;
pub mod redis_sink;
pub mod sink;

pub use cache::{CacheEntry, SnapshotCache};
pub use error::{StorageError, StorageResult};
pub use redis_sink::{RedisSink, DEFAULT_KEY_PREFIX};
pub use sink::{DirectorySink, MemorySink, PublishSink};
