//! Redis publish sink.

use async_trait::async_trait;
use forecast_common::CanonicalRecord;
use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::sink::PublishSink;

/// Default key namespace, mirroring the `weatherForecasts` collection.
pub const DEFAULT_KEY_PREFIX: &str = "weatherForecasts:";

/// Stores each document as a JSON string with `SET <prefix><key>`.
#[derive(Clone)]
pub struct RedisSink {
    conn: MultiplexedConnection,
    key_prefix: String,
}

impl RedisSink {
    /// Connect to Redis.
    pub async fn connect(redis_url: &str, key_prefix: impl Into<String>) -> StorageResult<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| StorageError::Redis(format!("Redis connection failed: {}", e)))?;

        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StorageError::Redis(format!("Redis connection failed: {}", e)))?;

        Ok(Self {
            conn,
            key_prefix: key_prefix.into(),
        })
    }

    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl PublishSink for RedisSink {
    async fn put(&self, key: &str, record: &CanonicalRecord) -> StorageResult<()> {
        let json = serde_json::to_string(&record.to_document()?)?;
        let full_key = self.full_key(key);

        // Multiplexed connections are cheap to clone and share one socket.
        let mut conn = self.conn.clone();
        let _: () = conn
            .set(&full_key, json)
            .await
            .map_err(|e| StorageError::Redis(format!("SET {} failed: {}", full_key, e)))?;

        debug!(key = %full_key, "Published document to Redis");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}
