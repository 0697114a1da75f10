//! Resilience orchestrator: fetch, normalize, persist, publish, fall back.
//!
//! ```text
//! Fetch ──ok──▶ Persist (cache write, then publish) ──▶ Success / DegradedSuccess
//!   │
//!   └─err──▶ Fallback (cache read) ──found──▶ publish cached ──▶ DegradedSuccess
//!                                   └─none──▶ TotalFailure
//! ```
//!
//! [`ResilienceOrchestrator::run_cycle`] never returns an error; every failure
//! is folded into the [`CycleOutcome`].

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use forecast_common::{CanonicalRecord, ForecastError, ForecastResult, SourceKind};
use metrics::{counter, histogram};
use tracing::{error, info, instrument, warn};

use crate::context::ForecastContext;

/// Why a cycle published stale data or skipped the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum Degradation {
    /// Fresh record published, but it could not be cached.
    CacheWriteFailed { error: String },
    /// Upstream failed; the cached snapshot was published instead.
    ServedFromCache {
        stored_at: DateTime<Utc>,
        cause: String,
    },
}

/// Why nothing reached the sink.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Upstream failed and no snapshot has been cached yet.
    NoSnapshot { cause: String },
    /// Upstream failed and the snapshot could not be read.
    SnapshotUnreadable { cause: String, error: String },
    /// The sink rejected the record.
    PublishFailed { error: String },
}

/// Result of one cycle for one source kind.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Success { produced_at: DateTime<Utc> },
    DegradedSuccess(Degradation),
    TotalFailure { reason: FailureReason },
}

impl CycleOutcome {
    /// Metric and log label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::DegradedSuccess(_) => "degraded",
            Self::TotalFailure { .. } => "failure",
        }
    }

    /// Whether a record reached the sink.
    pub fn published(&self) -> bool {
        !matches!(self, Self::TotalFailure { .. })
    }
}

/// Runs forecast cycles against a shared [`ForecastContext`].
#[derive(Clone)]
pub struct ResilienceOrchestrator {
    ctx: Arc<ForecastContext>,
}

impl ResilienceOrchestrator {
    pub fn new(ctx: Arc<ForecastContext>) -> Self {
        Self { ctx }
    }

    pub fn context(&self) -> &ForecastContext {
        &self.ctx
    }

    /// Run one full cycle for `kind`.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn run_cycle(&self, kind: SourceKind) -> CycleOutcome {
        let started = Instant::now();

        let outcome = match self.fetch(kind).await {
            Ok(record) => self.persist(record).await,
            Err(cause) => {
                warn!(
                    error = %cause,
                    category = cause.category(),
                    "Fetch failed, falling back to cached snapshot"
                );
                counter!("forecast_fetch_failures_total", "kind" => kind.as_str(), "category" => cause.category())
                    .increment(1);
                self.fallback(kind, cause).await
            }
        };

        counter!("forecast_cycles_total", "kind" => kind.as_str(), "outcome" => outcome.label()).increment(1);
        histogram!("forecast_cycle_duration_seconds", "kind" => kind.as_str())
            .record(started.elapsed().as_secs_f64());

        info!(
            outcome = outcome.label(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cycle complete"
        );
        outcome
    }

    /// Fetch raw bytes within the source's timeout and normalize them.
    async fn fetch(&self, kind: SourceKind) -> ForecastResult<CanonicalRecord> {
        let binding = self.ctx.source(kind);

        let raw = tokio::time::timeout(binding.fetch_timeout, self.ctx.transport.fetch(&binding.url))
            .await
            .map_err(|_| ForecastError::Timeout {
                url: binding.url.clone(),
                seconds: binding.fetch_timeout.as_secs(),
            })??;

        histogram!("forecast_payload_bytes", "kind" => kind.as_str()).record(raw.len() as f64);

        let record = binding
            .adapter
            .normalize(&raw, self.ctx.decoder.as_ref(), &self.ctx.location, Utc::now())?;

        if record.kind() != kind {
            return Err(ForecastError::Decode(format!(
                "source '{}' is bound to a {} adapter",
                kind,
                record.kind()
            )));
        }

        Ok(record)
    }

    /// Cache the fresh record, then publish it. A cache failure degrades but
    /// does not block publishing.
    async fn persist(&self, record: CanonicalRecord) -> CycleOutcome {
        let kind = record.kind();

        let cache_error = match self.ctx.cache.write(&record).await {
            Ok(_) => None,
            Err(e) => {
                warn!(error = %e, "Snapshot write failed; publishing fresh record anyway");
                Some(e.to_string())
            }
        };

        if let Err(e) = self.publish(kind, &record).await {
            return CycleOutcome::TotalFailure {
                reason: FailureReason::PublishFailed { error: e.to_string() },
            };
        }

        match cache_error {
            None => CycleOutcome::Success {
                produced_at: record.produced_at(),
            },
            Some(error) => CycleOutcome::DegradedSuccess(Degradation::CacheWriteFailed { error }),
        }
    }

    /// Publish the last cached snapshot unchanged, if there is one.
    async fn fallback(&self, kind: SourceKind, cause: ForecastError) -> CycleOutcome {
        let entry = match self.ctx.cache.read(kind).await {
            Ok(Some(entry)) => entry,
            Ok(None) => {
                error!(cause = %cause, "No cached snapshot; nothing published this cycle");
                return CycleOutcome::TotalFailure {
                    reason: FailureReason::NoSnapshot {
                        cause: cause.to_string(),
                    },
                };
            }
            Err(e) => {
                error!(cause = %cause, error = %e, "Cached snapshot unreadable; nothing published this cycle");
                return CycleOutcome::TotalFailure {
                    reason: FailureReason::SnapshotUnreadable {
                        cause: cause.to_string(),
                        error: e.to_string(),
                    },
                };
            }
        };

        if let Err(e) = self.publish(kind, &entry.record).await {
            return CycleOutcome::TotalFailure {
                reason: FailureReason::PublishFailed { error: e.to_string() },
            };
        }

        info!(
            stored_at = %entry.stored_at,
            age_secs = entry.age(Utc::now()).num_seconds(),
            "Published cached snapshot"
        );
        CycleOutcome::DegradedSuccess(Degradation::ServedFromCache {
            stored_at: entry.stored_at,
            cause: cause.to_string(),
        })
    }

    async fn publish(&self, kind: SourceKind, record: &CanonicalRecord) -> Result<(), storage::StorageError> {
        let key = kind.publish_key();
        match self.ctx.sink.put(key, record).await {
            Ok(()) => {
                info!(key = %key, sink = self.ctx.sink.name(), "Published forecast");
                Ok(())
            }
            Err(e) => {
                error!(key = %key, sink = self.ctx.sink.name(), error = %e, "Publish failed");
                Err(e)
            }
        }
    }
}
