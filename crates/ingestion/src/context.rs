//! Explicit wiring of every collaborator a forecast cycle needs.

use std::sync::Arc;
use std::time::Duration;

use forecast_common::{Location, SourceKind};
use storage::{PublishSink, SnapshotCache};

use crate::adapter::SourceAdapter;
use crate::decode::GridDecoder;
use crate::transport::Transport;

/// One upstream feed: where to fetch it, how long to wait, how to read it.
#[derive(Clone)]
pub struct SourceBinding {
    pub url: String,
    pub fetch_timeout: Duration,
    pub adapter: Arc<dyn SourceAdapter>,
}

impl SourceBinding {
    pub fn new(url: impl Into<String>, fetch_timeout: Duration, adapter: Arc<dyn SourceAdapter>) -> Self {
        Self {
            url: url.into(),
            fetch_timeout,
            adapter,
        }
    }
}

impl std::fmt::Debug for SourceBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceBinding")
            .field("url", &self.url)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("kind", &self.adapter.kind())
            .finish()
    }
}

/// Built once at startup and shared by the orchestrator and scheduler.
pub struct ForecastContext {
    pub transport: Arc<dyn Transport>,
    pub decoder: Arc<dyn GridDecoder>,
    pub cache: Arc<SnapshotCache>,
    pub sink: Arc<dyn PublishSink>,
    pub location: Location,
    pub short_range: SourceBinding,
    pub seasonal: SourceBinding,
}

impl ForecastContext {
    pub fn source(&self, kind: SourceKind) -> &SourceBinding {
        match kind {
            SourceKind::ShortRange => &self.short_range,
            SourceKind::Seasonal => &self.seasonal,
        }
    }
}
