//! End-to-end cycles from upstream bytes to a published document on disk.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use forecast_common::{Condition, ForecastError, ForecastResult, Location, SourceKind};
use ingestion::{
    AdapterConfig, CycleOutcome, Degradation, ForecastContext, PayloadDecoder, ResilienceOrchestrator,
    SeasonalAdapter, ShortRangeAdapter, SourceBinding, Transport,
};
use storage::{DirectorySink, SnapshotCache};
use test_utils::assert_approx_eq;
use test_utils::fixtures::{scenario_netcdf, urls};

/// Serves the scenario NetCDF payload for every URL until switched off.
struct ScenarioUpstream {
    payload: Bytes,
    online: AtomicBool,
}

impl ScenarioUpstream {
    fn new(steps: usize) -> Self {
        Self {
            payload: Bytes::from(scenario_netcdf(steps)),
            online: AtomicBool::new(true),
        }
    }
}

#[async_trait]
impl Transport for ScenarioUpstream {
    async fn fetch(&self, url: &str) -> ForecastResult<Bytes> {
        if self.online.load(Ordering::SeqCst) {
            Ok(self.payload.clone())
        } else {
            Err(ForecastError::Transport {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
        }
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    upstream: Arc<ScenarioUpstream>,
    sink: DirectorySink,
    orchestrator: ResilienceOrchestrator,
}

fn harness(steps: usize) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let upstream = Arc::new(ScenarioUpstream::new(steps));
    let sink_dir = dir.path().join("published");

    let ctx = ForecastContext {
        transport: upstream.clone(),
        decoder: Arc::new(PayloadDecoder::default()),
        cache: Arc::new(SnapshotCache::new(dir.path().join("cache"))),
        sink: Arc::new(DirectorySink::new(&sink_dir)),
        location: Location::yucatan_site(),
        short_range: SourceBinding::new(
            urls::CHIRPS_GEFS,
            Duration::from_secs(10),
            Arc::new(ShortRangeAdapter::new(AdapterConfig::new("precipitation", "probability", 7))),
        ),
        seasonal: SourceBinding::new(
            urls::IRI_SEASONAL,
            Duration::from_secs(10),
            Arc::new(SeasonalAdapter::default()),
        ),
    };

    Harness {
        _dir: dir,
        upstream,
        sink: DirectorySink::new(sink_dir),
        orchestrator: ResilienceOrchestrator::new(Arc::new(ctx)),
    }
}

fn published(h: &Harness, key: &str) -> serde_json::Value {
    let bytes = std::fs::read(h.sink.path_for(key)).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Fresh cycles
// ============================================================================

#[tokio::test]
async fn test_short_range_netcdf_to_document() {
    let h = harness(7);

    let outcome = h.orchestrator.run_cycle(SourceKind::ShortRange).await;
    assert!(matches!(outcome, CycleOutcome::Success { .. }));

    let doc = published(&h, "shortTermForecast");
    let days = doc["days"].as_array().unwrap();
    assert_eq!(days.len(), 7);

    // Cell 1 of the scenario, step t holds t + 0.01 mm.
    assert_approx_eq!(days[0]["precipitationMm"].as_f64().unwrap(), 0.01, 1e-6);
    assert_approx_eq!(days[3]["precipitationMm"].as_f64().unwrap(), 3.01, 1e-6);
    assert_eq!(days[3]["condition"], serde_json::json!(Condition::Cloudy));
    assert_eq!(days[0]["probabilityPct"].as_f64().unwrap(), 40.0);
    assert_eq!(doc["current"]["condition"], serde_json::json!(Condition::Clear));
    assert_eq!(doc["location"]["label"], "Tahcabo, Yucatán");
}

#[tokio::test]
async fn test_seasonal_netcdf_to_document() {
    let h = harness(3);

    let outcome = h.orchestrator.run_cycle(SourceKind::Seasonal).await;
    assert_eq!(outcome.label(), "success");

    let doc = published(&h, "longTermForecast");
    let months = doc["months"].as_array().unwrap();
    assert_eq!(months.len(), 3);
    assert_approx_eq!(months[2]["precipitationMm"].as_f64().unwrap(), 2.01, 1e-6);
    assert!(months[0]["monthKey"].as_str().unwrap().len() == 7);
}

#[tokio::test]
async fn test_short_horizon_payload_is_not_published() {
    // Three steps cannot satisfy a seven day horizon.
    let h = harness(3);

    let outcome = h.orchestrator.run_cycle(SourceKind::ShortRange).await;
    assert_eq!(outcome.label(), "failure");
    assert!(!h.sink.path_for("shortTermForecast").exists());
}

// ============================================================================
// Outage
// ============================================================================

#[tokio::test]
async fn test_outage_republishes_last_document() {
    let h = harness(7);

    h.orchestrator.run_cycle(SourceKind::ShortRange).await;
    let before = published(&h, "shortTermForecast");

    h.upstream.online.store(false, Ordering::SeqCst);
    let outcome = h.orchestrator.run_cycle(SourceKind::ShortRange).await;
    assert!(matches!(
        outcome,
        CycleOutcome::DegradedSuccess(Degradation::ServedFromCache { .. })
    ));
    assert_eq!(published(&h, "shortTermForecast"), before);

    h.upstream.online.store(true, Ordering::SeqCst);
    let outcome = h.orchestrator.run_cycle(SourceKind::ShortRange).await;
    assert!(matches!(outcome, CycleOutcome::Success { .. }));
}
