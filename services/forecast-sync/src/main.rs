//! Precipitation forecast sync service.
//!
//! Periodically fetches the CHIRPS-GEFS short-range and IRI seasonal
//! precipitation feeds for one site and publishes them with:
//! - Nearest grid cell resolution
//! - Estimated temperature, humidity, and sky condition
//! - Last-known-good fallback when an upstream is down
//! - Prometheus metrics (optional)

mod config;
mod scheduler;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use forecast_common::SourceKind;
use ingestion::{
    ForecastContext, HttpTransport, PayloadDecoder, ResilienceOrchestrator, SeasonalAdapter, ShortRangeAdapter,
    SourceBinding,
};
use netcdf_parser::GridOptions;
use storage::{DirectorySink, MemorySink, PublishSink, RedisSink, SnapshotCache};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::{ServiceConfig, SinkConfig};
use scheduler::{all_failed, KindSchedule, Scheduler};

#[derive(Parser, Debug)]
#[command(name = "forecast-sync")]
#[command(about = "Precipitation forecast sync with cached fallback")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "FORECAST_SYNC_CONFIG", default_value = "config/forecast-sync.yaml")]
    config: PathBuf,

    /// Run one cycle per source and exit (vs continuous scheduling)
    #[arg(long)]
    once: bool,

    /// Only run this source: short_range or seasonal (default: both)
    #[arg(short, long, value_parser = parse_kind)]
    kind: Option<SourceKind>,

    /// Directory for cached snapshots (overrides config)
    #[arg(long, env = "CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Publish to Redis at this URL (overrides config)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Publish JSON documents into this directory (overrides config and --redis-url)
    #[arg(long, env = "SINK_DIR")]
    sink_dir: Option<PathBuf>,

    /// Serve Prometheus metrics on this port
    #[arg(long, env = "METRICS_PORT")]
    metrics_port: Option<u16>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_kind(s: &str) -> Result<SourceKind, String> {
    SourceKind::ALL
        .into_iter()
        .find(|k| k.as_str() == s)
        .ok_or_else(|| format!("unknown source '{}', expected short_range or seasonal", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting forecast sync");

    let mut config = ServiceConfig::load_or_default(&args.config)?;
    apply_overrides(&mut config, &args);

    if let Some(port) = args.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("Failed to install Prometheus exporter")?;
        info!(addr = %addr, "Prometheus metrics exporter listening");
    }

    tokio::fs::create_dir_all(&config.cache_dir)
        .await
        .with_context(|| format!("Failed to create cache directory: {}", config.cache_dir.display()))?;

    let ctx = build_context(&config).await?;
    let orchestrator = ResilienceOrchestrator::new(Arc::new(ctx));

    let schedules = SourceKind::ALL
        .into_iter()
        .filter(|kind| args.kind.map_or(true, |only| only == *kind))
        .map(|kind| KindSchedule {
            kind,
            interval: config.source(kind).interval,
        })
        .collect();
    let scheduler = Scheduler::new(orchestrator, schedules);

    if args.once {
        info!("Running single sync cycle");

        let outcomes = scheduler.run_once().await;
        for (kind, outcome) in &outcomes {
            info!(kind = %kind, outcome = outcome.label(), "Source finished");
        }
        if all_failed(&outcomes) {
            anyhow::bail!("No source published a forecast");
        }
    } else {
        info!("Starting continuous scheduling");

        let cancel = CancellationToken::new();

        // Handle Ctrl+C
        let cancel_on_signal = cancel.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
            cancel_on_signal.cancel();
        });

        scheduler.run_until_cancelled(cancel).await;
    }

    info!("Forecast sync stopped");
    Ok(())
}

fn apply_overrides(config: &mut ServiceConfig, args: &Args) {
    if let Some(dir) = &args.cache_dir {
        config.cache_dir = dir.clone();
    }
    if let Some(dir) = &args.sink_dir {
        config.sink = SinkConfig::Directory { path: dir.clone() };
    } else if let Some(url) = &args.redis_url {
        let key_prefix = match &config.sink {
            SinkConfig::Redis { key_prefix, .. } => key_prefix.clone(),
            _ => storage::DEFAULT_KEY_PREFIX.to_string(),
        };
        config.sink = SinkConfig::Redis {
            url: url.clone(),
            key_prefix,
        };
    }
}

async fn build_sink(sink: &SinkConfig) -> Result<Arc<dyn PublishSink>> {
    let sink: Arc<dyn PublishSink> = match sink {
        SinkConfig::Redis { url, key_prefix } => Arc::new(
            RedisSink::connect(url, key_prefix.clone())
                .await
                .context("Failed to connect publish sink")?,
        ),
        SinkConfig::Directory { path } => {
            tokio::fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create sink directory: {}", path.display()))?;
            Arc::new(DirectorySink::new(path))
        }
        SinkConfig::Memory => {
            warn!("Memory sink selected; published forecasts are discarded on exit");
            Arc::new(MemorySink::new())
        }
    };
    info!(sink = sink.name(), "Publish sink ready");
    Ok(sink)
}

async fn build_context(config: &ServiceConfig) -> Result<ForecastContext> {
    let short = config.source(SourceKind::ShortRange);
    let seasonal = config.source(SourceKind::Seasonal);

    // Per-source deadlines are enforced by the orchestrator; the client
    // timeout only has to outlast the longest one.
    let transport = HttpTransport::new(short.timeout.max(seasonal.timeout))?;

    Ok(ForecastContext {
        transport: Arc::new(transport),
        decoder: Arc::new(PayloadDecoder::new(GridOptions::from(&config.coordinates))),
        cache: Arc::new(SnapshotCache::new(&config.cache_dir)),
        sink: build_sink(&config.sink).await?,
        location: config.location.clone(),
        short_range: SourceBinding::new(
            short.url,
            short.timeout,
            Arc::new(ShortRangeAdapter::new(short.adapter)),
        ),
        seasonal: SourceBinding::new(
            seasonal.url,
            seasonal.timeout,
            Arc::new(SeasonalAdapter::new(seasonal.adapter)),
        ),
    })
}
