//! Forecast ingestion library.
//!
//! Fetches the short-range (CHIRPS-GEFS) and seasonal (IRI) precipitation
//! feeds, normalizes the grid cell nearest the monitored site into a
//! canonical record, and publishes it to a sink. When an upstream fails,
//! the last cached snapshot is published instead.
//!
//! # Architecture
//!
//! - [`Transport`] fetches raw bytes
//! - [`GridDecoder`] turns bytes into a [`forecast_common::GridDataset`]
//! - [`SourceAdapter`] turns a dataset into a [`forecast_common::CanonicalRecord`]
//! - [`ResilienceOrchestrator`] runs one cycle and decides what gets published
//!
//! Everything a cycle touches is wired explicitly through [`ForecastContext`].

pub mod adapter;
pub mod context;
pub mod decode;
pub mod orchestrator;
pub mod transport;

pub use adapter::{AdapterConfig, SeasonalAdapter, ShortRangeAdapter, SourceAdapter};
pub use context::{ForecastContext, SourceBinding};
pub use decode::{GridDecoder, JsonGrid, PayloadDecoder, RawPayload};
pub use orchestrator::{CycleOutcome, Degradation, FailureReason, ResilienceOrchestrator};
pub use transport::{HttpTransport, Transport};
