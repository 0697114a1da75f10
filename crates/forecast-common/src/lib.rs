//! Common types and utilities shared across the forecast-sync crates.

pub mod error;
pub mod estimate;
pub mod forecast;
pub mod grid;
pub mod location;

pub use error::{ForecastError, ForecastResult};
pub use estimate::{estimate, Condition, DerivedMetrics, BASE_HUMIDITY_PCT, BASE_TEMPERATURE_C};
pub use forecast::{
    month_key, CanonicalRecord, CurrentConditions, DayForecast, MonthOutlook, SeasonalOutlook,
    ShortRangeForecast, SourceKind,
};
pub use grid::{resolve, resolve_with_distance, ForecastAxis, GridDataset, Series};
pub use location::{LatLon, Location};
