//! Source adapters: decoded grid in, canonical record out.

use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use forecast_common::{
    estimate, month_key, resolve_with_distance, CanonicalRecord, CurrentConditions, DayForecast, ForecastAxis,
    ForecastError, ForecastResult, GridDataset, Location, MonthOutlook, SeasonalOutlook, ShortRangeForecast,
    SourceKind,
};
use tracing::{debug, warn};

use crate::decode::GridDecoder;

/// Variable names and horizon for one feed.
#[derive(Debug, Clone, PartialEq)]
pub struct AdapterConfig {
    precipitation_variable: String,
    probability_variable: String,
    horizon: usize,
}

impl AdapterConfig {
    pub fn new(
        precipitation_variable: impl Into<String>,
        probability_variable: impl Into<String>,
        horizon: usize,
    ) -> Self {
        Self {
            precipitation_variable: precipitation_variable.into(),
            probability_variable: probability_variable.into(),
            horizon: horizon.max(1),
        }
    }

    pub fn for_kind(kind: SourceKind) -> Self {
        Self::new("precipitation", "probability", kind.default_horizon())
    }

    pub fn precipitation_variable(&self) -> &str {
        &self.precipitation_variable
    }

    pub fn probability_variable(&self) -> &str {
        &self.probability_variable
    }

    /// Number of days or months to emit. At least 1.
    pub fn horizon(&self) -> usize {
        self.horizon
    }
}

/// Normalizes one upstream feed into its canonical record.
///
/// Adapters are pure: no I/O, no persistence.
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Build the canonical record from an already decoded grid.
    fn normalize_grid(
        &self,
        dataset: &GridDataset,
        location: &Location,
        now: DateTime<Utc>,
    ) -> ForecastResult<CanonicalRecord>;

    /// Decode `raw` with `decoder`, then normalize.
    fn normalize(
        &self,
        raw: &Bytes,
        decoder: &dyn GridDecoder,
        location: &Location,
        now: DateTime<Utc>,
    ) -> ForecastResult<CanonicalRecord> {
        let dataset = decoder.decode(raw)?;
        self.normalize_grid(&dataset, location, now)
    }
}

/// Resolve the location's cell and log how far away it is.
fn resolve_cell(kind: SourceKind, dataset: &GridDataset, location: &Location) -> ForecastResult<usize> {
    let (index, distance) = resolve_with_distance(location.target(), dataset)?;
    debug!(
        kind = %kind,
        index,
        distance_deg = distance,
        cell_lat = dataset.latitudes()[index],
        cell_lon = dataset.longitudes()[index],
        "Resolved grid cell"
    );
    Ok(index)
}

/// Read `horizon` finite forecast values for the cell at `index`.
fn read_series(dataset: &GridDataset, variable: &str, index: usize, horizon: usize) -> ForecastResult<Vec<f64>> {
    let series = dataset.series(variable, index, horizon)?;

    if series.axis == ForecastAxis::Cells && horizon > 1 {
        warn!(
            variable = %variable,
            index,
            horizon,
            "Variable has no time axis; reading forecast steps from consecutive grid cells"
        );
    }

    if let Some(step) = series.values.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::Decode(format!(
            "variable '{}' has no valid value at forecast step {} of cell {}",
            variable, step, index
        )));
    }

    Ok(series.values)
}

/// CHIRPS-GEFS daily precipitation.
#[derive(Debug, Clone)]
pub struct ShortRangeAdapter {
    config: AdapterConfig,
}

impl ShortRangeAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }
}

impl Default for ShortRangeAdapter {
    fn default() -> Self {
        Self::new(AdapterConfig::for_kind(SourceKind::ShortRange))
    }
}

impl SourceAdapter for ShortRangeAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::ShortRange
    }

    fn normalize_grid(
        &self,
        dataset: &GridDataset,
        location: &Location,
        now: DateTime<Utc>,
    ) -> ForecastResult<CanonicalRecord> {
        let index = resolve_cell(self.kind(), dataset, location)?;
        let horizon = self.config.horizon();

        let precipitation = read_series(dataset, self.config.precipitation_variable(), index, horizon)?;
        let probability = read_series(dataset, self.config.probability_variable(), index, horizon)?;

        let (&p0, &q0) = precipitation
            .first()
            .zip(probability.first())
            .ok_or_else(|| ForecastError::InsufficientHorizon {
                variable: self.config.precipitation_variable.clone(),
                required: 1,
                available: 0,
            })?;
        let current = CurrentConditions::new(p0, q0, estimate(p0), now);

        let today = now.date_naive();
        let days = precipitation
            .iter()
            .zip(&probability)
            .enumerate()
            .map(|(offset, (&p, &q))| {
                DayForecast::new(offset as u32, today + Duration::days(offset as i64), p, q, estimate(p))
            })
            .collect();

        Ok(CanonicalRecord::ShortRange(ShortRangeForecast {
            current,
            days,
            location: location.clone(),
            produced_at: now,
        }))
    }
}

/// IRI seasonal precipitation outlook.
#[derive(Debug, Clone)]
pub struct SeasonalAdapter {
    config: AdapterConfig,
}

impl SeasonalAdapter {
    pub fn new(config: AdapterConfig) -> Self {
        Self { config }
    }
}

impl Default for SeasonalAdapter {
    fn default() -> Self {
        Self::new(AdapterConfig::for_kind(SourceKind::Seasonal))
    }
}

impl SourceAdapter for SeasonalAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::Seasonal
    }

    fn normalize_grid(
        &self,
        dataset: &GridDataset,
        location: &Location,
        now: DateTime<Utc>,
    ) -> ForecastResult<CanonicalRecord> {
        let index = resolve_cell(self.kind(), dataset, location)?;
        let horizon = self.config.horizon();

        let precipitation = read_series(dataset, self.config.precipitation_variable(), index, horizon)?;
        let probability = read_series(dataset, self.config.probability_variable(), index, horizon)?;

        let months = precipitation
            .iter()
            .zip(&probability)
            .enumerate()
            .map(|(offset, (&p, &q))| MonthOutlook {
                month_key: month_key(now, offset as u32),
                precipitation_mm: p,
                probability_pct: q,
            })
            .collect();

        Ok(CanonicalRecord::Seasonal(SeasonalOutlook {
            months,
            location: location.clone(),
            produced_at: now,
        }))
    }
}
