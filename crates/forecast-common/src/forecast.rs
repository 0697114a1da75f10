//! Canonical forecast records, the only shapes written to the cache and sink.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::estimate::{Condition, DerivedMetrics};
use crate::location::Location;

/// The two upstream feeds, each with its own adapter, cache entry, and key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SourceKind {
    /// Daily precipitation for the coming week (CHIRPS-GEFS).
    ShortRange,
    /// Monthly precipitation outlook (IRI seasonal forecast).
    Seasonal,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::ShortRange, SourceKind::Seasonal];

    /// Key the published document is stored under.
    pub fn publish_key(&self) -> &'static str {
        match self {
            Self::ShortRange => "shortTermForecast",
            Self::Seasonal => "longTermForecast",
        }
    }

    /// File name of the cached snapshot.
    pub fn cache_file_name(&self) -> &'static str {
        match self {
            Self::ShortRange => "short_range.json",
            Self::Seasonal => "seasonal.json",
        }
    }

    /// Number of forecast entries produced by default (days or months).
    pub fn default_horizon(&self) -> usize {
        match self {
            Self::ShortRange => 7,
            Self::Seasonal => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortRange => "short_range",
            Self::Seasonal => "seasonal",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Conditions at the resolved cell for the first forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentConditions {
    pub precipitation_mm: f64,
    pub probability_pct: f64,
    pub estimated_temperature_c: f64,
    pub estimated_humidity_pct: f64,
    pub condition: Condition,
    pub observed_at: DateTime<Utc>,
}

impl CurrentConditions {
    pub fn new(precipitation_mm: f64, probability_pct: f64, derived: DerivedMetrics, observed_at: DateTime<Utc>) -> Self {
        Self {
            precipitation_mm,
            probability_pct,
            estimated_temperature_c: derived.temperature_c,
            estimated_humidity_pct: derived.humidity_pct,
            condition: derived.condition,
            observed_at,
        }
    }
}

/// One day of the short-range forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayForecast {
    pub offset_days: u32,
    pub date: NaiveDate,
    pub precipitation_mm: f64,
    pub probability_pct: f64,
    pub estimated_temperature_c: f64,
    pub estimated_humidity_pct: f64,
    pub condition: Condition,
}

impl DayForecast {
    pub fn new(offset_days: u32, date: NaiveDate, precipitation_mm: f64, probability_pct: f64, derived: DerivedMetrics) -> Self {
        Self {
            offset_days,
            date,
            precipitation_mm,
            probability_pct,
            estimated_temperature_c: derived.temperature_c,
            estimated_humidity_pct: derived.humidity_pct,
            condition: derived.condition,
        }
    }
}

/// Canonical short-range forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortRangeForecast {
    pub current: CurrentConditions,
    pub days: Vec<DayForecast>,
    pub location: Location,
    pub produced_at: DateTime<Utc>,
}

/// One month of the seasonal outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthOutlook {
    /// Calendar month as `YYYY-MM`.
    pub month_key: String,
    pub precipitation_mm: f64,
    pub probability_pct: f64,
}

/// Canonical seasonal outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalOutlook {
    pub months: Vec<MonthOutlook>,
    pub location: Location,
    pub produced_at: DateTime<Utc>,
}

/// `YYYY-MM` key of the calendar month `offset` months after `now`'s month.
pub fn month_key(now: DateTime<Utc>, offset: u32) -> String {
    let months = now.year() as i64 * 12 + now.month0() as i64 + offset as i64;
    format!("{:04}-{:02}", months.div_euclid(12), months.rem_euclid(12) + 1)
}

/// Either canonical record, tagged by source kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanonicalRecord {
    ShortRange(ShortRangeForecast),
    Seasonal(SeasonalOutlook),
}

impl CanonicalRecord {
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::ShortRange(_) => SourceKind::ShortRange,
            Self::Seasonal(_) => SourceKind::Seasonal,
        }
    }

    pub fn produced_at(&self) -> DateTime<Utc> {
        match self {
            Self::ShortRange(f) => f.produced_at,
            Self::Seasonal(s) => s.produced_at,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Self::ShortRange(f) => &f.location,
            Self::Seasonal(s) => &s.location,
        }
    }

    /// The untagged JSON document handed to the publish sink.
    pub fn to_document(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            Self::ShortRange(f) => serde_json::to_value(f),
            Self::Seasonal(s) => serde_json::to_value(s),
        }
    }
}

impl From<ShortRangeForecast> for CanonicalRecord {
    fn from(f: ShortRangeForecast) -> Self {
        Self::ShortRange(f)
    }
}

impl From<SeasonalOutlook> for CanonicalRecord {
    fn from(s: SeasonalOutlook) -> Self {
        Self::Seasonal(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::estimate;
    use chrono::TimeZone;

    fn sample_short_range() -> ShortRangeForecast {
        let now = Utc.with_ymd_and_hms(2026, 10, 15, 6, 0, 0).unwrap();
        let date = now.date_naive();
        ShortRangeForecast {
            current: CurrentConditions::new(3.0, 40.0, estimate(3.0), now),
            days: vec![DayForecast::new(0, date, 3.0, 40.0, estimate(3.0))],
            location: Location::yucatan_site(),
            produced_at: now,
        }
    }

    #[test]
    fn test_month_key_rolls_over_year() {
        let now = Utc.with_ymd_and_hms(2026, 11, 30, 23, 0, 0).unwrap();
        assert_eq!(month_key(now, 0), "2026-11");
        assert_eq!(month_key(now, 1), "2026-12");
        assert_eq!(month_key(now, 2), "2027-01");
        assert_eq!(month_key(now, 14), "2028-01");
    }

    #[test]
    fn test_publish_keys() {
        assert_eq!(SourceKind::ShortRange.publish_key(), "shortTermForecast");
        assert_eq!(SourceKind::Seasonal.publish_key(), "longTermForecast");
    }

    #[test]
    fn test_short_range_document_uses_estimated_field_names() {
        let record = CanonicalRecord::from(sample_short_range());
        let doc = record.to_document().unwrap();

        assert_eq!(doc["current"]["estimatedTemperatureC"], 23.5);
        assert_eq!(doc["current"]["estimatedHumidityPct"], 71.0);
        assert_eq!(doc["current"]["condition"], "cloudy");
        assert_eq!(doc["days"][0]["offsetDays"], 0);
        assert_eq!(doc["days"][0]["date"], "2026-10-15");
        assert!(doc.get("shortRange").is_none());
    }

    #[test]
    fn test_record_json_round_trip() {
        let record = CanonicalRecord::from(sample_short_range());
        let json = serde_json::to_string(&record).unwrap();
        let back: CanonicalRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
        assert_eq!(back.kind(), SourceKind::ShortRange);
    }

    #[test]
    fn test_seasonal_kind() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let record = CanonicalRecord::from(SeasonalOutlook {
            months: vec![MonthOutlook {
                month_key: "2026-01".into(),
                precipitation_mm: 40.0,
                probability_pct: 55.0,
            }],
            location: Location::yucatan_site(),
            produced_at: now,
        });
        assert_eq!(record.kind(), SourceKind::Seasonal);
        assert_eq!(record.produced_at(), now);
        assert_eq!(record.to_document().unwrap()["months"][0]["monthKey"], "2026-01");
    }
}
