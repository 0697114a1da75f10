//! Temperature, humidity, and sky condition estimated from precipitation.
//!
//! Neither upstream feed publishes these attributes, so they are derived from
//! the precipitation amount with fixed regional constants for the Yucatán
//! peninsula. They are estimates, and the canonical records name them so.

use serde::{Deserialize, Serialize};

/// Regional base temperature in °C for a dry day.
pub const BASE_TEMPERATURE_C: f64 = 25.0;
/// Regional base relative humidity in percent for a dry day.
pub const BASE_HUMIDITY_PCT: f64 = 65.0;
/// Upper bound on the estimated humidity.
pub const MAX_HUMIDITY_PCT: f64 = 95.0;

const TEMPERATURE_DROP_PER_MM: f64 = 0.5;
const HUMIDITY_RISE_PER_MM: f64 = 2.0;

const CLEAR_BELOW_MM: f64 = 0.1;
const PARTLY_CLOUDY_BELOW_MM: f64 = 2.5;
const CLOUDY_BELOW_MM: f64 = 7.5;

/// Sky condition derived from precipitation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Rain,
}

impl Condition {
    /// Step function over precipitation in mm, half-open intervals.
    pub fn from_precipitation(precipitation_mm: f64) -> Self {
        if precipitation_mm < CLEAR_BELOW_MM {
            Self::Clear
        } else if precipitation_mm < PARTLY_CLOUDY_BELOW_MM {
            Self::PartlyCloudy
        } else if precipitation_mm < CLOUDY_BELOW_MM {
            Self::Cloudy
        } else {
            Self::Rain
        }
    }

    /// Human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Rain => "Rain",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Output of [`estimate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedMetrics {
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub condition: Condition,
}

/// Derive temperature, humidity, and condition from a precipitation amount.
///
/// Total over the reals. Negative precipitation is not rejected.
pub fn estimate(precipitation_mm: f64) -> DerivedMetrics {
    DerivedMetrics {
        temperature_c: BASE_TEMPERATURE_C - precipitation_mm * TEMPERATURE_DROP_PER_MM,
        humidity_pct: (BASE_HUMIDITY_PCT + precipitation_mm * HUMIDITY_RISE_PER_MM).min(MAX_HUMIDITY_PCT),
        condition: Condition::from_precipitation(precipitation_mm),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_day_is_clear() {
        let m = estimate(0.0);
        assert_eq!(m.condition, Condition::Clear);
        assert_eq!(m.temperature_c, BASE_TEMPERATURE_C);
        assert_eq!(m.humidity_pct, BASE_HUMIDITY_PCT);
    }

    #[test]
    fn test_heavy_rain_clamps_humidity() {
        let m = estimate(10.0);
        assert_eq!(m.condition, Condition::Rain);
        assert_eq!(m.humidity_pct, 95.0);
        assert_eq!(m.temperature_c, 20.0);
    }

    #[test]
    fn test_condition_boundaries_are_half_open() {
        assert_eq!(Condition::from_precipitation(0.099), Condition::Clear);
        assert_eq!(Condition::from_precipitation(0.1), Condition::PartlyCloudy);
        assert_eq!(Condition::from_precipitation(2.499), Condition::PartlyCloudy);
        assert_eq!(Condition::from_precipitation(2.5), Condition::Cloudy);
        assert_eq!(Condition::from_precipitation(7.499), Condition::Cloudy);
        assert_eq!(Condition::from_precipitation(7.5), Condition::Rain);
        assert_eq!(Condition::from_precipitation(250.0), Condition::Rain);
    }

    #[test]
    fn test_negative_precipitation_is_accepted() {
        let m = estimate(-2.0);
        assert_eq!(m.condition, Condition::Clear);
        assert_eq!(m.temperature_c, 26.0);
        assert_eq!(m.humidity_pct, 61.0);
    }

    #[test]
    fn test_estimate_is_monotonic() {
        let samples: Vec<f64> = (0..200).map(|i| i as f64 * 0.25 - 5.0).collect();
        for pair in samples.windows(2) {
            let (lo, hi) = (estimate(pair[0]), estimate(pair[1]));
            assert!(lo.temperature_c >= hi.temperature_c);
            assert!(lo.humidity_pct <= hi.humidity_pct);
        }
    }

    #[test]
    fn test_cloudy_scenario() {
        let m = estimate(3.0);
        assert_eq!(m.condition, Condition::Cloudy);
        assert_eq!(m.temperature_c, BASE_TEMPERATURE_C - 1.5);
        assert_eq!(m.humidity_pct, (BASE_HUMIDITY_PCT + 6.0).min(95.0));
    }

    #[test]
    fn test_condition_serializes_snake_case() {
        let json = serde_json::to_string(&Condition::PartlyCloudy).unwrap();
        assert_eq!(json, "\"partly_cloudy\"");
    }
}
