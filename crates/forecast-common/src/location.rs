//! The monitored site.

use serde::{Deserialize, Serialize};

/// A bare coordinate pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Squared Euclidean distance in degree space.
    pub fn squared_distance(&self, lat: f64, lon: f64) -> f64 {
        let d_lat = lat - self.lat;
        let d_lon = lon - self.lon;
        d_lat * d_lat + d_lon * d_lon
    }
}

/// The single geographic location the service publishes forecasts for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64, label: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            label: label.into(),
        }
    }

    /// Muchucux / Tahcabo, Yucatán.
    pub fn yucatan_site() -> Self {
        Self::new(20.6537, -88.4460, "Tahcabo, Yucatán")
    }

    pub fn target(&self) -> LatLon {
        LatLon::new(self.latitude, self.longitude)
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::yucatan_site()
    }
}
