//! Service configuration loaded from YAML.
//!
//! Every field is optional; an empty file yields the production defaults.
//!
//! ```yaml
//! location: { latitude: 20.6537, longitude: -88.446, label: "Tahcabo, Yucatán" }
//! cache_dir: data/cache
//! sink: { type: redis, url: "redis://127.0.0.1:6379" }
//! sources:
//!   short_range: { interval_secs: 3600, horizon: 7 }
//!   seasonal: { interval_secs: 21600, horizon: 3 }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use forecast_common::{Location, SourceKind};
use ingestion::AdapterConfig;
use netcdf_parser::GridOptions;
use serde::Deserialize;
use tracing::{debug, info};

const CHIRPS_GEFS_URL: &str =
    "https://iridl.ldeo.columbia.edu/SOURCES/.CHIRPS/.GEFS/.reforecast/.HINDCAST/.Precipitation/data.nc";
const IRI_SEASONAL_URL: &str =
    "https://iridl.ldeo.columbia.edu/SOURCES/.IRI/.FD/.Seasonal_Forecast/.Precipitation/data.nc";

/// Root configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub location: Location,
    pub cache_dir: PathBuf,
    pub sink: SinkConfig,
    pub sources: SourcesConfig,
    pub coordinates: CoordinateConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            location: Location::yucatan_site(),
            cache_dir: PathBuf::from("data/cache"),
            sink: SinkConfig::default(),
            sources: SourcesConfig::default(),
            coordinates: CoordinateConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        debug!(path = %path.display(), "Loaded service config");
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            info!(path = %path.display(), "Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // serde_yaml rejects an empty document as a struct.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn source(&self, kind: SourceKind) -> SourceSettings {
        match kind {
            SourceKind::ShortRange => self.sources.short_range.resolve(kind),
            SourceKind::Seasonal => self.sources.seasonal.resolve(kind),
        }
    }
}

/// Where published records go.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    Redis {
        #[serde(default = "default_redis_url")]
        url: String,
        #[serde(default = "default_key_prefix")]
        key_prefix: String,
    },
    Directory {
        path: PathBuf,
    },
    /// Keeps records in memory only. Useful for dry runs.
    Memory,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::Redis {
            url: default_redis_url(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_key_prefix() -> String {
    storage::DEFAULT_KEY_PREFIX.to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub short_range: SourceConfig,
    pub seasonal: SourceConfig,
}

/// One feed as written in YAML. Missing fields take the feed's defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub url: Option<String>,
    pub interval_secs: Option<u64>,
    pub timeout_secs: Option<u64>,
    pub horizon: Option<usize>,
    pub precipitation_variable: Option<String>,
    pub probability_variable: Option<String>,
}

/// One feed with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub url: String,
    pub interval: Duration,
    pub timeout: Duration,
    pub adapter: AdapterConfig,
}

impl SourceConfig {
    pub fn resolve(&self, kind: SourceKind) -> SourceSettings {
        let (url, interval_secs) = match kind {
            SourceKind::ShortRange => (CHIRPS_GEFS_URL, 3600),
            SourceKind::Seasonal => (IRI_SEASONAL_URL, 6 * 3600),
        };
        let defaults = AdapterConfig::for_kind(kind);

        SourceSettings {
            url: self.url.clone().unwrap_or_else(|| url.to_string()),
            // A zero period would spin.
            interval: Duration::from_secs(self.interval_secs.unwrap_or(interval_secs).max(1)),
            timeout: Duration::from_secs(self.timeout_secs.unwrap_or(60).max(1)),
            adapter: AdapterConfig::new(
                self.precipitation_variable
                    .as_deref()
                    .unwrap_or(defaults.precipitation_variable()),
                self.probability_variable
                    .as_deref()
                    .unwrap_or(defaults.probability_variable()),
                self.horizon.unwrap_or(defaults.horizon()),
            ),
        }
    }
}

/// NetCDF coordinate variable names, most preferred first.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CoordinateConfig {
    pub latitude: Vec<String>,
    pub longitude: Vec<String>,
}

impl Default for CoordinateConfig {
    fn default() -> Self {
        let options = GridOptions::default();
        Self {
            latitude: options.latitude,
            longitude: options.longitude,
        }
    }
}

impl From<&CoordinateConfig> for GridOptions {
    fn from(config: &CoordinateConfig) -> Self {
        Self {
            latitude: config.latitude.clone(),
            longitude: config.longitude.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = ServiceConfig::from_yaml("").unwrap();
        assert_eq!(config, ServiceConfig::default());

        let short = config.source(SourceKind::ShortRange);
        assert_eq!(short.interval, Duration::from_secs(3600));
        assert_eq!(short.adapter.horizon(), 7);
        assert!(short.url.contains("CHIRPS"));

        let seasonal = config.source(SourceKind::Seasonal);
        assert_eq!(seasonal.interval, Duration::from_secs(21600));
        assert_eq!(seasonal.adapter.horizon(), 3);
    }

    #[test]
    fn test_partial_source_override() {
        let yaml = r#"
sources:
  seasonal:
    url: "http://localhost:8080/iri.nc"
    horizon: 6
    precipitation_variable: prcp
"#;
        let config = ServiceConfig::from_yaml(yaml).unwrap();
        let seasonal = config.source(SourceKind::Seasonal);
        assert_eq!(seasonal.url, "http://localhost:8080/iri.nc");
        assert_eq!(seasonal.adapter.horizon(), 6);
        assert_eq!(seasonal.adapter.precipitation_variable(), "prcp");
        assert_eq!(seasonal.adapter.probability_variable(), "probability");
        assert_eq!(seasonal.interval, Duration::from_secs(21600));

        // The other feed is untouched.
        assert_eq!(config.source(SourceKind::ShortRange).adapter.horizon(), 7);
    }

    #[test]
    fn test_sink_variants() {
        let config = ServiceConfig::from_yaml("sink: { type: directory, path: /srv/forecasts }").unwrap();
        assert_eq!(
            config.sink,
            SinkConfig::Directory {
                path: PathBuf::from("/srv/forecasts")
            }
        );

        let config = ServiceConfig::from_yaml("sink: { type: redis }").unwrap();
        assert_eq!(config.sink, SinkConfig::default());

        let config = ServiceConfig::from_yaml("sink: { type: memory }").unwrap();
        assert_eq!(config.sink, SinkConfig::Memory);
    }

    #[test]
    fn test_zero_interval_is_clamped() {
        let config = ServiceConfig::from_yaml("sources: { short_range: { interval_secs: 0 } }").unwrap();
        assert_eq!(config.source(SourceKind::ShortRange).interval, Duration::from_secs(1));
    }

    #[test]
    fn test_custom_location() {
        let yaml = "location: { latitude: 21.0, longitude: -89.6, label: Mérida }";
        let config = ServiceConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.location, Location::new(21.0, -89.6, "Mérida"));
    }

    #[test]
    fn test_unknown_sink_type_is_rejected() {
        assert!(ServiceConfig::from_yaml("sink: { type: s3 }").is_err());
    }

    #[test]
    fn test_sample_config_parses() {
        let config = ServiceConfig::load(&test_utils::sample_config_path()).unwrap();
        assert_eq!(config.location, Location::yucatan_site());
    }
}
