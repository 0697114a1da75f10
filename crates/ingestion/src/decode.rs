//! Grid decoding at the upstream boundary.
//!
//! Payloads are classified by their leading bytes before anything reads
//! them, so a feed that starts returning an HTML error page or an
//! unsupported format is rejected as a decode failure up front.

use std::collections::BTreeMap;

use bytes::Bytes;
use forecast_common::{ForecastError, ForecastResult, GridDataset};
use netcdf_parser::GridOptions;
use serde::Deserialize;
use tracing::debug;

const HDF5_MAGIC: &[u8] = b"\x89HDF";

/// JSON grid document.
///
/// Each variable holds either one value per cell or `timeSteps` values per
/// cell stored time-major. `null` marks a missing value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonGrid {
    pub latitude: Vec<f64>,
    pub longitude: Vec<f64>,
    #[serde(default)]
    pub time_steps: Option<usize>,
    pub variables: BTreeMap<String, Vec<Option<f64>>>,
}

impl JsonGrid {
    pub fn into_dataset(self) -> ForecastResult<GridDataset> {
        let mut dataset = GridDataset::new(self.latitude, self.longitude)?;
        let cells = dataset.len();
        let time_steps = self.time_steps.unwrap_or(1).max(1);

        let expected = time_steps.checked_mul(cells).ok_or_else(|| {
            ForecastError::Decode(format!("{} time steps overflow a grid of {} cells", time_steps, cells))
        })?;

        for (name, values) in self.variables {
            let steps = if values.len() == cells {
                1
            } else if values.len() == expected {
                time_steps
            } else {
                return Err(ForecastError::Decode(format!(
                    "variable '{}' has {} values for {} cells and {} time steps",
                    name,
                    values.len(),
                    cells,
                    time_steps
                )));
            };
            let values = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
            dataset.insert(name, values, steps)?;
        }

        Ok(dataset)
    }
}

/// An upstream payload, classified by format.
#[derive(Debug, Clone)]
pub enum RawPayload {
    /// NetCDF classic or 64-bit offset file.
    NetCdf(Bytes),
    /// JSON grid document, already parsed.
    JsonGrid(JsonGrid),
}

impl RawPayload {
    /// Classify `raw` by its leading bytes.
    pub fn sniff(raw: &Bytes) -> ForecastResult<Self> {
        if netcdf_parser::is_classic(raw) {
            return Ok(Self::NetCdf(raw.clone()));
        }
        if raw.starts_with(HDF5_MAGIC) {
            return Err(ForecastError::Decode(
                "NetCDF-4/HDF5 payloads are not supported".to_string(),
            ));
        }

        match raw.iter().find(|b| !b.is_ascii_whitespace()) {
            Some(b'{') => serde_json::from_slice(raw)
                .map(Self::JsonGrid)
                .map_err(|e| ForecastError::Decode(format!("invalid JSON grid: {}", e))),
            Some(_) => {
                let preview: String = String::from_utf8_lossy(&raw[..raw.len().min(32)])
                    .chars()
                    .filter(|c| !c.is_control())
                    .collect();
                Err(ForecastError::Decode(format!(
                    "unrecognised payload ({} bytes, starts with {:?})",
                    raw.len(),
                    preview
                )))
            }
            None => Err(ForecastError::Decode("empty payload".to_string())),
        }
    }
}

/// Turns raw bytes into a grid dataset.
pub trait GridDecoder: Send + Sync {
    fn decode(&self, raw: &Bytes) -> ForecastResult<GridDataset>;
}

/// Decoder for every format [`RawPayload`] recognises.
#[derive(Debug, Clone, Default)]
pub struct PayloadDecoder {
    netcdf: GridOptions,
}

impl PayloadDecoder {
    pub fn new(netcdf: GridOptions) -> Self {
        Self { netcdf }
    }
}

impl GridDecoder for PayloadDecoder {
    fn decode(&self, raw: &Bytes) -> ForecastResult<GridDataset> {
        let dataset = match RawPayload::sniff(raw)? {
            RawPayload::NetCdf(bytes) => netcdf_parser::decode_grid(bytes, &self.netcdf)?,
            RawPayload::JsonGrid(grid) => grid.into_dataset()?,
        };
        debug!(cells = dataset.len(), "Decoded payload");
        Ok(dataset)
    }
}
