//! Error types for NetCDF parsing operations.

use forecast_common::ForecastError;
use thiserror::Error;

/// Result type for NetCDF parser operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF parsing.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// Decoded arrays do not form a valid grid
    #[error(transparent)]
    Grid(#[from] ForecastError),
}

impl From<NetCdfError> for ForecastError {
    fn from(e: NetCdfError) -> Self {
        match e {
            NetCdfError::MissingData(name) => ForecastError::MissingVariable(name),
            NetCdfError::InvalidFormat(msg) => ForecastError::Decode(msg),
            NetCdfError::Grid(inner) => inner,
        }
    }
}
