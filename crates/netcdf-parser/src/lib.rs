//! NetCDF classic reader for gridded precipitation feeds.
//!
//! Both upstream feeds publish NetCDF classic (CDF-1) or 64-bit offset
//! (CDF-2) files. This crate reads them from memory with the pure-Rust
//! `netcdf3` crate, applies CF packing attributes, and maps the result onto
//! a [`forecast_common::GridDataset`].
//!
//! # Example
//!
//! ```ignore
//! use netcdf_parser::{decode_grid, GridOptions};
//!
//! let grid = decode_grid(bytes, &GridOptions::default())?;
//! let precipitation = grid.require("precipitation")?;
//! ```
//!
//! NetCDF-4 (HDF5) files are not supported and fail the magic-number check.

pub mod error;
pub mod file;
pub mod grid;

pub use error::{NetCdfError, NetCdfResult};
pub use file::{is_classic, NetCdfFile, VariableInfo};
pub use grid::{to_grid_dataset, GridOptions};

use bytes::Bytes;
use forecast_common::GridDataset;

/// Parse `data` and build a grid dataset from it.
pub fn decode_grid(data: impl Into<Bytes>, options: &GridOptions) -> NetCdfResult<GridDataset> {
    let mut file = NetCdfFile::from_bytes(data)?;
    to_grid_dataset(&mut file, options)
}
