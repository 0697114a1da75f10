//! Mapping NetCDF variables onto a cell-indexed [`GridDataset`].

use forecast_common::GridDataset;
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::file::{NetCdfFile, VariableInfo};

/// Which coordinate variables to look for, in order of preference.
#[derive(Debug, Clone, PartialEq)]
pub struct GridOptions {
    pub latitude: Vec<String>,
    pub longitude: Vec<String>,
}

impl Default for GridOptions {
    fn default() -> Self {
        Self {
            latitude: vec!["latitude".into(), "lat".into(), "Y".into()],
            longitude: vec!["longitude".into(), "lon".into(), "X".into()],
        }
    }
}

/// How coordinates map onto cells.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CellLayout {
    /// Latitude and longitude share their dimensions; one cell per element.
    Shared(Vec<String>),
    /// Independent 1-D axes; cells are the lat-major product.
    Axes { lat_dim: String, lon_dim: String },
}

impl CellLayout {
    fn cell_dims(&self) -> Vec<String> {
        match self {
            Self::Shared(dims) => dims.clone(),
            Self::Axes { lat_dim, lon_dim } => vec![lat_dim.clone(), lon_dim.clone()],
        }
    }
}

fn find_variable(file: &NetCdfFile, candidates: &[String]) -> Option<VariableInfo> {
    candidates.iter().find_map(|name| file.variable(name))
}

/// Build a grid dataset from a parsed file.
///
/// Every numeric variable whose trailing dimensions are the cell dimensions
/// is included. Leading dimensions become the time axis; at most one of them
/// may be longer than 1. Other variables are skipped.
pub fn to_grid_dataset(file: &mut NetCdfFile, options: &GridOptions) -> NetCdfResult<GridDataset> {
    let lat_var = find_variable(file, &options.latitude)
        .ok_or_else(|| NetCdfError::MissingData(format!("latitude (tried {:?})", options.latitude)))?;
    let lon_var = find_variable(file, &options.longitude)
        .ok_or_else(|| NetCdfError::MissingData(format!("longitude (tried {:?})", options.longitude)))?;

    let layout = if lat_var.dimensions == lon_var.dimensions {
        CellLayout::Shared(lat_var.dimensions.clone())
    } else if let ([lat_dim], [lon_dim]) = (lat_var.dimensions.as_slice(), lon_var.dimensions.as_slice()) {
        CellLayout::Axes {
            lat_dim: lat_dim.clone(),
            lon_dim: lon_dim.clone(),
        }
    } else {
        return Err(NetCdfError::InvalidFormat(format!(
            "cannot pair coordinates {:?} and {:?}",
            lat_var.dimensions, lon_var.dimensions
        )));
    };

    let raw_lats = file.read_unpacked(&lat_var.name)?;
    let raw_lons = file.read_unpacked(&lon_var.name)?;

    let (latitudes, longitudes) = match layout {
        CellLayout::Shared(_) => (raw_lats, raw_lons),
        CellLayout::Axes { .. } => {
            let n = raw_lats.len() * raw_lons.len();
            let mut lats = Vec::with_capacity(n);
            let mut lons = Vec::with_capacity(n);
            for &lat in &raw_lats {
                for &lon in &raw_lons {
                    lats.push(lat);
                    lons.push(lon);
                }
            }
            (lats, lons)
        }
    };

    let mut dataset = GridDataset::new(latitudes, longitudes)?;
    let cell_dims = layout.cell_dims();

    for var in file.variables() {
        if var.name == lat_var.name || var.name == lon_var.name || !var.is_numeric() {
            continue;
        }
        if !var.dimensions.ends_with(&cell_dims) {
            debug!(variable = %var.name, dims = ?var.dimensions, "Skipping non-grid variable");
            continue;
        }

        let leading = &var.shape[..var.shape.len() - cell_dims.len()];
        if leading.iter().filter(|&&len| len > 1).count() > 1 {
            debug!(variable = %var.name, dims = ?var.dimensions, "Skipping variable with several forecast axes");
            continue;
        }
        let steps = leading.iter().product::<usize>();

        let values = file.read_unpacked(&var.name)?;
        dataset.insert(var.name, values, steps)?;
    }

    debug!(
        cells = dataset.len(),
        variables = ?dataset.variable_names().collect::<Vec<_>>(),
        "Decoded NetCDF grid"
    );

    Ok(dataset)
}
