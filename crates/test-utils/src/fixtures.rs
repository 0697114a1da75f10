//! Common test fixtures for forecast-sync tests.

use forecast_common::GridDataset;

use crate::generators::create_indexed_series;
use crate::netcdf::{AttrValue, ClassicFileBuilder, NcValues};

/// Three-cell scenario where the site sits exactly on cell 1.
pub mod scenario {
    pub const LATITUDES: [f64; 3] = [20.0, 20.6537, 21.0];
    pub const LONGITUDES: [f64; 3] = [-88.0, -88.446, -89.0];
    pub const PRECIPITATION: [f64; 3] = [1.0, 3.0, 9.0];
    pub const RESOLVED_INDEX: usize = 1;
}

/// Upstream feed URLs.
pub mod urls {
    pub const CHIRPS_GEFS: &str =
        "https://iridl.ldeo.columbia.edu/SOURCES/.CHIRPS/.GEFS/.reforecast/.HINDCAST/.Precipitation/data.nc";
    pub const IRI_SEASONAL: &str =
        "https://iridl.ldeo.columbia.edu/SOURCES/.IRI/.FD/.Seasonal_Forecast/.Precipitation/data.nc";
}

/// The three-cell scenario grid with a plain per-cell precipitation array.
pub fn scenario_grid() -> GridDataset {
    GridDataset::new(scenario::LATITUDES.to_vec(), scenario::LONGITUDES.to_vec())
        .and_then(|g| g.with_variable("precipitation", scenario::PRECIPITATION.to_vec()))
        .expect("scenario grid is well-formed")
}

/// A NetCDF classic payload over the scenario cells with a `T` record axis.
///
/// Precipitation step `t` of cell `i` is `t * 100 + i` mm scaled by 0.01 and
/// packed as shorts; probability is a constant 40 % stored as floats.
pub fn scenario_netcdf(steps: usize) -> Vec<u8> {
    let cells = scenario::LATITUDES.len();
    let packed: Vec<i16> = create_indexed_series(cells, steps)
        .into_iter()
        .map(|v| v as i16)
        .collect();

    ClassicFileBuilder::new()
        .record_dimension("T", steps)
        .dimension("cell", cells)
        .global_attribute("title", AttrValue::Text("CHIRPS-GEFS precipitation".into()))
        .variable("latitude", &["cell"], NcValues::Double(scenario::LATITUDES.to_vec()))
        .variable("longitude", &["cell"], NcValues::Double(scenario::LONGITUDES.to_vec()))
        .variable("precipitation", &["T", "cell"], NcValues::Short(packed))
        .attribute("precipitation", "scale_factor", AttrValue::Double(vec![0.01]))
        .attribute("precipitation", "units", AttrValue::Text("mm".into()))
        .variable("probability", &["T", "cell"], NcValues::Float(vec![40.0; cells * steps]))
        .build()
}

/// A payload no decoder accepts.
pub const GARBAGE_PAYLOAD: &[u8] = b"<html><body>503 Service Unavailable</body></html>";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_grid_shape() {
        let grid = scenario_grid();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid.value("precipitation", scenario::RESOLVED_INDEX).unwrap(), 3.0);
    }

    #[test]
    fn test_scenario_netcdf_magic() {
        let bytes = scenario_netcdf(7);
        assert_eq!(&bytes[..4], b"CDF\x01");
    }
}
