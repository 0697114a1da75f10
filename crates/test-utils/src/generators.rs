//! Test data generators for synthetic precipitation grids.
//!
//! These produce predictable, verifiable values so tests can assert on exact
//! cells and forecast steps.

use forecast_common::GridDataset;
use serde_json::{json, Map, Value};

/// Creates parallel coordinate arrays for a regular `rows x cols` grid.
///
/// Cells are ordered lat-major starting at `(origin_lat, origin_lon)` and
/// stepping `spacing` degrees north and east.
///
/// ```
/// use test_utils::create_cell_coordinates;
///
/// let (lats, lons) = create_cell_coordinates(2, 3, 20.0, -89.0, 0.5);
/// assert_eq!(lats, vec![20.0, 20.0, 20.0, 20.5, 20.5, 20.5]);
/// assert_eq!(lons[..3], [-89.0, -88.5, -88.0]);
/// ```
pub fn create_cell_coordinates(
    rows: usize,
    cols: usize,
    origin_lat: f64,
    origin_lon: f64,
    spacing: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut lats = Vec::with_capacity(rows * cols);
    let mut lons = Vec::with_capacity(rows * cols);
    for row in 0..rows {
        for col in 0..cols {
            lats.push(origin_lat + row as f64 * spacing);
            lons.push(origin_lon + col as f64 * spacing);
        }
    }
    (lats, lons)
}

/// Creates a time-major series where each value encodes its position.
///
/// Step `t` of cell `i` is `t * 100 + i`, so `values[t * cells + i]` can be
/// checked directly.
pub fn create_indexed_series(cells: usize, steps: usize) -> Vec<f64> {
    (0..steps)
        .flat_map(|t| (0..cells).map(move |i| (t * 100 + i) as f64))
        .collect()
}

/// Creates precipitation-like values in mm, time-major.
///
/// Most values are 0; some are up to 50mm. Deterministic for a given seed.
pub fn create_precipitation_series(cells: usize, steps: usize, seed: u32) -> Vec<f64> {
    let mut data = Vec::with_capacity(cells * steps);
    for t in 0..steps {
        for i in 0..cells {
            let hash = simple_hash(i as u32, t as u32, seed);
            let precip = if hash % 4 == 0 {
                (hash % 5000) as f64 / 100.0
            } else {
                0.0
            };
            data.push(precip);
        }
    }
    data
}

/// Creates probability-of-precipitation values in percent, time-major.
pub fn create_probability_series(cells: usize, steps: usize, seed: u32) -> Vec<f64> {
    (0..steps)
        .flat_map(|t| (0..cells).map(move |i| (simple_hash(i as u32, t as u32, seed) % 101) as f64))
        .collect()
}

/// Simple deterministic hash for reproducible test data.
fn simple_hash(x: u32, y: u32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_mul(31).wrapping_add(x);
    h = h.wrapping_mul(31).wrapping_add(y);
    h ^= h >> 16;
    h = h.wrapping_mul(0x85ebca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2ae35);
    h ^= h >> 16;
    h
}

/// A 5x5 grid at 0.25° spacing around the Yucatán site with `steps`
/// forecast steps of `precipitation` and `probability`.
///
/// Cell 12 (the centre) is closest to the site.
pub fn create_yucatan_grid(steps: usize, seed: u32) -> GridDataset {
    let (lats, lons) = create_cell_coordinates(5, 5, 20.1537, -88.946, 0.25);
    let cells = lats.len();
    GridDataset::new(lats, lons)
        .and_then(|g| g.with_series("precipitation", steps, create_precipitation_series(cells, steps, seed)))
        .and_then(|g| g.with_series("probability", steps, create_probability_series(cells, steps, seed)))
        .expect("synthetic grid is well-formed")
}

/// Serialize a dataset as a JSON grid document.
///
/// ```json
/// { "latitude": [...], "longitude": [...], "timeSteps": 7, "variables": { "precipitation": [...] } }
/// ```
///
/// `timeSteps` is written when any variable has more than one step.
pub fn json_grid_payload(dataset: &GridDataset) -> Vec<u8> {
    let mut variables = Map::new();
    let mut time_steps = 1;
    for name in dataset.variable_names() {
        if let Some(var) = dataset.variable(name) {
            time_steps = time_steps.max(var.steps());
            variables.insert(name.to_string(), json!(var.values()));
        }
    }

    let mut doc = json!({
        "latitude": dataset.latitudes(),
        "longitude": dataset.longitudes(),
        "variables": Value::Object(variables),
    });
    if time_steps > 1 {
        doc["timeSteps"] = json!(time_steps);
    }

    serde_json::to_vec(&doc).expect("JSON grid serializes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_common::{resolve, Location};

    #[test]
    fn test_indexed_series_layout() {
        let values = create_indexed_series(3, 2);
        assert_eq!(values, vec![0.0, 1.0, 2.0, 100.0, 101.0, 102.0]);
    }

    #[test]
    fn test_precipitation_series_is_deterministic() {
        let a = create_precipitation_series(10, 7, 42);
        let b = create_precipitation_series(10, 7, 42);
        assert_eq!(a, b);
        assert!(a.iter().all(|&v| (0.0..=50.0).contains(&v)));
    }

    #[test]
    fn test_probability_range() {
        let values = create_probability_series(25, 3, 7);
        assert!(values.iter().all(|&v| (0.0..=100.0).contains(&v)));
    }

    #[test]
    fn test_yucatan_grid_centre_is_nearest() {
        let grid = create_yucatan_grid(7, 1);
        assert_eq!(grid.len(), 25);
        assert_eq!(resolve(Location::yucatan_site().target(), &grid).unwrap(), 12);
    }

    #[test]
    fn test_json_payload_fields() {
        let grid = create_yucatan_grid(3, 1);
        let doc: Value = serde_json::from_slice(&json_grid_payload(&grid)).unwrap();
        assert_eq!(doc["timeSteps"], 3);
        assert_eq!(doc["latitude"].as_array().unwrap().len(), 25);
        assert_eq!(doc["variables"]["precipitation"].as_array().unwrap().len(), 75);
    }
}
