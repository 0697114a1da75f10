//! Gridded datasets and nearest-cell resolution.
//!
//! A [`GridDataset`] stores one coordinate pair per cell in two parallel
//! arrays plus any number of named measurement variables aligned with those
//! cells. A variable may also carry a leading time axis, in which case its
//! values are stored time-major: step `t` of cell `i` lives at `t * N + i`.

use std::collections::BTreeMap;

use crate::error::{ForecastError, ForecastResult};
use crate::location::LatLon;

/// A measurement variable aligned with the dataset's cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    values: Vec<f64>,
    steps: usize,
}

impl Variable {
    /// Number of time steps (1 for a plain per-cell array).
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// Which axis forecast offsets were read along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastAxis {
    /// Offsets walk a real time dimension; the cell index stays fixed.
    Time,
    /// Offsets walk consecutive cell positions. Only meaningful for feeds that
    /// pack their forecast steps next to each other along the cell axis.
    Cells,
}

/// Consecutive forecast values read for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub axis: ForecastAxis,
    pub values: Vec<f64>,
}

/// Parallel latitude/longitude arrays plus index-aligned variables.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridDataset {
    latitudes: Vec<f64>,
    longitudes: Vec<f64>,
    variables: BTreeMap<String, Variable>,
}

impl GridDataset {
    /// Create a dataset from parallel coordinate arrays.
    ///
    /// Zero cells is allowed here; [`resolve`] rejects it.
    pub fn new(latitudes: Vec<f64>, longitudes: Vec<f64>) -> ForecastResult<Self> {
        if latitudes.len() != longitudes.len() {
            return Err(ForecastError::Decode(format!(
                "latitude has {} cells but longitude has {}",
                latitudes.len(),
                longitudes.len()
            )));
        }

        Ok(Self {
            latitudes,
            longitudes,
            variables: BTreeMap::new(),
        })
    }

    /// Add a variable with `steps` time steps stored time-major.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>, steps: usize) -> ForecastResult<()> {
        let name = name.into();
        let steps = steps.max(1);
        let expected = steps.checked_mul(self.len()).ok_or_else(|| {
            ForecastError::Decode(format!(
                "variable '{}' declares {} steps, too many for {} cells",
                name,
                steps,
                self.len()
            ))
        })?;

        if values.len() != expected {
            return Err(ForecastError::Decode(format!(
                "variable '{}' has {} values, expected {} ({} steps x {} cells)",
                name,
                values.len(),
                expected,
                steps,
                self.len()
            )));
        }

        self.variables.insert(name, Variable { values, steps });
        Ok(())
    }

    /// Builder form of [`insert`](Self::insert) for a plain per-cell variable.
    pub fn with_variable(mut self, name: impl Into<String>, values: Vec<f64>) -> ForecastResult<Self> {
        self.insert(name, values, 1)?;
        Ok(self)
    }

    /// Builder form of [`insert`](Self::insert) for a time-major variable.
    pub fn with_series(
        mut self,
        name: impl Into<String>,
        steps: usize,
        values: Vec<f64>,
    ) -> ForecastResult<Self> {
        self.insert(name, values, steps)?;
        Ok(self)
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.latitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latitudes.is_empty()
    }

    pub fn latitudes(&self) -> &[f64] {
        &self.latitudes
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.longitudes
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(String::as_str)
    }

    /// Look up a variable, failing with `MissingVariable` if absent.
    pub fn require(&self, name: &str) -> ForecastResult<&Variable> {
        self.variables
            .get(name)
            .ok_or_else(|| ForecastError::MissingVariable(name.to_string()))
    }

    /// Value of the first time step at `index`.
    pub fn value(&self, name: &str, index: usize) -> ForecastResult<f64> {
        let variable = self.require(name)?;
        variable
            .values
            .get(index)
            .copied()
            .ok_or_else(|| ForecastError::InsufficientHorizon {
                variable: name.to_string(),
                required: index + 1,
                available: variable.values.len(),
            })
    }

    /// Read `horizon` consecutive forecast values for the cell at `index`.
    ///
    /// Variables with a time axis are read along it. Variables without one
    /// fall back to consecutive cell positions starting at `index`.
    pub fn series(&self, name: &str, index: usize, horizon: usize) -> ForecastResult<Series> {
        let variable = self.require(name)?;
        let n = self.len();

        if variable.steps > 1 {
            if horizon > variable.steps || index >= n {
                return Err(ForecastError::InsufficientHorizon {
                    variable: name.to_string(),
                    required: horizon,
                    available: if index < n { variable.steps } else { 0 },
                });
            }
            let values = (0..horizon).map(|t| variable.values[t * n + index]).collect();
            return Ok(Series {
                axis: ForecastAxis::Time,
                values,
            });
        }

        let available = n.saturating_sub(index);
        if horizon > available {
            return Err(ForecastError::InsufficientHorizon {
                variable: name.to_string(),
                required: horizon,
                available,
            });
        }

        Ok(Series {
            axis: ForecastAxis::Cells,
            values: variable.values[index..index + horizon].to_vec(),
        })
    }
}

/// Index of the cell nearest to `target`.
pub fn resolve(target: LatLon, dataset: &GridDataset) -> ForecastResult<usize> {
    resolve_with_distance(target, dataset).map(|(index, _)| index)
}

/// Index of the cell nearest to `target` plus its distance in degrees.
///
/// Squared Euclidean distance in degree space, linear scan, no maximum
/// radius. Ties keep the lowest index. Cells with NaN coordinates never win
/// unless every cell is NaN, in which case index 0 is returned.
pub fn resolve_with_distance(target: LatLon, dataset: &GridDataset) -> ForecastResult<(usize, f64)> {
    if dataset.is_empty() {
        return Err(ForecastError::EmptyDataset);
    }

    let cell_distance = |i: usize| {
        let d = target.squared_distance(dataset.latitudes[i], dataset.longitudes[i]);
        if d.is_nan() {
            f64::INFINITY
        } else {
            d
        }
    };

    let mut best_index = 0;
    let mut best_distance = cell_distance(0);

    for i in 1..dataset.len() {
        let d = cell_distance(i);
        if d < best_distance {
            best_distance = d;
            best_index = i;
        }
    }

    Ok((best_index, best_distance.sqrt()))
}
