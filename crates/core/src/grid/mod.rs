//! Gridded WBGT and productivity-loss fields
//!
//! A field is a time-stacked latitude/longitude grid stored row-major,
//! indexed `[t·nlat·nlon + j·nlon + i]`. Coordinates are carried alongside
//! the cell values and are preserved unchanged through the loss computation.
//! Missing cells use the [`NODATAVAL`] sentinel and propagate as missing.

pub mod apply;

pub use apply::{estimate_loss_grid, LossSummary};

use crate::damage::EstimateError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Sentinel marking a missing/no-data grid cell
pub const NODATAVAL: f64 = -9999.0;

/// Errors raised by grid construction, validation and evaluation
#[derive(Debug, Clone, PartialEq)]
pub enum GridError {
    /// A coordinate axis has no entries
    EmptyAxis {
        /// Axis name ("time", "lat" or "lon")
        axis: &'static str,
    },
    /// The time axis is not strictly increasing
    NonMonotonicTime {
        /// Index of the first out-of-order timestamp
        index: usize,
    },
    /// Cell value count does not match the coordinate axes
    ShapeMismatch {
        /// Cells implied by the coordinate axes
        expected: usize,
        /// Cells actually present
        actual: usize,
    },
    /// A cell value violated the estimator's input contract
    Cell {
        /// Time step index of the failing cell
        time_index: usize,
        /// Latitude index of the failing cell
        lat_index: usize,
        /// Longitude index of the failing cell
        lon_index: usize,
        /// Timestamp of the failing time step
        timestamp: DateTime<Utc>,
        /// The underlying input-contract violation
        source: EstimateError,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::EmptyAxis { axis } => {
                write!(f, "grid {axis} axis is empty")
            }
            GridError::NonMonotonicTime { index } => {
                write!(f, "time axis is not strictly increasing at index {index}")
            }
            GridError::ShapeMismatch { expected, actual } => {
                write!(
                    f,
                    "grid shape mismatch: coordinates imply {expected} cells, got {actual}"
                )
            }
            GridError::Cell {
                time_index,
                lat_index,
                lon_index,
                timestamp,
                source,
            } => {
                write!(
                    f,
                    "invalid cell at {timestamp} (time index {time_index}, \
                     lat index {lat_index}, lon index {lon_index}): {source}"
                )
            }
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridError::Cell { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Coordinate axes shared by input and output grids
///
/// The time axis is hourly in the source data. The validated invariant is
/// strict ordering; irregular spacing is tolerated (subsetted files) but
/// logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCoords {
    /// Time axis, strictly increasing
    pub times: Vec<DateTime<Utc>>,
    /// Latitude axis (degrees north)
    pub lats: Vec<f64>,
    /// Longitude axis (degrees east)
    pub lons: Vec<f64>,
}

impl GridCoords {
    /// Create validated coordinate axes
    ///
    /// # Errors
    /// Returns [`GridError::EmptyAxis`] if any axis is empty and
    /// [`GridError::NonMonotonicTime`] if the time axis is not strictly
    /// increasing.
    pub fn new(
        times: Vec<DateTime<Utc>>,
        lats: Vec<f64>,
        lons: Vec<f64>,
    ) -> Result<Self, GridError> {
        let coords = GridCoords { times, lats, lons };
        coords.validate()?;
        Ok(coords)
    }

    /// Re-check the axis invariants (used after deserialization)
    ///
    /// # Errors
    /// Same conditions as [`GridCoords::new`].
    pub fn validate(&self) -> Result<(), GridError> {
        if self.times.is_empty() {
            return Err(GridError::EmptyAxis { axis: "time" });
        }
        if self.lats.is_empty() {
            return Err(GridError::EmptyAxis { axis: "lat" });
        }
        if self.lons.is_empty() {
            return Err(GridError::EmptyAxis { axis: "lon" });
        }
        if let Some(i) = self.times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(GridError::NonMonotonicTime { index: i + 1 });
        }
        let hourly = self
            .times
            .windows(2)
            .all(|w| w[1] - w[0] == Duration::hours(1));
        if !hourly {
            warn!("time axis is not uniformly hourly; proceeding with ordered timestamps");
        }
        Ok(())
    }

    /// Number of time steps
    #[must_use]
    pub fn n_times(&self) -> usize {
        self.times.len()
    }

    /// Number of latitude rows
    #[must_use]
    pub fn n_lat(&self) -> usize {
        self.lats.len()
    }

    /// Number of longitude columns
    #[must_use]
    pub fn n_lon(&self) -> usize {
        self.lons.len()
    }

    /// Cells in one time step (nlat × nlon)
    #[must_use]
    pub fn cells_per_step(&self) -> usize {
        self.n_lat() * self.n_lon()
    }

    /// Total cells across all time steps
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.n_times() * self.cells_per_step()
    }

    /// Flat index of (time, lat, lon)
    #[inline]
    #[must_use]
    pub fn index(&self, t: usize, j: usize, i: usize) -> usize {
        t * self.cells_per_step() + j * self.n_lon() + i
    }
}

/// Hourly gridded WBGT field (°C), the estimator's input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WbgtGrid {
    coords: GridCoords,
    values: Vec<f64>,
}

impl WbgtGrid {
    /// Create a grid from coordinates and row-major cell values
    ///
    /// Missing cells are marked with [`NODATAVAL`].
    ///
    /// # Errors
    /// Returns [`GridError::ShapeMismatch`] if `values.len()` does not equal
    /// the cell count implied by the axes, or an axis error from
    /// [`GridCoords::validate`].
    pub fn new(coords: GridCoords, values: Vec<f64>) -> Result<Self, GridError> {
        let grid = WbgtGrid { coords, values };
        grid.validate()?;
        Ok(grid)
    }

    /// Re-check shape and axis invariants (used after deserialization)
    ///
    /// # Errors
    /// Same conditions as [`WbgtGrid::new`].
    pub fn validate(&self) -> Result<(), GridError> {
        self.coords.validate()?;
        let expected = self.coords.cell_count();
        if self.values.len() != expected {
            return Err(GridError::ShapeMismatch {
                expected,
                actual: self.values.len(),
            });
        }
        Ok(())
    }

    /// Coordinate axes
    #[must_use]
    pub fn coords(&self) -> &GridCoords {
        &self.coords
    }

    /// Row-major cell values
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Cell value at (time, lat, lon)
    #[inline]
    #[must_use]
    pub fn value(&self, t: usize, j: usize, i: usize) -> f64 {
        self.values[self.coords.index(t, j, i)]
    }
}

/// Hourly gridded fractional productivity loss, the estimator's output
///
/// Same coordinates and layout as the input grid it was computed from. Valid
/// cells hold a fraction in [0, 1]; missing input cells stay [`NODATAVAL`].
/// Created fresh per evaluation and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossGrid {
    coords: GridCoords,
    values: Vec<f64>,
}

impl LossGrid {
    /// Coordinate axes (identical to the source WBGT grid's)
    #[must_use]
    pub fn coords(&self) -> &GridCoords {
        &self.coords
    }

    /// Row-major cell values
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Consume the grid, returning its cell values
    #[must_use]
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }

    /// Cell value at (time, lat, lon)
    #[inline]
    #[must_use]
    pub fn value(&self, t: usize, j: usize, i: usize) -> f64 {
        self.values[self.coords.index(t, j, i)]
    }
}
