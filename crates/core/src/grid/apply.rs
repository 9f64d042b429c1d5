//! Elementwise application of the damage response over a gridded field
//!
//! Each cell's loss depends only on that cell's WBGT and the selected
//! intensity class, so the grid is fanned out across worker threads one time
//! step per chunk with no cross-cell coordination.

use crate::damage::{validate_wbgt, DamageCurve, IntensityClass};
use crate::grid::{GridError, LossGrid, WbgtGrid, NODATAVAL};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Estimate fractional productivity loss for every cell of a WBGT grid
///
/// Output coordinates and layout are identical to the input's. Cells marked
/// [`NODATAVAL`] propagate as [`NODATAVAL`]; they are never coerced to a
/// numeric loss. Evaluation order is unobservable: cells are independent.
///
/// # Errors
/// Returns [`GridError::Cell`] identifying the first cell (time step,
/// lat/lon index, timestamp) whose value is non-finite or outside the
/// plausible physical range.
pub fn estimate_loss_grid(
    grid: &WbgtGrid,
    class: IntensityClass,
) -> Result<LossGrid, GridError> {
    let curve = DamageCurve::for_class(class);
    let coords = grid.coords();
    let step = coords.cells_per_step();
    let nlon = coords.n_lon();

    let mut values = vec![NODATAVAL; grid.values().len()];
    values
        .par_chunks_mut(step)
        .zip(grid.values().par_chunks(step))
        .enumerate()
        .try_for_each(|(t, (out_step, in_step))| {
            for (cell, (out, &wbgt)) in out_step.iter_mut().zip(in_step.iter()).enumerate() {
                if wbgt == NODATAVAL {
                    continue;
                }
                validate_wbgt(wbgt).map_err(|source| GridError::Cell {
                    time_index: t,
                    lat_index: cell / nlon,
                    lon_index: cell % nlon,
                    timestamp: coords.times[t],
                    source,
                })?;
                *out = curve.loss(wbgt).value();
            }
            Ok(())
        })?;

    Ok(LossGrid {
        coords: coords.clone(),
        values,
    })
}

/// Summary statistics of a loss grid's valid cells, for batch logging
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LossSummary {
    /// Cells holding a loss fraction
    pub valid_cells: usize,
    /// Cells carrying the no-data sentinel
    pub nodata_cells: usize,
    /// Smallest valid loss (NaN when no valid cells)
    pub min: f64,
    /// Mean valid loss (NaN when no valid cells)
    pub mean: f64,
    /// Largest valid loss (NaN when no valid cells)
    pub max: f64,
}

impl LossGrid {
    /// Summarize valid cells (min/mean/max), counting no-data cells apart
    #[must_use]
    pub fn summary(&self) -> LossSummary {
        let mut valid_cells = 0usize;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;

        for &v in self.values() {
            if v == NODATAVAL {
                continue;
            }
            valid_cells += 1;
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }

        let nodata_cells = self.values().len() - valid_cells;
        if valid_cells == 0 {
            return LossSummary {
                valid_cells,
                nodata_cells,
                min: f64::NAN,
                mean: f64::NAN,
                max: f64::NAN,
            };
        }
        LossSummary {
            valid_cells,
            nodata_cells,
            min,
            mean: sum / valid_cells as f64,
            max,
        }
    }
}

impl fmt::Display for LossSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "valid={} nodata={} min={:.4} mean={:.4} max={:.4}",
            self.valid_cells, self.nodata_cells, self.min, self.mean, self.max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::estimate_loss;
    use crate::grid::GridCoords;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn hourly_times(n: usize) -> Vec<DateTime<Utc>> {
        let start = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|h| start + Duration::hours(i64::try_from(h).unwrap()))
            .collect()
    }

    fn grid_2x2(values: Vec<f64>) -> WbgtGrid {
        let coords =
            GridCoords::new(hourly_times(1), vec![-35.0, -34.9], vec![149.0, 149.1]).unwrap();
        WbgtGrid::new(coords, values).unwrap()
    }

    #[test]
    fn test_grid_matches_scalar_estimator() {
        let grid = grid_2x2(vec![22.0, 28.0, 33.5, 41.0]);
        let loss = estimate_loss_grid(&grid, IntensityClass::Medium).unwrap();

        for (idx, &wbgt) in grid.values().iter().enumerate() {
            let expected = estimate_loss(wbgt, IntensityClass::Medium).unwrap();
            assert_eq!(loss.values()[idx], expected.value());
        }
    }

    #[test]
    fn test_coordinates_preserved() {
        let grid = grid_2x2(vec![25.0; 4]);
        let loss = estimate_loss_grid(&grid, IntensityClass::High).unwrap();
        assert_eq!(loss.coords(), grid.coords());
    }

    #[test]
    fn test_nodata_propagates() {
        let grid = grid_2x2(vec![25.0, NODATAVAL, 30.0, 35.0]);
        let loss = estimate_loss_grid(&grid, IntensityClass::Low).unwrap();

        assert_eq!(loss.value(0, 0, 1), NODATAVAL);
        assert!(loss.value(0, 0, 0) >= 0.0 && loss.value(0, 0, 0) <= 1.0);
        assert!(loss.value(0, 1, 0) >= 0.0 && loss.value(0, 1, 0) <= 1.0);
        assert!(loss.value(0, 1, 1) >= 0.0 && loss.value(0, 1, 1) <= 1.0);
    }

    #[test]
    fn test_invalid_cell_reports_location() {
        let coords =
            GridCoords::new(hourly_times(2), vec![-35.0, -34.9], vec![149.0, 149.1]).unwrap();
        let mut values = vec![25.0; 8];
        values[coords.index(1, 0, 1)] = f64::NAN;
        let grid = WbgtGrid::new(coords, values).unwrap();

        let err = estimate_loss_grid(&grid, IntensityClass::Medium).unwrap_err();
        match err {
            GridError::Cell {
                time_index,
                lat_index,
                lon_index,
                ..
            } => {
                assert_eq!(time_index, 1);
                assert_eq!(lat_index, 0);
                assert_eq!(lon_index, 1);
            }
            other => panic!("expected Cell error, got {other:?}"),
        }
    }

    #[test]
    fn test_summary_skips_nodata() {
        let grid = grid_2x2(vec![33.5, NODATAVAL, 33.5, 33.5]);
        let loss = estimate_loss_grid(&grid, IntensityClass::Medium).unwrap();
        let summary = loss.summary();

        assert_eq!(summary.valid_cells, 3);
        assert_eq!(summary.nodata_cells, 1);
        assert!((summary.mean - 0.5).abs() < 1e-12);
        assert!((summary.min - 0.5).abs() < 1e-12);
        assert!((summary.max - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_summary_of_all_nodata_grid() {
        let grid = grid_2x2(vec![NODATAVAL; 4]);
        let loss = estimate_loss_grid(&grid, IntensityClass::Low).unwrap();
        let summary = loss.summary();

        assert_eq!(summary.valid_cells, 0);
        assert_eq!(summary.nodata_cells, 4);
        assert!(summary.mean.is_nan());
    }
}
