//! Labour Productivity Loss Core Library
//!
//! Converts gridded hourly Wet Bulb Globe Temperature (WBGT) fields into
//! estimated labour productivity loss fractions for three physical
//! work-intensity classes, supporting the Australian Climate Service
//! delivery to Treasury.
//!
//! The computational core is a per-cell Gaussian-CDF damage response with
//! class-specific parameters (Roson & Sartori 2016; ILO 2019); everything
//! else is plumbing around it:
//! - validated time/lat/lon grids with no-data propagation
//! - data-parallel application over time steps
//! - JSON dataset load/store preserving coordinate metadata
//! - a batch runner processing yearly files

// Core types and utilities
pub mod core_types;

// Damage response curves and the scalar estimator
pub mod damage;

// Gridded fields and the parallel grid estimator
pub mod grid;

// Dataset persistence
pub mod io;

// Batch file processing
pub mod batch;

// Re-export core types
pub use core_types::{Celsius, Fraction};

// Re-export the estimator surface
pub use damage::{
    estimate_loss, DamageCurve, EstimateError, IntensityClass, UnknownClassError, WBGT_MAX,
    WBGT_MIN,
};

// Re-export grid types
pub use grid::{
    estimate_loss_grid, GridCoords, GridError, LossGrid, LossSummary, WbgtGrid, NODATAVAL,
};

// Re-export dataset and batch surfaces
pub use batch::{discover_inputs, output_path, process_file, run_batch, BatchError, FileReport};
pub use io::{DatasetError, LossDataset, LossVariable, WbgtDataset};
