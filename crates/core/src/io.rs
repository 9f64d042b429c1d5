//! Gridded dataset persistence
//!
//! Reads hourly WBGT datasets and writes productivity-loss datasets as JSON
//! documents carrying the variable values, the coordinate axes and the
//! attribute dictionaries. Coordinate metadata passes through the pipeline
//! unchanged: the output dataset's axes are the input dataset's axes.

use crate::damage::IntensityClass;
use crate::grid::{GridCoords, GridError, LossGrid, WbgtGrid};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Errors that can occur while loading or storing datasets
#[derive(Debug)]
pub enum DatasetError {
    /// Failed to read the file
    LoadFailed(String),
    /// Failed to parse file contents
    ParseFailed(String),
    /// Parsed dataset violates a grid invariant
    InvalidGrid(GridError),
    /// Failed to serialize the dataset
    SerializeFailed(String),
    /// Failed to write the file
    SaveFailed(String),
}

impl fmt::Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::LoadFailed(msg) => write!(f, "failed to load dataset: {msg}"),
            DatasetError::ParseFailed(msg) => write!(f, "failed to parse dataset: {msg}"),
            DatasetError::InvalidGrid(err) => write!(f, "dataset grid is invalid: {err}"),
            DatasetError::SerializeFailed(msg) => {
                write!(f, "failed to serialize dataset: {msg}")
            }
            DatasetError::SaveFailed(msg) => write!(f, "failed to save dataset: {msg}"),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::InvalidGrid(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GridError> for DatasetError {
    fn from(err: GridError) -> Self {
        DatasetError::InvalidGrid(err)
    }
}

/// An hourly WBGT input dataset: one named variable on a coordinate grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WbgtDataset {
    /// Variable name (`wbgtAdjust` for the bias-adjusted delivery files)
    pub variable: String,
    /// Global attribute dictionary
    pub attrs: FxHashMap<String, String>,
    /// The gridded field itself
    pub grid: WbgtGrid,
}

impl WbgtDataset {
    /// Wrap a grid as a dataset with no attributes
    #[must_use]
    pub fn new(variable: impl Into<String>, grid: WbgtGrid) -> Self {
        WbgtDataset {
            variable: variable.into(),
            attrs: FxHashMap::default(),
            grid,
        }
    }

    /// Load a WBGT dataset from a JSON file and validate its grid
    ///
    /// # Errors
    /// Returns [`DatasetError::LoadFailed`] / [`DatasetError::ParseFailed`]
    /// for I/O and syntax problems, and [`DatasetError::InvalidGrid`] when
    /// the parsed coordinates and cell values are inconsistent.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let contents =
            fs::read_to_string(path).map_err(|e| DatasetError::LoadFailed(e.to_string()))?;
        let dataset: Self = serde_json::from_str(&contents)
            .map_err(|e| DatasetError::ParseFailed(e.to_string()))?;
        dataset.grid.validate()?;
        Ok(dataset)
    }

    /// Save the dataset to a JSON file
    ///
    /// # Errors
    /// Returns [`DatasetError::SerializeFailed`] or
    /// [`DatasetError::SaveFailed`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| DatasetError::SerializeFailed(e.to_string()))?;
        fs::write(path, contents).map_err(|e| DatasetError::SaveFailed(e.to_string()))?;
        Ok(())
    }
}

/// One productivity-loss variable of an output dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossVariable {
    /// Variable name (`productivity_loss_low` / `_medium` / `_high`)
    pub name: String,
    /// Variable attribute dictionary (long_name, units)
    pub attrs: FxHashMap<String, String>,
    /// Row-major cell values on the dataset's coordinate grid
    pub values: Vec<f64>,
}

/// A productivity-loss output dataset: the three class variables on the
/// source dataset's coordinate grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossDataset {
    /// Coordinate axes, copied unchanged from the input dataset
    pub coords: GridCoords,
    /// Loss variables, one per intensity class
    pub variables: Vec<LossVariable>,
    /// Global attribute dictionary
    pub attrs: FxHashMap<String, String>,
}

impl LossDataset {
    /// Assemble an output dataset from per-class loss grids
    ///
    /// Global and per-variable attributes follow the delivery convention:
    /// losses are unitless fractions ("1") and the global metadata names the
    /// damage-function provenance.
    #[must_use]
    pub fn assemble(coords: GridCoords, losses: Vec<(IntensityClass, LossGrid)>) -> Self {
        let variables = losses
            .into_iter()
            .map(|(class, loss)| {
                debug_assert_eq!(loss.coords(), &coords);
                let mut attrs = FxHashMap::default();
                attrs.insert("long_name".to_string(), class.long_name().to_string());
                attrs.insert("units".to_string(), "1".to_string());
                LossVariable {
                    name: class.output_variable().to_string(),
                    attrs,
                    values: loss.into_values(),
                }
            })
            .collect();

        let mut attrs = FxHashMap::default();
        attrs.insert(
            "title".to_string(),
            "Hourly labour productivity damage due to humid heat stress".to_string(),
        );
        attrs.insert(
            "source".to_string(),
            "WBGT bias-adjusted input, IGR damage function".to_string(),
        );
        attrs.insert(
            "units".to_string(),
            "change in labour productivity".to_string(),
        );
        attrs.insert(
            "references".to_string(),
            "Roson & Sartori (2016); ILO (2019); Kjellstrom et al. (2009); Kompas et al (2018)"
                .to_string(),
        );

        LossDataset {
            coords,
            variables,
            attrs,
        }
    }

    /// Look up a loss variable by name
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&LossVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Check coordinate and per-variable shape invariants
    ///
    /// # Errors
    /// Returns [`GridError::ShapeMismatch`] for a variable whose cell count
    /// does not match the axes, or an axis error from
    /// [`GridCoords::validate`].
    pub fn validate(&self) -> Result<(), GridError> {
        self.coords.validate()?;
        let expected = self.coords.cell_count();
        for variable in &self.variables {
            if variable.values.len() != expected {
                return Err(GridError::ShapeMismatch {
                    expected,
                    actual: variable.values.len(),
                });
            }
        }
        Ok(())
    }

    /// Load a loss dataset from a JSON file and validate its shape
    ///
    /// # Errors
    /// Same conditions as [`WbgtDataset::load`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let contents =
            fs::read_to_string(path).map_err(|e| DatasetError::LoadFailed(e.to_string()))?;
        let dataset: Self = serde_json::from_str(&contents)
            .map_err(|e| DatasetError::ParseFailed(e.to_string()))?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Save the dataset to a JSON file
    ///
    /// # Errors
    /// Returns [`DatasetError::SerializeFailed`] or
    /// [`DatasetError::SaveFailed`].
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DatasetError> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| DatasetError::SerializeFailed(e.to_string()))?;
        fs::write(path, contents).map_err(|e| DatasetError::SaveFailed(e.to_string()))?;
        Ok(())
    }
}
