//! Batch processing of yearly WBGT files
//!
//! Discovers `{variable}_*.json` files in an input directory, evaluates the
//! three intensity-class losses for each and writes `productivityLoss_*`
//! outputs next to each other in the output directory. Processing is
//! sequential per file (each file already parallelizes across time steps)
//! and fails fast on the first error so the invoking job aborts with the
//! failing file and cell identified.

use crate::damage::IntensityClass;
use crate::grid::{estimate_loss_grid, GridError, LossSummary};
use crate::io::{DatasetError, LossDataset, WbgtDataset};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Output file prefix substituted for the input variable name
pub const OUTPUT_VARIABLE: &str = "productivityLoss";

/// Errors raised by the batch wrapper
#[derive(Debug)]
pub enum BatchError {
    /// Input or output directory could not be accessed
    Dir {
        /// The directory involved
        path: PathBuf,
        /// Underlying I/O error text
        msg: String,
    },
    /// A dataset failed to load or store
    Dataset {
        /// The file involved
        path: PathBuf,
        /// Underlying dataset error
        source: DatasetError,
    },
    /// An input file does not carry the expected variable
    VariableMismatch {
        /// The file involved
        path: PathBuf,
        /// Variable the batch run was asked to process
        expected: String,
        /// Variable the file actually carries
        found: String,
    },
    /// Loss evaluation failed for a cell of an input file
    Grid {
        /// The file involved
        path: PathBuf,
        /// Underlying grid error, identifying the cell/time step
        source: GridError,
    },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::Dir { path, msg } => {
                write!(f, "cannot access directory {}: {msg}", path.display())
            }
            BatchError::Dataset { path, source } => {
                write!(f, "{}: {source}", path.display())
            }
            BatchError::VariableMismatch {
                path,
                expected,
                found,
            } => {
                write!(
                    f,
                    "{}: expected variable '{expected}', found '{found}'",
                    path.display()
                )
            }
            BatchError::Grid { path, source } => {
                write!(f, "{}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Dataset { source, .. } => Some(source),
            BatchError::Grid { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Outcome of one processed file, for logging and job accounting
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Input file path
    pub input: PathBuf,
    /// Output file path
    pub output: PathBuf,
    /// Per-class summaries of the written loss fields
    pub summaries: Vec<(IntensityClass, LossSummary)>,
}

/// Find `{variable}_*.json` input files, sorted by file name
///
/// # Errors
/// Returns [`BatchError::Dir`] if the directory cannot be read.
pub fn discover_inputs(input_dir: &Path, variable: &str) -> Result<Vec<PathBuf>, BatchError> {
    let entries = fs::read_dir(input_dir).map_err(|e| BatchError::Dir {
        path: input_dir.to_path_buf(),
        msg: e.to_string(),
    })?;

    let prefix = format!("{variable}_");
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BatchError::Dir {
            path: input_dir.to_path_buf(),
            msg: e.to_string(),
        })?;
        let path = entry.path();
        let wanted = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.starts_with(&prefix) && name.ends_with(".json"));
        if wanted {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Output path for an input file: same name with the variable prefix
/// replaced by [`OUTPUT_VARIABLE`]
#[must_use]
pub fn output_path(input: &Path, output_dir: &Path, variable: &str) -> PathBuf {
    let name = input
        .file_name()
        .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
    output_dir.join(name.replacen(variable, OUTPUT_VARIABLE, 1))
}

/// Process a single WBGT file and write its productivity-loss output
///
/// # Errors
/// Returns [`BatchError::Dataset`] for load/store failures,
/// [`BatchError::VariableMismatch`] if the file carries a different
/// variable, and [`BatchError::Grid`] (with the failing cell/time step) for
/// input-contract violations.
pub fn process_file(
    input: &Path,
    output: &Path,
    variable: &str,
) -> Result<FileReport, BatchError> {
    info!("processing {}", input.display());

    let dataset = WbgtDataset::load(input).map_err(|source| BatchError::Dataset {
        path: input.to_path_buf(),
        source,
    })?;
    if dataset.variable != variable {
        return Err(BatchError::VariableMismatch {
            path: input.to_path_buf(),
            expected: variable.to_string(),
            found: dataset.variable,
        });
    }

    let mut losses = Vec::with_capacity(IntensityClass::ALL.len());
    let mut summaries = Vec::with_capacity(IntensityClass::ALL.len());
    for class in IntensityClass::ALL {
        let loss = estimate_loss_grid(&dataset.grid, class).map_err(|source| BatchError::Grid {
            path: input.to_path_buf(),
            source,
        })?;
        summaries.push((class, loss.summary()));
        losses.push((class, loss));
    }

    let out_dataset = LossDataset::assemble(dataset.grid.coords().clone(), losses);
    out_dataset.save(output).map_err(|source| BatchError::Dataset {
        path: output.to_path_buf(),
        source,
    })?;

    for (class, summary) in &summaries {
        info!("  {class}: {summary}");
    }
    info!("written {}", output.display());

    Ok(FileReport {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        summaries,
    })
}

/// Process every `{variable}_*.json` file of a directory
///
/// Creates the output directory if needed. Fails fast on the first file
/// error so the invoking job can abort and report it.
///
/// # Errors
/// Returns [`BatchError::Dir`] when directories cannot be accessed, or the
/// first per-file error from [`process_file`].
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    variable: &str,
) -> Result<Vec<FileReport>, BatchError> {
    fs::create_dir_all(output_dir).map_err(|e| BatchError::Dir {
        path: output_dir.to_path_buf(),
        msg: e.to_string(),
    })?;

    let inputs = discover_inputs(input_dir, variable)?;
    if inputs.is_empty() {
        warn!(
            "no {variable}_*.json files found in {}",
            input_dir.display()
        );
    }

    inputs
        .iter()
        .map(|input| {
            let output = output_path(input, output_dir, variable);
            process_file(input, &output, variable)
        })
        .collect()
}
