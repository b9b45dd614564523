//! Error types for the dataset and figure layers.
//!
//! Orchestration code uses `anyhow`; these enums exist where callers need to
//! match on the failure (e.g. the hist2d row guard maps to exit status 1).

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by typed column access and dataset construction
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("no column named '{name}' (available: {})", available.join(", "))]
    MissingColumn { name: String, available: Vec<String> },

    #[error("column '{0}' is not numeric")]
    NotNumeric(String),

    #[error("column '{name}' has {len} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        len: usize,
        expected: usize,
    },
}

/// Errors raised while building or writing a figure
#[derive(Debug, Error)]
pub enum FigureError {
    #[error("need at least {required} rows with both values present, found {rows}")]
    InsufficientData { rows: usize, required: usize },

    #[error("unsupported figure format for '{}' (expected .svg or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Errors raised while resolving command-line arguments
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("miscellaneous cutoff must be a finite, non-negative ratio (got {0})")]
    InvalidCutoff(f64),
}
