//! Error taxonomy for the aggregation pipeline.
//!
//! Only [`AggregateError`] is fatal for a run. Every [`FileParseError`] is
//! scoped to a single result file: it is logged, counted, and the file is
//! left out of the summary.

use std::path::PathBuf;
use thiserror::Error;

/// Run-level failures that abort the pipeline before any output is written.
#[derive(Debug, Error)]
pub enum AggregateError {
    /// The configured results root does not exist.
    #[error("Results directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// The configured results root exists but is not a directory.
    #[error("Results path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),
}

/// Failure to parse the method identity out of a filename.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// The first delimiter-separated token was empty (e.g. `_Ta8`).
    #[error("filename '{0}' has an empty method token")]
    EmptyMethod(String),
}

/// Per-file failure. The offending file is skipped, the run continues.
#[derive(Debug, Error)]
pub enum FileParseError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} is missing required column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error(
        "{} line {line}: invalid value {value:?} in column '{column}'",
        .path.display()
    )]
    InvalidValue {
        path: PathBuf,
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("{} column '{column}' sums to a non-finite value", .path.display())]
    Overflow { path: PathBuf, column: &'static str },

    #[error("{}: {source}", .path.display())]
    Name {
        path: PathBuf,
        #[source]
        source: NameError,
    },
}
