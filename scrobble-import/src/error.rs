//! Error types for scrobble-import
//!
//! Three severities, matching how far a failure reaches:
//! - [`RowError`]: one row is skipped, the file carries on
//! - [`ImportError`]: one file's run is aborted, the file keeps its unimported name
//! - [`StoreError`]: event store failures, surfaced through [`ImportError::Store`]

use std::path::PathBuf;
use thiserror::Error;

/// Row-level parse failure (recoverable)
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    /// Row is shorter than the fixed schema
    #[error("expected at least {expected} columns, found {found}")]
    MissingColumns { expected: usize, found: usize },

    /// Epoch column is not a whole number
    #[error("epoch field is not an integer: '{0}'")]
    InvalidEpoch(String),

    /// Display timestamp does not match the export format
    #[error("timestamp '{value}' does not match format '{format}'")]
    InvalidTimestamp {
        value: String,
        format: &'static str,
    },

    /// Row bytes could not be decoded
    #[error("unreadable row: {0}")]
    Unreadable(String),
}

/// Event store client errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// File-level import failure
#[derive(Debug, Error)]
pub enum ImportError {
    /// File could not be opened or read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Querying or inserting into the event store failed
    #[error("Event store error: {0}")]
    Store(#[from] StoreError),

    /// Marking the file imported failed
    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Path has no usable file name
    #[error("Invalid file name: {0}")]
    InvalidFileName(PathBuf),
}

/// Result type for file import runs
pub type ImportResult<T> = Result<T, ImportError>;
