//! Scrobble export discovery
//!
//! Lists the unimported CSV files directly inside the data directory.
//! Subdirectories are not descended into. Results are sorted by file name so
//! a polling cycle always visits files in the same order.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

use super::file_state::is_import_candidate;

/// Directory scan errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Directory listing failed
    #[error("I/O error: {0}")]
    IoError(String),
}

/// Finds files waiting to be imported
#[derive(Debug, Clone)]
pub struct FileScanner {
    root: PathBuf,
}

impl FileScanner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Unimported CSV files in the data directory, sorted by name
    pub fn scan(&self) -> Result<Vec<PathBuf>, ScanError> {
        if !self.root.exists() {
            return Err(ScanError::PathNotFound(self.root.clone()));
        }

        if !self.root.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }

        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) => {
                    if entry.file_type().is_file() && is_import_candidate(entry.path()) {
                        files.push(entry.into_path());
                    }
                }
                Err(e) if e.depth() == 0 => {
                    // The root itself could not be read
                    return Err(ScanError::IoError(e.to_string()));
                }
                Err(e) => {
                    tracing::warn!("Error accessing entry: {}", e);
                }
            }
        }

        tracing::debug!(
            root = %self.root.display(),
            count = files.len(),
            "Scan complete"
        );

        Ok(files)
    }
}
