//! Per-file import outcome

use std::path::PathBuf;

/// Outcome of one successful file import run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    /// New events submitted to the store
    pub inserted: usize,
    /// Rows whose identity was already known (store or earlier in the file)
    pub skipped_duplicates: usize,
    /// Rows rejected by the record parser
    pub malformed_rows: usize,
    /// Where the file lives now that it carries the imported marker
    pub imported_path: PathBuf,
}

impl ImportSummary {
    /// Status line text shown after each file
    pub fn status_message(&self) -> String {
        format!("Added {} item(s)", self.inserted)
    }
}
