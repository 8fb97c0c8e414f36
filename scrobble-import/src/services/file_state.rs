//! Source file lifecycle
//!
//! The file name is the only persisted import state:
//! `name.csv` is unimported, `name_imported.csv` is imported.
//! The rename performed by [`mark_imported`] is the state transition.

use std::path::{Path, PathBuf};

use crate::error::{ImportError, ImportResult};

/// Suffix appended to the file stem once a file is imported
pub const IMPORTED_MARKER: &str = "_imported";

/// Extension of scrobble export files
pub const CSV_EXTENSION: &str = "csv";

/// Persisted state of a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Unimported,
    Imported,
}

impl FileState {
    /// State encoded in a file name
    pub fn of(path: &Path) -> Self {
        let imported = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().ends_with(IMPORTED_MARKER))
            .unwrap_or(false);
        if imported {
            FileState::Imported
        } else {
            FileState::Unimported
        }
    }
}

/// True when the path has the CSV extension (case-insensitive)
pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(CSV_EXTENSION))
        .unwrap_or(false)
}

/// True for CSV files that still need importing
///
/// Both triggers use this check before handing a path to the importer.
pub fn is_import_candidate(path: &Path) -> bool {
    is_csv(path) && FileState::of(path) == FileState::Unimported
}

/// `dir/name.ext` becomes `dir/name_imported.ext`
pub fn imported_path(path: &Path) -> Option<PathBuf> {
    let stem = path.file_stem()?.to_string_lossy();
    let name = match path.extension() {
        Some(ext) => format!("{}{}.{}", stem, IMPORTED_MARKER, ext.to_string_lossy()),
        None => format!("{}{}", stem, IMPORTED_MARKER),
    };
    Some(path.with_file_name(name))
}

/// Rename the file to its imported form and return the new path
pub fn mark_imported(path: &Path) -> ImportResult<PathBuf> {
    let target =
        imported_path(path).ok_or_else(|| ImportError::InvalidFileName(path.to_path_buf()))?;

    std::fs::rename(path, &target).map_err(|source| ImportError::Rename {
        from: path.to_path_buf(),
        to: target.clone(),
        source,
    })?;

    tracing::debug!(from = %path.display(), to = %target.display(), "Marked file imported");
    Ok(target)
}
