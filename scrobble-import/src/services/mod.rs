//! Import pipeline components
//!
//! Leaves first: record parser, deduplicator, file state, scanner, importer.

pub mod deduplicator;
pub mod file_importer;
pub mod file_scanner;
pub mod file_state;
pub mod record_parser;
pub mod status_line;

pub use deduplicator::{DedupResult, Deduplicator};
pub use file_importer::{import_file, FileImporter};
pub use file_scanner::{FileScanner, ScanError};
pub use file_state::{imported_path, is_import_candidate, mark_imported, FileState};
pub use record_parser::{parse_csv_result, parse_row, parse_string_record};
pub use status_line::StatusLine;
