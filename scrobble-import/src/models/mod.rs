//! Data models for the scrobble import pipeline

pub mod import_result;
pub mod scrobble;

pub use import_result::ImportSummary;
pub use scrobble::{EventPayload, ImportEvent, ScrobbleRecord};
