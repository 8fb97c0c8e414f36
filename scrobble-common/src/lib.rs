//! # Scrobble Common Library
//!
//! Shared code for the scrobble importer including:
//! - Error types
//! - Configuration loading and validation
//! - Platform config directory resolution

pub mod config;
pub mod error;

pub use config::{Settings, TomlConfig, TriggerMode};
pub use error::{Error, Result};
