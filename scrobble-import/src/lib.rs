//! scrobble-import library interface
//!
//! Imports Last.fm scrobble CSV exports into an ActivityWatch bucket.
//! Exposes the pipeline pieces for integration testing.

pub mod error;
pub mod models;
pub mod services;
pub mod store;
pub mod trigger;

pub use crate::error::{ImportError, ImportResult, RowError, StoreError};
pub use crate::services::FileImporter;
pub use crate::store::{ActivityWatchClient, EventStore};
pub use crate::trigger::Trigger;
