#![allow(dead_code)]

//! Test Helper Utilities
//!
//! Shared utilities for testing scrobble-import

pub mod fixtures;
pub mod memory_store;

// Re-export commonly used items
pub use fixtures::{scrobble_line, write_export, HEADER};
pub use memory_store::MemoryStore;
