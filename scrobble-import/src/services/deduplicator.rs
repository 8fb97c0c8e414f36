//! Scrobble deduplication
//!
//! The event store is the source of truth for what has already been imported.
//! A [`Deduplicator`] is seeded with the identities currently in the bucket at
//! the start of each file run and is never reused across runs.

use std::collections::HashSet;

use crate::models::ScrobbleRecord;

/// Deduplication outcome for one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DedupResult {
    /// Identity not seen before, record should be staged
    New(String),
    /// Identity already in the store or staged earlier in this run
    Duplicate(String),
}

/// Known-identity set for one file import run
#[derive(Debug, Default)]
pub struct Deduplicator {
    known: HashSet<String>,
}

impl Deduplicator {
    /// Seed from the identities already present in the bucket
    pub fn new<I>(known: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            known: known.into_iter().collect(),
        }
    }

    /// Check a record and remember its identity
    ///
    /// Once a record is admitted its identity counts as known for the rest of
    /// the run, so a second row with the same identity is a duplicate.
    pub fn check(&mut self, record: &ScrobbleRecord) -> DedupResult {
        let identity = record.identity();
        if self.known.insert(identity.clone()) {
            DedupResult::New(identity)
        } else {
            DedupResult::Duplicate(identity)
        }
    }

    /// Number of identities known so far
    pub fn known_count(&self) -> usize {
        self.known.len()
    }
}
