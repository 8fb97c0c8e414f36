//! Event store abstraction
//!
//! The import pipeline needs four operations from the store. [`EventStore`]
//! names them so the pipeline can run against the ActivityWatch server in
//! production and an in-memory store in tests.

pub mod activitywatch;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::models::ImportEvent;

pub use activitywatch::ActivityWatchClient;

/// Event type of the import bucket
pub const BUCKET_EVENT_TYPE: &str = "lifecycle_data";

/// Bucket metadata as listed by the store
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BucketInfo {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

/// Event as returned by the store
#[derive(Debug, Clone, Deserialize)]
pub struct StoredEvent {
    #[serde(default)]
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl StoredEvent {
    /// Import identity, if this event was created by the importer
    pub fn uid(&self) -> Option<&str> {
        self.data.get("uid").and_then(Value::as_str)
    }
}

/// Operations the import pipeline needs from the event store
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All buckets, keyed by bucket name
    async fn list_buckets(&self) -> Result<HashMap<String, BucketInfo>, StoreError>;

    /// Create a bucket; creating an existing bucket is not an error
    ///
    /// With `queued`, a store that cannot be reached keeps the request and
    /// sends it before its next event query or insert instead of failing.
    async fn create_bucket(
        &self,
        name: &str,
        event_type: &str,
        queued: bool,
    ) -> Result<(), StoreError>;

    /// Every event in the bucket
    async fn get_events(&self, bucket: &str) -> Result<Vec<StoredEvent>, StoreError>;

    /// Insert a batch of events in one call
    async fn insert_events(&self, bucket: &str, events: &[ImportEvent]) -> Result<(), StoreError>;
}

/// Create the bucket if the store does not list it yet
///
/// Returns `true` when the bucket was created.
pub async fn ensure_bucket(store: &dyn EventStore, name: &str) -> Result<bool, StoreError> {
    let buckets = store.list_buckets().await?;
    if buckets.contains_key(name) {
        tracing::debug!(bucket = %name, "Bucket already exists");
        return Ok(false);
    }

    store.create_bucket(name, BUCKET_EVENT_TYPE, true).await?;
    tracing::info!(bucket = %name, event_type = BUCKET_EVENT_TYPE, "Created bucket");
    Ok(true)
}

/// Identities already recorded in the bucket
pub async fn known_identities(
    store: &dyn EventStore,
    bucket: &str,
) -> Result<Vec<String>, StoreError> {
    let events = store.get_events(bucket).await?;
    Ok(events
        .iter()
        .filter_map(|event| event.uid().map(str::to_string))
        .collect())
}
