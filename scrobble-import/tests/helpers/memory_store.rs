//! In-memory event store

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use scrobble_import::models::ImportEvent;
use scrobble_import::store::{BucketInfo, EventStore, StoredEvent};
use scrobble_import::StoreError;

#[derive(Default)]
struct State {
    buckets: HashMap<String, BucketInfo>,
    events: HashMap<String, Vec<StoredEvent>>,
    insert_calls: usize,
    get_calls: usize,
    fail_get: bool,
    fail_insert: bool,
    last_create_queued: Option<bool>,
}

/// Event store keeping everything in memory, with switchable failures
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self, bucket: &str) -> Vec<StoredEvent> {
        let state = self.state.lock().unwrap();
        state.events.get(bucket).cloned().unwrap_or_default()
    }

    pub fn uids(&self, bucket: &str) -> Vec<String> {
        self.events(bucket)
            .iter()
            .filter_map(|e| e.uid().map(str::to_string))
            .collect()
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().unwrap().insert_calls
    }

    pub fn get_calls(&self) -> usize {
        self.state.lock().unwrap().get_calls
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.state.lock().unwrap().buckets.contains_key(bucket)
    }

    /// `queued` flag of the most recent bucket creation
    pub fn last_create_queued(&self) -> Option<bool> {
        self.state.lock().unwrap().last_create_queued
    }

    pub fn set_fail_get(&self, fail: bool) {
        self.state.lock().unwrap().fail_get = fail;
    }

    pub fn set_fail_insert(&self, fail: bool) {
        self.state.lock().unwrap().fail_insert = fail;
    }

    /// Seed an event with the given uid, as if imported earlier
    pub fn seed_uid(&self, bucket: &str, uid: &str) {
        let event: StoredEvent = serde_json::from_value(serde_json::json!({
            "timestamp": "2020-01-01T00:00:00Z",
            "duration": 60.0,
            "data": {"uid": uid},
        }))
        .unwrap();
        let mut state = self.state.lock().unwrap();
        state.events.entry(bucket.to_string()).or_default().push(event);
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn list_buckets(&self) -> Result<HashMap<String, BucketInfo>, StoreError> {
        Ok(self.state.lock().unwrap().buckets.clone())
    }

    async fn create_bucket(
        &self,
        name: &str,
        event_type: &str,
        queued: bool,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.last_create_queued = Some(queued);
        state.buckets.entry(name.to_string()).or_insert_with(|| BucketInfo {
            id: name.to_string(),
            event_type: Some(event_type.to_string()),
            client: None,
            hostname: None,
        });
        Ok(())
    }

    async fn get_events(&self, bucket: &str) -> Result<Vec<StoredEvent>, StoreError> {
        let mut state = self.state.lock().unwrap();
        state.get_calls += 1;
        if state.fail_get {
            return Err(StoreError::Network("connection refused".to_string()));
        }
        Ok(state.events.get(bucket).cloned().unwrap_or_default())
    }

    async fn insert_events(&self, bucket: &str, events: &[ImportEvent]) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.insert_calls += 1;
        if state.fail_insert {
            return Err(StoreError::Api(500, "internal error".to_string()));
        }
        let stored: Vec<StoredEvent> = events
            .iter()
            .map(|e| serde_json::from_value(serde_json::to_value(e).unwrap()).unwrap())
            .collect();
        state.events.entry(bucket.to_string()).or_default().extend(stored);
        Ok(())
    }
}
