//! ActivityWatch REST client
//!
//! Talks to `aw-server` over its `/api/0` HTTP API.
//!
//! A queued bucket creation that cannot reach the server is kept in memory and
//! sent again before the next event query or insert.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::json;

use super::{BucketInfo, EventStore, StoredEvent};
use crate::error::StoreError;
use crate::models::ImportEvent;

/// Client name reported to the server and used in the bucket name
pub const CLIENT_NAME: &str = "aw-importer-lastfm";

/// Default server address
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5600";

/// Server address used with `--testing`
pub const TESTING_SERVER_URL: &str = "http://127.0.0.1:5666";

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// ActivityWatch API client
pub struct ActivityWatchClient {
    http_client: reqwest::Client,
    base_url: Url,
    hostname: String,
    /// (name, event type) of queued bucket creations not yet accepted by the server
    pending_buckets: Mutex<Vec<(String, String)>>,
}

impl ActivityWatchClient {
    pub fn new(base_url: &str, hostname: impl Into<String>) -> Result<Self, StoreError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StoreError::Network(format!("invalid server URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(StoreError::Network(format!(
                "invalid server URL '{}'",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder()
            .user_agent(concat!("aw-importer-lastfm/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url,
            hostname: hostname.into(),
            pending_buckets: Mutex::new(Vec::new()),
        })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Bucket the importer writes to: `aw-importer-lastfm_<hostname>`
    pub fn bucket_name(&self) -> String {
        format!("{}_{}", CLIENT_NAME, self.hostname)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "0"]).extend(segments);
        }
        url
    }

    /// Number of queued bucket creations still waiting for the server
    pub fn pending_bucket_count(&self) -> usize {
        self.pending_buckets
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    async fn post_bucket(&self, name: &str, event_type: &str) -> Result<(), StoreError> {
        let url = self.endpoint(&["buckets", name]);
        let body = json!({
            "client": CLIENT_NAME,
            "type": event_type,
            "hostname": self.hostname,
        });

        let response = self
            .http_client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }

    /// Send queued bucket creations; the unsent ones stay queued on failure
    async fn flush_pending_buckets(&self) -> Result<(), StoreError> {
        let pending = std::mem::take(
            &mut *self
                .pending_buckets
                .lock()
                .unwrap_or_else(|e| e.into_inner()),
        );

        let mut remaining = pending.into_iter();
        while let Some((name, event_type)) = remaining.next() {
            if let Err(e) = self.post_bucket(&name, &event_type).await {
                let mut queue = self
                    .pending_buckets
                    .lock()
                    .unwrap_or_else(|e| e.into_inner());
                queue.push((name, event_type));
                queue.extend(remaining);
                return Err(e);
            }
            tracing::info!(bucket = %name, "Created queued bucket");
        }
        Ok(())
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() || status == StatusCode::NOT_MODIFIED {
            return Ok(response);
        }
        let error_text = response.text().await.unwrap_or_default();
        Err(StoreError::Api(status.as_u16(), error_text))
    }
}

#[async_trait]
impl EventStore for ActivityWatchClient {
    async fn list_buckets(&self) -> Result<HashMap<String, BucketInfo>, StoreError> {
        let url = self.endpoint(&["buckets", ""]);
        tracing::debug!(url = %url, "Listing buckets");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn create_bucket(
        &self,
        name: &str,
        event_type: &str,
        queued: bool,
    ) -> Result<(), StoreError> {
        match self.post_bucket(name, event_type).await {
            Err(StoreError::Network(msg)) if queued => {
                tracing::warn!(bucket = %name, error = %msg, "Server unreachable, bucket creation queued");
                self.pending_buckets
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push((name.to_string(), event_type.to_string()));
                Ok(())
            }
            result => result,
        }
    }

    async fn get_events(&self, bucket: &str) -> Result<Vec<StoredEvent>, StoreError> {
        self.flush_pending_buckets().await?;
        let url = self.endpoint(&["buckets", bucket, "events"]);
        tracing::debug!(url = %url, "Fetching events");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))
    }

    async fn insert_events(&self, bucket: &str, events: &[ImportEvent]) -> Result<(), StoreError> {
        self.flush_pending_buckets().await?;
        let url = self.endpoint(&["buckets", bucket, "events"]);
        tracing::debug!(url = %url, count = events.len(), "Inserting events");

        let response = self
            .http_client
            .post(url)
            .json(events)
            .send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Self::check_status(response).await?;
        Ok(())
    }
}

/// Host name for the bucket: configured value, else the environment, else `unknown`
pub fn resolve_hostname(configured: Option<&str>) -> String {
    configured
        .map(str::to_string)
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
