//! Scrobble records and the events built from them

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One parsed row of a scrobble export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrobbleRecord {
    /// Epoch column exactly as it appeared in the row (trimmed)
    pub epoch_raw: String,
    /// Epoch column as whole seconds since the Unix epoch
    pub epoch_seconds: i64,
    /// Human-readable timestamp column, minute resolution
    pub display_timestamp: NaiveDateTime,
    pub artist: String,
    pub album: String,
    pub track: String,
}

impl ScrobbleRecord {
    /// Deduplication key: raw epoch, artist, album and track concatenated verbatim
    pub fn identity(&self) -> String {
        format!(
            "{}{}{}{}",
            self.epoch_raw, self.artist, self.album, self.track
        )
    }

    /// Display timestamp with its seconds taken from the epoch column
    ///
    /// The display column only has minute precision, so its seconds are always
    /// zero and adding the epoch's seconds-of-minute replaces them. For any
    /// modern time zone the offset is a whole number of minutes, so the seconds
    /// component does not depend on the zone the epoch is read in.
    pub fn effective_timestamp(&self) -> NaiveDateTime {
        self.display_timestamp + Duration::seconds(self.epoch_seconds.rem_euclid(60))
    }

    /// Human-readable event title
    pub fn title(&self) -> String {
        format!("{} by {} on {}", self.track, self.artist, self.album)
    }

    /// Build the event submitted to the store
    pub fn to_event(&self, duration: u32) -> ImportEvent {
        ImportEvent {
            timestamp: self.effective_timestamp().and_utc(),
            duration,
            payload: EventPayload {
                title: self.title(),
                artist: self.artist.clone(),
                album: self.album.clone(),
                track: self.track.clone(),
                uid: self.identity(),
            },
        }
    }
}

/// Event as sent to the event store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportEvent {
    /// Serialized as RFC 3339
    pub timestamp: DateTime<Utc>,
    /// Seconds
    pub duration: u32,
    #[serde(rename = "data")]
    pub payload: EventPayload,
}

/// Event data carried to the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub track: String,
    /// Equals the record identity
    pub uid: String,
}
