//! Filesystem notification trigger
//!
//! Subscribes to events under the data directory (recursively). The watcher
//! callback only forwards events into a channel; a single consumer imports
//! qualifying files one at a time, so imports never overlap.
//!
//! A created file is not imported right away: exporters create the file and
//! then write rows into it. Every event touching a pending file restarts its
//! settle window, and the file is imported once it has been quiet for the
//! whole window. Dropping the watcher on shutdown unsubscribes.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{import_and_report, TriggerError};
use crate::services::{is_import_candidate, FileImporter, StatusLine};

/// Quiet time after the last write before a created file is imported
pub const DEFAULT_SETTLE: Duration = Duration::from_secs(1);

const MIN_TICK: Duration = Duration::from_millis(10);

#[derive(Debug, Clone)]
pub struct NotificationTrigger {
    root: PathBuf,
    settle: Duration,
}

impl NotificationTrigger {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            settle: DEFAULT_SETTLE,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn settle(&self) -> Duration {
        self.settle
    }

    pub async fn run<W: Write>(
        &self,
        importer: &FileImporter,
        status: &mut StatusLine<W>,
        shutdown: CancellationToken,
    ) -> Result<(), TriggerError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<notify::Result<Event>>();

        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| {
                // Receiver gone means we are shutting down
                let _ = tx.send(res);
            })?;
        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        info!(path = %self.root.display(), "Watching for new scrobble exports");

        let mut pending = PendingFiles::new(self.settle);
        let mut tick = tokio::time::interval((self.settle / 4).max(MIN_TICK));
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = rx.recv() => match received {
                    Some(Ok(event)) => pending.observe(&event, Instant::now()),
                    Some(Err(e)) => warn!("Watch error: {}", e),
                    None => break,
                },
                _ = tick.tick() => {
                    for path in pending.take_settled(Instant::now()) {
                        if !path.exists() {
                            debug!(file = %path.display(), "Pending file disappeared");
                            continue;
                        }
                        // Errors are logged; no new event will re-offer this file
                        let _ = import_and_report(importer, &path, status).await;
                    }
                }
            }
        }

        if !pending.is_empty() {
            info!(
                count = pending.len(),
                "Shutting down with files still being written, they stay unimported"
            );
        }
        if let Err(e) = watcher.unwatch(&self.root) {
            debug!("Unwatch failed: {}", e);
        }
        info!("Stopped watching {}", self.root.display());
        Ok(())
    }
}

/// Created files waiting for their writes to settle
#[derive(Debug)]
pub struct PendingFiles {
    settle: Duration,
    last_activity: HashMap<PathBuf, Instant>,
}

impl PendingFiles {
    pub fn new(settle: Duration) -> Self {
        Self {
            settle,
            last_activity: HashMap::new(),
        }
    }

    /// Track created candidates and restart the window of pending files the event touches
    pub fn observe(&mut self, event: &Event, now: Instant) {
        for path in created_candidates(event) {
            self.last_activity.insert(path, now);
        }
        if matches!(event.kind, EventKind::Create(_)) {
            return;
        }

        let removed = matches!(event.kind, EventKind::Remove(_));
        for path in &event.paths {
            if removed {
                self.last_activity.remove(path);
            } else if let Some(last) = self.last_activity.get_mut(path) {
                *last = now;
            }
        }
    }

    /// Remove and return files quiet for the whole settle window, sorted by path
    pub fn take_settled(&mut self, now: Instant) -> Vec<PathBuf> {
        let settle = self.settle;
        let mut settled: Vec<PathBuf> = self
            .last_activity
            .iter()
            .filter(|(_, last)| now.saturating_duration_since(**last) >= settle)
            .map(|(path, _)| path.clone())
            .collect();
        settled.sort();

        for path in &settled {
            self.last_activity.remove(path);
        }
        settled
    }

    pub fn len(&self) -> usize {
        self.last_activity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_activity.is_empty()
    }
}

/// Paths from a create event that should be imported
///
/// Directories, non-CSV files and files already carrying the imported marker
/// are ignored.
pub fn created_candidates(event: &Event) -> Vec<PathBuf> {
    if !matches!(event.kind, EventKind::Create(_)) {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter(|path| qualifies(path))
        .cloned()
        .collect()
}

fn qualifies(path: &Path) -> bool {
    !path.is_dir() && is_import_candidate(path)
}
