//! Polling trigger
//!
//! `Idle -> Scanning -> Sleeping -> Idle` until shutdown. Each cycle imports
//! every unimported CSV file in the data directory, in file-name order, then
//! sleeps for the poll interval. Shutdown interrupts the sleep and is checked
//! between files.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::import_and_report;
use crate::services::{FileImporter, FileScanner, StatusLine};

/// Counts from one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Candidate files found by the scan
    pub discovered: usize,
    /// Files imported and renamed
    pub imported: usize,
    /// Files whose import failed
    pub failed: usize,
    /// Events inserted across all files
    pub inserted: usize,
}

#[derive(Debug, Clone)]
pub struct PollingTrigger {
    scanner: FileScanner,
    interval: Duration,
}

impl PollingTrigger {
    pub fn new(data_path: PathBuf, interval: Duration) -> Self {
        Self {
            scanner: FileScanner::new(data_path),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub async fn run<W: Write>(
        &self,
        importer: &FileImporter,
        status: &mut StatusLine<W>,
        shutdown: CancellationToken,
    ) {
        info!(
            path = %self.scanner.root().display(),
            interval_secs = self.interval.as_secs_f64(),
            "Polling for scrobble exports"
        );

        loop {
            let report = self.run_cycle(importer, status, &shutdown).await;
            debug!(?report, "Polling cycle complete");

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Polling stopped");
    }

    /// Scan once and import every candidate file
    pub async fn run_cycle<W: Write>(
        &self,
        importer: &FileImporter,
        status: &mut StatusLine<W>,
        shutdown: &CancellationToken,
    ) -> CycleReport {
        let mut report = CycleReport::default();

        let files = match self.scanner.scan() {
            Ok(files) => files,
            Err(e) => {
                warn!("Scan of {} failed: {}", self.scanner.root().display(), e);
                return report;
            }
        };
        report.discovered = files.len();

        for path in files {
            if shutdown.is_cancelled() {
                break;
            }
            match import_and_report(importer, &path, status).await {
                Ok(summary) => {
                    report.imported += 1;
                    report.inserted += summary.inserted;
                }
                Err(_) => report.failed += 1,
            }
        }

        report
    }
}
