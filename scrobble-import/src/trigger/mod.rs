//! Trigger strategies
//!
//! A trigger decides when the [`FileImporter`] runs and on which files.
//! Exactly one runs per process. Both hand files to the importer one at a time,
//! and only while the file still has its unimported name.

pub mod notification;
pub mod polling;

use std::io::Write;
use std::path::Path;

use scrobble_common::{Settings, TriggerMode};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::error::ImportResult;
use crate::models::ImportSummary;
use crate::services::{FileImporter, StatusLine};

pub use notification::NotificationTrigger;
pub use polling::PollingTrigger;

/// Trigger failures that stop the driver
#[derive(Debug, Error)]
pub enum TriggerError {
    /// Filesystem notifications could not be set up
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// The active trigger strategy
#[derive(Debug, Clone)]
pub enum Trigger {
    Polling(PollingTrigger),
    Notification(NotificationTrigger),
}

impl Trigger {
    pub fn from_settings(settings: &Settings) -> Self {
        match settings.trigger {
            TriggerMode::Poll => Trigger::Polling(PollingTrigger::new(
                settings.data_path.clone(),
                settings.poll_interval,
            )),
            TriggerMode::Watch => {
                Trigger::Notification(NotificationTrigger::new(settings.data_path.clone()))
            }
        }
    }

    /// Run until `shutdown` is cancelled
    pub async fn run<W: Write>(
        &self,
        importer: &FileImporter,
        status: &mut StatusLine<W>,
        shutdown: CancellationToken,
    ) -> Result<(), TriggerError> {
        match self {
            Trigger::Polling(trigger) => {
                trigger.run(importer, status, shutdown).await;
                Ok(())
            }
            Trigger::Notification(trigger) => trigger.run(importer, status, shutdown).await,
        }
    }
}

/// Import one file and report the outcome; errors are logged, not propagated
pub(crate) async fn import_and_report<W: Write>(
    importer: &FileImporter,
    path: &Path,
    status: &mut StatusLine<W>,
) -> ImportResult<ImportSummary> {
    let result = importer.import_file(path).await;
    match &result {
        Ok(summary) => {
            if let Err(e) = status.update(&summary.status_message()) {
                warn!("Failed to write status line: {}", e);
            }
        }
        Err(e) => {
            error!(file = %path.display(), error = %e, "Import failed, file left unimported");
        }
    }
    result
}
