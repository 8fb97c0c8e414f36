//! File import pipeline
//!
//! One run per file:
//! 1. Read the file (failure aborts, file stays unimported)
//! 2. Fetch the identities already in the bucket
//! 3. Parse each row after the header, skipping malformed rows
//! 4. Drop rows whose identity is already known
//! 5. Insert the remaining events in one batch (skipped when empty)
//! 6. Rename the file to its imported form
//!
//! A store failure in step 2 or 5 aborts before the rename, so the next polling
//! cycle retries the file. Deduplication makes that retry safe.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::deduplicator::{DedupResult, Deduplicator};
use super::file_state::mark_imported;
use super::record_parser::parse_csv_result;
use crate::error::{ImportError, ImportResult};
use crate::models::{ImportEvent, ImportSummary};
use crate::store::{known_identities, EventStore};

/// Imports scrobble files into one bucket
#[derive(Clone)]
pub struct FileImporter {
    store: Arc<dyn EventStore>,
    bucket: String,
    default_duration: u32,
}

impl FileImporter {
    pub fn new(store: Arc<dyn EventStore>, bucket: impl Into<String>, default_duration: u32) -> Self {
        Self {
            store,
            bucket: bucket.into(),
            default_duration,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Import one file, see [`import_file`]
    pub async fn import_file(&self, path: &Path) -> ImportResult<ImportSummary> {
        import_file(self.store.as_ref(), &self.bucket, path, self.default_duration).await
    }
}

/// Import one scrobble export into `bucket` and mark it imported
pub async fn import_file(
    store: &dyn EventStore,
    bucket: &str,
    path: &Path,
    default_duration: u32,
) -> ImportResult<ImportSummary> {
    let content = tokio::fs::read(path).await.map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let known = known_identities(store, bucket).await?;
    let mut dedup = Deduplicator::new(known);
    debug!(
        bucket = %bucket,
        known = dedup.known_count(),
        "Loaded known identities"
    );

    let (batch, skipped_duplicates, malformed_rows) =
        stage_events(path, &content, &mut dedup, default_duration);

    if !batch.is_empty() {
        store.insert_events(bucket, &batch).await?;
    }

    let imported_path = mark_imported(path)?;

    let summary = ImportSummary {
        inserted: batch.len(),
        skipped_duplicates,
        malformed_rows,
        imported_path,
    };

    info!(
        file = %path.display(),
        inserted = summary.inserted,
        duplicates = summary.skipped_duplicates,
        malformed = summary.malformed_rows,
        "Imported file"
    );

    Ok(summary)
}

/// Parse and deduplicate every data row, returning (events, duplicates, malformed)
fn stage_events(
    path: &Path,
    content: &[u8],
    dedup: &mut Deduplicator,
    default_duration: u32,
) -> (Vec<ImportEvent>, usize, usize) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content);

    let mut batch = Vec::new();
    let mut duplicates = 0;
    let mut malformed = 0;

    // skip(1): header row
    for (index, result) in reader.records().skip(1).enumerate() {
        // 1-based, header is line 1
        let fallback_line = index as u64 + 2;

        let record = match parse_csv_result(&result) {
            Ok(record) => record,
            Err(e) => {
                malformed += 1;
                let position = match &result {
                    Ok(row) => row.position(),
                    Err(err) => err.position(),
                };
                let line = position.map(|p| p.line()).unwrap_or(fallback_line);
                let fields: Vec<&str> = match &result {
                    Ok(row) => row.iter().collect(),
                    Err(_) => Vec::new(),
                };
                warn!(
                    file = %path.display(),
                    line,
                    error = %e,
                    row = ?fields,
                    "There was a problem with a row, skipping it"
                );
                continue;
            }
        };

        match dedup.check(&record) {
            DedupResult::New(_) => batch.push(record.to_event(default_duration)),
            DedupResult::Duplicate(uid) => {
                duplicates += 1;
                debug!(uid = %uid, "Skipping already imported scrobble");
            }
        }
    }

    (batch, duplicates, malformed)
}
