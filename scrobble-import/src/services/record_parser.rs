//! Scrobble export row parser
//!
//! Fixed schema, header row skipped by the caller:
//!
//! | column | content                                 |
//! |--------|-----------------------------------------|
//! | 0      | epoch seconds                           |
//! | 1      | display timestamp `15 Nov 2023, 10:30`  |
//! | 2      | artist                                  |
//! | 3      | unused                                  |
//! | 4      | album                                   |
//! | 5      | unused                                  |
//! | 6      | track                                   |
//!
//! Extra trailing columns are ignored.

use chrono::NaiveDateTime;

use crate::error::RowError;
use crate::models::ScrobbleRecord;

/// `strftime` format of the display timestamp column
pub const DISPLAY_TIMESTAMP_FORMAT: &str = "%d %b %Y, %H:%M";

/// Minimum number of columns a data row must have
pub const MIN_COLUMNS: usize = 7;

const COL_EPOCH: usize = 0;
const COL_DISPLAY_TIMESTAMP: usize = 1;
const COL_ARTIST: usize = 2;
const COL_ALBUM: usize = 4;
const COL_TRACK: usize = 6;

/// Parse one data row into a [`ScrobbleRecord`]
///
/// Every consumed field is trimmed before use.
pub fn parse_row<S: AsRef<str>>(row: &[S]) -> Result<ScrobbleRecord, RowError> {
    if row.len() < MIN_COLUMNS {
        return Err(RowError::MissingColumns {
            expected: MIN_COLUMNS,
            found: row.len(),
        });
    }

    let field = |index: usize| row[index].as_ref().trim();

    let epoch_raw = field(COL_EPOCH);
    let epoch_seconds: i64 = epoch_raw
        .parse()
        .map_err(|_| RowError::InvalidEpoch(epoch_raw.to_string()))?;

    let display_raw = field(COL_DISPLAY_TIMESTAMP);
    let display_timestamp = NaiveDateTime::parse_from_str(display_raw, DISPLAY_TIMESTAMP_FORMAT)
        .map_err(|_| RowError::InvalidTimestamp {
            value: display_raw.to_string(),
            format: DISPLAY_TIMESTAMP_FORMAT,
        })?;

    Ok(ScrobbleRecord {
        epoch_raw: epoch_raw.to_string(),
        epoch_seconds,
        display_timestamp,
        artist: field(COL_ARTIST).to_string(),
        album: field(COL_ALBUM).to_string(),
        track: field(COL_TRACK).to_string(),
    })
}

/// Parse a row read by the `csv` crate
pub fn parse_string_record(record: &csv::StringRecord) -> Result<ScrobbleRecord, RowError> {
    let fields: Vec<&str> = record.iter().collect();
    parse_row(&fields)
}

/// Parse one item yielded by a `csv` reader; decode failures become [`RowError::Unreadable`]
pub fn parse_csv_result(
    result: &Result<csv::StringRecord, csv::Error>,
) -> Result<ScrobbleRecord, RowError> {
    match result {
        Ok(record) => parse_string_record(record),
        Err(e) => Err(RowError::Unreadable(e.to_string())),
    }
}
