//! Scrobble export fixtures

use std::path::{Path, PathBuf};

/// Header row of a Last.fm export
pub const HEADER: &str = "uts,utc_time,artist,artist_mbid,album,album_mbid,track,track_mbid";

/// One data row in export layout
pub fn scrobble_line(epoch: &str, display: &str, artist: &str, album: &str, track: &str) -> String {
    format!(
        "{},\"{}\",\"{}\",,\"{}\",,\"{}\",",
        epoch, display, artist, album, track
    )
}

/// Write `HEADER` plus `lines` to `dir/name` and return the path
pub fn write_export(dir: &Path, name: &str, lines: &[String]) -> PathBuf {
    let mut content = String::from(HEADER);
    content.push('\n');
    for line in lines {
        content.push_str(line);
        content.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}
