//! Integration tests for the polling and notification triggers

mod helpers;

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use helpers::{scrobble_line, write_export, MemoryStore, HEADER};
use scrobble_common::{Settings, TriggerMode};
use scrobble_import::services::{FileImporter, StatusLine};
use scrobble_import::trigger::{NotificationTrigger, PollingTrigger, Trigger};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

const BUCKET: &str = "aw-importer-lastfm_testhost";

fn row(epoch: &str, track: &str) -> String {
    scrobble_line(epoch, "15 Nov 2023, 10:30", "Boards of Canada", "Geogaddi", track)
}

fn settings(data_path: &Path, trigger: TriggerMode) -> Settings {
    Settings {
        data_path: data_path.to_path_buf(),
        default_duration: 60,
        poll_interval: Duration::from_secs(3600),
        trigger,
        server_url: None,
        hostname: None,
    }
}

async fn wait_for(path: &Path, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    path.exists()
}

#[test]
fn test_trigger_from_settings() {
    let dir = TempDir::new().unwrap();

    match Trigger::from_settings(&settings(dir.path(), TriggerMode::Poll)) {
        Trigger::Polling(p) => assert_eq!(p.interval(), Duration::from_secs(3600)),
        other => panic!("Expected polling trigger, got {:?}", other),
    }
    assert!(matches!(
        Trigger::from_settings(&settings(dir.path(), TriggerMode::Watch)),
        Trigger::Notification(_)
    ));
}

#[tokio::test]
async fn test_polling_cycle_imports_every_candidate() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let importer = FileImporter::new(store.clone(), BUCKET, 60);
    write_export(dir.path(), "b.csv", &[row("1700000001", "Gyroscope")]);
    write_export(dir.path(), "a.csv", &[row("1700000002", "Dawn Chorus")]);
    write_export(dir.path(), "old_imported.csv", &[row("1700000003", "Julie and Candy")]);

    let trigger = PollingTrigger::new(dir.path().to_path_buf(), Duration::from_secs(3600));
    let mut status = StatusLine::new(Vec::new());
    let shutdown = CancellationToken::new();

    let report = trigger.run_cycle(&importer, &mut status, &shutdown).await;

    assert_eq!(report.discovered, 2);
    assert_eq!(report.imported, 2);
    assert_eq!(report.inserted, 2);
    assert!(dir.path().join("a_imported.csv").exists());
    assert!(dir.path().join("b_imported.csv").exists());

    // Files are visited in name order
    let uids = store.uids(BUCKET);
    assert!(uids[0].starts_with("1700000002"));
    assert!(uids[1].starts_with("1700000001"));

    let status_text = String::from_utf8(status.into_inner()).unwrap();
    assert!(status_text.ends_with("Added 1 item(s)\r"));

    // Nothing is re-offered on the next cycle
    let mut status = StatusLine::new(Vec::new());
    let report = trigger.run_cycle(&importer, &mut status, &shutdown).await;
    assert_eq!(report.discovered, 0);
}

#[tokio::test]
async fn test_polling_retries_after_store_failure() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let importer = FileImporter::new(store.clone(), BUCKET, 60);
    write_export(dir.path(), "a.csv", &[row("1700000002", "Dawn Chorus")]);
    write_export(dir.path(), "b.csv", &[row("1700000001", "Gyroscope")]);

    let trigger = PollingTrigger::new(dir.path().to_path_buf(), Duration::from_secs(3600));
    let mut status = StatusLine::new(Vec::new());
    let shutdown = CancellationToken::new();

    store.set_fail_insert(true);
    let report = trigger.run_cycle(&importer, &mut status, &shutdown).await;
    assert_eq!(report.failed, 2);
    assert_eq!(report.imported, 0);
    assert!(dir.path().join("a.csv").exists());

    store.set_fail_insert(false);
    let report = trigger.run_cycle(&importer, &mut status, &shutdown).await;
    assert_eq!(report.imported, 2);
    assert_eq!(store.events(BUCKET).len(), 2);
}

#[tokio::test]
async fn test_polling_missing_directory_is_not_fatal() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let importer = FileImporter::new(store, BUCKET, 60);

    let trigger = PollingTrigger::new(dir.path().join("missing"), Duration::from_secs(3600));
    let mut status = StatusLine::new(Vec::new());
    let report = trigger
        .run_cycle(&importer, &mut status, &CancellationToken::new())
        .await;

    assert_eq!(report.discovered, 0);
}

#[tokio::test]
async fn test_polling_sleep_is_interrupted_by_shutdown() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let importer = FileImporter::new(store.clone(), BUCKET, 60);
    write_export(dir.path(), "a.csv", &[row("1700000002", "Dawn Chorus")]);

    let trigger = Trigger::from_settings(&settings(dir.path(), TriggerMode::Poll));
    let mut status = StatusLine::new(Vec::new());
    let shutdown = CancellationToken::new();

    let canceller = {
        let shutdown = shutdown.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            shutdown.cancel();
        }
    };

    let (result, _) = tokio::time::timeout(Duration::from_secs(10), async {
        tokio::join!(trigger.run(&importer, &mut status, shutdown.clone()), canceller)
    })
    .await
    .expect("polling loop did not stop on shutdown");

    assert!(result.is_ok());
    assert_eq!(store.events(BUCKET).len(), 1);
}

#[tokio::test]
async fn test_notification_imports_created_file() {
    let root = TempDir::new().unwrap();
    let watched = root.path().join("watched");
    let staging = root.path().join("staging");
    std::fs::create_dir(&watched).unwrap();
    std::fs::create_dir(&staging).unwrap();

    let store = Arc::new(MemoryStore::new());
    let importer = FileImporter::new(store.clone(), BUCKET, 60);
    let trigger = NotificationTrigger::new(watched.clone());
    let mut status = StatusLine::new(Vec::new());
    let shutdown = CancellationToken::new();

    let staged = write_export(
        &staging,
        "history.csv",
        &[row("1700000001", "Gyroscope"), row("1700000002", "Dawn Chorus")],
    );
    let imported = watched.join("history_imported.csv");

    let driver = {
        let shutdown = shutdown.clone();
        let watched = watched.clone();
        let imported = imported.clone();
        async move {
            // Give the watcher time to subscribe
            tokio::time::sleep(Duration::from_millis(300)).await;
            std::fs::hard_link(&staged, watched.join("history.csv")).unwrap();
            std::fs::write(watched.join("notes.txt"), "ignored").unwrap();
            let seen = wait_for(&imported, Duration::from_secs(10)).await;
            shutdown.cancel();
            seen
        }
    };

    let (result, seen) = tokio::join!(trigger.run(&importer, &mut status, shutdown.clone()), driver);

    assert!(result.is_ok());
    assert!(seen, "created file was not imported");
    assert!(!watched.join("history.csv").exists());
    assert!(watched.join("notes.txt").exists());
    assert_eq!(store.events(BUCKET).len(), 2);
}

#[tokio::test]
async fn test_notification_waits_for_rows_written_after_create() {
    let dir = TempDir::new().unwrap();
    let watched = dir.path().to_path_buf();

    let store = Arc::new(MemoryStore::new());
    let importer = FileImporter::new(store.clone(), BUCKET, 60);
    let trigger = NotificationTrigger::new(watched.clone()).with_settle(Duration::from_secs(2));
    let mut status = StatusLine::new(Vec::new());
    let shutdown = CancellationToken::new();
    let imported = watched.join("history_imported.csv");

    let driver = {
        let shutdown = shutdown.clone();
        let watched = watched.clone();
        let imported = imported.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(300)).await;

            // Header first, rows after a pause, like an exporter streaming its output
            let mut file = std::fs::File::create(watched.join("history.csv")).unwrap();
            writeln!(file, "{}", HEADER).unwrap();
            file.flush().unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            for i in 0..5 {
                writeln!(file, "{}", row(&format!("170000010{}", i), &format!("Track {}", i)))
                    .unwrap();
            }
            file.flush().unwrap();
            drop(file);

            let seen = wait_for(&imported, Duration::from_secs(10)).await;
            shutdown.cancel();
            seen
        }
    };

    let (result, seen) = tokio::join!(trigger.run(&importer, &mut status, shutdown.clone()), driver);

    assert!(result.is_ok());
    assert!(seen, "created file was not imported");
    assert_eq!(store.events(BUCKET).len(), 5);
}

#[tokio::test]
async fn test_notification_missing_directory_is_error() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MemoryStore::new());
    let importer = FileImporter::new(store, BUCKET, 60);
    let trigger = NotificationTrigger::new(dir.path().join("missing"));
    let mut status = StatusLine::new(Vec::new());

    let result = trigger
        .run(&importer, &mut status, CancellationToken::new())
        .await;

    assert!(result.is_err());
}
