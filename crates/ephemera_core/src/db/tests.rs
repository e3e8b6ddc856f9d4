//! Metadata store tests.

use super::*;
use crate::ids::RandomTokens;
use crate::models::{NewFile, NewPaste};
use chrono::Duration;
use tempfile::TempDir;

fn setup_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("db");
    let db = Database::new(db_path.to_str().unwrap()).unwrap();
    (db, temp_dir)
}

fn file_expiring_in(ttl: Duration) -> FileEntry {
    FileEntry::new(
        &RandomTokens,
        NewFile {
            original_name: "notes.txt".to_string(),
            size: 5,
            content_type: "text/plain".to_string(),
            ttl,
            max_downloads: None,
        },
        Utc::now(),
    )
}

fn paste_expiring_in(ttl: Duration) -> Paste {
    Paste::new(
        &RandomTokens,
        NewPaste {
            content: "hello".to_string(),
            language: None,
            title: None,
            ttl,
            max_views: Some(10),
        },
        "text".to_string(),
        Utc::now(),
    )
}

#[tokio::test]
async fn insert_then_find_returns_equal_record() {
    let (db, _temp) = setup_test_db();
    let ctx = OpContext::background();
    let entry = file_expiring_in(Duration::hours(1));

    db.insert(&ctx, &entry).await.expect("insert");
    let found: FileEntry = db.find(&ctx, &entry.id).await.expect("find");
    assert_eq!(found, entry);

    let missing: Result<FileEntry, _> = db.find(&ctx, "nope").await;
    assert!(matches!(missing, Err(StorageError::NotFound)));
}

#[tokio::test]
async fn files_and_pastes_live_in_separate_tables() {
    let (db, _temp) = setup_test_db();
    let ctx = OpContext::background();
    let paste = paste_expiring_in(Duration::hours(1));
    db.insert(&ctx, &paste).await.expect("insert");

    let as_file: Result<FileEntry, _> = db.find(&ctx, &paste.id).await;
    assert!(matches!(as_file, Err(StorageError::NotFound)));
    let as_paste: Paste = db.find(&ctx, &paste.id).await.expect("find");
    assert_eq!(as_paste.content, "hello");
}

#[tokio::test]
async fn duplicate_insert_is_rejected() {
    let (db, _temp) = setup_test_db();
    let ctx = OpContext::background();
    let entry = file_expiring_in(Duration::hours(1));

    db.insert(&ctx, &entry).await.expect("insert");
    let err = db.insert(&ctx, &entry).await.expect_err("duplicate");
    assert!(matches!(err, StorageError::Duplicate(id) if id == entry.id));
}

#[tokio::test]
async fn increment_usage_persists_counter() {
    let (db, _temp) = setup_test_db();
    let ctx = OpContext::background();
    let paste = paste_expiring_in(Duration::hours(1));
    db.insert(&ctx, &paste).await.expect("insert");

    assert_eq!(
        RecordStore::<Paste>::increment_usage(&db, &ctx, &paste.id)
            .await
            .expect("first"),
        1
    );
    assert_eq!(
        RecordStore::<Paste>::increment_usage(&db, &ctx, &paste.id)
            .await
            .expect("second"),
        2
    );
    let stored: Paste = db.find(&ctx, &paste.id).await.expect("find");
    assert_eq!(stored.views, 2);

    let err = RecordStore::<Paste>::increment_usage(&db, &ctx, "missing")
        .await
        .expect_err("missing");
    assert!(matches!(err, StorageError::NotFound));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_do_not_lose_updates() {
    let (db, _temp) = setup_test_db();
    let ctx = OpContext::background();
    let entry = file_expiring_in(Duration::hours(1));
    db.insert(&ctx, &entry).await.expect("insert");

    let mut handles = Vec::new();
    for _ in 0..32 {
        let db = db.clone();
        let id = entry.id.clone();
        handles.push(tokio::spawn(async move {
            RecordStore::<FileEntry>::increment_usage(&db, &OpContext::background(), &id).await
        }));
    }

    let mut counts = Vec::new();
    for handle in handles {
        counts.push(handle.await.expect("join").expect("increment"));
    }
    counts.sort_unstable();
    assert_eq!(counts, (1..=32).collect::<Vec<u64>>());

    let stored: FileEntry = db.find(&ctx, &entry.id).await.expect("find");
    assert_eq!(stored.downloads, 32);
}

#[tokio::test]
async fn remove_returns_row_and_clears_index() {
    let (db, _temp) = setup_test_db();
    let ctx = OpContext::background();
    let entry = file_expiring_in(Duration::milliseconds(-10));
    db.insert(&ctx, &entry).await.expect("insert");

    let removed: FileEntry = db.remove(&ctx, &entry.id).await.expect("remove");
    assert_eq!(removed.id, entry.id);

    let swept: Vec<FileEntry> = db.remove_expired(&ctx, Utc::now()).await.expect("sweep");
    assert!(swept.is_empty());

    let again: Result<FileEntry, _> = db.remove(&ctx, &entry.id).await;
    assert!(matches!(again, Err(StorageError::NotFound)));
}

#[tokio::test]
async fn remove_expired_only_takes_past_rows() {
    let (db, _temp) = setup_test_db();
    let ctx = OpContext::background();
    let expired = paste_expiring_in(Duration::seconds(-5));
    let live = paste_expiring_in(Duration::hours(1));
    db.insert(&ctx, &expired).await.expect("insert expired");
    db.insert(&ctx, &live).await.expect("insert live");

    let swept: Vec<Paste> = db.remove_expired(&ctx, Utc::now()).await.expect("sweep");
    assert_eq!(swept.len(), 1);
    assert_eq!(swept[0].id, expired.id);

    let gone: Result<Paste, _> = db.find(&ctx, &expired.id).await;
    assert!(matches!(gone, Err(StorageError::NotFound)));
    let kept: Paste = db.find(&ctx, &live.id).await.expect("live row");
    assert_eq!(kept.id, live.id);

    let second: Vec<Paste> = db.remove_expired(&ctx, Utc::now()).await.expect("sweep");
    assert!(second.is_empty());
}

#[tokio::test]
async fn cancelled_context_skips_storage_work() {
    let (db, _temp) = setup_test_db();
    let ctx = OpContext::background();
    ctx.cancel();
    let entry = file_expiring_in(Duration::hours(1));

    let err = db.insert(&ctx, &entry).await.expect_err("cancelled");
    assert!(matches!(err, StorageError::Cancelled));

    let missing: Result<FileEntry, _> = db.find(&OpContext::background(), &entry.id).await;
    assert!(matches!(missing, Err(StorageError::NotFound)));
}

/// Hold redb's single writer slot on another thread for `hold`. Returns once
/// the slot is taken.
fn hold_writer(db: &Database, hold: std::time::Duration) -> std::thread::JoinHandle<()> {
    let inner = db.db.clone();
    let (taken_tx, taken_rx) = std::sync::mpsc::channel();
    let handle = std::thread::spawn(move || {
        let txn = inner.begin_write().expect("begin write");
        taken_tx.send(()).expect("signal");
        std::thread::sleep(hold);
        drop(txn);
    });
    taken_rx.recv().expect("writer taken");
    handle
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn write_past_deadline_is_aborted_not_committed() {
    let (db, _temp) = setup_test_db();
    let entry = file_expiring_in(Duration::hours(1));

    let writer = hold_writer(&db, std::time::Duration::from_millis(300));
    let ctx = OpContext::with_timeout(std::time::Duration::from_millis(50));
    let err = db.insert(&ctx, &entry).await.expect_err("deadline");
    assert!(matches!(err, StorageError::DeadlineExceeded));
    writer.join().expect("writer thread");

    let missing: Result<FileEntry, _> = db.find(&OpContext::background(), &entry.id).await;
    assert!(matches!(missing, Err(StorageError::NotFound)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn increment_and_sweep_past_deadline_leave_rows_untouched() {
    let (db, _temp) = setup_test_db();
    let background = OpContext::background();
    let expired = paste_expiring_in(Duration::seconds(-5));
    db.insert(&background, &expired).await.expect("insert");

    let writer = hold_writer(&db, std::time::Duration::from_millis(300));
    let ctx = OpContext::with_timeout(std::time::Duration::from_millis(50));
    let err = RecordStore::<Paste>::increment_usage(&db, &ctx, &expired.id)
        .await
        .expect_err("deadline");
    assert!(matches!(err, StorageError::DeadlineExceeded));
    let err = RecordStore::<Paste>::remove_expired(&db, &ctx, Utc::now())
        .await
        .expect_err("deadline");
    assert!(matches!(err, StorageError::DeadlineExceeded));
    writer.join().expect("writer thread");

    let stored: Paste = db.find(&background, &expired.id).await.expect("row kept");
    assert_eq!(stored.views, 0);
}

#[tokio::test]
async fn reopening_keeps_rows() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("db");
    let db_path = db_path.to_str().unwrap();
    let ctx = OpContext::background();
    let entry = file_expiring_in(Duration::hours(1));

    {
        let db = Database::new(db_path).expect("open");
        db.insert(&ctx, &entry).await.expect("insert");
    }

    let reopened = Database::new(db_path).expect("reopen");
    let found: FileEntry = reopened.find(&ctx, &entry.id).await.expect("find");
    assert_eq!(found, entry);
}

#[test]
fn explicit_redb_path_is_used_verbatim() {
    assert_eq!(
        resolve_db_file(Path::new("/tmp/store.redb")),
        PathBuf::from("/tmp/store.redb")
    );
    assert_eq!(
        resolve_db_file(Path::new("/tmp/ephemera")),
        PathBuf::from("/tmp/ephemera").join(REDB_FILE_NAME)
    );
}

#[test]
fn expiry_key_clamps_pre_epoch_timestamps() {
    let before_epoch = DateTime::<Utc>::from_timestamp(-100, 0).unwrap();
    assert_eq!(records::expiry_key(before_epoch), 0);
    let later = DateTime::<Utc>::from_timestamp(2, 5_000_000).unwrap();
    assert_eq!(records::expiry_key(later), 2_005);
}
