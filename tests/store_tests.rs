//! Integration tests for the record store contract.

use drydupe::store::{FileRecord, RecordStore, ResultRecord, StoreError};
use std::collections::HashSet;
use std::fs;
use tempfile::tempdir;

// =============================================================================
// Helper Functions
// =============================================================================

fn file_store() -> (tempfile::TempDir, RecordStore) {
    let dir = tempdir().unwrap();
    let store = RecordStore::with_path(dir.path().join("records.db")).unwrap();
    (dir, store)
}

fn member_set(files: &[FileRecord]) -> HashSet<(String, u64)> {
    files.iter().map(|f| (f.path.clone(), f.size)).collect()
}

// =============================================================================
// Duplicate detection
// =============================================================================

#[test]
fn test_end_to_end_scenario() {
    let (_dir, store) = file_store();
    store.record_file("/a/1.txt", "H1", 10).unwrap();
    store.record_file("/a/2.txt", "H1", 10).unwrap();
    store.record_file("/a/3.txt", "H2", 5).unwrap();

    assert_eq!(store.duplicate_hashes().unwrap(), vec!["H1".to_string()]);

    let files = store.files_for_hash("H1").unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(
        member_set(&files),
        HashSet::from([("/a/1.txt".to_string(), 10), ("/a/2.txt".to_string(), 10)])
    );

    assert!(store.record_group("H1", "/a/1.txt", 10).unwrap());
    assert!(store.record_group("H1", "/a/2.txt", 10).unwrap());

    let results: HashSet<ResultRecord> = store.results().unwrap().into_iter().collect();
    assert_eq!(
        results,
        HashSet::from([
            ResultRecord::new("H1", "/a/1.txt", 10),
            ResultRecord::new("H1", "/a/2.txt", 10),
        ])
    );
}

#[test]
fn test_shared_hash_with_different_sizes() {
    let (_dir, store) = file_store();
    store.record_file("/x", "same", 1).unwrap();
    store.record_file("/y", "same", 2).unwrap();

    assert_eq!(store.duplicate_hashes().unwrap(), vec!["same".to_string()]);
    assert_eq!(
        member_set(&store.files_for_hash("same").unwrap()),
        HashSet::from([("/x".to_string(), 1), ("/y".to_string(), 2)])
    );
}

#[test]
fn test_singleton_hash_is_not_a_duplicate() {
    let (_dir, store) = file_store();
    store.record_file("/only", "lonely", 7).unwrap();
    assert!(store.duplicate_hashes().unwrap().is_empty());
    assert_eq!(store.files_for_hash("lonely").unwrap().len(), 1);
    assert!(store.files_for_hash("absent").unwrap().is_empty());
}

#[test]
fn test_hash_with_sql_metacharacters() {
    let (_dir, store) = file_store();
    let hash = "x' OR '1'='1";
    store.record_file("/q1", hash, 3).unwrap();
    store.record_file("/q2", hash, 3).unwrap();
    store.record_file("/other", "plain", 3).unwrap();

    let files = store.files_for_hash(hash).unwrap();
    assert_eq!(files.len(), 2);
    assert!(files.iter().all(|f| f.hash == hash));
}

// =============================================================================
// Failure semantics
// =============================================================================

#[test]
fn test_duplicate_path_leaves_state_unchanged() {
    let (_dir, store) = file_store();
    store.record_file("/p", "h1", 4).unwrap();

    let err = store.record_file("/p", "h2", 9).unwrap_err();
    assert!(matches!(err, StoreError::DuplicatePath(ref p) if p == "/p"));

    assert_eq!(store.file_count().unwrap(), 1);
    assert!(store.files_for_hash("h2").unwrap().is_empty());
    assert_eq!(store.files_for_hash("h1").unwrap(), vec![FileRecord::new("/p", "h1", 4)]);
}

#[test]
fn test_operations_before_open_fail() {
    let mut store = RecordStore::new();
    assert!(!store.is_open());
    assert!(matches!(store.ensure_schema(), Err(StoreError::NotOpen)));
    assert!(matches!(store.record_file("/a", "h", 1), Err(StoreError::NotOpen)));
    assert!(matches!(store.duplicate_hashes(), Err(StoreError::NotOpen)));
    assert!(matches!(store.files_for_hash("h"), Err(StoreError::NotOpen)));
    assert!(matches!(store.record_group("h", "/a", 1), Err(StoreError::NotOpen)));
    assert!(matches!(store.results(), Err(StoreError::NotOpen)));
    assert!(matches!(store.record_files(std::iter::empty::<&FileRecord>()), Err(StoreError::NotOpen)));

    store.close().unwrap();
    store.close().unwrap();
}

#[test]
fn test_operations_after_close_fail() {
    let (_dir, mut store) = file_store();
    store.close().unwrap();
    store.close().unwrap();
    assert!(store.path().is_none());
    assert!(matches!(store.duplicate_hashes(), Err(StoreError::NotOpen)));
}

#[test]
fn test_open_rejects_non_database_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("garbage.db");
    fs::write(&path, vec![0xAB; 4096]).unwrap();

    let err = RecordStore::with_path(&path).unwrap_err();
    assert!(matches!(err, StoreError::Open { .. }));
}

#[test]
fn test_open_in_missing_directory_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("missing").join("records.db");
    assert!(matches!(
        RecordStore::with_path(path),
        Err(StoreError::Open { .. })
    ));
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_records_survive_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records.db");
    {
        let store = RecordStore::with_path(&path).unwrap();
        store.record_file("/a", "h", 1).unwrap();
        store.record_file("/b", "h", 1).unwrap();
        store.record_group("h", "/a", 1).unwrap();
    }

    let store = RecordStore::with_path(&path).unwrap();
    assert_eq!(store.file_count().unwrap(), 2);
    assert_eq!(store.results().unwrap(), vec![ResultRecord::new("h", "/a", 1)]);
    assert!(!store.record_group("h", "/a", 1).unwrap());
}

#[test]
fn test_export_copies_both_tables() {
    let (dir, store) = file_store();
    store.record_file("/a", "h", 2).unwrap();
    store.record_file("/b", "h", 2).unwrap();
    store.record_group("h", "/a", 2).unwrap();
    store.record_group("h", "/b", 2).unwrap();

    let dest = dir.path().join("duplicates.sqlite");
    fs::write(&dest, b"stale").unwrap();
    store.export_to(&dest).unwrap();

    let copy = RecordStore::with_path(&dest).unwrap();
    assert_eq!(copy.file_count().unwrap(), 2);
    assert_eq!(copy.results().unwrap(), store.results().unwrap());
}
