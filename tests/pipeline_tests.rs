//! End-to-end tests: directory scan, record store, grouping and reports.

use drydupe::config::Config;
use drydupe::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use drydupe::error::ExitCode;
use drydupe::output::{FormatError, OutputFormat};
use drydupe::stats::Stats;
use drydupe::store::RecordStore;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::{tempdir, TempDir};

// =============================================================================
// Helper Functions
// =============================================================================

/// Two identical files, one unique file, one empty file.
fn sample_tree() -> TempDir {
    let dir = tempdir().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("file1.txt"), b"duplicate content").unwrap();
    fs::write(dir.path().join("nested/file2.txt"), b"duplicate content").unwrap();
    fs::write(dir.path().join("unique.txt"), b"something else entirely").unwrap();
    fs::write(dir.path().join("empty.txt"), b"").unwrap();
    dir
}

fn config_with_format(format: &str) -> Config {
    Config {
        format: format.to_string(),
        ..Config::default()
    }
}

fn run_to_string(config: &Config, root: &Path) -> (ExitCode, String) {
    let mut out = Vec::new();
    let code = drydupe::run(config, &[root.to_path_buf()], None, &mut out).unwrap();
    (code, String::from_utf8(out).unwrap())
}

// =============================================================================
// Finder
// =============================================================================

#[test]
fn test_finder_groups_identical_files() {
    let tree = sample_tree();
    let mut store = RecordStore::new();
    store.open_in_memory().unwrap();
    let mut stats = Stats::new();

    let outcome = DuplicateFinder::with_defaults()
        .find_duplicates(&[tree.path().to_path_buf()], &mut store, &mut stats)
        .unwrap();

    assert_eq!(outcome.skipped, 0);
    assert_eq!(outcome.groups.len(), 1);
    let group = &outcome.groups[0];
    assert_eq!(group.len(), 2);
    assert!(group.files.iter().any(|f| f.path.ends_with("file1.txt")));
    assert!(group.files.iter().any(|f| f.path.ends_with("file2.txt")));

    assert_eq!(stats.total_count, 3);
    assert_eq!(stats.total_size, 17 + 17 + 23);
    assert_eq!(stats.files_count, 2);
    assert_eq!(stats.files_size, 34);
    assert_eq!(store.file_count().unwrap(), 3);
    assert_eq!(store.results().unwrap().len(), 2);
}

#[test]
fn test_finder_overlapping_roots() {
    let tree = sample_tree();
    let mut store = RecordStore::new();
    store.open_in_memory().unwrap();
    let mut stats = Stats::new();

    let roots = vec![tree.path().to_path_buf(), tree.path().join("nested")];
    let outcome = DuplicateFinder::new(FinderConfig::default().with_io_threads(2))
        .find_duplicates(&roots, &mut store, &mut stats)
        .unwrap();
    assert_eq!(outcome.groups.len(), 1);
    assert_eq!(stats.total_count, 3);
}

#[test]
fn test_finder_rejects_bad_roots() {
    let tree = sample_tree();
    let mut store = RecordStore::new();
    store.open_in_memory().unwrap();
    let finder = DuplicateFinder::with_defaults();

    let missing = finder.find_duplicates(&[tree.path().join("nope")], &mut store, &mut Stats::new());
    assert!(matches!(missing, Err(FinderError::PathNotFound(_))));

    let file = finder.find_duplicates(&[tree.path().join("unique.txt")], &mut store, &mut Stats::new());
    assert!(matches!(file, Err(FinderError::NotADirectory(_))));
    assert_eq!(store.file_count().unwrap(), 0);
}

#[test]
fn test_finder_requires_open_store() {
    let tree = sample_tree();
    let mut store = RecordStore::new();
    let result = DuplicateFinder::with_defaults().find_duplicates(
        &[tree.path().to_path_buf()],
        &mut store,
        &mut Stats::new(),
    );
    assert!(matches!(result, Err(FinderError::Store(_))));
}

// =============================================================================
// Reports
// =============================================================================

#[test]
fn test_run_json_to_writer() {
    let tree = sample_tree();
    let (code, out) = run_to_string(&config_with_format("JSON"), tree.path());
    assert_eq!(code, ExitCode::Success);

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["summary"]["total_files"], 3);
    assert_eq!(json["summary"]["duplicate_groups"], 1);
    assert_eq!(json["summary"]["duplicate_files"], 2);
    assert_eq!(json["summary"]["reclaimable_space"], 17);
    assert_eq!(json["duplicates"][0]["files"].as_array().unwrap().len(), 2);
}

#[test]
fn test_run_text_without_duplicates() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a"), b"alpha").unwrap();
    fs::write(dir.path().join("b"), b"beta").unwrap();

    let (code, out) = run_to_string(&Config::default(), dir.path());
    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(out.contains("Scanned 2 files"));
    assert!(out.contains("No duplicates found"));
}

#[test]
fn test_run_html_writes_report_file() {
    let tree = sample_tree();
    let reports = tempdir().unwrap();
    let config = Config {
        output_dir: Some(reports.path().join("out")),
        report_name: "scan".to_string(),
        ..config_with_format("html")
    };

    let (code, out) = run_to_string(&config, tree.path());
    assert_eq!(code, ExitCode::Success);
    assert!(out.is_empty());

    let html = fs::read_to_string(reports.path().join("out/scan.htm")).unwrap();
    assert!(html.contains("file1.txt"));
    assert!(html.contains("file2.txt"));
    assert!(!html.contains("unique.txt"));
}

#[test]
fn test_run_text_to_output_dir() {
    let tree = sample_tree();
    let reports = tempdir().unwrap();
    let config = Config {
        output_dir: Some(reports.path().to_path_buf()),
        ..Config::default()
    };

    let (_, out) = run_to_string(&config, tree.path());
    assert!(out.is_empty());
    let text = fs::read_to_string(config.output_path(OutputFormat::Stdout)).unwrap();
    assert!(text.contains("2 files"));
}

#[test]
fn test_run_sqlite_exports_store() {
    let tree = sample_tree();
    let reports = tempdir().unwrap();
    let config = Config {
        output_dir: Some(reports.path().to_path_buf()),
        ..config_with_format("Sqlite")
    };

    let (code, _) = run_to_string(&config, tree.path());
    assert_eq!(code, ExitCode::Success);

    let exported = RecordStore::with_path(reports.path().join("duplicates.sqlite")).unwrap();
    assert_eq!(exported.file_count().unwrap(), 3);
    assert_eq!(exported.duplicate_hashes().unwrap().len(), 1);
    assert_eq!(exported.results().unwrap().len(), 2);
}

#[test]
fn test_run_keeps_named_database() {
    let tree = sample_tree();
    let dir = tempdir().unwrap();
    let db = dir.path().join("records.db");
    let config = Config {
        database: Some(db.clone()),
        ..config_with_format("json")
    };

    let (code, _) = run_to_string(&config, tree.path());
    assert_eq!(code, ExitCode::Success);
    let kept = RecordStore::with_path(&db).unwrap();
    assert_eq!(kept.results().unwrap().len(), 2);
    drop(kept);

    let mut out = Vec::new();
    let again = drydupe::run(&config, &[tree.path().to_path_buf()], None, &mut out);
    assert!(again.is_err());
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_run_rejects_invalid_format() {
    let tree = sample_tree();
    let reports = tempdir().unwrap();
    let config = Config {
        output_dir: Some(reports.path().to_path_buf()),
        ..config_with_format("pdf")
    };

    let mut out = Vec::new();
    let err = drydupe::run(&config, &[tree.path().to_path_buf()], None, &mut out).unwrap_err();
    assert_eq!(
        err.downcast_ref::<FormatError>(),
        Some(&FormatError::Invalid("pdf".to_string()))
    );
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert_eq!(fs::read_dir(reports.path()).unwrap().count(), 0);
}

#[test]
fn test_run_interrupted() {
    let tree = sample_tree();
    let flag = Arc::new(AtomicBool::new(true));
    let mut out = Vec::new();
    let err = drydupe::run(
        &config_with_format("json"),
        &[tree.path().to_path_buf()],
        Some(flag),
        &mut out,
    )
    .unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::Interrupted);
    assert!(out.is_empty());
}

#[test]
fn test_run_missing_root() {
    let mut out = Vec::new();
    let err = drydupe::run(
        &Config::default(),
        &[PathBuf::from("/definitely/not/here")],
        None,
        &mut out,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Path not found"));
}

#[cfg(unix)]
#[test]
fn test_run_with_non_utf8_names_is_partial_success() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tree = sample_tree();
    fs::write(tree.path().join(OsStr::from_bytes(b"a\xff")), b"first").unwrap();
    fs::write(tree.path().join(OsStr::from_bytes(b"a\xfe")), b"second").unwrap();

    let (code, out) = run_to_string(&config_with_format("json"), tree.path());
    assert_eq!(code, ExitCode::PartialSuccess);

    let json: serde_json::Value = serde_json::from_str(&out).unwrap();
    assert_eq!(json["summary"]["total_files"], 3);
    assert_eq!(json["summary"]["duplicate_groups"], 1);
}
