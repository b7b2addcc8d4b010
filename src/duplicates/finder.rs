//! Duplicate finder: drives the scanner, the record store and the run stats.
//!
//! # Overview
//!
//! 1. **Scan** - walk the roots, hash files on a rayon pool and record every
//!    `(path, hash, size)` triple in the store from the calling thread
//! 2. **Group** - ask the store for hashes shared by two or more files, load
//!    each group's members and materialize them into the `result` table
//!
//! `total_count`/`total_size` are bumped for every recorded file;
//! `files_count`/`files_size` only for memberships the store newly inserted,
//! so running the grouping step twice never double counts.
//!
//! # Example
//!
//! ```no_run
//! use drydupe::duplicates::DuplicateFinder;
//! use drydupe::stats::Stats;
//! use drydupe::store::RecordStore;
//! use std::path::PathBuf;
//!
//! let mut store = RecordStore::new();
//! store.open_in_memory().unwrap();
//! let mut stats = Stats::new();
//!
//! let finder = DuplicateFinder::with_defaults();
//! let outcome = finder
//!     .find_duplicates(&[PathBuf::from(".")], &mut store, &mut stats)
//!     .unwrap();
//! println!("{} duplicate groups", outcome.groups.len());
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;

use super::groups::DuplicateGroup;
use crate::scanner::{FileEntry, Hasher, Walker, WalkerConfig};
use crate::stats::Stats;
use crate::store::{FileRecord, RecordStore, ResultRecord, StoreError};

/// Configuration for the duplicate finder.
#[derive(Debug, Clone)]
pub struct FinderConfig {
    /// Number of I/O threads for parallel hashing.
    /// Default is 4 to prevent disk thrashing.
    pub io_threads: usize,
    /// Walker configuration for directory traversal.
    pub walker_config: WalkerConfig,
    /// Optional shutdown flag for graceful termination.
    pub shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            io_threads: 4,
            walker_config: WalkerConfig::default(),
            shutdown_flag: None,
        }
    }
}

impl FinderConfig {
    /// Set the number of hashing threads.
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads.max(1);
        self
    }

    /// Set the walker configuration.
    #[must_use]
    pub fn with_walker_config(mut self, config: WalkerConfig) -> Self {
        self.walker_config = config;
        self
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }
}

/// Errors that abort a duplicate search.
#[derive(thiserror::Error, Debug)]
pub enum FinderError {
    /// The scan was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Scan interrupted by user")]
    Interrupted,

    /// The provided path does not exist.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// The provided path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The hashing thread pool could not be built.
    #[error("Failed to build hashing thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The record store rejected an operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a completed search.
#[derive(Debug, Clone, Default)]
pub struct FinderOutcome {
    /// Duplicate groups, ordered by hash
    pub groups: Vec<DuplicateGroup>,
    /// Files skipped because they could not be read
    pub skipped: usize,
}

/// Duplicate finder that runs the scan and grouping steps.
#[derive(Debug)]
pub struct DuplicateFinder {
    config: FinderConfig,
    hasher: Hasher,
}

impl DuplicateFinder {
    #[must_use]
    pub fn new(config: FinderConfig) -> Self {
        Self {
            config,
            hasher: Hasher::new(),
        }
    }

    /// Create a new duplicate finder with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(FinderConfig::default())
    }

    /// Scan `roots` into `store` and materialize the duplicate groups.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] for invalid roots, interruption, or any store
    /// failure. A store failure aborts the run.
    pub fn find_duplicates(
        &self,
        roots: &[PathBuf],
        store: &mut RecordStore,
        stats: &mut Stats,
    ) -> Result<FinderOutcome, FinderError> {
        let skipped = self.scan(roots, store, stats)?;
        self.check_shutdown()?;
        let groups = Self::materialize_groups(store, stats)?;
        log::info!(
            "Found {} duplicate groups ({} files)",
            groups.len(),
            stats.files_count
        );
        Ok(FinderOutcome { groups, skipped })
    }

    /// Walk and hash `roots`, recording every file in `store`.
    ///
    /// Returns the number of files skipped because they could not be read.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError`] for invalid roots, interruption, or a store
    /// failure. Nothing is recorded if the batch insert fails.
    pub fn scan(
        &self,
        roots: &[PathBuf],
        store: &mut RecordStore,
        stats: &mut Stats,
    ) -> Result<usize, FinderError> {
        for root in roots {
            if !root.exists() {
                return Err(FinderError::PathNotFound(root.clone()));
            }
            if !root.is_dir() {
                return Err(FinderError::NotADirectory(root.clone()));
            }
        }

        let mut walker = Walker::new(roots.to_vec(), self.config.walker_config.clone());
        if let Some(flag) = &self.config.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut skipped = 0;
        let entries: Vec<(String, FileEntry)> = walker
            .walk()
            .filter_map(|entry| match entry {
                Ok(file) => match file.path_str().map(str::to_owned) {
                    Some(path) => Some((path, file)),
                    None => {
                        log::warn!("Skipping non UTF-8 path: {}", file.path.display());
                        skipped += 1;
                        None
                    }
                },
                Err(e) => {
                    log::warn!("Skipping: {}", e);
                    skipped += 1;
                    None
                }
            })
            .collect();
        self.check_shutdown()?;
        log::info!("Hashing {} files", entries.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.io_threads.max(1))
            .build()?;
        let hashed: Vec<_> = pool.install(|| {
            entries
                .par_iter()
                .filter(|_| !self.is_shutdown_requested())
                .map(|(path, entry)| {
                    self.hasher
                        .full_hash(&entry.path)
                        .map(|hash| FileRecord::new(path.as_str(), hash, entry.size))
                })
                .collect()
        });
        self.check_shutdown()?;

        let mut records = Vec::with_capacity(hashed.len());
        for result in hashed {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    log::warn!("Skipping: {}", e);
                    skipped += 1;
                }
            }
        }

        store.record_files(&records)?;
        for record in &records {
            stats.record_scanned(record.size);
        }
        log::debug!(
            "Recorded {} files ({} bytes), skipped {}",
            stats.total_count,
            stats.total_size,
            skipped
        );
        Ok(skipped)
    }

    /// Derive duplicate groups from `store` and write their memberships.
    ///
    /// Usable on its own when the files were recorded by another scanner.
    ///
    /// # Errors
    ///
    /// Returns the store error; the membership batch is written atomically.
    pub fn materialize_groups(
        store: &mut RecordStore,
        stats: &mut Stats,
    ) -> Result<Vec<DuplicateGroup>, FinderError> {
        let mut groups = Vec::new();
        for hash in store.duplicate_hashes()? {
            let files = store.files_for_hash(&hash)?;
            match DuplicateGroup::new(hash.clone(), files) {
                Some(group) => groups.push(group),
                None => log::warn!("Hash {} no longer has two members", hash),
            }
        }
        groups.sort_by(|a, b| a.hash.cmp(&b.hash));

        let records: Vec<ResultRecord> = groups
            .iter()
            .flat_map(DuplicateGroup::result_records)
            .collect();
        for record in store.record_groups(&records)? {
            stats.record_duplicate(record.size);
        }
        Ok(groups)
    }

    fn is_shutdown_requested(&self) -> bool {
        self.config
            .shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    fn check_shutdown(&self) -> Result<(), FinderError> {
        if self.is_shutdown_requested() {
            log::debug!("Finder: Shutdown requested");
            Err(FinderError::Interrupted)
        } else {
            Ok(())
        }
    }
}
