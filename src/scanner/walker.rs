//! Directory walker implementation using jwalk for parallel traversal.
//!
//! # Overview
//!
//! [`Walker`] visits one or more roots and yields every regular file as a
//! [`FileEntry`]. Paths are canonicalized so that overlapping roots, or a
//! file reached twice through a followed symlink, are reported only once; the
//! record store rejects repeated paths.
//!
//! # Example
//!
//! ```no_run
//! use drydupe::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig {
//!     skip_hidden: true,
//!     ..Default::default()
//! };
//!
//! let walker = Walker::new(vec![PathBuf::from("/home/user/Downloads")], config);
//! for entry in walker.walk() {
//!     match entry {
//!         Ok(file) => println!("{}: {} bytes", file.path.display(), file.size),
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use jwalk::WalkDir;

use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker for parallel file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root paths to walk
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker over `roots`.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self {
            roots,
            config,
            shutdown_flag: None,
        }
    }

    /// Stop yielding entries once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Walk every root, yielding file entries.
    ///
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. Empty files and files below `min_size` are skipped.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let mut seen: HashSet<PathBuf> = HashSet::new();

        self.roots
            .iter()
            .flat_map(move |root| {
                WalkDir::new(root)
                    .follow_links(self.config.follow_symlinks)
                    .skip_hidden(self.config.skip_hidden)
                    .sort(true)
                    .into_iter()
                    .map(move |entry| (root, entry))
            })
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |(root, entry_result)| match entry_result {
                Ok(entry) => {
                    let file_type = entry.file_type();
                    if file_type.is_dir() {
                        return None;
                    }
                    if file_type.is_symlink() && !self.config.follow_symlinks {
                        log::trace!("Skipping symlink: {}", entry.path().display());
                        return None;
                    }

                    let path = entry.path();
                    let metadata = match std::fs::metadata(&path) {
                        Ok(m) => m,
                        Err(e) => return Some(Err(ScanError::from_io(path, e))),
                    };
                    if !metadata.is_file() {
                        return None;
                    }

                    let size = metadata.len();
                    if size == 0 {
                        log::debug!("Skipping empty file: {}", path.display());
                        return None;
                    }
                    if self.config.min_size.is_some_and(|min| size < min) {
                        log::trace!("Skipping file below size limit: {}", path.display());
                        return None;
                    }

                    let path = std::fs::canonicalize(&path).unwrap_or(path);
                    if !seen.insert(path.clone()) {
                        log::trace!("Skipping already visited file: {}", path.display());
                        return None;
                    }
                    Some(Ok(FileEntry::new(path, size)))
                }
                Err(e) => {
                    let path = e.path().map_or_else(|| root.clone(), ToOwned::to_owned);
                    log::warn!("Cannot read {}: {}", path.display(), e);
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walk error"));
                    Some(Err(ScanError::from_io(path, source)))
                }
            })
    }
}
