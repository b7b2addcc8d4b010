//! Scanner: directory traversal and content hashing.
//!
//! The scanner produces the `(path, hash, size)` triples consumed by the
//! record store:
//! - [`walker`]: parallel directory traversal with jwalk
//! - [`hasher`]: streaming BLAKE3 content digests
//!
//! # Example
//!
//! ```no_run
//! use drydupe::scanner::{Hasher, Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from(".")], WalkerConfig::default());
//! let hasher = Hasher::new();
//! for entry in walker.walk().filter_map(Result::ok) {
//!     let hash = hasher.full_hash(&entry.path).unwrap();
//!     println!("{} {} {}", hash, entry.size, entry.path.display());
//! }
//! ```

pub mod hasher;
pub mod walker;

use std::path::PathBuf;

// Re-export main types
pub use hasher::{HashError, Hasher};
pub use walker::Walker;

/// A regular file discovered by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Normalized absolute path
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileEntry {
    #[must_use]
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self { path, size }
    }

    /// Path as stored in the record store.
    ///
    /// `None` for paths that are not valid UTF-8: a lossy rendering could
    /// map two distinct files onto the same stored path.
    #[must_use]
    pub fn path_str(&self) -> Option<&str> {
        self.path.to_str()
    }
}

/// Configuration for directory walking.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (names starting with `.`).
    pub skip_hidden: bool,

    /// Minimum file size to include (in bytes).
    pub min_size: Option<u64>,
}

/// Errors that can occur while walking a directory tree.
///
/// These are reported per entry; the walk continues past them.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// Permission was denied when accessing a file or directory.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while accessing a file.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error for `path`.
    #[must_use]
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io { path, source },
        }
    }
}
