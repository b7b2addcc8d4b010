//! Row types stored in the record store.

use serde::{Deserialize, Serialize};

/// One scanned file: its path, content hash and size.
///
/// Paths are unique within a store; hashes are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileRecord {
    /// Normalized path of the file
    pub path: String,
    /// Content digest produced by the scanner
    pub hash: String,
    /// File size in bytes
    pub size: u64,
}

impl FileRecord {
    /// Create a new file record.
    #[must_use]
    pub fn new(path: impl Into<String>, hash: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            hash: hash.into(),
            size,
        }
    }
}

/// One materialized membership of a file in a duplicate group.
///
/// The size is copied from the file record at grouping time and is never
/// re-derived when reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Hash identifying the duplicate group
    pub group_id: String,
    /// Path of the member file
    pub path: String,
    /// Size of the member file in bytes
    pub size: u64,
}

impl ResultRecord {
    /// Create a new result record.
    #[must_use]
    pub fn new(group_id: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            group_id: group_id.into(),
            path: path.into(),
            size,
        }
    }
}
