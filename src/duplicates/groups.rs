//! Duplicate groups derived from the record store.
//!
//! A group is identified by its hash and always has two or more members.
//! Groups are recomputed from the `files` table on demand and never cached.

use serde::Serialize;

use crate::store::{FileRecord, ResultRecord};

/// Files sharing one content hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Hash shared by every member; doubles as the group id
    pub hash: String,
    /// Member files, ordered by path
    pub files: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Build a group from store rows.
    ///
    /// Returns `None` when fewer than two files are given or when a member's
    /// hash differs from `hash`.
    #[must_use]
    pub fn new(hash: impl Into<String>, mut files: Vec<FileRecord>) -> Option<Self> {
        let hash = hash.into();
        if files.len() < 2 || files.iter().any(|f| f.hash != hash) {
            return None;
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Some(Self { hash, files })
    }

    /// Number of member files.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Groups always hold at least two files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Size of a single copy.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.files.iter().map(|f| f.size).max().unwrap_or(0)
    }

    /// Combined size of every member.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Space that keeping only one copy would free.
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        self.total_size().saturating_sub(self.size())
    }

    /// One result row per member.
    #[must_use]
    pub fn result_records(&self) -> Vec<ResultRecord> {
        self.files
            .iter()
            .map(|f| ResultRecord::new(self.hash.clone(), f.path.clone(), f.size))
            .collect()
    }
}
