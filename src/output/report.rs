//! Reporter input assembled from the `result` table and a stats snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::stats::{Stats, StatsSnapshot};
use crate::store::{RecordStore, ResultRecord, StoreResult};

/// One duplicate group as it appears in a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportGroup {
    /// Hash shared by every member
    pub hash: String,
    /// Member files, ordered by path
    pub files: Vec<ReportFile>,
}

/// One member file of a [`ReportGroup`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportFile {
    pub path: String,
    pub size: u64,
}

impl ReportGroup {
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

    /// Space freed by keeping only one copy.
    #[must_use]
    pub fn reclaimable(&self) -> u64 {
        self.total_size().saturating_sub(self.size())
    }
}

/// Everything a renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub groups: Vec<ReportGroup>,
    pub stats: StatsSnapshot,
}

impl Report {
    /// Fold result rows into groups. Rows sharing a group id are merged even
    /// when they are not adjacent.
    #[must_use]
    pub fn from_results(results: Vec<ResultRecord>, stats: StatsSnapshot) -> Self {
        let mut by_hash: BTreeMap<String, Vec<ReportFile>> = BTreeMap::new();
        for record in results {
            by_hash.entry(record.group_id).or_default().push(ReportFile {
                path: record.path,
                size: record.size,
            });
        }
        let groups = by_hash
            .into_iter()
            .map(|(hash, mut files)| {
                files.sort_by(|a, b| a.path.cmp(&b.path));
                ReportGroup { hash, files }
            })
            .collect();
        Self { groups, stats }
    }

    /// Read the materialized groups from `store` and snapshot `stats`.
    ///
    /// # Errors
    ///
    /// Returns the store error if the `result` table cannot be read.
    pub fn from_store(store: &RecordStore, stats: &Stats) -> StoreResult<Self> {
        Ok(Self::from_results(store.results()?, stats.snapshot()))
    }

    /// Number of member files across all groups.
    #[must_use]
    pub fn duplicate_files(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }

    /// Space freed by keeping one copy of every group.
    #[must_use]
    pub fn reclaimable_space(&self) -> u64 {
        self.groups.iter().map(ReportGroup::reclaimable).sum()
    }

    /// Whether any duplicates were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_results_groups_rows() {
        let rows = vec![
            ResultRecord::new("H2", "/b/2", 5),
            ResultRecord::new("H1", "/a/2", 10),
            ResultRecord::new("H2", "/b/1", 5),
            ResultRecord::new("H1", "/a/1", 10),
        ];
        let report = Report::from_results(rows, StatsSnapshot::default());

        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].hash, "H1");
        assert_eq!(report.groups[0].files[0].path, "/a/1");
        assert_eq!(report.groups[1].files[1].path, "/b/2");
        assert_eq!(report.duplicate_files(), 4);
    }

    #[test]
    fn test_reclaimable_space() {
        let rows = vec![
            ResultRecord::new("H1", "/a", 10),
            ResultRecord::new("H1", "/b", 10),
            ResultRecord::new("H1", "/c", 10),
        ];
        let report = Report::from_results(rows, StatsSnapshot::default());
        assert_eq!(report.groups[0].size(), 10);
        assert_eq!(report.groups[0].total_size(), 30);
        assert_eq!(report.reclaimable_space(), 20);
    }

    #[test]
    fn test_empty_report() {
        let report = Report::from_results(Vec::new(), StatsSnapshot::default());
        assert!(report.is_empty());
        assert_eq!(report.reclaimable_space(), 0);
    }
}
