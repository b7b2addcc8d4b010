//! JSON output formatter for duplicate reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "duplicates": [
//!     {
//!       "hash": "abc123...",
//!       "size": 1024,
//!       "files": ["/path/to/file1.txt", "/path/to/file2.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "total_files": 100,
//!     "total_size": 1048576,
//!     "duplicate_groups": 5,
//!     "duplicate_files": 10,
//!     "duplicate_size": 10240,
//!     "reclaimable_space": 5120,
//!     "started_at": "2026-01-01T00:00:00Z",
//!     "elapsed_ms": 1234
//!   }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::report::{Report, ReportGroup};

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Content hash shared by every file
    pub hash: String,
    /// Size of one copy in bytes
    pub size: u64,
    /// Paths of all duplicate files
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    #[must_use]
    pub fn from_report_group(group: &ReportGroup) -> Self {
        Self {
            hash: group.hash.clone(),
            size: group.size(),
            files: group.files.iter().map(|f| f.path.clone()).collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Total number of files scanned
    pub total_files: u64,
    /// Total size of all scanned files in bytes
    pub total_size: u64,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Number of files belonging to a duplicate group
    pub duplicate_files: u64,
    /// Combined size of files belonging to a duplicate group
    pub duplicate_size: u64,
    /// Space freed by keeping one copy per group
    pub reclaimable_space: u64,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Run duration in milliseconds
    pub elapsed_ms: u64,
}

impl JsonSummary {
    #[must_use]
    pub fn from_report(report: &Report) -> Self {
        let stats = &report.stats;
        Self {
            total_files: stats.total_count,
            total_size: stats.total_size,
            duplicate_groups: report.groups.len(),
            duplicate_files: stats.files_count,
            duplicate_size: stats.files_size,
            reclaimable_space: report.reclaimable_space(),
            started_at: stats.started_at,
            elapsed_ms: u64::try_from(stats.elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// List of duplicate groups
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Run summary
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON document for `report`.
    #[must_use]
    pub fn new(report: &Report) -> Self {
        Self {
            duplicates: report
                .groups
                .iter()
                .map(JsonDuplicateGroup::from_report_group)
                .collect(),
            summary: JsonSummary::from_report(report),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
