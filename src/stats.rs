//! Run statistics.
//!
//! One [`Stats`] value lives for the whole run. The driver bumps the scan
//! counters for every file handed to the store and the duplicate counters only
//! for files confirmed as members of a duplicate group. Elapsed time is not
//! cached; it is measured when a [`StatsSnapshot`] is taken.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Mutable run-scoped counters.
#[derive(Debug, Clone)]
pub struct Stats {
    /// Number of files recorded during the scan
    pub total_count: u64,
    /// Combined size of all recorded files
    pub total_size: u64,
    /// Number of files that belong to a duplicate group
    pub files_count: u64,
    /// Combined size of all files that belong to a duplicate group
    pub files_size: u64,
    /// Monotonic start of the run
    pub start_time: Instant,
    /// Wall-clock start of the run, for reports
    pub started_at: DateTime<Utc>,
}

impl Stats {
    /// Start a new run.
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_count: 0,
            total_size: 0,
            files_count: 0,
            files_size: 0,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Account for one file handed to the store.
    pub fn record_scanned(&mut self, size: u64) {
        self.total_count += 1;
        self.total_size = self.total_size.saturating_add(size);
    }

    /// Account for one file newly confirmed as a duplicate group member.
    pub fn record_duplicate(&mut self, size: u64) {
        self.files_count += 1;
        self.files_size = self.files_size.saturating_add(size);
    }

    /// Time since the run started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Freeze the counters together with the current elapsed time.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_count: self.total_count,
            total_size: self.total_size,
            files_count: self.files_count,
            files_size: self.files_size,
            started_at: self.started_at,
            elapsed: self.elapsed(),
        }
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only copy of [`Stats`] handed to reporters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub total_count: u64,
    pub total_size: u64,
    pub files_count: u64,
    pub files_size: u64,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Stats::new().snapshot()
    }
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}
