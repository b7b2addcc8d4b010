//! Per-run record store for scanned files and duplicate groups.
//!
//! The store keeps two SQLite tables for the lifetime of one run:
//!
//! * `files`: one row per scanned file (`path` unique, indexed by `hash`)
//! * `result`: one row per file membership in a materialized duplicate group
//!
//! Duplicate groups themselves are never cached. They are recomputed from the
//! `files` table by [`RecordStore::duplicate_hashes`] and
//! [`RecordStore::files_for_hash`].
//!
//! # Architecture
//!
//! * [`database`]: connection lifecycle, schema and queries.
//! * [`record`]: the row types read and written by the store.
//!
//! # Thread Safety
//!
//! A [`RecordStore`] exclusively owns its connection and is meant for a single
//! writer. It is `Send` but not `Sync`; callers that scan in parallel must
//! funnel all store calls through one thread.

pub mod database;
pub mod record;

pub use database::{RecordStore, StoreError, StoreResult};
pub use record::{FileRecord, ResultRecord};
