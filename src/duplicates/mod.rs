//! Duplicate detection driver.
//!
//! This module provides:
//! - [`DuplicateFinder`]: scans roots into the record store, then derives and
//!   materializes duplicate groups
//! - [`DuplicateGroup`]: the files sharing one content hash

pub mod finder;
pub mod groups;

pub use finder::{DuplicateFinder, FinderConfig, FinderError, FinderOutcome};
pub use groups::DuplicateGroup;
