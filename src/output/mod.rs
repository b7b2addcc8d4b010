//! Report formats and renderers.
//!
//! [`OutputFormat`] names the supported encodings. The renderers consume a
//! [`Report`] built from the store's `result` table and a stats snapshot:
//! - JSON for automation and scripting
//! - plain text for the terminal
//! - HTML for sharing
//!
//! The `sqlite` format is not rendered; it is a copy of the record store
//! (see [`crate::store::RecordStore::export_to`]).
//!
//! # Example
//!
//! ```
//! use drydupe::output::{JsonOutput, Report};
//! use drydupe::stats::Stats;
//! use drydupe::store::ResultRecord;
//!
//! let report = Report::from_results(
//!     vec![
//!         ResultRecord::new("H1", "/a/1.txt", 10),
//!         ResultRecord::new("H1", "/a/2.txt", 10),
//!     ],
//!     Stats::new().snapshot(),
//! );
//! let json = JsonOutput::new(&report).to_json().unwrap();
//! assert!(json.contains("\"H1\""));
//! ```

pub mod format;
pub mod html;
pub mod json;
pub mod report;
pub mod text;

// Re-export main types
pub use format::{FormatError, OutputFormat};
pub use html::{HtmlOutput, HtmlOutputError};
pub use json::{JsonOutput, JsonOutputError};
pub use report::{Report, ReportFile, ReportGroup};
pub use text::TextOutput;
