//! HTML output formatter for duplicate reports.
//!
//! Renders a self-contained page through the `askama` template
//! `templates/report.html`. CSS is embedded and file paths are escaped by the
//! template engine.

use std::io::Write;

use askama::Template;
use bytesize::ByteSize;
use chrono::Local;

use super::report::Report;
use super::text::format_duration;

/// Complete HTML output structure for the Askama template.
#[derive(Template)]
#[template(path = "report.html")]
pub struct HtmlOutput {
    /// Formatted generation timestamp
    pub timestamp: String,
    /// Formatted run start
    pub started_at: String,
    /// Application version
    pub version: String,
    /// Number of scanned files
    pub total_files: u64,
    /// Human-readable size of scanned files
    pub total_size: String,
    /// Number of files in duplicate groups
    pub duplicate_files: u64,
    /// Human-readable size of files in duplicate groups
    pub duplicate_size: String,
    /// Human-readable reclaimable space
    pub reclaimable_space: String,
    /// Human-readable run duration
    pub elapsed: String,
    /// Duplicate groups formatted for HTML
    pub groups: Vec<HtmlDuplicateGroup>,
}

/// A duplicate group formatted for HTML presentation.
pub struct HtmlDuplicateGroup {
    pub hash: String,
    pub size_formatted: String,
    pub files: Vec<String>,
}

impl HtmlOutput {
    #[must_use]
    pub fn new(report: &Report) -> Self {
        let stats = &report.stats;
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            started_at: stats
                .started_at
                .with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            total_files: stats.total_count,
            total_size: ByteSize::b(stats.total_size).to_string(),
            duplicate_files: stats.files_count,
            duplicate_size: ByteSize::b(stats.files_size).to_string(),
            reclaimable_space: ByteSize::b(report.reclaimable_space()).to_string(),
            elapsed: format_duration(stats.elapsed),
            groups: report
                .groups
                .iter()
                .map(|g| HtmlDuplicateGroup {
                    hash: g.hash.clone(),
                    size_formatted: ByteSize::b(g.size()).to_string(),
                    files: g.files.iter().map(|f| f.path.clone()).collect(),
                })
                .collect(),
        }
    }

    /// Generate the HTML string.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn to_html(&self) -> Result<String, askama::Error> {
        self.render()
    }

    /// Write the HTML report to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), HtmlOutputError> {
        let html = self.to_html()?;
        writer.write_all(html.as_bytes())?;
        Ok(())
    }
}

/// Errors that can occur during HTML output generation.
#[derive(thiserror::Error, Debug)]
pub enum HtmlOutputError {
    /// Template rendering error
    #[error("HTML template error: {0}")]
    Template(#[from] askama::Error),

    /// I/O error during writing
    #[error("I/O error during HTML generation: {0}")]
    Io(#[from] std::io::Error),
}
