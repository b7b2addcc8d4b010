//! Plain-text report for the terminal.
//!
//! ```text
//! H1 (2 files, 10 B each)
//!   /a/1.txt
//!   /a/2.txt
//!
//! Scanned 3 files (25 B) in 12ms
//! Found 2 duplicate files (20 B) in 1 groups, 10 B reclaimable
//! ```

use std::io::{self, Write};
use std::time::Duration;

use bytesize::ByteSize;

use super::report::Report;

/// Plain-text formatter.
pub struct TextOutput<'a> {
    report: &'a Report,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(report: &'a Report) -> Self {
        Self { report }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for group in &self.report.groups {
            writeln!(
                writer,
                "{} ({} files, {} each)",
                group.hash,
                group.files.len(),
                ByteSize::b(group.size())
            )?;
            for file in &group.files {
                writeln!(writer, "  {}", file.path)?;
            }
            writeln!(writer)?;
        }

        let stats = &self.report.stats;
        writeln!(
            writer,
            "Scanned {} files ({}) in {}",
            stats.total_count,
            ByteSize::b(stats.total_size),
            format_duration(stats.elapsed)
        )?;
        if self.report.is_empty() {
            writeln!(writer, "No duplicates found")?;
        } else {
            writeln!(
                writer,
                "Found {} duplicate files ({}) in {} groups, {} reclaimable",
                stats.files_count,
                ByteSize::b(stats.files_size),
                self.report.groups.len(),
                ByteSize::b(self.report.reclaimable_space())
            )?;
        }
        Ok(())
    }

    /// Render the report into a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the rendered text is not valid UTF-8.
    pub fn to_text(&self) -> io::Result<String> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Format a duration as a human-readable string.
pub(crate) fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, duration.subsec_millis())
    } else {
        format!("{}ms", duration.subsec_millis())
    }
}
