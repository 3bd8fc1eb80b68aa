//! Plain-text listing of duplicate groups.
//!
//! One block per group, blocks separated by a blank line:
//!
//! ```text
//! 5d41402abc4b2a76b9719d911017c592  5 B each, 5 B wasted
//!     /data/a.txt
//!     /data/b.txt
//!
//! 1 duplicate groups, 1 redundant files, 5 B reclaimable (3 files scanned, 0 warnings)
//! ```

use std::io::Write;

use bytesize::ByteSize;

use super::OutputError;
use crate::duplicates::{DuplicateGroup, ScanReport};

/// Human-readable group listing.
#[derive(Debug, Clone, Copy)]
pub struct ListOutput<'a> {
    report: &'a ScanReport,
}

impl<'a> ListOutput<'a> {
    /// Wrap a finished report.
    #[must_use]
    pub fn new(report: &'a ScanReport) -> Self {
        Self { report }
    }

    /// Write every group followed by the summary line.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), OutputError> {
        for group in &self.report.groups {
            write_group(writer, group)?;
            writeln!(writer)?;
        }
        writeln!(writer, "{}", self.summary_line())?;
        Ok(())
    }

    /// The trailing summary line.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let summary = &self.report.summary;
        let mut line = format!(
            "{} duplicate groups, {} redundant files, {} reclaimable ({} files scanned, {} warnings)",
            summary.duplicate_groups,
            summary.duplicate_files,
            summary.reclaimable_display(),
            summary.total_files,
            summary.warnings.len(),
        );
        if self.report.is_cancelled() {
            line.push_str(" [cancelled, results incomplete]");
        }
        line
    }
}

fn write_group<W: Write>(writer: &mut W, group: &DuplicateGroup) -> std::io::Result<()> {
    writeln!(
        writer,
        "{}  {} each, {} wasted",
        group.digest_hex(),
        ByteSize::b(group.size),
        ByteSize::b(group.wasted_space)
    )?;
    for file in &group.files {
        writeln!(writer, "    {}", file.path.display())?;
    }
    Ok(())
}
