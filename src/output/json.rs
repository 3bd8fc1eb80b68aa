//! JSON output formatter for duplicate scan results.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "generated_at": "2024-05-01T12:00:00Z",
//!   "duplicates": [
//!     {
//!       "digest": "5d41402abc4b2a76b9719d911017c592",
//!       "algorithm": "md5",
//!       "size": 5,
//!       "wasted_space": 5,
//!       "files": ["/data/a.txt", "/data/b.txt"]
//!     }
//!   ],
//!   "summary": {
//!     "status": "completed",
//!     "total_files": 3,
//!     "total_size": 15,
//!     "eliminated_by_size": 0,
//!     "eliminated_by_prefix": 1,
//!     "prefix_digests": 3,
//!     "full_digests": 2,
//!     "bytes_hashed": 10,
//!     "duplicate_groups": 1,
//!     "duplicate_files": 1,
//!     "wasted_space": 5,
//!     "scan_duration_ms": 3,
//!     "warnings": [],
//!     "exit_code": 0,
//!     "exit_code_name": "DFF000"
//!   }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::OutputError;
use crate::duplicates::{DuplicateGroup, ScanReport, ScanStatus, ScanSummary};
use crate::error::ExitCode;
use crate::scanner::DigestAlgorithm;

/// A single duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Full content digest as lowercase hex
    pub digest: String,
    /// Algorithm that produced the digest
    pub algorithm: DigestAlgorithm,
    /// File size in bytes
    pub size: u64,
    /// Bytes reclaimable by keeping one copy
    pub wasted_space: u64,
    /// Member paths in discovery order
    pub files: Vec<String>,
}

impl JsonDuplicateGroup {
    /// Create a JSON duplicate group from a [`DuplicateGroup`].
    #[must_use]
    pub fn from_duplicate_group(group: &DuplicateGroup, algorithm: DigestAlgorithm) -> Self {
        Self {
            digest: group.digest_hex(),
            algorithm,
            size: group.size,
            wasted_space: group.wasted_space,
            files: group
                .files
                .iter()
                .map(|f| f.path.to_string_lossy().into_owned())
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Whether the run completed or was cancelled
    pub status: ScanStatus,
    /// Total number of files collected
    pub total_files: usize,
    /// Total size of all collected files in bytes
    pub total_size: u64,
    /// Files dropped because their size was unique
    pub eliminated_by_size: usize,
    /// Files dropped because their prefix digest was unique
    pub eliminated_by_prefix: usize,
    /// Prefix digests computed
    pub prefix_digests: usize,
    /// Full digests computed
    pub full_digests: usize,
    /// Bytes read by full digests
    pub bytes_hashed: u64,
    /// Number of confirmed duplicate groups
    pub duplicate_groups: usize,
    /// Total number of duplicate files (excluding one copy per group)
    pub duplicate_files: usize,
    /// Total reclaimable bytes
    pub wasted_space: u64,
    /// Duration of the scan in milliseconds
    pub scan_duration_ms: u64,
    /// Recoverable problems, rendered as messages
    pub warnings: Vec<String>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "DFF000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a [`ScanSummary`].
    #[must_use]
    pub fn from_scan_summary(summary: &ScanSummary, status: ScanStatus, exit_code: ExitCode) -> Self {
        Self {
            status,
            total_files: summary.total_files,
            total_size: summary.total_size,
            eliminated_by_size: summary.eliminated_by_size,
            eliminated_by_prefix: summary.eliminated_by_prefix,
            prefix_digests: summary.prefix_digests,
            full_digests: summary.full_digests,
            bytes_hashed: summary.bytes_hashed,
            duplicate_groups: summary.duplicate_groups,
            duplicate_files: summary.duplicate_files,
            wasted_space: summary.wasted_space,
            scan_duration_ms: summary.scan_duration.as_millis() as u64,
            warnings: summary.warnings.iter().map(ToString::to_string).collect(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// When the report was rendered
    pub generated_at: DateTime<Utc>,
    /// Duplicate groups in report order
    pub duplicates: Vec<JsonDuplicateGroup>,
    /// Scan summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document for a finished run.
    ///
    /// # Example
    ///
    /// ```
    /// use dff::duplicates::ScanReport;
    /// use dff::error::ExitCode;
    /// use dff::output::json::JsonOutput;
    /// use dff::scanner::DigestAlgorithm;
    ///
    /// let output = JsonOutput::new(&ScanReport::default(), DigestAlgorithm::Md5, ExitCode::Success);
    /// assert!(output.duplicates.is_empty());
    /// ```
    #[must_use]
    pub fn new(report: &ScanReport, algorithm: DigestAlgorithm, exit_code: ExitCode) -> Self {
        Self {
            generated_at: Utc::now(),
            duplicates: report
                .groups
                .iter()
                .map(|g| JsonDuplicateGroup::from_duplicate_group(g, algorithm))
                .collect(),
            summary: JsonSummary::from_scan_summary(&report.summary, report.status, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), OutputError> {
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
