//! Exit codes and structured error reporting.

use serde::Serialize;

use crate::duplicates::ScanReport;

/// Exit codes for the dff binary.
///
/// - 0: Success (completed normally)
/// - 1: General error (unexpected failure)
/// - 2: Duplicates found while `--fail-on-duplicate` is set
/// - 3: Partial success (completed with some non-fatal warnings)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Duplicates found and the caller asked to fail on them.
    DuplicatesFound = 2,
    /// Partial success: Scan completed but some files or directories were skipped.
    PartialSuccess = 3,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "DFF000",
            Self::GeneralError => "DFF001",
            Self::DuplicatesFound => "DFF002",
            Self::PartialSuccess => "DFF003",
            Self::Interrupted => "DFF130",
        }
    }

    /// Pick the exit code for a finished run.
    ///
    /// Cancellation wins, then duplicates (only with `fail_on_duplicate`),
    /// then warnings.
    #[must_use]
    pub fn for_report(report: &ScanReport, fail_on_duplicate: bool) -> Self {
        if report.is_cancelled() {
            Self::Interrupted
        } else if fail_on_duplicate && report.has_duplicates() {
            Self::DuplicatesFound
        } else if report.summary.has_warnings() {
            Self::PartialSuccess
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DFF001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
