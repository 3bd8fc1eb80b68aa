//! Output formatters for duplicate scan results.
//!
//! - [`json`]: machine-readable document (default)
//! - [`list`]: one text block per group
//!
//! # Example
//!
//! ```no_run
//! use dff::cli::OutputFormat;
//! use dff::duplicates::DuplicateFinder;
//! use dff::error::ExitCode;
//! use dff::output::write_report;
//! use dff::scanner::DigestAlgorithm;
//! use std::path::PathBuf;
//!
//! let report = DuplicateFinder::with_defaults().find_duplicates(&[PathBuf::from(".")]).unwrap();
//! let mut stdout = std::io::stdout();
//! write_report(&mut stdout, OutputFormat::List, &report, DigestAlgorithm::Md5, ExitCode::Success)
//!     .unwrap();
//! ```

pub mod json;
pub mod list;

use std::io::Write;

pub use json::JsonOutput;
pub use list::ListOutput;

use crate::cli::OutputFormat;
use crate::duplicates::ScanReport;
use crate::error::ExitCode;
use crate::scanner::DigestAlgorithm;

/// Errors that can occur while rendering a report.
#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error while writing report: {0}")]
    Io(#[from] std::io::Error),
}

/// Render `report` in the chosen format.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<W: Write>(
    writer: &mut W,
    format: OutputFormat,
    report: &ScanReport,
    algorithm: DigestAlgorithm,
    exit_code: ExitCode,
) -> Result<(), OutputError> {
    match format {
        OutputFormat::Json => JsonOutput::new(report, algorithm, exit_code).write_to(writer, true),
        OutputFormat::List => ListOutput::new(report).write_to(writer),
    }?;
    writer.flush()?;
    Ok(())
}
