//! Command-line interface definitions for dff.
//!
//! Every tuning flag is optional so that values from the configuration file
//! and `DFF_*` environment variables apply unless the flag is given.
//!
//! # Example
//!
//! ```bash
//! # Report duplicates below two directories as JSON (default)
//! dff ~/Downloads ~/Pictures
//!
//! # Human-readable listing, stronger hash, skip build output
//! dff . --output list --algorithm blake3 --exclude target/
//!
//! # Fail a CI job if any duplicate exists
//! dff assets/ --fail-on-duplicate
//! ```

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::scanner::DigestAlgorithm;

/// Find duplicate files by content.
///
/// Files are compared by size, then by a digest of their first bytes, then by
/// a digest of their whole content. Only files whose full digests match are
/// reported.
#[derive(Debug, Parser)]
#[command(name = "dff")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directories (or files) to search for duplicates
    #[arg(value_name = "PATH", required = true, num_args = 1..)]
    pub paths: Vec<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Number of leading bytes compared before full hashing (e.g., 4KiB)
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub prefix_bytes: Option<u64>,

    /// Hash algorithm used for content digests
    #[arg(short, long, value_enum)]
    pub algorithm: Option<DigestAlgorithm>,

    /// Follow symbolic links (each target is still visited once)
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Gitignore-style pattern to exclude (can be specified multiple times)
    #[arg(short, long, value_name = "PATTERN")]
    pub exclude: Vec<String>,

    /// Minimum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Maximum file size to consider (e.g., 1KB, 1MB, 1GB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Maximum number of files read at the same time (default: 4)
    ///
    /// Lower values reduce disk thrashing on HDDs.
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Number of hashing threads (default: number of CPUs)
    #[arg(long, value_name = "N")]
    pub cpu_threads: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Write the report to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,

    /// Exit with code 2 if any duplicate is found
    #[arg(short, long)]
    pub fail_on_duplicate: bool,

    /// Disable progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Report fatal errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Output format for scan results.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Machine-readable JSON document
    #[default]
    Json,
    /// One block per group: header line, then indented paths
    List,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::List => write!(f, "list"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports the following formats:
/// - Plain numbers: "1024" (bytes)
/// - Decimal suffixes: "1KB", "1MB", "1GB", "1TB" (powers of 1000)
/// - Binary suffixes: "1KiB", "1MiB", "1GiB", "1TiB" (powers of 1024)
///
/// Suffixes are case-insensitive.
///
/// # Errors
///
/// Returns an error string if the input cannot be parsed.
///
/// # Examples
///
/// ```
/// use dff::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("4KiB").unwrap(), 4096);
/// assert_eq!(parse_size("1.5MB").unwrap(), 1_500_000);
/// ```
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
