//! dff - content-addressed duplicate file finder
//!
//! Files are narrowed down by size, then by a digest of their first bytes,
//! and finally confirmed by a digest of their full content. Directory
//! traversal, hashing and grouping live in [`scanner`] and [`duplicates`];
//! the remaining modules make up the command-line application.

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::Cli;
use crate::config::Settings;
use crate::duplicates::DuplicateFinder;
use crate::error::ExitCode;
use crate::output::write_report;
use crate::progress::Progress;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error if configuration is invalid, none of the paths can be
/// accessed, or the report cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut settings = Settings::load(cli.config.as_deref())?;
    settings.apply_cli(&cli);
    settings.validate().context("Invalid configuration")?;
    log::debug!("Effective settings: {:?}", settings);

    let handler = signal::install_handler();
    let mut finder_config = settings
        .finder_config()
        .with_shutdown_flag(handler.get_flag());
    if !cli.no_progress && !cli.quiet {
        finder_config = finder_config.with_progress_callback(Arc::new(Progress::new(false)));
    }

    let finder = DuplicateFinder::new(finder_config);
    let report = finder
        .find_duplicates(&cli.paths)
        .context("Duplicate scan failed")?;

    let exit_code = ExitCode::for_report(&report, settings.fail_on_duplicate);

    match cli.output_file {
        Some(ref path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            write_report(
                &mut writer,
                settings.output,
                &report,
                settings.hash_algorithm,
                exit_code,
            )?;
            writer.flush()?;
            log::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            write_report(
                &mut handle,
                settings.output,
                &report,
                settings.hash_algorithm,
                exit_code,
            )?;
        }
    }

    Ok(exit_code)
}
