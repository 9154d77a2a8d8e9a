//! ocrfind - OCR archive finder and merger
//!
//! For every file in a working directory, ocrfind derives a base name,
//! searches a date-partitioned OCR archive for folders whose name contains
//! it (newest partitions first), and copies the matching folders into the
//! working directory without ever overwriting anything. Files with no
//! match are moved to an unresolved folder.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod merge;
pub mod path_utils;
pub mod progress;
pub mod runner;
pub mod search;
pub mod signal;
pub mod working;

use std::sync::Arc;

use anyhow::Context;
use bytesize::ByteSize;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::ExitCode;
use crate::progress::Progress;
use crate::runner::{RunSummary, Runner};

/// Run the application for parsed CLI arguments.
///
/// # Errors
///
/// Configuration problems and an unusable working directory. Per-file
/// failures are reported through the returned [`ExitCode`] instead.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let config = Config::load(cli.config.as_deref())
        .context("failed to load configuration")?
        .with_overrides(&cli);

    if cli.show_config {
        print!("{}", config.to_toml().context("failed to render configuration")?);
        return Ok(ExitCode::Success);
    }

    let working_dir = cli
        .working_dir
        .as_deref()
        .context("a working directory is required")?;

    let mut runner =
        Runner::from_config(&config)?.with_progress(Arc::new(Progress::new(cli.quiet)));
    if let Some(today) = cli.today {
        runner = runner.with_today(today);
    }
    match signal::install_handler() {
        Ok(handler) => runner = runner.with_cancel(handler.token()),
        Err(e) => log::warn!("{}; Ctrl+C will not stop the run cleanly", e),
    }

    let summary = runner.run(working_dir)?;
    if !cli.quiet {
        print_summary(&summary);
    }
    Ok(summary.exit_code())
}

fn print_summary(summary: &RunSummary) {
    let merge = &summary.merge;
    println!();
    println!("Base names:      {}", summary.base_names);
    println!("  resolved:      {}", summary.resolved);
    println!("  unresolved:    {}", summary.unresolved);
    if summary.skipped > 0 {
        println!("  not processed: {}", summary.skipped);
    }
    println!("Overrides:       {}", summary.overrides.count());
    println!(
        "Copied:          {} file(s), {} in {} folder(s)",
        merge.files_copied,
        ByteSize::b(merge.bytes_copied),
        merge.folders_created.len()
    );
    if merge.relocated > 0 {
        println!("Moved unresolved: {} file(s)", merge.relocated);
    }
    let failures = summary.failure_count();
    if failures > 0 {
        println!("Failures:        {failures}");
        for (path, reason) in summary.overrides.failures.iter().chain(&merge.failures) {
            println!("  {}: {}", path.display(), reason);
        }
    }
}
