//! Command-line interface definitions for ocrfind.
//!
//! Every option here overrides the matching configuration field; anything
//! left unset falls through to the environment, the config file and the
//! built-in defaults.
//!
//! # Example
//!
//! ```bash
//! # Resolve every file in a working folder with the configured archive
//! ocrfind "D:\intake\batch-07"
//!
//! # One-off archive roots, searching every phase
//! ocrfind ./batch --dated-root '\\ronsin158\ocr_processed\{year}' \
//!     --archive-root '\\ronsin158\ocr_processed' --policy exhaustive
//!
//! # Show the effective configuration
//! ocrfind --show-config
//! ```

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::merge::{MergeLayout, OriginalPlacement};
use crate::search::StopPolicy;

/// Find archived OCR folders for the files in a working directory and merge
/// them in.
///
/// Each file's base name (the name without extension and without
/// " - Copy" / " (N)" suffixes) is searched for in the dated archive
/// partitions, newest first. Matching folders are copied next to the file;
/// files with no match are moved to an unresolved folder.
#[derive(Debug, Parser)]
#[command(name = "ocrfind")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Print errors as JSON objects on stderr
    #[arg(long)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir / config.toml)
    #[arg(long, value_name = "FILE", env = "OCRFIND_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub show_config: bool,

    /// Working directory whose files are resolved
    #[arg(value_name = "WORKING_DIR", required_unless_present = "show_config")]
    pub working_dir: Option<PathBuf>,

    /// Dated archive root; `{year}` expands to the partition year (repeatable)
    #[arg(long = "dated-root", value_name = "PATH")]
    pub dated_roots: Vec<String>,

    /// Archive root searched whole in the last phase (repeatable)
    #[arg(long = "archive-root", value_name = "PATH")]
    pub archive_roots: Vec<PathBuf>,

    /// Directory of override scans substituted before searching
    #[arg(long, value_name = "DIR", conflicts_with = "no_override")]
    pub override_dir: Option<PathBuf>,

    /// Skip the override pass even if one is configured
    #[arg(long)]
    pub no_override: bool,

    /// Stop at the first phase with a match, or run every phase
    #[arg(long, value_enum)]
    pub policy: Option<StopPolicy>,

    /// Copy match folders as folders or flatten their files
    #[arg(long, value_enum)]
    pub layout: Option<MergeLayout>,

    /// What happens to the working file of a resolved name
    #[arg(long, value_enum)]
    pub original: Option<OriginalPlacement>,

    /// Days probed by the recent-days phase
    #[arg(long, value_name = "N")]
    pub recent_days: Option<u32>,

    /// Base names searched concurrently
    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,

    /// Thread ceiling for each phase's scan pool
    #[arg(long, value_name = "N")]
    pub pool_ceiling: Option<usize>,

    /// Comma-separated phase order (e.g. recent-days,full-archive)
    #[arg(long, value_name = "LIST", value_delimiter = ',')]
    pub phases: Option<Vec<String>>,

    /// Reference date for date-derived phases (YYYY-MM-DD, default today)
    #[arg(long, value_name = "DATE", value_parser = parse_date)]
    pub today: Option<NaiveDate>,

    /// Follow symbolic links while scanning the archive
    #[arg(long)]
    pub follow_symlinks: bool,
}

/// Parse a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns a message naming the bad input.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}
