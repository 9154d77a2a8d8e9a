//! Recursive match-folder discovery.
//!
//! [`scan_tree`] walks a subtree depth-first and collects every directory
//! whose final component contains the target substring. The walk uses
//! [`walkdir`], which holds at most one open handle per level, so pending
//! state grows with depth rather than with fan-out.
//!
//! Unreadable subtrees (permission errors, a share dropping mid-walk) are
//! logged and skipped; siblings still complete.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::path_utils::name_contains;
use crate::signal::CancelToken;

/// Result of scanning one candidate root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// Directory that was scanned.
    pub root: PathBuf,
    /// Matching directories, in traversal order.
    pub matches: Vec<PathBuf>,
    /// Directories visited below the root.
    pub dirs_visited: usize,
    /// Entries that could not be read and were treated as empty.
    pub errors: usize,
    /// The walk stopped early because cancellation was signalled.
    pub cancelled: bool,
}

impl ScanOutcome {
    /// `true` if at least one match was found.
    #[must_use]
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }
}

/// Scan options that stay fixed for a whole run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Descend into symlinked directories. Off by default to avoid cycles.
    pub follow_symlinks: bool,
}

/// Find every directory strictly below `root` whose name contains `needle`.
///
/// The root itself is never reported. Cancellation is checked between
/// directory entries; a cancelled scan returns what it had so far with
/// `cancelled` set.
#[must_use]
pub fn scan_tree(root: &Path, needle: &str, options: ScanOptions, cancel: &CancelToken) -> ScanOutcome {
    let mut outcome = ScanOutcome {
        root: root.to_path_buf(),
        ..Default::default()
    };

    let walker = WalkDir::new(root)
        .min_depth(1)
        .follow_links(options.follow_symlinks)
        .into_iter()
        .filter_entry(|e| e.file_type().is_dir());

    for entry in walker {
        if cancel.is_cancelled() {
            log::trace!("Scan of {} cancelled", root.display());
            outcome.cancelled = true;
            break;
        }
        match entry {
            Ok(entry) => {
                outcome.dirs_visited += 1;
                if name_contains(entry.file_name(), needle) {
                    log::debug!("Match: {}", entry.path().display());
                    outcome.matches.push(entry.into_path());
                }
            }
            Err(e) => {
                outcome.errors += 1;
                let path = e.path().unwrap_or(root);
                if e.loop_ancestor().is_some() {
                    log::debug!("Symlink loop skipped at {}", path.display());
                } else {
                    log::warn!("Unreadable, treated as empty: {}: {}", path.display(), e);
                }
            }
        }
    }

    outcome
}
