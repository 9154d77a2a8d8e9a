//! Merging archive content into the working directory.
//!
//! Every operation here mutates the working directory and therefore runs on
//! the coordinating thread only, one base name at a time. No operation ever
//! overwrites an existing entry: destinations are chosen with
//! [`ConflictSafeNamer`] and files are created with create-new semantics.
//! The override pass in [`xray`] is the one deliberate exception, replacing a
//! working file with its designated substitute.
//!
//! - [`namer`]: non-colliding destination names
//! - [`fsops`]: metadata-preserving copy and cross-device move
//! - [`engine`]: folder / flat merge, original placement, unresolved bucket
//! - [`xray`]: pre-merge override substitution

pub mod engine;
pub mod fsops;
pub mod namer;
pub mod xray;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use engine::MergeEngine;
pub use namer::ConflictSafeNamer;
pub use xray::{OverrideReport, XrayOverridePass};

/// Default name of the bucket for base names with no archive match.
pub const DEFAULT_UNRESOLVED_DIR: &str = "NOT IN OCR";

/// Error for a single merge operation. Never aborts the run.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Every counter value produced a name that already exists.
    #[error("no free name for '{name}' in {dir} after {attempts} attempts")]
    NamesExhausted {
        /// Destination directory.
        dir: PathBuf,
        /// Desired name.
        name: String,
        /// Candidates tried.
        attempts: u64,
    },

    /// The source disappeared before it could be copied or moved.
    #[error("source vanished: {0}")]
    SourceMissing(PathBuf),

    /// Any other I/O failure.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path being operated on.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl MergeError {
    /// Wrap an I/O error, mapping "not found" to [`MergeError::SourceMissing`].
    #[must_use]
    pub fn io(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::SourceMissing(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }
}

/// How matched folders are laid out in the working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MergeLayout {
    /// Copy each match folder as a folder, preserving its structure.
    #[default]
    Folders,
    /// Copy every file of each match folder into the working root.
    Flat,
}

/// What happens to the working file(s) of a resolved base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OriginalPlacement {
    /// Rename to `<name> - Copy.<ext>` and leave it beside the merged content.
    #[default]
    Rename,
    /// Leave the original untouched.
    Keep,
    /// Copy `<name> - Copy.<ext>` into every merged folder, then remove the
    /// original once all copies succeeded. Requires [`MergeLayout::Folders`].
    Distribute,
}

impl fmt::Display for MergeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Folders => f.write_str("folders"),
            Self::Flat => f.write_str("flat"),
        }
    }
}

impl fmt::Display for OriginalPlacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename => f.write_str("rename"),
            Self::Keep => f.write_str("keep"),
            Self::Distribute => f.write_str("distribute"),
        }
    }
}

/// Merge settings, fixed for a run.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    /// Folder or flat layout.
    pub layout: MergeLayout,
    /// Treatment of the working original.
    pub original: OriginalPlacement,
    /// Extensions never copied (without dot, case-insensitive).
    pub ignored_extensions: Vec<String>,
    /// Subfolder receiving unresolved files.
    pub unresolved_dir: String,
    /// Destination naming policy.
    pub namer: ConflictSafeNamer,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            layout: MergeLayout::Folders,
            original: OriginalPlacement::Rename,
            ignored_extensions: vec!["db".to_string()],
            unresolved_dir: DEFAULT_UNRESOLVED_DIR.to_string(),
            namer: ConflictSafeNamer::default(),
        }
    }
}

/// Counts and failures from merging one or more base names.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Archive files copied.
    pub files_copied: usize,
    /// Bytes copied from the archive.
    pub bytes_copied: u64,
    /// Top-level folders created in the working directory.
    pub folders_created: Vec<PathBuf>,
    /// Match folders whose content was merged.
    pub sources_merged: usize,
    /// Originals renamed with the copy marker.
    pub originals_marked: usize,
    /// Marked originals copied into merged folders.
    pub originals_distributed: usize,
    /// Originals removed after distribution.
    pub originals_removed: usize,
    /// Files moved to the unresolved bucket.
    pub relocated: usize,
    /// Operations that failed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl MergeReport {
    /// Record a failed operation and keep going.
    pub fn fail(&mut self, path: &Path, err: &MergeError) {
        log::warn!("{}", err);
        self.failures.push((path.to_path_buf(), err.to_string()));
    }

    /// Fold another report into this one.
    pub fn absorb(&mut self, other: MergeReport) {
        self.files_copied += other.files_copied;
        self.bytes_copied += other.bytes_copied;
        self.folders_created.extend(other.folders_created);
        self.sources_merged += other.sources_merged;
        self.originals_marked += other.originals_marked;
        self.originals_distributed += other.originals_distributed;
        self.originals_removed += other.originals_removed;
        self.relocated += other.relocated;
        self.failures.extend(other.failures);
    }

    /// `true` if no operation failed.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}
