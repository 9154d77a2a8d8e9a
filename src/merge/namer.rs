//! Conflict-safe destination naming.
//!
//! Given a desired name in a directory, the namer returns the first name in
//! the sequence `X`, `X (1)`, `X (2)`, ... that does not exist. For files
//! the counter goes before the extension (`12345 (1).pdf`); for folders it
//! goes after the whole name, so dotted folder names stay intact.
//!
//! An entry that cannot be inspected (permission error on a share) counts
//! as taken: a skipped name is harmless, an overwritten file is not.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::MergeError;
use crate::path_utils::split_name;
use crate::working::COPY_MARKER;

/// Picks non-colliding destination paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictSafeNamer {
    limit: u64,
}

impl Default for ConflictSafeNamer {
    fn default() -> Self {
        Self {
            limit: u64::from(u32::MAX),
        }
    }
}

impl ConflictSafeNamer {
    /// A namer that gives up after `limit` counter values.
    #[must_use]
    pub fn with_limit(limit: u64) -> Self {
        Self { limit }
    }

    /// Free path for a file named `name` in `dir`.
    ///
    /// # Errors
    ///
    /// [`MergeError::NamesExhausted`] when every counter value is taken.
    pub fn file_path(&self, dir: &Path, name: &str) -> Result<PathBuf, MergeError> {
        let (stem, ext) = split_name(Path::new(name));
        self.first_free(dir, name, &stem, &ext)
    }

    /// Free path for a folder named `name` in `dir`.
    ///
    /// # Errors
    ///
    /// [`MergeError::NamesExhausted`] when every counter value is taken.
    pub fn dir_path(&self, dir: &Path, name: &str) -> Result<PathBuf, MergeError> {
        self.first_free(dir, name, name, "")
    }

    /// Free path for the copy-marked form of `name`: `<stem> - Copy<ext>`.
    ///
    /// A name that already carries the marker is not marked twice.
    ///
    /// # Errors
    ///
    /// [`MergeError::NamesExhausted`] when every counter value is taken.
    pub fn copy_marked_path(&self, dir: &Path, name: &str) -> Result<PathBuf, MergeError> {
        let (stem, ext) = split_name(Path::new(name));
        if stem.contains(COPY_MARKER) {
            return self.first_free(dir, name, &stem, &ext);
        }
        let marked_stem = format!("{stem}{COPY_MARKER}");
        self.first_free(dir, name, &marked_stem, &ext)
    }

    fn first_free(&self, dir: &Path, name: &str, stem: &str, ext: &str) -> Result<PathBuf, MergeError> {
        let first = dir.join(format!("{stem}{ext}"));
        if !is_taken(&first) {
            return Ok(first);
        }
        for counter in 1..=self.limit {
            let candidate = dir.join(format!("{stem} ({counter}){ext}"));
            if !is_taken(&candidate) {
                log::trace!("Renamed on conflict: {} -> {}", name, candidate.display());
                return Ok(candidate);
            }
        }
        Err(MergeError::NamesExhausted {
            dir: dir.to_path_buf(),
            name: name.to_string(),
            attempts: self.limit.saturating_add(1),
        })
    }
}

/// Whether any entry (file, folder or dangling link) occupies `path`.
#[must_use]
pub fn is_taken(path: &Path) -> bool {
    match fs::symlink_metadata(path) {
        Ok(_) => true,
        Err(e) => e.kind() != ErrorKind::NotFound,
    }
}
