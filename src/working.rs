//! Working-directory listing and base-name derivation.
//!
//! A base name identifies "the same document" across decorated copies:
//! `12345.pdf`, `12345 - Copy.pdf` and `12345 (2).pdf` all map to `12345`.
//! Base names are recomputed from the live listing at the start of every
//! pass and never stored.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::path_utils::{has_ignored_extension, split_name};

/// Marker appended to an original once archive content has been merged.
pub const COPY_MARKER: &str = " - Copy";

fn decoration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?: - Copy| \(\d+\))+$").expect("decoration pattern is a valid regex")
    })
}

/// Derive the base name of a working file.
///
/// Strips the extension, then any trailing run of ` - Copy` and ` (N)`
/// decorations. A name made only of decorations keeps its stem.
///
/// ```
/// use ocrfind::working::base_name;
/// use std::path::Path;
///
/// assert_eq!(base_name(Path::new("12345 - Copy (1).pdf")), "12345");
/// assert_eq!(base_name(Path::new("12345_Smith.pdf")), "12345_Smith");
/// ```
#[must_use]
pub fn base_name(path: &Path) -> String {
    let (stem, _) = split_name(path);
    let stripped = decoration_pattern().replace(&stem, "");
    if stripped.trim().is_empty() {
        stem
    } else {
        stripped.into_owned()
    }
}

/// Whether a file name already carries the copy marker.
#[must_use]
pub fn is_copy_marked(path: &Path) -> bool {
    let (stem, _) = split_name(path);
    stem.contains(COPY_MARKER)
}

/// Regular files of a working directory grouped by base name.
///
/// Groups and their members are sorted so passes are deterministic.
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    groups: BTreeMap<String, Vec<PathBuf>>,
}

impl WorkingSet {
    /// List `dir` (non-recursively), skipping directories and ignored files.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the directory itself cannot be listed.
    /// Entries that vanish mid-listing are skipped.
    pub fn scan(dir: &Path, ignored_extensions: &[String]) -> std::io::Result<Self> {
        let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for entry in fs::read_dir(dir)? {
            let Ok(entry) = entry else { continue };
            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if !is_file || has_ignored_extension(&entry.file_name(), ignored_extensions) {
                continue;
            }
            let path = entry.path();
            groups.entry(base_name(&path)).or_default().push(path);
        }
        for files in groups.values_mut() {
            files.sort();
        }
        log::debug!(
            "Working set for {}: {} base name(s)",
            dir.display(),
            groups.len()
        );
        Ok(Self { groups })
    }

    /// Number of distinct base names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// `true` when no eligible files were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Consume into `(base name, files)` pairs, sorted by base name.
    pub fn into_groups(self) -> impl Iterator<Item = (String, Vec<PathBuf>)> {
        self.groups.into_iter()
    }
}
