//! Merge engine: copies match folders into the working directory.
//!
//! For one base name and its match folders:
//!
//! - [`MergeLayout::Folders`] copies each match folder as a folder, keeping
//!   its structure; a colliding top-level name gets a counter.
//! - [`MergeLayout::Flat`] copies every file found under each match folder
//!   straight into the working root.
//! - With no readable match folder, the base name's files move into the
//!   unresolved bucket.
//!
//! The working original is then handled per [`OriginalPlacement`]. Failures
//! abort only the file or folder in progress and are recorded in the
//! returned [`MergeReport`].

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::fsops::{copy_file_no_clobber, copy_to_free_name, move_file};
use super::{MergeConfig, MergeError, MergeLayout, MergeReport, OriginalPlacement};
use crate::path_utils::has_ignored_extension;

/// Applies merge operations to one working directory.
#[derive(Debug, Clone)]
pub struct MergeEngine {
    working_dir: PathBuf,
    config: MergeConfig,
}

impl MergeEngine {
    /// Create an engine for `working_dir`.
    #[must_use]
    pub fn new(working_dir: &Path, config: MergeConfig) -> Self {
        Self {
            working_dir: working_dir.to_path_buf(),
            config,
        }
    }

    /// Merge `matches` for `base`, whose working files are `originals`.
    ///
    /// An empty `matches`, or one where no folder can be read, relocates the
    /// originals instead.
    pub fn merge(&self, base: &str, originals: &[PathBuf], matches: &[PathBuf]) -> MergeReport {
        if matches.is_empty() {
            return self.relocate_unresolved(base, originals);
        }

        let mut report = MergeReport::default();
        // A vanished match is absent; the originals are only touched once a
        // match is known to be readable.
        let sources: Vec<&PathBuf> = matches
            .iter()
            .filter(|src| Self::check_readable(src, &mut report))
            .collect();
        if sources.is_empty() {
            log::warn!("No match folder for '{}' is readable, treating it as unmatched", base);
            report.absorb(self.relocate_unresolved(base, originals));
            return report;
        }

        let originals: Vec<PathBuf> = match self.config.original {
            OriginalPlacement::Rename => originals
                .iter()
                .filter_map(|path| self.mark_original(path, &mut report))
                .collect(),
            OriginalPlacement::Keep | OriginalPlacement::Distribute => originals.to_vec(),
        };

        match self.config.layout {
            MergeLayout::Folders => {
                let folders: Vec<PathBuf> = sources
                    .iter()
                    .filter_map(|folder| self.copy_folder(folder, &mut report))
                    .collect();
                report.sources_merged += folders.len();
                if self.config.original == OriginalPlacement::Distribute {
                    for original in &originals {
                        self.distribute_original(original, &folders, &mut report);
                    }
                }
            }
            MergeLayout::Flat => {
                for folder in &sources {
                    if self.copy_flat(folder, &mut report) {
                        report.sources_merged += 1;
                    }
                }
            }
        }

        log::info!(
            "Merged {} file(s) for '{}' from {} folder(s)",
            report.files_copied,
            base,
            report.sources_merged
        );
        report
    }

    /// Move every file of `base` into the unresolved bucket, creating it
    /// if needed.
    pub fn relocate_unresolved(&self, base: &str, originals: &[PathBuf]) -> MergeReport {
        let mut report = MergeReport::default();
        let bucket = self.working_dir.join(&self.config.unresolved_dir);
        if let Err(e) = fs::create_dir_all(&bucket) {
            report.fail(&bucket, &MergeError::io(&bucket, e));
            return report;
        }

        for original in originals {
            let Some(name) = original.file_name().map(|n| n.to_string_lossy().into_owned()) else {
                continue;
            };
            let result = self
                .config
                .namer
                .file_path(&bucket, &name)
                .and_then(|dest| move_file(original, &dest).map_err(|e| MergeError::io(original, e)));
            match result {
                Ok(()) => report.relocated += 1,
                Err(e) => report.fail(original, &e),
            }
        }
        log::info!(
            "No match for '{}': moved {} file(s) to {}",
            base,
            report.relocated,
            self.config.unresolved_dir
        );
        report
    }

    fn is_ignored(&self, name: &std::ffi::OsStr) -> bool {
        has_ignored_extension(name, &self.config.ignored_extensions)
    }

    /// Whether a match folder can be listed; records the failure if not.
    fn check_readable(src: &Path, report: &mut MergeReport) -> bool {
        match fs::read_dir(src) {
            Ok(_) => true,
            Err(e) => {
                report.fail(src, &MergeError::io(src, e));
                false
            }
        }
    }

    /// Rename an original to its copy-marked name in place.
    fn mark_original(&self, path: &Path, report: &mut MergeReport) -> Option<PathBuf> {
        if crate::working::is_copy_marked(path) {
            return Some(path.to_path_buf());
        }
        let dir = path.parent().unwrap_or(&self.working_dir);
        let name = path.file_name()?.to_string_lossy().into_owned();
        let result = self
            .config
            .namer
            .copy_marked_path(dir, &name)
            .and_then(|dest| fs::rename(path, &dest).map(|()| dest).map_err(|e| MergeError::io(path, e)));
        match result {
            Ok(dest) => {
                log::debug!("Marked {} -> {}", name, dest.display());
                report.originals_marked += 1;
                Some(dest)
            }
            Err(e) => {
                report.fail(path, &e);
                // still present under its old name
                path.exists().then(|| path.to_path_buf())
            }
        }
    }

    /// Copy a whole match folder; returns the created destination folder.
    fn copy_folder(&self, src: &Path, report: &mut MergeReport) -> Option<PathBuf> {
        let name = src.file_name()?.to_string_lossy().into_owned();
        let dest = match self.config.namer.dir_path(&self.working_dir, &name) {
            Ok(dest) => dest,
            Err(e) => {
                report.fail(src, &e);
                return None;
            }
        };
        if !Self::check_readable(src, report) {
            return None;
        }
        if let Err(e) = fs::create_dir(&dest) {
            report.fail(&dest, &MergeError::io(&dest, e));
            return None;
        }
        report.folders_created.push(dest.clone());

        for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(src).to_path_buf();
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    report.fail(&path, &MergeError::io(&path, source));
                    continue;
                }
            };
            let Ok(relative) = entry.path().strip_prefix(src) else {
                continue;
            };
            let target = dest.join(relative);
            let file_type = entry.file_type();

            if file_type.is_dir() {
                if let Err(e) = fs::create_dir_all(&target) {
                    report.fail(&target, &MergeError::io(&target, e));
                }
            } else if file_type.is_file() && !self.is_ignored(entry.file_name()) {
                match copy_file_no_clobber(entry.path(), &target) {
                    Ok(bytes) => {
                        log::trace!("Copied {} -> {}", entry.path().display(), target.display());
                        report.files_copied += 1;
                        report.bytes_copied += bytes;
                    }
                    Err(e) => report.fail(entry.path(), &MergeError::io(entry.path(), e)),
                }
            }
        }
        Some(dest)
    }

    /// Copy every file under a match folder into the working root.
    ///
    /// Returns `false` if the folder itself could not be read.
    fn copy_flat(&self, src: &Path, report: &mut MergeReport) -> bool {
        for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(src).to_path_buf();
                    let at_root = e.depth() == 0;
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    report.fail(&path, &MergeError::io(&path, source));
                    if at_root {
                        return false;
                    }
                    continue;
                }
            };
            if !entry.file_type().is_file() || self.is_ignored(entry.file_name()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            match copy_to_free_name(&self.config.namer, entry.path(), &self.working_dir, &name) {
                Ok((dest, bytes)) => {
                    log::trace!("Copied {} -> {}", entry.path().display(), dest.display());
                    report.files_copied += 1;
                    report.bytes_copied += bytes;
                }
                Err(e) => report.fail(entry.path(), &e),
            }
        }
        true
    }

    /// Copy the marked original into every merged folder, then remove it.
    fn distribute_original(&self, original: &Path, folders: &[PathBuf], report: &mut MergeReport) {
        if folders.is_empty() {
            log::warn!("No folder was merged, keeping {}", original.display());
            return;
        }
        let Some(name) = original.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return;
        };

        let mut all_copied = true;
        for folder in folders {
            let result = self.config.namer.copy_marked_path(folder, &name).and_then(|dest| {
                copy_file_no_clobber(original, &dest).map_err(|e| MergeError::io(original, e))
            });
            match result {
                Ok(_) => report.originals_distributed += 1,
                Err(e) => {
                    all_copied = false;
                    report.fail(original, &e);
                }
            }
        }

        if !all_copied {
            log::warn!("Keeping {} because a copy failed", original.display());
            return;
        }
        match fs::remove_file(original) {
            Ok(()) => report.originals_removed += 1,
            Err(e) => report.fail(original, &MergeError::io(original, e)),
        }
    }
}
