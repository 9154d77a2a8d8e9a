//! Pre-merge override pass.
//!
//! An override directory holds authoritative substitutes (X-ray scans) for
//! working files. Before any searching, each base name in the working
//! directory is looked up there; the first substitute whose stem contains
//! the base name is moved over the working file named `<base>.<ext>`.
//!
//! A missing override directory turns the pass into a no-op.

use std::fs;
use std::path::{Path, PathBuf};

use crate::path_utils::{has_ignored_extension, name_contains};
use crate::working::WorkingSet;

use super::fsops::replace_file;
use super::MergeError;

/// Outcome of one override pass.
#[derive(Debug, Clone, Default)]
pub struct OverrideReport {
    /// Base names whose working file was replaced, with the substitute used.
    pub replaced: Vec<(String, PathBuf)>,
    /// Replacements that failed, with the reason.
    pub failures: Vec<(PathBuf, String)>,
}

impl OverrideReport {
    /// Number of working files replaced.
    #[must_use]
    pub fn count(&self) -> usize {
        self.replaced.len()
    }
}

/// Substitutes override files into the working directory.
#[derive(Debug, Clone)]
pub struct XrayOverridePass {
    override_dir: Option<PathBuf>,
    ignored_extensions: Vec<String>,
}

impl XrayOverridePass {
    /// Create a pass; `None` disables it.
    #[must_use]
    pub fn new(override_dir: Option<PathBuf>, ignored_extensions: Vec<String>) -> Self {
        Self {
            override_dir,
            ignored_extensions,
        }
    }

    /// Sorted override candidates, or empty when the directory is unusable.
    fn listing(&self) -> Vec<PathBuf> {
        let Some(dir) = self.override_dir.as_deref() else {
            return Vec::new();
        };
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::info!("Override directory {} unavailable: {}", dir.display(), e);
                return Vec::new();
            }
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter(|entry| !has_ignored_extension(&entry.file_name(), &self.ignored_extensions))
            .map(|entry| entry.path())
            .collect();
        files.sort();
        files
    }

    /// Run the pass over `working_dir`.
    pub fn run(&self, working_dir: &Path) -> OverrideReport {
        let mut report = OverrideReport::default();
        let mut listing = self.listing();
        if listing.is_empty() {
            return report;
        }

        let working = match WorkingSet::scan(working_dir, &self.ignored_extensions) {
            Ok(set) => set,
            Err(e) => {
                log::warn!("Override pass skipped, cannot list {}: {}", working_dir.display(), e);
                return report;
            }
        };

        for (base, files) in working.into_groups() {
            let Some(idx) = find_in(&listing, &base) else {
                continue;
            };
            let prefix = format!("{base}.");
            let Some(target) = files.iter().find(|path| {
                path.file_name()
                    .is_some_and(|n| n.to_string_lossy().starts_with(&prefix))
            }) else {
                log::debug!("Override for '{}' found but no '{}*' working file", base, prefix);
                continue;
            };

            let source = listing[idx].clone();
            match replace_file(&source, target) {
                Ok(()) => {
                    // a used override is gone; later base names see the rest
                    listing.remove(idx);
                    log::info!("Replaced {} with override {}", target.display(), source.display());
                    report.replaced.push((base, source));
                }
                Err(e) => {
                    let err = MergeError::io(&source, e);
                    log::warn!("{}", err);
                    report.failures.push((source, err.to_string()));
                }
            }
        }
        report
    }
}

/// Index of the first listed file whose stem contains `base`.
fn find_in(listing: &[PathBuf], base: &str) -> Option<usize> {
    listing.iter().position(|path| {
        path.file_stem()
            .is_some_and(|stem| name_contains(stem, base))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let root = TempDir::new().unwrap();
        let working = root.path().join("working");
        let xray = root.path().join("xray");
        fs::create_dir_all(&working).unwrap();
        fs::create_dir_all(&xray).unwrap();
        (root, working, xray)
    }

    #[test]
    fn test_override_replaces_working_file() {
        let (_root, working, xray) = setup();
        fs::write(working.join("12345.pdf"), b"original").unwrap();
        fs::write(xray.join("XR_12345_chest.pdf"), b"xray").unwrap();

        let pass = XrayOverridePass::new(Some(xray.clone()), vec!["db".into()]);
        let report = pass.run(&working);

        assert_eq!(report.count(), 1);
        assert_eq!(fs::read(working.join("12345.pdf")).unwrap(), b"xray");
        assert!(!xray.join("XR_12345_chest.pdf").exists());
    }

    #[test]
    fn test_missing_override_dir_is_noop() {
        let (root, working, _xray) = setup();
        fs::write(working.join("12345.pdf"), b"original").unwrap();

        let pass = XrayOverridePass::new(Some(root.path().join("absent")), Vec::new());
        let report = pass.run(&working);

        assert_eq!(report.count(), 0);
        assert_eq!(fs::read(working.join("12345.pdf")).unwrap(), b"original");
    }

    #[test]
    fn test_disabled_pass() {
        let (_root, working, _xray) = setup();
        let pass = XrayOverridePass::new(None, Vec::new());
        assert_eq!(pass.run(&working).count(), 0);
        assert!(pass.listing().is_empty());
    }

    #[test]
    fn test_first_sorted_match_wins_and_ignored_skipped() {
        let (_root, working, xray) = setup();
        fs::write(working.join("12345.pdf"), b"original").unwrap();
        fs::write(xray.join("12345.db"), b"db").unwrap();
        fs::write(xray.join("b_12345.pdf"), b"b").unwrap();
        fs::write(xray.join("a_12345.pdf"), b"a").unwrap();

        let pass = XrayOverridePass::new(Some(xray.clone()), vec!["db".into()]);
        let listing = pass.listing();
        assert_eq!(listing, vec![xray.join("a_12345.pdf"), xray.join("b_12345.pdf")]);
        assert_eq!(find_in(&listing, "99999"), None);

        let report = pass.run(&working);
        assert_eq!(report.replaced, vec![("12345".to_string(), xray.join("a_12345.pdf"))]);
        assert_eq!(fs::read(working.join("12345.pdf")).unwrap(), b"a");
        assert!(xray.join("b_12345.pdf").exists());
        assert!(xray.join("12345.db").exists());
    }

    #[test]
    fn test_used_override_falls_through_to_next_match() {
        let (_root, working, xray) = setup();
        fs::write(working.join("1234.pdf"), b"short").unwrap();
        fs::write(working.join("12345.pdf"), b"long").unwrap();
        // both stems contain "1234"; the first is taken by that base name
        fs::write(xray.join("x_12345.pdf"), b"x").unwrap();
        fs::write(xray.join("y_12345.pdf"), b"y").unwrap();

        let report = XrayOverridePass::new(Some(xray.clone()), Vec::new()).run(&working);

        assert_eq!(report.count(), 2);
        assert!(report.failures.is_empty());
        assert_eq!(fs::read(working.join("1234.pdf")).unwrap(), b"x");
        assert_eq!(fs::read(working.join("12345.pdf")).unwrap(), b"y");
        assert_eq!(
            report.replaced,
            vec![
                ("1234".to_string(), xray.join("x_12345.pdf")),
                ("12345".to_string(), xray.join("y_12345.pdf")),
            ]
        );
    }

    #[test]
    fn test_no_matching_working_file_leaves_override() {
        let (_root, working, xray) = setup();
        fs::write(working.join("12345 - Copy.pdf"), b"copy").unwrap();
        fs::write(xray.join("12345.pdf"), b"xray").unwrap();

        let report = XrayOverridePass::new(Some(xray.clone()), Vec::new()).run(&working);

        assert_eq!(report.count(), 0);
        assert!(xray.join("12345.pdf").exists());
    }
}
