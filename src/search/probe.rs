//! Directory existence probes.
//!
//! A probe never fails. Any I/O error other than "not found" is reported as
//! [`ProbeResult::Degraded`] and counts as absent: on a flaky network share
//! a missed match is preferable to an aborted run.

use std::io::ErrorKind;
use std::path::Path;

/// Outcome of probing a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeResult {
    /// The path exists and is a directory.
    Found,
    /// The path is absent or is not a directory.
    NotFound,
    /// The path could not be checked; treated as absent.
    Degraded(ErrorKind),
}

impl ProbeResult {
    /// Only [`ProbeResult::Found`] counts as present.
    #[must_use]
    pub fn is_found(self) -> bool {
        matches!(self, Self::Found)
    }
}

/// Check whether `path` currently exists as a directory (following symlinks).
#[must_use]
pub fn probe_dir(path: &Path) -> ProbeResult {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_dir() => ProbeResult::Found,
        Ok(_) => ProbeResult::NotFound,
        Err(e) if e.kind() == ErrorKind::NotFound => ProbeResult::NotFound,
        Err(e) => {
            log::debug!("Probe degraded for {}: {}", path.display(), e);
            ProbeResult::Degraded(e.kind())
        }
    }
}
