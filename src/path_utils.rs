//! Name helpers shared by the scanner, the override pass and the merge engine.
//!
//! Archive shares are written from Windows, macOS and Linux clients, so the
//! same visible folder name can reach us as NFC or NFD. Names are normalised
//! to NFC before any substring comparison:
//!
//! ```
//! use ocrfind::path_utils::name_contains;
//! use std::ffi::OsStr;
//!
//! // "José" with a decomposed accent still matches a composed needle
//! assert!(name_contains(OsStr::new("12345_Jose\u{0301}"), "12345_José"));
//! ```

use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::Path;

use unicode_normalization::{is_nfc_quick, IsNormalized, UnicodeNormalization};

/// Normalise a string to NFC, borrowing when it already is.
#[must_use]
pub fn to_nfc(s: &str) -> Cow<'_, str> {
    match is_nfc_quick(s.chars()) {
        IsNormalized::Yes => Cow::Borrowed(s),
        _ => Cow::Owned(s.nfc().collect()),
    }
}

/// Lossy, NFC-normalised view of a file name.
#[must_use]
pub fn nfc_name(name: &OsStr) -> Cow<'_, str> {
    match name.to_string_lossy() {
        Cow::Borrowed(s) => to_nfc(s),
        Cow::Owned(s) => Cow::Owned(to_nfc(&s).into_owned()),
    }
}

/// Case-sensitive, unanchored substring test on a file or folder name.
///
/// An empty needle never matches; it would otherwise select every folder
/// in the archive.
#[must_use]
pub fn name_contains(name: &OsStr, needle: &str) -> bool {
    !needle.is_empty() && nfc_name(name).contains(to_nfc(needle).as_ref())
}

/// Whether `name` ends with `.<ext>` for any of `extensions`, ignoring case.
///
/// Extensions are given without the leading dot (`"db"`).
#[must_use]
pub fn has_ignored_extension(name: &OsStr, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return false;
    }
    let lower = name.to_string_lossy().to_lowercase();
    extensions.iter().any(|ext| {
        let ext = ext.trim_start_matches('.').to_lowercase();
        !ext.is_empty() && lower.len() > ext.len() && lower.ends_with(&ext) && {
            let dot = lower.len() - ext.len() - 1;
            lower.as_bytes()[dot] == b'.'
        }
    })
}

/// Split a file name into `(stem, extension-with-dot)`.
///
/// Directories and dotfiles keep their full name as the stem.
#[must_use]
pub fn split_name(path: &Path) -> (String, String) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) if !ext.is_empty() => {
            let ext = format!(".{}", ext.to_string_lossy());
            let stem = name[..name.len() - ext.len()].to_string();
            (stem, ext)
        }
        _ => (name, String::new()),
    }
}
