//! Low-level file operations used by the merge engine.
//!
//! Copies never clobber: the destination is opened with `create_new`, so an
//! entry that appears between naming and copying makes the copy fail with
//! `AlreadyExists` instead of being overwritten. Modification time and
//! permissions are carried over from the source on a best-effort basis.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use filetime::FileTime;

use super::namer::ConflictSafeNamer;
use super::MergeError;

/// Retries when a freshly chosen name is claimed before we can create it.
const CLAIM_RETRIES: usize = 8;

/// Copy `src` to a not-yet-existing `dest`, preserving timestamps and
/// permissions. Returns the bytes copied.
///
/// A partially written destination is removed on failure.
///
/// # Errors
///
/// `AlreadyExists` if `dest` exists; any other I/O error from reading
/// `src` or writing `dest`.
pub fn copy_file_no_clobber(src: &Path, dest: &Path) -> io::Result<u64> {
    let mut reader = File::open(src)?;
    let meta = reader.metadata()?;
    let mut writer = OpenOptions::new().write(true).create_new(true).open(dest)?;

    let bytes = match io::copy(&mut reader, &mut writer) {
        Ok(bytes) => bytes,
        Err(e) => {
            drop(writer);
            let _ = fs::remove_file(dest);
            return Err(e);
        }
    };
    drop(writer);

    preserve_metadata(&meta, dest);
    Ok(bytes)
}

fn preserve_metadata(meta: &fs::Metadata, dest: &Path) {
    let mtime = FileTime::from_last_modification_time(meta);
    let atime = FileTime::from_last_access_time(meta);
    if let Err(e) = filetime::set_file_times(dest, atime, mtime) {
        log::debug!("Could not preserve timestamps on {}: {}", dest.display(), e);
    }
    if let Err(e) = fs::set_permissions(dest, meta.permissions()) {
        log::debug!("Could not preserve permissions on {}: {}", dest.display(), e);
    }
}

/// Copy `src` into `dir` as `name`, or the first free variant of it.
///
/// # Errors
///
/// [`MergeError::NamesExhausted`] if no name is free, or the copy's I/O
/// error mapped through [`MergeError::io`].
pub fn copy_to_free_name(
    namer: &ConflictSafeNamer,
    src: &Path,
    dir: &Path,
    name: &str,
) -> Result<(PathBuf, u64), MergeError> {
    let mut last_err = None;
    for _ in 0..CLAIM_RETRIES {
        let dest = namer.file_path(dir, name)?;
        match copy_file_no_clobber(src, &dest) {
            Ok(bytes) => return Ok((dest, bytes)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                log::debug!("{} was claimed concurrently, picking another name", dest.display());
                last_err = Some(e);
            }
            Err(e) if e.kind() == ErrorKind::NotFound && !src.exists() => {
                return Err(MergeError::SourceMissing(src.to_path_buf()));
            }
            Err(e) => return Err(MergeError::io(&dest, e)),
        }
    }
    Err(MergeError::io(
        &dir.join(name),
        last_err.unwrap_or_else(|| io::Error::from(ErrorKind::AlreadyExists)),
    ))
}

/// Move a file to a destination the caller has checked is free.
///
/// Falls back to copy-then-remove across filesystems (archive shares and
/// the working directory usually live on different volumes). The source is
/// only removed after the copy succeeded.
///
/// # Errors
///
/// Any I/O error from the rename, copy or removal.
pub fn move_file(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            log::debug!("Cross-device move, copying {} -> {}", src.display(), dest.display());
            copy_file_no_clobber(src, dest)?;
            fs::remove_file(src)
        }
        Err(e) => Err(e),
    }
}

/// Replace `dest` with `src`, consuming `src`.
///
/// This is the only operation that overwrites. It is used by the override
/// pass, where the substitute is authoritative by definition.
///
/// # Errors
///
/// Any I/O error from the rename, copy or removal.
pub fn replace_file(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            let meta = fs::metadata(src)?;
            fs::copy(src, dest)?;
            preserve_metadata(&meta, dest);
            fs::remove_file(src)
        }
        Err(e) => Err(e),
    }
}
