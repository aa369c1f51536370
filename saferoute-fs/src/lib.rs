//! Shared filesystem helpers built on `cap-std`, `camino`, and `tempfile`.
//!
//! The scorer persists model artefacts with a write-then-rename protocol so a
//! crash mid-write never leaves a truncated file where a loader expects a
//! valid one. These helpers keep that protocol in one place.

#![forbid(unsafe_code)]

use std::io::{self, Write};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use tempfile::NamedTempFile;

/// Ensure the parent directory for `path` exists.
///
/// Absolute paths are resolved from the filesystem root, relative paths from
/// the current directory. A path with no parent (or a bare root parent) is a
/// no-op.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    if parent.as_str().is_empty() || parent == Utf8Path::new("/") {
        return Ok(());
    }

    let (base, relative) = if parent.is_absolute() {
        let relative = parent
            .strip_prefix("/")
            .map_err(|_| io::Error::other("failed to strip root from absolute path"))?;
        (Utf8PathBuf::from("/"), relative.to_path_buf())
    } else {
        (Utf8PathBuf::from("."), parent.to_path_buf())
    };

    if relative.as_str().is_empty() {
        return Ok(());
    }
    let dir = fs_utf8::Dir::open_ambient_dir(&base, ambient_authority())?;
    dir.create_dir_all(&relative)?;
    Ok(())
}

/// Return whether `path` exists and is a regular file.
pub fn file_is_file(path: &Utf8Path) -> bool {
    path.as_std_path().is_file()
}

/// Write `bytes` to `path` atomically.
///
/// The payload lands in a temporary file in the destination directory and is
/// renamed over `path` only once fully written, so concurrent readers see
/// either the old contents or the new, never a partial write. The parent
/// directory is created when missing.
pub fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> io::Result<()> {
    ensure_parent_dir(path)?;
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let mut tmp = NamedTempFile::new_in(parent.as_std_path())?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path.as_std_path()).map_err(|err| err.error)?;
    Ok(())
}
