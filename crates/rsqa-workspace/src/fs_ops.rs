//! Directory and file helpers reporting [`DirectoryError`].

use std::fs;
use std::io;
use std::path::Path;

use rsqa_utils::error::DirectoryError;

/// Delete `dir` and everything below it. A missing directory is not an error.
///
/// # Errors
///
/// [`DirectoryError::NotADirectory`] when `dir` is a file, or
/// [`DirectoryError::DeleteFailed`].
pub fn delete_directory(dir: &Path) -> Result<(), DirectoryError> {
    match fs::symlink_metadata(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(DirectoryError::DeleteFailed {
            path: dir.to_path_buf(),
            source,
        }),
        Ok(meta) if !meta.is_dir() => Err(DirectoryError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Ok(_) => fs::remove_dir_all(dir).map_err(|source| DirectoryError::DeleteFailed {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// Delete every entry of `dir`, keeping `dir` itself.
///
/// # Errors
///
/// [`DirectoryError::ListFailed`] when `dir` cannot be listed (including
/// when it is not a directory), or [`DirectoryError::DeleteFailed`] for the
/// first entry that cannot be removed.
pub fn delete_all_in(dir: &Path) -> Result<(), DirectoryError> {
    let list_failed = |source: io::Error| DirectoryError::ListFailed {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(list_failed)? {
        let entry = entry.map_err(list_failed)?;
        let path = entry.path();
        let is_dir = entry.file_type().map_err(list_failed)?.is_dir();

        let removed = if is_dir {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        removed.map_err(|source| DirectoryError::DeleteFailed { path, source })?;
    }
    Ok(())
}

/// Make sure `dir` exists as a readable and writable directory.
///
/// # Errors
///
/// [`DirectoryError::NotADirectory`] when a file is in the way,
/// [`DirectoryError::NotReadWrite`] when the directory is read-only or cannot
/// be listed, [`DirectoryError::CreateFailed`] when creation fails.
pub fn ensure_directory(dir: &Path) -> Result<(), DirectoryError> {
    // A concurrent creator may win the race, so re-check before failing
    if !dir.exists()
        && let Err(source) = fs::create_dir_all(dir)
        && !dir.exists()
    {
        return Err(DirectoryError::CreateFailed {
            path: dir.to_path_buf(),
            source,
        });
    }

    if !dir.is_dir() {
        return Err(DirectoryError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let readonly = fs::metadata(dir)
        .map(|meta| meta.permissions().readonly())
        .unwrap_or(true);
    if readonly || fs::read_dir(dir).is_err() {
        return Err(DirectoryError::NotReadWrite {
            path: dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Copy `from` to `to`, replacing `to`. Returns the number of bytes copied.
///
/// # Errors
///
/// [`DirectoryError::CopyFailed`].
pub fn copy_file(from: &Path, to: &Path) -> Result<u64, DirectoryError> {
    fs::copy(from, to).map_err(|source| DirectoryError::CopyFailed {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}
