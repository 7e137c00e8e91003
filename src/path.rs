//! Opening files with caller mistakes (missing directories or files) kept
//! apart from genuine I/O failures.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Debug)]
pub(crate) enum PathError {
    /// The path cannot name a file: it or its parent directory is missing.
    Invalid(PathBuf),
    Io(io::Error),
}

fn parent_exists(path: &Path) -> bool {
    match path.parent() {
        // A bare file name is relative to the working directory.
        Some(parent) if !parent.as_os_str().is_empty() => parent.is_dir(),
        _ => true,
    }
}

/// Opens an existing file for reading.
pub(crate) fn open_file(path: &Path) -> Result<fs::File, PathError> {
    if !parent_exists(path) {
        return Err(PathError::Invalid(path.to_path_buf()));
    }
    fs::File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => PathError::Invalid(path.to_path_buf()),
        _ => PathError::Io(err),
    })
}

/// Creates (or truncates) a file for writing. Nothing is created when the
/// parent directory is missing.
pub(crate) fn create_file(path: &Path) -> Result<fs::File, PathError> {
    if !parent_exists(path) {
        return Err(PathError::Invalid(path.to_path_buf()));
    }
    fs::File::create(path).map_err(PathError::Io)
}
