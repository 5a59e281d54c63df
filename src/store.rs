//! Write boundary for dataset files.
//!
//! Contents are staged in a temporary file next to the target and renamed over
//! it, so readers observe either the previous file or the complete new one.

use std::fs::{self, File};
use std::io::{self, Write};

use camino::Utf8Path;
use tracing::debug;

/// Replaces the file at `path` with `contents` in one step.
pub trait Persist {
    fn persist(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()>;
}

/// Temp-file-and-rename writer used for real runs.
#[derive(Clone, Copy, Debug, Default)]
pub struct AtomicFs;

impl Persist for AtomicFs {
    fn persist(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
        write_atomic(path, |file| file.write_all(contents))
    }
}

/// Accepts every write and keeps nothing. Backs `--dry-run`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl Persist for Discard {
    fn persist(&self, path: &Utf8Path, contents: &[u8]) -> io::Result<()> {
        debug!(path = %path, bytes = contents.len(), "dry-run: write discarded");
        Ok(())
    }
}

/// Stage bytes produced by `fill` in a sibling temp file, then rename it onto
/// `path`. If `fill` or the flush fails the temp file is removed on drop and
/// `path` is untouched.
pub(crate) fn write_atomic<F>(path: &Utf8Path, fill: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };

    let mut staged = tempfile::Builder::new()
        .prefix(".datamut-")
        .suffix(".tmp")
        .tempfile_in(dir)?;

    fill(staged.as_file_mut())?;
    staged.as_file().sync_all()?;
    match fs::metadata(path) {
        Ok(existing) => staged.as_file().set_permissions(existing.permissions())?,
        Err(err) if err.kind() == io::ErrorKind::NotFound => set_default_permissions(staged.as_file())?,
        Err(err) => return Err(err),
    }

    staged.persist(path).map_err(|err| err.error)?;
    debug!(path = %path, "persisted dataset");
    Ok(())
}

// Temp files are created 0600; a fresh dataset should look like any other file.
#[cfg(unix)]
fn set_default_permissions(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_file: &File) -> io::Result<()> {
    Ok(())
}
