//! Create-or-append transition for the sample dataset.
//!
//! Each call rediscovers state from the file: a missing file is created from
//! the seed rows, an existing one gains exactly one row. Repeating a call with
//! the same arguments appends again; callers needing exactly-once behaviour
//! must deduplicate before calling.
//!
//! The read-modify-write sequence takes no lock. Two concurrent callers on the
//! same path race and the last rename wins.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::{MutateError, Result};
use crate::record::Record;
use crate::store::{AtomicFs, Persist};

/// Which branch ran and how many rows the dataset holds afterwards. `path` is
/// the target anchored at the current directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Created { path: Utf8PathBuf, rows: usize },
    Appended { path: Utf8PathBuf, rows: usize },
}

impl Outcome {
    pub fn path(&self) -> &Utf8Path {
        match self {
            Outcome::Created { path, .. } | Outcome::Appended { path, .. } => path,
        }
    }

    pub fn rows(&self) -> usize {
        match self {
            Outcome::Created { rows, .. } | Outcome::Appended { rows, .. } => *rows,
        }
    }

    pub fn action(&self) -> &'static str {
        match self {
            Outcome::Created { .. } => "created",
            Outcome::Appended { .. } => "appended",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Created { path, rows } => write!(f, "Created {} with {} rows", path, rows),
            Outcome::Appended { path, rows } => {
                write!(f, "Appended 1 row to {} ({} rows total)", path, rows)
            }
        }
    }
}

/// Apply the transition at `path` using the atomic filesystem writer.
pub fn mutate(path: &Utf8Path, seed: &[Record], new_record: &Record) -> Result<Outcome> {
    mutate_with(&AtomicFs, path, seed, new_record)
}

/// Same as [`mutate`] with an explicit write boundary.
pub fn mutate_with<P>(persist: &P, path: &Utf8Path, seed: &[Record], new_record: &Record) -> Result<Outcome>
where
    P: Persist + ?Sized,
{
    let resolved = resolve(path);
    let path = resolved.as_path();

    for record in seed.iter().chain(std::iter::once(new_record)) {
        record
            .validate()
            .map_err(|source| MutateError::malformed(path, source))?;
    }

    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Err(MutateError::io(
            path,
            io::Error::from(io::ErrorKind::IsADirectory),
        )),
        Ok(meta) => {
            ensure_writable(path, &meta)?;
            append(persist, path, new_record)
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => create(persist, path, seed),
        Err(err) => Err(MutateError::io(path, err)),
    }
}

/// Anchor a relative path at the current directory without touching the
/// filesystem. Falls back to the path as given if that is not possible.
fn resolve(path: &Utf8Path) -> Utf8PathBuf {
    std::path::absolute(path)
        .ok()
        .and_then(|abs| Utf8PathBuf::from_path_buf(abs).ok())
        .unwrap_or_else(|| path.to_owned())
}

/// A target that may not be written is an I/O failure even though renaming
/// over it would succeed.
fn ensure_writable(path: &Utf8Path, meta: &fs::Metadata) -> Result<()> {
    if meta.permissions().readonly() {
        return Err(MutateError::io(
            path,
            io::Error::new(io::ErrorKind::PermissionDenied, "dataset file is read-only"),
        ));
    }
    OpenOptions::new()
        .write(true)
        .open(path)
        .map(drop)
        .map_err(|source| MutateError::io(path, source))
}

fn create<P>(persist: &P, path: &Utf8Path, seed: &[Record]) -> Result<Outcome>
where
    P: Persist + ?Sized,
{
    debug!(path = %path, rows = seed.len(), "no dataset present, seeding");
    let dataset = Dataset::from_records(seed.to_vec());
    write(persist, path, &dataset)?;

    info!(path = %path, rows = dataset.len(), action = "created", "dataset written");
    Ok(Outcome::Created {
        path: path.to_owned(),
        rows: dataset.len(),
    })
}

fn append<P>(persist: &P, path: &Utf8Path, new_record: &Record) -> Result<Outcome>
where
    P: Persist + ?Sized,
{
    let mut dataset = Dataset::read(path)?;
    debug!(path = %path, rows = dataset.len(), record = %new_record, "appending row");

    dataset.push(new_record.clone());
    write(persist, path, &dataset)?;

    info!(path = %path, rows = dataset.len(), action = "appended", "dataset written");
    Ok(Outcome::Appended {
        path: path.to_owned(),
        rows: dataset.len(),
    })
}

fn write<P>(persist: &P, path: &Utf8Path, dataset: &Dataset) -> Result<()>
where
    P: Persist + ?Sized,
{
    let bytes = dataset.encode(path)?;
    persist
        .persist(path, &bytes)
        .map_err(|source| MutateError::io(path, source))
}
