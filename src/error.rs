use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::record::RecordError;

/// Failures surfaced by the dataset mutator. Every variant names the file it concerns.
#[derive(Error, Debug)]
pub enum MutateError {
    #[error("schema mismatch in {path}: expected columns Name,Age,City, found {}", render_columns(.found))]
    SchemaMismatch { path: Utf8PathBuf, found: Vec<String> },
    #[error("I/O failure on {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed record for {path}: {source}")]
    MalformedRecord {
        path: Utf8PathBuf,
        #[source]
        source: RecordError,
    },
    #[error("corrupt row in {path}{}: {reason}", render_line(.line))]
    CorruptRow {
        path: Utf8PathBuf,
        line: Option<u64>,
        reason: String,
    },
}

/// Coarse classification callers can branch on without matching every field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    SchemaMismatch,
    Io,
    MalformedRecord,
    CorruptRow,
}

pub type Result<T> = std::result::Result<T, MutateError>;

impl MutateError {
    pub fn io(path: &Utf8Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_owned(),
            source,
        }
    }

    pub fn malformed(path: &Utf8Path, source: RecordError) -> Self {
        Self::MalformedRecord {
            path: path.to_owned(),
            source,
        }
    }

    pub fn corrupt(path: &Utf8Path, line: Option<u64>, reason: String) -> Self {
        Self::CorruptRow {
            path: path.to_owned(),
            line,
            reason,
        }
    }

    /// Fold a `csv` error into the taxonomy: reader I/O stays I/O, anything
    /// else means the existing file could not be decoded.
    pub fn from_csv(path: &Utf8Path, err: csv::Error) -> Self {
        let line = err.position().map(|pos| pos.line());
        let reason = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(source) => Self::io(path, source),
            _ => Self::corrupt(path, line, reason),
        }
    }

    /// Replace the line of a `CorruptRow`; other kinds are returned as is.
    pub fn with_line(self, line: Option<u64>) -> Self {
        match self {
            Self::CorruptRow { path, reason, .. } => Self::CorruptRow { path, line, reason },
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SchemaMismatch { .. } => ErrorKind::SchemaMismatch,
            Self::Io { .. } => ErrorKind::Io,
            Self::MalformedRecord { .. } => ErrorKind::MalformedRecord,
            Self::CorruptRow { .. } => ErrorKind::CorruptRow,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        match self {
            Self::SchemaMismatch { path, .. }
            | Self::Io { path, .. }
            | Self::MalformedRecord { path, .. }
            | Self::CorruptRow { path, .. } => path,
        }
    }
}

fn render_columns(found: &[String]) -> String {
    if found.is_empty() {
        "<no header>".to_owned()
    } else {
        found.join(",")
    }
}

fn render_line(line: &Option<u64>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}
