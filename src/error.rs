use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Malformed row in {table} at line {line}: {reason}")]
    MalformedRow {
        table: &'static str,
        line: u64,
        reason: String,
    },

    #[error("Unresolved reference to {table}: no entry for {key} (source line {line})")]
    UnresolvedReference {
        table: &'static str,
        key: String,
        line: u64,
    },

    #[error("Ambiguous natural key in {table}: {key} maps to more than one row")]
    AmbiguousKey { table: &'static str, key: String },

    #[error("Source file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Step {step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: Box<Error>,
    },
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

/// Undecodable lines never get here; `SourceReader::rows` turns them into
/// malformed rows. Whatever else the reader reports is a read failure.
impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(io) => Error::Io(io),
            other => Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("source read failed: {:?}", other),
            )),
        }
    }
}

impl Error {
    pub fn error_code(&self) -> i32 {
        match self {
            Error::Io(_) => -1,
            Error::Storage(_) => -2,
            Error::MalformedRow { .. } => -3,
            Error::UnresolvedReference { .. } => -4,
            Error::AmbiguousKey { .. } => -5,
            Error::MissingFile(_) => -6,
            Error::Config(_) => -7,
            Error::Step { source, .. } => source.error_code(),
        }
    }

    /// The innermost error, with any step label removed.
    pub fn root(&self) -> &Error {
        match self {
            Error::Step { source, .. } => source.root(),
            other => other,
        }
    }

    pub(crate) fn in_step(self, step: &'static str) -> Error {
        match self {
            Error::Step { .. } => self,
            other => Error::Step {
                step,
                source: Box::new(other),
            },
        }
    }
}
