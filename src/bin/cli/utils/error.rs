//! CLI error type and exit codes

use retail_etl::Error;
use std::fmt;

/// CLI exit codes for different error categories
pub mod exit_codes {
    pub const GENERAL_ERROR: i32 = 1;
    /// Invalid command line usage or configuration
    pub const USAGE_ERROR: i32 = 2;
    /// Source file or database not found
    pub const NOT_FOUND: i32 = 3;
    /// Malformed source row
    pub const VALIDATION_ERROR: i32 = 5;
    pub const IO_ERROR: i32 = 7;
    pub const DATABASE_ERROR: i32 = 8;
    /// Unresolved or ambiguous reference, failed foreign key check
    pub const INTEGRITY_FAILED: i32 = 10;
}

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub enum CliError {
    /// Invalid arguments
    Usage(String),
    /// Database file does not exist
    DatabaseNotFound(String),
    /// Foreign key check reported violations
    IntegrityFailed(usize),
    /// Error raised by the normalizer or the report queries
    Normalizer(Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => exit_codes::USAGE_ERROR,
            CliError::DatabaseNotFound(_) => exit_codes::NOT_FOUND,
            CliError::IntegrityFailed(_) => exit_codes::INTEGRITY_FAILED,
            CliError::Normalizer(e) => match e.root() {
                Error::Config(_) => exit_codes::USAGE_ERROR,
                Error::MissingFile(_) => exit_codes::NOT_FOUND,
                Error::MalformedRow { .. } => exit_codes::VALIDATION_ERROR,
                Error::UnresolvedReference { .. } | Error::AmbiguousKey { .. } => {
                    exit_codes::INTEGRITY_FAILED
                }
                Error::Io(_) => exit_codes::IO_ERROR,
                Error::Storage(_) => exit_codes::DATABASE_ERROR,
                Error::Step { .. } => exit_codes::GENERAL_ERROR,
            },
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{}", msg),
            CliError::DatabaseNotFound(path) => write!(
                f,
                "Database not found: {}. Use 'build' to create it.",
                path
            ),
            CliError::IntegrityFailed(count) => {
                write!(f, "Foreign key check failed: {} violation(s)", count)
            }
            CliError::Normalizer(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Normalizer(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Error> for CliError {
    fn from(err: Error) -> Self {
        CliError::Normalizer(err)
    }
}
