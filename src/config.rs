//! Pipeline configuration
//!
//! Settings come from three layers, applied in order: built-in defaults, an
//! optional JSON file, then `RETAIL_ETL_*` environment variables. Command line
//! flags are applied on top by the CLI.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SOURCE: &str = "RETAIL_ETL_SOURCE";
pub const ENV_DATABASE: &str = "RETAIL_ETL_DATABASE";
pub const ENV_MALFORMED: &str = "RETAIL_ETL_MALFORMED";
pub const ENV_RESET: &str = "RETAIL_ETL_RESET";

/// What to do with a source row that does not fit its extraction rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Fail the whole table step.
    #[default]
    Abort,
    /// Log a warning, count the row and continue.
    Skip,
}

impl std::str::FromStr for MalformedRowPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "abort" => Ok(MalformedRowPolicy::Abort),
            "skip" => Ok(MalformedRowPolicy::Skip),
            _ => Err(Error::Config(format!(
                "invalid malformed row policy: {}. Use 'abort' or 'skip'.",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    pub source_path: PathBuf,
    pub database_path: PathBuf,
    pub field_delimiter: char,
    pub list_delimiter: char,
    /// Remove the database file before opening it.
    pub reset_database: bool,
    pub malformed_rows: MalformedRowPolicy,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from("data.csv"),
            database_path: PathBuf::from("normalized.db"),
            field_delimiter: '\t',
            list_delimiter: ';',
            reset_database: false,
            malformed_rows: MalformedRowPolicy::Abort,
        }
    }
}

impl NormalizerConfig {
    pub fn new(source_path: impl Into<PathBuf>, database_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            database_path: database_path.into(),
            ..Default::default()
        }
    }

    /// Load a JSON configuration file. Missing keys take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
    }

    /// Apply `RETAIL_ETL_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(source) = lookup(ENV_SOURCE) {
            self.source_path = PathBuf::from(source);
        }
        if let Some(database) = lookup(ENV_DATABASE) {
            self.database_path = PathBuf::from(database);
        }
        if let Some(policy) = lookup(ENV_MALFORMED) {
            self.malformed_rows = policy.parse()?;
        }
        if let Some(reset) = lookup(ENV_RESET) {
            self.reset_database = match reset.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => return Err(Error::Config(format!("invalid {}: {}", ENV_RESET, reset))),
            };
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.field_delimiter == self.list_delimiter {
            return Err(Error::Config(
                "field and list delimiters must differ".to_string(),
            ));
        }
        if !self.field_delimiter.is_ascii() {
            return Err(Error::Config("field delimiter must be ASCII".to_string()));
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("database path is empty".to_string()));
        }
        if self.source_path.as_os_str().is_empty() {
            return Err(Error::Config("source path is empty".to_string()));
        }
        Ok(())
    }
}
