//! CLI command modules
//!
//! - build: normalize a source file into a database
//! - query: run report queries, list the available ones
//! - tables: row counts and foreign key check of a built database

pub mod build;
pub mod query;
pub mod tables;

use crate::cli::utils::{CliError, CliResult};
use retail_etl::Storage;
use std::path::Path;

/// Open an existing database read-write without resetting it.
pub(crate) fn open_existing(path: &str) -> CliResult<Storage> {
    if !Path::new(path).is_file() {
        return Err(CliError::DatabaseNotFound(path.to_string()));
    }
    Ok(Storage::open(path, false)?)
}

pub(crate) fn required<'a>(matches: &'a clap::ArgMatches, name: &str) -> CliResult<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| CliError::Usage(format!("{} argument is required", name)))
}
