//! Table summary and foreign key check

use clap::{Arg, ArgMatches, Command};
use retail_etl::schema::ALL_TABLES;
use serde::Serialize;

use super::{open_existing, required};
use crate::cli::utils::{print_success, CliError, CliResult, JsonOutput};
use crate::cli::GlobalOptions;

#[derive(Debug, Serialize)]
struct TableSummary {
    table: &'static str,
    exists: bool,
    rows: u64,
}

pub fn tables_command() -> Command {
    Command::new("tables")
        .about("Show row counts and check foreign keys of a built database")
        .arg(
            Arg::new("database")
                .help("SQLite database built by 'build'")
                .required(true)
                .index(1),
        )
}

pub fn run_tables(matches: &ArgMatches) -> CliResult<()> {
    let global = GlobalOptions::from_matches(matches);
    let path = required(matches, "database")?;
    let storage = open_existing(path)?;

    let mut summaries = Vec::with_capacity(ALL_TABLES.len());
    for schema in ALL_TABLES {
        let exists = storage.table_exists(schema.name)?;
        let rows = if exists {
            storage.table_row_count(schema.name)?
        } else {
            0
        };
        summaries.push(TableSummary {
            table: schema.name,
            exists,
            rows,
        });
    }
    let violations = storage.foreign_key_violations()?;

    if global.is_json() {
        let mut output = JsonOutput::new();
        output.status(violations.is_empty());
        output.add_str("database", path);
        output.add_serialized("tables", &summaries);
        output.add_serialized("foreign_key_violations", &violations);
        output.print();
    } else {
        for summary in &summaries {
            if summary.exists {
                println!("  {:<16} {:>8} rows", summary.table, summary.rows);
            } else {
                println!("  {:<16} {:>8}", summary.table, "missing");
            }
        }
        for violation in violations.iter().take(10) {
            println!(
                "  [FK] {} rowid {} -> {}",
                violation.table,
                violation.rowid.map_or("?".to_string(), |id| id.to_string()),
                violation.parent
            );
        }
        if violations.is_empty() && !global.quiet {
            print_success("Foreign key check passed");
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(CliError::IntegrityFailed(violations.len()))
    }
}
