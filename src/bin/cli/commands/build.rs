//! Normalization command

use clap::{Arg, ArgMatches, Command};
use retail_etl::{MalformedRowPolicy, NormalizerConfig, Pipeline, TableStep};
use std::path::Path;
use std::time::Duration;

use crate::cli::utils::{
    format_duration, print_header, print_success, print_warning, CliResult, JsonOutput,
};
use crate::cli::GlobalOptions;

pub fn build_command() -> Command {
    Command::new("build")
        .about("Normalize an order export into a SQLite database")
        .arg(
            Arg::new("source")
                .help("Tab-separated order export")
                .index(1),
        )
        .arg(
            Arg::new("database")
                .help("SQLite database to create")
                .index(2),
        )
        .arg(
            Arg::new("from")
                .help("Rebuild this table and every later one, keeping earlier tables")
                .long("from")
                .value_name("STEP"),
        )
        .arg(
            Arg::new("skip-malformed")
                .help("Skip malformed source rows instead of failing the step")
                .long("skip-malformed")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("keep-existing")
                .help("Do not delete an existing database file first")
                .long("keep-existing")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .help("JSON configuration file")
                .long("config")
                .value_name("FILE"),
        )
}

/// Configuration layering: file, then environment, then arguments.
fn resolve_config(matches: &ArgMatches, first: TableStep) -> CliResult<NormalizerConfig> {
    let config = match matches.get_one::<String>("config") {
        Some(path) => NormalizerConfig::from_json_file(Path::new(path))?,
        None => NormalizerConfig::default(),
    };
    let mut config = config.with_env_overrides()?;

    if let Some(source) = matches.get_one::<String>("source") {
        config.source_path = source.into();
    }
    if let Some(database) = matches.get_one::<String>("database") {
        config.database_path = database.into();
    }
    if matches.get_flag("skip-malformed") {
        config.malformed_rows = MalformedRowPolicy::Skip;
    }
    // A partial rebuild reads the tables before `first`.
    config.reset_database = !matches.get_flag("keep-existing") && first == TableStep::Region;
    Ok(config)
}

pub fn run_build(matches: &ArgMatches) -> CliResult<()> {
    let global = GlobalOptions::from_matches(matches);
    let first = match matches.get_one::<String>("from") {
        Some(step) => step.parse::<TableStep>()?,
        None => TableStep::Region,
    };
    let config = resolve_config(matches, first)?;

    if global.chatty() {
        print_header(&format!(
            "Normalizing {} into {}",
            config.source_path.display(),
            config.database_path.display()
        ));
    }

    let mut pipeline = Pipeline::new(config)?;
    let report = pipeline.run_from(first)?;
    let config = pipeline.config();

    if global.is_json() {
        let mut output = JsonOutput::new();
        output.status(true);
        output.add_str("source", &config.source_path.display().to_string());
        output.add_str("database", &config.database_path.display().to_string());
        output.add_serialized("tables", &report.tables);
        output.add_uint("total_rows", report.total_rows() as u64);
        output.add_uint("total_skipped", report.total_skipped() as u64);
        output.print();
        return Ok(());
    }

    if global.quiet {
        return Ok(());
    }

    for table in &report.tables {
        println!(
            "  {:<16} {:>8} rows  {:>10}",
            table.table,
            table.rows_inserted,
            format_duration(Duration::from_millis(table.duration_ms))
        );
        if table.rows_skipped > 0 {
            print_warning(&format!(
                "{}: skipped {} malformed row(s)",
                table.table, table.rows_skipped
            ));
        }
    }
    print_success(&format!(
        "Built {} tables, {} rows",
        report.tables.len(),
        report.total_rows()
    ));
    Ok(())
}
