//! Report query commands

use clap::{Arg, ArgMatches, Command};
use retail_etl::ReportQuery;
use serde_json::Value as Json;

use super::{open_existing, required};
use crate::cli::utils::{print_header, print_result_set, result_set_to_json, CliResult, JsonOutput};
use crate::cli::GlobalOptions;

pub fn query_command() -> Command {
    Command::new("query")
        .about("Run a report query against a built database")
        .arg(
            Arg::new("database")
                .help("SQLite database built by 'build'")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("query")
                .help("Query name (see 'queries')")
                .required(true)
                .index(2)
                .value_parser(ReportQuery::NAMES),
        )
        .arg(
            Arg::new("customer")
                .help("Customer full name, for customer-orders and customer-total")
                .long("customer")
                .short('c')
                .value_name("NAME"),
        )
}

pub fn queries_command() -> Command {
    Command::new("queries").about("List the available report queries")
}

pub fn run_query(matches: &ArgMatches) -> CliResult<()> {
    let global = GlobalOptions::from_matches(matches);
    let path = required(matches, "database")?;
    let name = required(matches, "query")?;
    let customer = matches.get_one::<String>("customer").map(String::as_str);

    let report = ReportQuery::by_name(name, customer)?;
    let storage = open_existing(path)?;
    let result = storage.run_report(&report.build())?;

    if global.is_json() {
        let mut output = JsonOutput::new();
        output.status(true);
        output.add_str("query", report.name());
        output.add_serialized("columns", &result.columns);
        output.add_value("rows", result_set_to_json(&result));
        output.print();
    } else {
        if !global.quiet {
            print_header(report.description());
        }
        print_result_set(&result);
    }
    Ok(())
}

pub fn run_queries(matches: &ArgMatches) -> CliResult<()> {
    let global = GlobalOptions::from_matches(matches);
    let reports = ReportQuery::all("NAME");

    if global.is_json() {
        let list = reports
            .iter()
            .map(|report| {
                serde_json::json!({
                    "name": report.name(),
                    "description": report.description(),
                    "needs_customer": !report.build().params.is_empty(),
                })
            })
            .collect();
        let mut output = JsonOutput::new();
        output.status(true);
        output.add_value("queries", Json::Array(list));
        output.print();
        return Ok(());
    }

    for report in &reports {
        let usage = if report.build().params.is_empty() {
            report.name().to_string()
        } else {
            format!("{} --customer NAME", report.name())
        };
        println!("  {:<40} {}", usage, report.description());
    }
    Ok(())
}
