//! retail-cli command structure
//!
//! # Output Formats
//!
//! - `text` (default): aligned tables and status lines
//! - `json`: one JSON document per command on stdout
//!
//! Logs always go to stderr, so JSON output stays parseable.

pub mod commands;
pub mod utils;

use clap::{Arg, ArgMatches, Command};
use tracing::Level;
use utils::{CliError, CliResult};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}. Use 'text' or 'json'.", s)),
        }
    }
}

/// Global CLI options that apply to all commands
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub log_level: Level,
    pub log_json: bool,
}

impl GlobalOptions {
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let output_format = matches
            .get_one::<String>("format")
            .map(|s| s.parse().unwrap_or_default())
            .unwrap_or_default();

        let log_level = matches
            .get_one::<String>("log-level")
            .and_then(|s| s.parse().ok())
            .unwrap_or(Level::WARN);

        GlobalOptions {
            output_format,
            quiet: matches.get_flag("quiet"),
            log_level,
            log_json: matches.get_flag("log-json"),
        }
    }

    pub fn is_json(&self) -> bool {
        self.output_format == OutputFormat::Json
    }

    /// Whether human-oriented status lines should be printed.
    pub fn chatty(&self) -> bool {
        !self.is_json() && !self.quiet
    }
}

pub fn build_cli() -> Command {
    Command::new("retail-cli")
        .about("Normalize retail order exports into SQLite and run reports")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("format")
                .help("Output format: text (default) or json")
                .short('o')
                .long("format")
                .global(true)
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("quiet")
                .help("Suppress informational output (errors still shown)")
                .short('q')
                .long("quiet")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .help("Log level written to stderr; RUST_LOG overrides it")
                .long("log-level")
                .global(true)
                .value_parser(["error", "warn", "info", "debug", "trace"])
                .default_value("warn"),
        )
        .arg(
            Arg::new("log-json")
                .help("Write logs as JSON lines")
                .long("log-json")
                .global(true)
                .action(clap::ArgAction::SetTrue),
        )
        .subcommand(commands::build::build_command())
        .subcommand(commands::query::query_command())
        .subcommand(commands::query::queries_command())
        .subcommand(commands::tables::tables_command())
}

/// Dispatch to appropriate command handler
pub fn run(matches: ArgMatches) -> CliResult<()> {
    match matches.subcommand() {
        Some(("build", sub)) => commands::build::run_build(sub),
        Some(("query", sub)) => commands::query::run_query(sub),
        Some(("queries", sub)) => commands::query::run_queries(sub),
        Some(("tables", sub)) => commands::tables::run_tables(sub),
        _ => Err(CliError::Usage(
            "Unknown command. Use --help for available commands.".to_string(),
        )),
    }
}
