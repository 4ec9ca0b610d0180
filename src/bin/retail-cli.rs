//! Retail order normalizer CLI
//!
//! Builds the normalized database from an order export and runs the report
//! queries against it.

mod cli;

use cli::utils::{json_error, print_error};
use retail_etl::logging::init_logging;

fn main() {
    let matches = cli::build_cli().get_matches();
    let global = cli::GlobalOptions::from_matches(&matches);
    init_logging(global.log_level, global.log_json);

    if let Err(e) = cli::run(matches) {
        if global.is_json() {
            json_error(&e.to_string()).print();
        } else {
            print_error(&e.to_string());
        }
        std::process::exit(e.exit_code());
    }
}
