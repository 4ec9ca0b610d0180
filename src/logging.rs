use std::time::{Duration, Instant};
use tracing::{error, info, Level};
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Initialize logging for the CLI. `RUST_LOG` takes precedence over `level`.
pub fn init_logging(level: Level, json_output: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("retail_etl={},warn", level)));

    if json_output {
        let fmt_layer = fmt::layer()
            .json()
            .with_timer(SystemTime)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr);

        Registry::default().with(env_filter).with(fmt_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(SystemTime)
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .with_writer(std::io::stderr);

        Registry::default().with(env_filter).with(fmt_layer).init();
    }
}

/// Times one table step and logs its outcome.
pub struct StepTimer {
    start: Instant,
    step: &'static str,
}

impl StepTimer {
    pub fn start(step: &'static str) -> Self {
        info!(step, "Table step started");
        Self {
            start: Instant::now(),
            step,
        }
    }

    pub fn complete<T>(self, result: &crate::Result<T>, rows: usize) -> Duration {
        let duration = self.start.elapsed();
        match result {
            Ok(_) => info!(
                step = self.step,
                rows,
                duration_ms = duration.as_millis() as u64,
                "Table step completed"
            ),
            Err(e) => error!(
                step = self.step,
                duration_ms = duration.as_millis() as u64,
                error = %e,
                "Table step failed"
            ),
        }
        duration
    }
}
