//! Display and output utilities for CLI commands
//!
//! Text output goes through the `print_*` helpers, JSON output through
//! [`JsonOutput`].

use retail_etl::storage::display_value;
use retail_etl::ResultSet;
use rusqlite::types::Value;
use serde_json::{Map, Number, Value as Json};

/// Format duration in human-readable form
pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        format!("{} μs", duration.as_micros())
    } else if secs < 1.0 {
        format!("{} ms", duration.as_millis())
    } else if secs < 60.0 {
        format!("{:.2} s", secs)
    } else {
        format!("{:.1} min", secs / 60.0)
    }
}

pub fn print_success(message: &str) {
    println!("[OK] {}", message);
}

pub fn print_error(message: &str) {
    eprintln!("[ERROR] {}", message);
}

pub fn print_warning(message: &str) {
    println!("[WARN] {}", message);
}

pub fn print_header(title: &str) {
    println!("\n=== {} ===", title);
}

/// Print a result set as an aligned, pipe-separated table.
pub fn print_result_set(result: &ResultSet) {
    let cells: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(display_value).collect())
        .collect();

    let mut widths: Vec<usize> = result.columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |row: &[String]| {
        row.iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
            .collect::<Vec<_>>()
            .join(" | ")
    };

    println!("{}", format_row(&result.columns));
    println!(
        "{}",
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-")
    );
    for row in &cells {
        println!("{}", format_row(row));
    }
    println!("({} rows)", result.len());
}

pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Integer(i) => Json::Number((*i).into()),
        Value::Real(f) => Number::from_f64(*f).map_or(Json::Null, Json::Number),
        Value::Text(s) => Json::String(s.clone()),
        Value::Blob(b) => Json::String(format!("<blob {} bytes>", b.len())),
    }
}

/// Rows as an array of objects keyed by column name.
pub fn result_set_to_json(result: &ResultSet) -> Json {
    let rows = result
        .rows
        .iter()
        .map(|row| {
            let object: Map<String, Json> = result
                .columns
                .iter()
                .cloned()
                .zip(row.iter().map(value_to_json))
                .collect();
            Json::Object(object)
        })
        .collect();
    Json::Array(rows)
}

// ============================================================================
// JSON Output Support
// ============================================================================

/// JSON output builder for structured CLI output
#[derive(Debug, Clone, Default)]
pub struct JsonOutput {
    fields: Map<String, Json>,
}

impl JsonOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_str(&mut self, key: &str, value: &str) -> &mut Self {
        self.fields.insert(key.to_string(), Json::String(value.to_string()));
        self
    }

    pub fn add_uint(&mut self, key: &str, value: u64) -> &mut Self {
        self.fields.insert(key.to_string(), Json::Number(value.into()));
        self
    }

    /// Add any serializable value; falls back to null if it cannot be encoded.
    pub fn add_serialized<T: serde::Serialize>(&mut self, key: &str, value: &T) -> &mut Self {
        let json = serde_json::to_value(value).unwrap_or(Json::Null);
        self.fields.insert(key.to_string(), json);
        self
    }

    pub fn add_value(&mut self, key: &str, value: Json) -> &mut Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    /// Set the status field (common for all responses)
    pub fn status(&mut self, success: bool) -> &mut Self {
        self.add_str("status", if success { "success" } else { "error" })
    }

    pub fn error(&mut self, message: &str) -> &mut Self {
        self.add_str("status", "error");
        self.add_str("error", message)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&Json::Object(self.fields.clone()))
            .unwrap_or_else(|_| "{}".to_string())
    }

    /// Print JSON output to stdout
    pub fn print(&self) {
        println!("{}", self.to_json());
    }
}

pub fn json_error(message: &str) -> JsonOutput {
    let mut output = JsonOutput::new();
    output.error(message);
    output
}
