#![allow(dead_code)]

use retail_etl::storage::display_value;
use retail_etl::{NormalizerConfig, Pipeline, PipelineReport, Storage};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const HEADER: &str = "Name\tAddress\tCity\tCountry\tRegion\tProductName\tProductCategory\tProductCategoryDescription\tProductUnitPrice\tQuantityOrderded\tOrderDate";

pub const JANE_DOE: &str = "Jane Doe\t1 Elm St\tSpringfield\tUSA\tAmericas\tWidget;Gadget\tTools;Tools\tHardware;Hardware\t9.99;19.99\t2;1\t20230115;20230201";

/// Four customers in three regions, seven order lines.
pub const SAMPLE: [&str; 4] = [
    JANE_DOE,
    "Ana Souza\t9 Rua Azul\tLisbon\tPortugal\tEurope\tGadget;Mug\tTools;Kitchen\tHardware;Cookware\t19.99;5.5\t3;4\t20230310;20230705",
    "Li Wei\t88 Ring Rd\tBeijing\tChina\tAsia\tMug\tKitchen\tCookware\t5.5\t10\t20231111",
    "John Roe\t2 Oak Ave\tToronto\tCanada\tAmericas\tWidget;Widget\tTools;Tools\tHardware;Hardware\t9.99;9.99\t1;1\t20230120;20230320",
];

/// A source file and database path inside a temporary directory.
pub struct Fixture {
    pub dir: TempDir,
    pub source: PathBuf,
    pub database: PathBuf,
}

impl Fixture {
    pub fn new(rows: &[&str]) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let source = dir.path().join("data.csv");
        let database = dir.path().join("normalized.db");
        let fixture = Self {
            dir,
            source,
            database,
        };
        fixture.write_source(rows);
        fixture
    }

    pub fn sample() -> Self {
        Self::new(&SAMPLE)
    }

    pub fn write_source(&self, rows: &[&str]) {
        let mut text = String::from(HEADER);
        text.push('\n');
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        fs::write(&self.source, text).expect("Failed to write source");
    }

    /// Header, `before`, one line holding a byte that is not UTF-8, `after`.
    pub fn write_source_with_undecodable_line(&self, before: &str, after: &str) {
        let mut bytes = Vec::new();
        for line in [HEADER, before] {
            bytes.extend_from_slice(line.as_bytes());
            bytes.push(b'\n');
        }
        bytes.extend_from_slice(b"Jo\xffn Doe\t1 Elm St\tSpringfield\tUSA\tAmericas\tMug\tKitchen\tCookware\t5.5\t1\t20230101\n");
        bytes.extend_from_slice(after.as_bytes());
        bytes.push(b'\n');
        fs::write(&self.source, bytes).expect("Failed to write source");
    }

    pub fn config(&self) -> NormalizerConfig {
        let mut config = NormalizerConfig::new(&self.source, &self.database);
        config.reset_database = true;
        config
    }

    pub fn build(&self) -> (PipelineReport, Storage) {
        let mut pipeline = Pipeline::new(self.config()).expect("Failed to open pipeline");
        let report = pipeline.run().expect("Normalization failed");
        (report, pipeline.into_storage())
    }
}

/// Every row of `table` in ID order, rendered as text.
pub fn dump(storage: &Storage, table: &str) -> Vec<Vec<String>> {
    storage
        .execute(&format!("SELECT * FROM {} ORDER BY 1", table))
        .expect("Failed to dump table")
        .iter()
        .map(|row| row.iter().map(display_value).collect())
        .collect()
}

pub fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}
