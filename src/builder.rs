//! Table builder
//!
//! Runs the fixed table sequence against one storage handle. Each step:
//!
//! 1. drops the target table, so a failed step never leaves stale rows
//! 2. loads the key maps of its parent tables
//! 3. scans the source and extracts its rows
//! 4. recreates the table and bulk inserts in one transaction
//!
//! A failed step stops the run. Tables committed by earlier steps stay as
//! they are; rerunning from the failed step is the recovery path.

use crate::config::NormalizerConfig;
use crate::extract::{self, Dimension};
use crate::logging::StepTimer;
use crate::resolver::{
    KeyMap, KeySpec, CATEGORY_BY_NAME, COUNTRY_BY_NAME, CUSTOMER_BY_IDENTITY,
    PRODUCT_BY_IDENTITY, REGION_BY_NAME,
};
use crate::schema::{self, TableSchema};
use crate::storage::{Row, Storage};
use crate::{Error, Result};
use rusqlite::types::Value;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TableStep {
    Region,
    Country,
    Customer,
    ProductCategory,
    Product,
    OrderDetail,
}

impl TableStep {
    /// Build order. Every table comes after the tables it references.
    pub const SEQUENCE: [TableStep; 6] = [
        TableStep::Region,
        TableStep::Country,
        TableStep::Customer,
        TableStep::ProductCategory,
        TableStep::Product,
        TableStep::OrderDetail,
    ];

    pub fn name(self) -> &'static str {
        self.schema().name
    }

    pub fn schema(self) -> &'static TableSchema {
        match self.dimension() {
            Some(dimension) => dimension.schema(),
            None => &schema::ORDER_DETAIL,
        }
    }

    pub fn dimension(self) -> Option<Dimension> {
        match self {
            TableStep::Region => Some(Dimension::Region),
            TableStep::Country => Some(Dimension::Country),
            TableStep::Customer => Some(Dimension::Customer),
            TableStep::ProductCategory => Some(Dimension::ProductCategory),
            TableStep::Product => Some(Dimension::Product),
            TableStep::OrderDetail => None,
        }
    }

    /// Key map a dimension step resolves its foreign key through.
    fn parent_keys(self) -> Option<&'static KeySpec> {
        match self {
            TableStep::Country => Some(&REGION_BY_NAME),
            TableStep::Customer => Some(&COUNTRY_BY_NAME),
            TableStep::Product => Some(&CATEGORY_BY_NAME),
            _ => None,
        }
    }
}

impl fmt::Display for TableStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TableStep {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TableStep::SEQUENCE
            .into_iter()
            .find(|step| step.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                Error::Config(format!(
                    "unknown table step: {}. Expected one of: {}",
                    s,
                    TableStep::SEQUENCE.map(TableStep::name).join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    pub table: &'static str,
    pub rows_inserted: usize,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub tables: Vec<TableReport>,
}

impl PipelineReport {
    pub fn table(&self, name: &str) -> Option<&TableReport> {
        self.tables.iter().find(|t| t.table == name)
    }

    pub fn total_rows(&self) -> usize {
        self.tables.iter().map(|t| t.rows_inserted).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.tables.iter().map(|t| t.rows_skipped).sum()
    }
}

pub struct Pipeline {
    config: NormalizerConfig,
    storage: Storage,
}

impl Pipeline {
    /// Validate the configuration and open the database it names.
    pub fn new(config: NormalizerConfig) -> Result<Self> {
        config.validate()?;
        // Checked before the database is touched, so a missing source never
        // costs an existing database when reset is requested.
        if !config.source_path.is_file() {
            return Err(Error::MissingFile(config.source_path.clone()));
        }
        let storage = Storage::open(&config.database_path, config.reset_database)?;
        Ok(Self { config, storage })
    }

    pub fn with_storage(config: NormalizerConfig, storage: Storage) -> Self {
        Self { config, storage }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn into_storage(self) -> Storage {
        self.storage
    }

    pub fn run(&mut self) -> Result<PipelineReport> {
        self.run_from(TableStep::Region)
    }

    /// Run `first` and every later step of the sequence.
    pub fn run_from(&mut self, first: TableStep) -> Result<PipelineReport> {
        info!(
            source = %self.config.source_path.display(),
            from = first.name(),
            "Normalization started"
        );

        let mut report = PipelineReport::default();
        for step in TableStep::SEQUENCE.into_iter().filter(|s| *s >= first) {
            report.tables.push(self.build_step(step)?);
        }

        info!(
            tables = report.tables.len(),
            rows = report.total_rows(),
            skipped = report.total_skipped(),
            "Normalization finished"
        );
        Ok(report)
    }

    /// Build one table. Errors carry the step name.
    pub fn build_step(&mut self, step: TableStep) -> Result<TableReport> {
        let timer = StepTimer::start(step.name());
        let result = self.build(step);
        let rows = result.as_ref().map_or(0, |(rows, _, _)| *rows);
        let duration = timer.complete(&result, rows);

        let (rows_inserted, rows_read, rows_skipped) = result.map_err(|e| e.in_step(step.name()))?;
        Ok(TableReport {
            table: step.name(),
            rows_inserted,
            rows_read,
            rows_skipped,
            duration_ms: duration.as_millis() as u64,
        })
    }

    fn build(&mut self, step: TableStep) -> Result<(usize, usize, usize)> {
        let schema = step.schema();
        self.storage.drop_table(schema.name)?;
        self.require_parents(schema)?;

        let (rows, rows_read, rows_skipped) = match step.dimension() {
            Some(dimension) => self.dimension_rows(step, dimension)?,
            None => self.order_detail_rows()?,
        };

        let inserted = self.storage.replace_table(schema, &rows)?;
        Ok((inserted, rows_read, rows_skipped))
    }

    fn require_parents(&self, schema: &TableSchema) -> Result<()> {
        for parent in schema.parents {
            if !self.storage.table_exists(parent)? {
                return Err(Error::Storage(format!(
                    "{} references {}, which has not been built",
                    schema.name, parent
                )));
            }
        }
        Ok(())
    }

    fn dimension_rows(&self, step: TableStep, dimension: Dimension) -> Result<(Vec<Row>, usize, usize)> {
        let parent = step
            .parent_keys()
            .map(|spec| KeyMap::load(&self.storage, spec))
            .transpose()?;

        let scan = extract::extract_dimension(&self.config, dimension)?;

        let mut rows = Vec::with_capacity(scan.items.len());
        for (key, line) in scan.items {
            let parent_id = match (&parent, key.parent_reference()) {
                (Some(map), Some(reference)) => Some(map.resolve(&reference, line)?),
                _ => None,
            };
            rows.push(key.into_row(parent_id));
        }
        Ok((rows, scan.rows_read, scan.rows_skipped))
    }

    fn order_detail_rows(&self) -> Result<(Vec<Row>, usize, usize)> {
        let customers = KeyMap::load(&self.storage, &CUSTOMER_BY_IDENTITY)?;
        let products = KeyMap::load(&self.storage, &PRODUCT_BY_IDENTITY)?;

        let scan = extract::extract_order_lines(&self.config)?;

        let rows = scan
            .items
            .into_iter()
            .map(|order| {
                let customer_id = customers.resolve(&order.customer.natural_key(), order.line)?;
                let product_id = products.resolve(&order.product.natural_key(), order.line)?;
                Ok(vec![
                    Value::Integer(customer_id),
                    Value::Integer(product_id),
                    Value::Text(order.order_date),
                    Value::Integer(order.quantity),
                ])
            })
            .collect::<Result<Vec<Row>>>()?;
        Ok((rows, scan.rows_read, scan.rows_skipped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_matches_schema_order() {
        let names: Vec<&str> = TableStep::SEQUENCE.iter().map(|s| s.name()).collect();
        let schema_names: Vec<&str> = schema::ALL_TABLES.iter().map(|t| t.name).collect();
        assert_eq!(names, schema_names);
    }

    #[test]
    fn test_step_parsing() {
        assert_eq!("product".parse::<TableStep>().unwrap(), TableStep::Product);
        assert_eq!("OrderDetail".parse::<TableStep>().unwrap(), TableStep::OrderDetail);
        assert!(matches!("Invoice".parse::<TableStep>(), Err(Error::Config(_))));
    }

    #[test]
    fn test_parent_keys_point_at_declared_parents() {
        for step in TableStep::SEQUENCE {
            if let Some(spec) = step.parent_keys() {
                assert_eq!(step.schema().parents, &[spec.table]);
            }
        }
    }

    #[test]
    fn test_run_from_later_step_requires_parents() {
        let storage = Storage::open_in_memory().unwrap();
        let mut pipeline = Pipeline::with_storage(NormalizerConfig::default(), storage);

        let err = pipeline.run_from(TableStep::Product).unwrap_err();
        assert!(matches!(err, Error::Step { step: "Product", .. }));
        assert!(err.to_string().contains("ProductCategory"));
    }
}
