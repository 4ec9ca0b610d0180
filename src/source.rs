//! Reader for the denormalized order file
//!
//! One header line, then one record per line with eleven tab-separated
//! columns. Columns 5..=10 hold `;`-separated lists that pair up by position.

use crate::{Error, Result};
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;

pub const COLUMN_COUNT: usize = 11;

pub mod columns {
    pub const FULL_NAME: usize = 0;
    pub const ADDRESS: usize = 1;
    pub const CITY: usize = 2;
    pub const COUNTRY: usize = 3;
    pub const REGION: usize = 4;
    pub const PRODUCT_NAMES: usize = 5;
    pub const CATEGORIES: usize = 6;
    pub const CATEGORY_DESCRIPTIONS: usize = 7;
    pub const UNIT_PRICES: usize = 8;
    pub const QUANTITIES: usize = 9;
    pub const ORDER_DATES: usize = 10;
}

/// Result of applying a rule to one row; `Err` carries the reason the row
/// is malformed.
pub type RowResult<T> = std::result::Result<T, String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    line: u64,
    fields: Vec<String>,
    /// Set when the line could not be decoded; the row has no fields.
    defect: Option<String>,
}

impl SourceRow {
    pub fn new(line: u64, fields: Vec<String>) -> Self {
        Self {
            line,
            fields,
            defect: None,
        }
    }

    /// A line that was read but could not be decoded into fields.
    pub fn unreadable(line: u64, reason: String) -> Self {
        Self {
            line,
            fields: Vec::new(),
            defect: Some(reason),
        }
    }

    /// 1-based line number in the source file.
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn check_layout(&self) -> RowResult<()> {
        if let Some(defect) = &self.defect {
            Err(defect.clone())
        } else if self.fields.len() == COLUMN_COUNT {
            Ok(())
        } else {
            Err(format!(
                "expected {} columns, found {}",
                COLUMN_COUNT,
                self.fields.len()
            ))
        }
    }

    pub fn field(&self, column: usize) -> RowResult<&str> {
        self.fields
            .get(column)
            .map(String::as_str)
            .ok_or_else(|| format!("missing column {}", column))
    }

    pub fn list(&self, column: usize, delimiter: char) -> RowResult<Vec<&str>> {
        Ok(self.field(column)?.split(delimiter).map(str::trim).collect())
    }

    /// Split several list columns and require equal cardinality.
    pub fn paired_lists(&self, columns: &[usize], delimiter: char) -> RowResult<Vec<Vec<&str>>> {
        let lists = columns
            .iter()
            .map(|&c| self.list(c, delimiter))
            .collect::<RowResult<Vec<_>>>()?;

        if let Some(first) = lists.first() {
            for (column, list) in columns.iter().zip(&lists) {
                if list.len() != first.len() {
                    return Err(format!(
                        "list in column {} has {} items, column {} has {}",
                        column,
                        list.len(),
                        columns[0],
                        first.len()
                    ));
                }
            }
        }
        Ok(lists)
    }
}

pub struct SourceReader {
    reader: Reader<BufReader<File>>,
}

impl SourceReader {
    /// Open the source and position it after the header line.
    pub fn open(path: &Path, field_delimiter: char) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::MissingFile(path.to_path_buf()),
            _ => Error::Io(e),
        })?;

        let reader = ReaderBuilder::new()
            .delimiter(field_delimiter as u8)
            .has_headers(true)
            .flexible(true)
            .quoting(false)
            .trim(Trim::All)
            .from_reader(BufReader::new(file));

        Ok(Self { reader })
    }

    /// Records in file order. A line that is not valid UTF-8 comes back as an
    /// unreadable row so the caller's malformed-row policy applies to it; only
    /// I/O failures end the iteration with an error.
    pub fn rows(&mut self) -> impl Iterator<Item = Result<SourceRow>> + '_ {
        let mut record = StringRecord::new();
        std::iter::from_fn(move || match self.reader.read_record(&mut record) {
            Ok(true) => {
                let line = record.position().map_or(0, |p| p.line());
                let fields = record.iter().map(str::to_string).collect();
                Some(Ok(SourceRow::new(line, fields)))
            }
            Ok(false) => None,
            Err(e) => match e.kind() {
                csv::ErrorKind::Utf8 { pos, err } => {
                    let line = pos.as_ref().map_or(0, |p| p.line());
                    let reason = format!(
                        "column {} is not valid UTF-8 after byte {}",
                        err.field(),
                        err.valid_up_to()
                    );
                    Some(Ok(SourceRow::unreadable(line, reason)))
                }
                _ => Some(Err(Error::from(e))),
            },
        })
    }
}
