//! Dimension extraction
//!
//! Every dimension is produced by the same routine: scan the source once,
//! apply the dimension's column rule to each row, and collect the results
//! into an ordered set. The set gives deduplication and the ascending tuple
//! order that surrogate IDs are assigned in.

use crate::config::{MalformedRowPolicy, NormalizerConfig};
use crate::resolver::NaturalKey;
use crate::schema::{self, TableSchema};
use crate::source::{columns, RowResult, SourceReader, SourceRow};
use crate::{Error, Result};
use chrono::NaiveDate;
use rusqlite::types::Value;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use tracing::{debug, warn};

/// Non-negative, finite unit price with a total order.
#[derive(Debug, Clone, Copy)]
pub struct Price(f64);

impl Price {
    pub fn parse(raw: &str) -> RowResult<Self> {
        let value: f64 = raw
            .parse()
            .map_err(|_| format!("unparsable price {:?}", raw))?;
        if !value.is_finite() || value < 0.0 {
            return Err(format!("price must be a non-negative number, got {:?}", raw));
        }
        // -0.0 and 0.0 must compare equal for deduplication
        Ok(Price(value + 0.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for Price {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Price {}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Hash for Price {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Split a full name into first name and the remaining tokens.
pub fn split_full_name(full_name: &str) -> RowResult<(String, String)> {
    let mut tokens = full_name.split_whitespace();
    let first = tokens
        .next()
        .ok_or_else(|| "customer name is empty".to_string())?;
    let last = tokens.collect::<Vec<_>>().join(" ");
    Ok((first.to_string(), last))
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CustomerKey {
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub country: String,
}

impl CustomerKey {
    fn from_row(row: &SourceRow) -> RowResult<Self> {
        let (first_name, last_name) = split_full_name(row.field(columns::FULL_NAME)?)?;
        Ok(Self {
            first_name,
            last_name,
            address: row.field(columns::ADDRESS)?.to_string(),
            city: row.field(columns::CITY)?.to_string(),
            country: row.field(columns::COUNTRY)?.to_string(),
        })
    }

    pub fn natural_key(&self) -> NaturalKey {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.address.clone(),
            self.city.clone(),
            self.country.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProductKey {
    pub name: String,
    pub price: Price,
    pub category: String,
}

impl ProductKey {
    pub fn natural_key(&self) -> NaturalKey {
        vec![self.name.clone(), self.price.to_string(), self.category.clone()]
    }
}

/// One distinct tuple of a dimension. Field order is the sort order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DimensionKey {
    Region {
        region: String,
    },
    Country {
        country: String,
        region: String,
    },
    Customer(CustomerKey),
    ProductCategory {
        category: String,
        description: String,
    },
    Product(ProductKey),
}

impl DimensionKey {
    /// Natural key of the parent row this tuple points at, if any.
    pub fn parent_reference(&self) -> Option<NaturalKey> {
        match self {
            DimensionKey::Region { .. } | DimensionKey::ProductCategory { .. } => None,
            DimensionKey::Country { region, .. } => Some(vec![region.clone()]),
            DimensionKey::Customer(c) => Some(vec![c.country.clone()]),
            DimensionKey::Product(p) => Some(vec![p.category.clone()]),
        }
    }

    /// Values in the table's insert column order.
    pub fn into_row(self, parent_id: Option<i64>) -> Vec<Value> {
        let parent = parent_id.map_or(Value::Null, Value::Integer);
        match self {
            DimensionKey::Region { region } => vec![Value::Text(region)],
            DimensionKey::Country { country, .. } => vec![Value::Text(country), parent],
            DimensionKey::Customer(c) => vec![
                Value::Text(c.first_name),
                Value::Text(c.last_name),
                Value::Text(c.address),
                Value::Text(c.city),
                parent,
            ],
            DimensionKey::ProductCategory {
                category,
                description,
            } => vec![Value::Text(category), Value::Text(description)],
            DimensionKey::Product(p) => {
                vec![Value::Text(p.name), Value::Real(p.price.value()), parent]
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Dimension {
    Region,
    Country,
    Customer,
    ProductCategory,
    Product,
}

impl Dimension {
    pub fn schema(self) -> &'static TableSchema {
        match self {
            Dimension::Region => &schema::REGION,
            Dimension::Country => &schema::COUNTRY,
            Dimension::Customer => &schema::CUSTOMER,
            Dimension::ProductCategory => &schema::PRODUCT_CATEGORY,
            Dimension::Product => &schema::PRODUCT,
        }
    }

    /// Apply this dimension's column rule to one row.
    pub fn keys_for_row(self, row: &SourceRow, list_delimiter: char) -> RowResult<Vec<DimensionKey>> {
        match self {
            Dimension::Region => Ok(vec![DimensionKey::Region {
                region: row.field(columns::REGION)?.to_string(),
            }]),
            Dimension::Country => Ok(vec![DimensionKey::Country {
                country: row.field(columns::COUNTRY)?.to_string(),
                region: row.field(columns::REGION)?.to_string(),
            }]),
            Dimension::Customer => Ok(vec![DimensionKey::Customer(CustomerKey::from_row(row)?)]),
            Dimension::ProductCategory => {
                let lists = row.paired_lists(
                    &[columns::CATEGORIES, columns::CATEGORY_DESCRIPTIONS],
                    list_delimiter,
                )?;
                Ok(lists[0]
                    .iter()
                    .zip(&lists[1])
                    .map(|(category, description)| DimensionKey::ProductCategory {
                        category: category.to_string(),
                        description: description.to_string(),
                    })
                    .collect())
            }
            Dimension::Product => Ok(product_keys(row, list_delimiter)?
                .into_iter()
                .map(DimensionKey::Product)
                .collect()),
        }
    }
}

fn product_keys(row: &SourceRow, list_delimiter: char) -> RowResult<Vec<ProductKey>> {
    let lists = row.paired_lists(
        &[columns::PRODUCT_NAMES, columns::CATEGORIES, columns::UNIT_PRICES],
        list_delimiter,
    )?;
    (0..lists[0].len())
        .map(|i| {
            Ok(ProductKey {
                name: lists[0][i].to_string(),
                category: lists[1][i].to_string(),
                price: Price::parse(lists[2][i])?,
            })
        })
        .collect()
}

/// One order line of the fact table, before key resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub line: u64,
    pub customer: CustomerKey,
    pub product: ProductKey,
    /// ISO `YYYY-MM-DD`.
    pub order_date: String,
    pub quantity: i64,
}

fn order_lines_for_row(row: &SourceRow, list_delimiter: char) -> RowResult<Vec<OrderLine>> {
    let customer = CustomerKey::from_row(row)?;
    let products = product_keys(row, list_delimiter)?;
    let lists = row.paired_lists(
        &[columns::PRODUCT_NAMES, columns::QUANTITIES, columns::ORDER_DATES],
        list_delimiter,
    )?;

    products
        .into_iter()
        .zip(lists[1].iter().zip(&lists[2]))
        .map(|(product, (quantity, date))| {
            Ok(OrderLine {
                line: row.line(),
                customer: customer.clone(),
                product,
                order_date: normalize_order_date(date)?,
                quantity: parse_quantity(quantity)?,
            })
        })
        .collect()
}

/// `YYYYMMDD` to `YYYY-MM-DD`.
pub fn normalize_order_date(raw: &str) -> RowResult<String> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("order date {:?} is not YYYYMMDD", raw));
    }
    NaiveDate::parse_from_str(raw, "%Y%m%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|e| format!("invalid order date {:?}: {}", raw, e))
}

fn parse_quantity(raw: &str) -> RowResult<i64> {
    match raw.parse::<i64>() {
        Ok(q) if q > 0 => Ok(q),
        _ => Err(format!("quantity must be a positive integer, got {:?}", raw)),
    }
}

/// Items produced by one pass over the source.
#[derive(Debug, Clone)]
pub struct Scan<T> {
    pub items: T,
    pub rows_read: usize,
    pub rows_skipped: usize,
}

/// Scan the source once, applying `rule` to every well-formed row.
fn scan_with<F>(config: &NormalizerConfig, table: &'static str, mut rule: F) -> Result<Scan<()>>
where
    F: FnMut(&SourceRow) -> RowResult<()>,
{
    let mut reader = SourceReader::open(&config.source_path, config.field_delimiter)?;
    let mut rows_read = 0;
    let mut rows_skipped = 0;

    for row in reader.rows() {
        let row = row?;
        rows_read += 1;

        if let Err(reason) = row.check_layout().and_then(|_| rule(&row)) {
            match config.malformed_rows {
                MalformedRowPolicy::Abort => {
                    return Err(Error::MalformedRow {
                        table,
                        line: row.line(),
                        reason,
                    })
                }
                MalformedRowPolicy::Skip => {
                    warn!(table, line = row.line(), reason = %reason, "Skipping malformed row");
                    rows_skipped += 1;
                }
            }
        }
    }

    Ok(Scan {
        items: (),
        rows_read,
        rows_skipped,
    })
}

/// Distinct tuples of one dimension, sorted, each with the first source
/// line it was seen on.
pub fn extract_dimension(
    config: &NormalizerConfig,
    dimension: Dimension,
) -> Result<Scan<BTreeMap<DimensionKey, u64>>> {
    let table = dimension.schema().name;
    let mut keys = BTreeMap::new();

    let scan = scan_with(config, table, |row| {
        let found = dimension.keys_for_row(row, config.list_delimiter)?;
        for key in found {
            keys.entry(key).or_insert(row.line());
        }
        Ok(())
    })?;

    debug!(
        table,
        distinct = keys.len(),
        rows = scan.rows_read,
        skipped = scan.rows_skipped,
        "Dimension extracted"
    );
    Ok(Scan {
        items: keys,
        rows_read: scan.rows_read,
        rows_skipped: scan.rows_skipped,
    })
}

/// Every order line in source order. Lines are never deduplicated.
pub fn extract_order_lines(config: &NormalizerConfig) -> Result<Scan<Vec<OrderLine>>> {
    let table = schema::ORDER_DETAIL.name;
    let mut lines = Vec::new();

    let scan = scan_with(config, table, |row| {
        lines.extend(order_lines_for_row(row, config.list_delimiter)?);
        Ok(())
    })?;

    debug!(table, lines = lines.len(), rows = scan.rows_read, "Order lines extracted");
    Ok(Scan {
        items: lines,
        rows_read: scan.rows_read,
        rows_skipped: scan.rows_skipped,
    })
}
