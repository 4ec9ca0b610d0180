//! Natural key to surrogate ID resolution
//!
//! A `KeyMap` is built from a table that has already been populated and is
//! read-only afterwards. Each table step loads the maps it needs; nothing is
//! shared between steps.

use crate::storage::{display_value, Storage};
use crate::{Error, Result};
use rusqlite::types::Value;
use std::collections::HashMap;
use tracing::debug;

/// Natural key values in canonical text form.
pub type NaturalKey = Vec<String>;

/// Where a key map is read from. Key columns are SQL expressions evaluated
/// against `table`.
#[derive(Debug, Clone, Copy)]
pub struct KeySpec {
    pub table: &'static str,
    pub key_columns: &'static [&'static str],
    pub id_column: &'static str,
}

pub const REGION_BY_NAME: KeySpec = KeySpec {
    table: "Region",
    key_columns: &["Region"],
    id_column: "RegionID",
};

pub const COUNTRY_BY_NAME: KeySpec = KeySpec {
    table: "Country",
    key_columns: &["Country"],
    id_column: "CountryID",
};

pub const CATEGORY_BY_NAME: KeySpec = KeySpec {
    table: "ProductCategory",
    key_columns: &["ProductCategory"],
    id_column: "ProductCategoryID",
};

/// Full customer identity, country resolved back to its name.
pub const CUSTOMER_BY_IDENTITY: KeySpec = KeySpec {
    table: "Customer",
    key_columns: &[
        "FirstName",
        "LastName",
        "Address",
        "City",
        "(SELECT Country FROM Country WHERE Country.CountryID = Customer.CountryID)",
    ],
    id_column: "CustomerID",
};

/// Product name, price and category name.
pub const PRODUCT_BY_IDENTITY: KeySpec = KeySpec {
    table: "Product",
    key_columns: &[
        "ProductName",
        "ProductUnitPrice",
        "(SELECT ProductCategory FROM ProductCategory \
          WHERE ProductCategory.ProductCategoryID = Product.ProductCategoryID)",
    ],
    id_column: "ProductID",
};

#[derive(Debug, Clone)]
pub struct KeyMap {
    table: &'static str,
    ids: HashMap<NaturalKey, i64>,
}

impl KeyMap {
    /// Read the whole table into memory. Two rows with the same natural key
    /// make the map ambiguous and fail the load.
    pub fn load(storage: &Storage, spec: &KeySpec) -> Result<Self> {
        Self::load_columns(storage, spec.table, spec.key_columns, spec.id_column)
    }

    fn load_columns(
        storage: &Storage,
        table: &'static str,
        key_columns: &[&str],
        id_column: &str,
    ) -> Result<Self> {
        let sql = format!(
            "SELECT {}, {} FROM {}",
            id_column,
            key_columns.join(", "),
            table
        );
        let rows = storage.execute(&sql)?;

        let mut ids = HashMap::with_capacity(rows.len());
        for row in rows {
            let id = match row.first() {
                Some(Value::Integer(id)) => *id,
                other => {
                    return Err(Error::Storage(format!(
                        "{}.{} is not an integer: {:?}",
                        table, id_column, other
                    )))
                }
            };
            let key: NaturalKey = row[1..].iter().map(display_value).collect();
            if ids.insert(key.clone(), id).is_some() {
                return Err(Error::AmbiguousKey {
                    table,
                    key: render_key(&key),
                });
            }
        }

        debug!(table, entries = ids.len(), "Key map loaded");
        Ok(Self { table, ids })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn get(&self, key: &[String]) -> Option<i64> {
        self.ids.get(key).copied()
    }

    /// Look up `key`; `line` is the source line that referenced it.
    pub fn resolve(&self, key: &[String], line: u64) -> Result<i64> {
        self.get(key).ok_or_else(|| Error::UnresolvedReference {
            table: self.table,
            key: render_key(key),
            line,
        })
    }
}

/// Single-column convenience over [`KeyMap::load`].
pub fn load_key_map(
    storage: &Storage,
    table: &'static str,
    key_column: &str,
    id_column: &str,
) -> Result<KeyMap> {
    KeyMap::load_columns(storage, table, &[key_column], id_column)
}

fn render_key(key: &[String]) -> String {
    if key.len() == 1 {
        format!("{:?}", key[0])
    } else {
        format!("({})", key.iter().map(|k| format!("{:?}", k)).collect::<Vec<_>>().join(", "))
    }
}
