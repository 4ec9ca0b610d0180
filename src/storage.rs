//! Storage handle over the embedded SQLite database
//!
//! Foreign key enforcement is switched on for every connection. It is only
//! suspended around `DROP TABLE`, so a parent table can be rebuilt while its
//! children still reference it.

use crate::query::Query;
use crate::schema::TableSchema;
use crate::{Error, Result};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub type Row = Vec<Value>;

/// Rows of a read query together with their column names.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One row reported by `PRAGMA foreign_key_check`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyViolation {
    pub table: String,
    pub rowid: Option<i64>,
    pub parent: String,
}

pub struct Storage {
    conn: Connection,
    path: Option<PathBuf>,
}

impl Storage {
    /// Open or create the database file. With `reset_existing` any existing
    /// file is removed first.
    pub fn open<P: AsRef<Path>>(path: P, reset_existing: bool) -> Result<Self> {
        let path = path.as_ref();
        if reset_existing && path.exists() {
            fs::remove_file(path).map_err(|e| {
                Error::Storage(format!("cannot remove {}: {}", path.display(), e))
            })?;
            info!(path = %path.display(), "Removed existing database");
        }

        let conn = Connection::open(path)
            .map_err(|e| Error::Storage(format!("cannot open {}: {}", path.display(), e)))?;
        Self::init(conn, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None)
    }

    fn init(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run a read statement and return every row.
    pub fn execute(&self, sql: &str) -> Result<Vec<Row>> {
        Ok(self.query(sql, &[])?.rows)
    }

    /// Run a parameterized read statement. Either all rows are returned or
    /// an error, never a prefix.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<ResultSet> {
        let mut stmt = self.conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<rusqlite::Result<Row>>()
            })?
            .collect::<rusqlite::Result<Vec<Row>>>()?;

        Ok(ResultSet { columns, rows })
    }

    /// Run a report template from the query library.
    pub fn run_report(&self, query: &Query) -> Result<ResultSet> {
        debug!(query = query.name, params = query.params.len(), "Running report query");
        self.query(query.sql, &query.params)
    }

    /// Create a table from its DDL. With `drop_first` an existing table of
    /// that name is dropped with foreign key checks suspended.
    pub fn create_table(&self, name: &str, ddl: &str, drop_first: bool) -> Result<()> {
        if drop_first {
            self.drop_table(name)?;
        }
        self.conn
            .execute_batch(ddl)
            .map_err(|e| Error::Storage(format!("cannot create {}: {}", name, e)))
    }

    pub fn drop_table(&self, name: &str) -> Result<()> {
        self.conn.execute_batch("PRAGMA foreign_keys = OFF;")?;
        let dropped = self
            .conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)));
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        dropped.map_err(|e| Error::Storage(format!("cannot drop {}: {}", name, e)))
    }

    /// Drop the table, then create and fill it inside one transaction.
    ///
    /// On any insert failure the transaction rolls back, which also undoes
    /// the `CREATE TABLE`: the table ends up absent, never partially filled.
    pub fn replace_table(&mut self, schema: &TableSchema, rows: &[Row]) -> Result<usize> {
        self.drop_table(schema.name)?;

        let tx = self.conn.transaction()?;
        tx.execute_batch(schema.ddl)
            .map_err(|e| Error::Storage(format!("cannot create {}: {}", schema.name, e)))?;
        {
            let mut stmt = tx.prepare(&schema.insert_sql())?;
            for row in rows {
                stmt.execute(params_from_iter(row.iter())).map_err(|e| {
                    Error::Storage(format!("insert into {} failed: {}", schema.name, e))
                })?;
            }
        }
        tx.commit()?;

        debug!(table = schema.name, rows = rows.len(), "Bulk insert committed");
        Ok(rows.len())
    }

    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn table_row_count(&self, name: &str) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(name)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn foreign_key_violations(&self) -> Result<Vec<ForeignKeyViolation>> {
        let mut stmt = self.conn.prepare("PRAGMA foreign_key_check")?;
        let violations = stmt
            .query_map([], |row| {
                Ok(ForeignKeyViolation {
                    table: row.get(0)?,
                    rowid: row.get(1)?,
                    parent: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(violations)
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render a cell for text output.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}
