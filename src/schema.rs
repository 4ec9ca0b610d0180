//! Table definitions for the normalized order schema
//!
//! Tables are listed parents first. Every surrogate key column is an
//! `INTEGER PRIMARY KEY`, so SQLite assigns 1..n in insertion order and the
//! builder controls ID assignment through the order of its inserts.

#[derive(Debug)]
pub struct TableSchema {
    pub name: &'static str,
    /// Columns written by the builder, in insert order. The surrogate key is
    /// never listed here.
    pub insert_columns: &'static [&'static str],
    pub parents: &'static [&'static str],
    pub ddl: &'static str,
}

impl TableSchema {
    pub fn insert_sql(&self) -> String {
        let placeholders: Vec<String> = (1..=self.insert_columns.len())
            .map(|i| format!("?{}", i))
            .collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            self.insert_columns.join(", "),
            placeholders.join(", ")
        )
    }
}

// =============================================================================
// Dimension tables
// =============================================================================

pub static REGION: TableSchema = TableSchema {
    name: "Region",
    insert_columns: &["Region"],
    parents: &[],
    ddl: "CREATE TABLE Region (
        RegionID INTEGER PRIMARY KEY,
        Region TEXT NOT NULL UNIQUE
    )",
};

pub static COUNTRY: TableSchema = TableSchema {
    name: "Country",
    insert_columns: &["Country", "RegionID"],
    parents: &["Region"],
    ddl: "CREATE TABLE Country (
        CountryID INTEGER PRIMARY KEY,
        Country TEXT NOT NULL,
        RegionID INTEGER NOT NULL,
        FOREIGN KEY (RegionID) REFERENCES Region(RegionID)
    )",
};

pub static CUSTOMER: TableSchema = TableSchema {
    name: "Customer",
    insert_columns: &["FirstName", "LastName", "Address", "City", "CountryID"],
    parents: &["Country"],
    ddl: "CREATE TABLE Customer (
        CustomerID INTEGER PRIMARY KEY,
        FirstName TEXT NOT NULL,
        LastName TEXT NOT NULL,
        Address TEXT NOT NULL,
        City TEXT NOT NULL,
        CountryID INTEGER NOT NULL,
        FOREIGN KEY (CountryID) REFERENCES Country(CountryID)
    )",
};

pub static PRODUCT_CATEGORY: TableSchema = TableSchema {
    name: "ProductCategory",
    insert_columns: &["ProductCategory", "ProductCategoryDescription"],
    parents: &[],
    ddl: "CREATE TABLE ProductCategory (
        ProductCategoryID INTEGER PRIMARY KEY,
        ProductCategory TEXT NOT NULL,
        ProductCategoryDescription TEXT NOT NULL
    )",
};

pub static PRODUCT: TableSchema = TableSchema {
    name: "Product",
    insert_columns: &["ProductName", "ProductUnitPrice", "ProductCategoryID"],
    parents: &["ProductCategory"],
    ddl: "CREATE TABLE Product (
        ProductID INTEGER PRIMARY KEY,
        ProductName TEXT NOT NULL,
        ProductUnitPrice REAL NOT NULL,
        ProductCategoryID INTEGER NOT NULL,
        FOREIGN KEY (ProductCategoryID) REFERENCES ProductCategory(ProductCategoryID)
    )",
};

// =============================================================================
// Fact table
// =============================================================================

pub static ORDER_DETAIL: TableSchema = TableSchema {
    name: "OrderDetail",
    insert_columns: &["CustomerID", "ProductID", "OrderDate", "QuantityOrdered"],
    parents: &["Customer", "Product"],
    ddl: "CREATE TABLE OrderDetail (
        OrderID INTEGER PRIMARY KEY,
        CustomerID INTEGER NOT NULL,
        ProductID INTEGER NOT NULL,
        OrderDate TEXT NOT NULL,
        QuantityOrdered INTEGER NOT NULL,
        FOREIGN KEY (CustomerID) REFERENCES Customer(CustomerID),
        FOREIGN KEY (ProductID) REFERENCES Product(ProductID)
    )",
};

/// All tables in build order.
pub static ALL_TABLES: [&TableSchema; 6] = [
    &REGION,
    &COUNTRY,
    &CUSTOMER,
    &PRODUCT_CATEGORY,
    &PRODUCT,
    &ORDER_DETAIL,
];
