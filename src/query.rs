//! Report query library
//!
//! Fixed, read-only statements over the normalized schema. Customer names are
//! always bound as parameters.

use crate::{Error, Result};
use rusqlite::types::Value;
use std::fmt;
use std::str::FromStr;

/// A ready-to-run statement with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub name: &'static str,
    pub sql: &'static str,
    pub params: Vec<Value>,
    pub columns: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportQuery {
    /// Every order line of one customer.
    CustomerOrders { customer: String },
    /// Lifetime total of one customer.
    CustomerTotal { customer: String },
    CustomerTotals,
    RegionTotals,
    CountryTotals,
    CountryRankInRegion,
    TopCountryPerRegion,
    QuarterlyCustomerTotals,
    /// Top five customers of each quarter.
    TopQuarterlyCustomers,
    MonthlyRanking,
    /// Longest gap between consecutive orders, per customer.
    MaxOrderGap,
}

impl ReportQuery {
    pub const NAMES: [&'static str; 11] = [
        "customer-orders",
        "customer-total",
        "customer-totals",
        "region-totals",
        "country-totals",
        "country-rank",
        "top-country",
        "quarterly-totals",
        "top-quarterly-customers",
        "monthly-ranking",
        "max-order-gap",
    ];

    /// Build a query by name. `customer` is required by the per-customer
    /// queries and ignored by the others.
    pub fn by_name(name: &str, customer: Option<&str>) -> Result<Self> {
        let need_customer = || {
            customer
                .map(str::to_string)
                .ok_or_else(|| Error::Config(format!("query {} needs a customer name", name)))
        };

        Ok(match name {
            "customer-orders" => ReportQuery::CustomerOrders {
                customer: need_customer()?,
            },
            "customer-total" => ReportQuery::CustomerTotal {
                customer: need_customer()?,
            },
            "customer-totals" => ReportQuery::CustomerTotals,
            "region-totals" => ReportQuery::RegionTotals,
            "country-totals" => ReportQuery::CountryTotals,
            "country-rank" => ReportQuery::CountryRankInRegion,
            "top-country" => ReportQuery::TopCountryPerRegion,
            "quarterly-totals" => ReportQuery::QuarterlyCustomerTotals,
            "top-quarterly-customers" => ReportQuery::TopQuarterlyCustomers,
            "monthly-ranking" => ReportQuery::MonthlyRanking,
            "max-order-gap" => ReportQuery::MaxOrderGap,
            _ => {
                return Err(Error::Config(format!(
                    "unknown query: {}. Expected one of: {}",
                    name,
                    Self::NAMES.join(", ")
                )))
            }
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReportQuery::CustomerOrders { .. } => "customer-orders",
            ReportQuery::CustomerTotal { .. } => "customer-total",
            ReportQuery::CustomerTotals => "customer-totals",
            ReportQuery::RegionTotals => "region-totals",
            ReportQuery::CountryTotals => "country-totals",
            ReportQuery::CountryRankInRegion => "country-rank",
            ReportQuery::TopCountryPerRegion => "top-country",
            ReportQuery::QuarterlyCustomerTotals => "quarterly-totals",
            ReportQuery::TopQuarterlyCustomers => "top-quarterly-customers",
            ReportQuery::MonthlyRanking => "monthly-ranking",
            ReportQuery::MaxOrderGap => "max-order-gap",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReportQuery::CustomerOrders { .. } => "Order lines of one customer with line totals",
            ReportQuery::CustomerTotal { .. } => "Lifetime order total of one customer",
            ReportQuery::CustomerTotals => "Order total of every customer, highest first",
            ReportQuery::RegionTotals => "Order total per region, highest first",
            ReportQuery::CountryTotals => "Order total per country, rounded, highest first",
            ReportQuery::CountryRankInRegion => "Countries ranked by total within their region",
            ReportQuery::TopCountryPerRegion => "Highest ranked country of each region",
            ReportQuery::QuarterlyCustomerTotals => "Customer totals per quarter and year",
            ReportQuery::TopQuarterlyCustomers => "Top five customers of each quarter",
            ReportQuery::MonthlyRanking => "Calendar months ranked by total",
            ReportQuery::MaxOrderGap => "Longest gap in days between orders, per customer",
        }
    }

    pub fn build(&self) -> Query {
        let (sql, columns) = self.template();
        let params = match self {
            ReportQuery::CustomerOrders { customer } | ReportQuery::CustomerTotal { customer } => {
                vec![Value::Text(customer.clone())]
            }
            _ => Vec::new(),
        };
        Query {
            name: self.name(),
            sql,
            params,
            columns,
        }
    }

    fn template(&self) -> (&'static str, &'static [&'static str]) {
        match self {
            ReportQuery::CustomerOrders { .. } => (CUSTOMER_ORDERS_SQL, &CUSTOMER_ORDERS_COLUMNS),
            ReportQuery::CustomerTotal { .. } => (CUSTOMER_TOTAL_SQL, &NAME_TOTAL_COLUMNS),
            ReportQuery::CustomerTotals => (CUSTOMER_TOTALS_SQL, &NAME_TOTAL_COLUMNS),
            ReportQuery::RegionTotals => (REGION_TOTALS_SQL, &["Region", "Total"]),
            ReportQuery::CountryTotals => (COUNTRY_TOTALS_SQL, &["Country", "Total"]),
            ReportQuery::CountryRankInRegion => (
                COUNTRY_RANK_SQL,
                &["Region", "Country", "CountryTotal", "TotalRank"],
            ),
            ReportQuery::TopCountryPerRegion => (
                TOP_COUNTRY_SQL,
                &["Region", "Country", "CountryTotal", "CountryRegionalRank"],
            ),
            ReportQuery::QuarterlyCustomerTotals => (
                QUARTERLY_TOTALS_SQL,
                &["Quarter", "Year", "CustomerID", "Total"],
            ),
            ReportQuery::TopQuarterlyCustomers => (
                TOP_QUARTERLY_SQL,
                &["Quarter", "Year", "CustomerID", "Total", "CustomerRank"],
            ),
            ReportQuery::MonthlyRanking => (MONTHLY_RANKING_SQL, &["Month", "Total", "TotalRank"]),
            ReportQuery::MaxOrderGap => (MAX_ORDER_GAP_SQL, &MAX_ORDER_GAP_COLUMNS),
        }
    }

    /// Every parameterless query, plus the customer queries for `customer`.
    pub fn all(customer: &str) -> Vec<ReportQuery> {
        Self::NAMES
            .iter()
            .filter_map(|name| Self::by_name(name, Some(customer)).ok())
            .collect()
    }
}

impl fmt::Display for ReportQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ReportQuery {
    type Err = Error;

    /// Parses parameterless queries only.
    fn from_str(s: &str) -> Result<Self> {
        Self::by_name(s, None)
    }
}

const NAME_TOTAL_COLUMNS: [&str; 2] = ["Name", "Total"];

const CUSTOMER_ORDERS_COLUMNS: [&str; 6] = [
    "Name",
    "ProductName",
    "OrderDate",
    "ProductUnitPrice",
    "QuantityOrdered",
    "Total",
];

const MAX_ORDER_GAP_COLUMNS: [&str; 7] = [
    "CustomerID",
    "FirstName",
    "LastName",
    "Country",
    "OrderDate",
    "PreviousOrderDate",
    "MaxDaysWithoutOrder",
];

const CUSTOMER_ORDERS_SQL: &str = "
    SELECT
        c.FirstName || ' ' || c.LastName AS Name,
        p.ProductName,
        od.OrderDate,
        p.ProductUnitPrice,
        od.QuantityOrdered,
        ROUND(p.ProductUnitPrice * od.QuantityOrdered, 2) AS Total
    FROM OrderDetail od
    JOIN Customer c ON od.CustomerID = c.CustomerID
    JOIN Product p ON od.ProductID = p.ProductID
    WHERE TRIM(c.FirstName || ' ' || c.LastName) = ?1
    ORDER BY od.OrderID";

const CUSTOMER_TOTAL_SQL: &str = "
    SELECT
        c.FirstName || ' ' || c.LastName AS Name,
        ROUND(SUM(p.ProductUnitPrice * od.QuantityOrdered), 2) AS Total
    FROM OrderDetail od
    JOIN Customer c ON od.CustomerID = c.CustomerID
    JOIN Product p ON od.ProductID = p.ProductID
    WHERE TRIM(c.FirstName || ' ' || c.LastName) = ?1
    GROUP BY c.CustomerID";

const CUSTOMER_TOTALS_SQL: &str = "
    SELECT
        c.FirstName || ' ' || c.LastName AS Name,
        ROUND(SUM(p.ProductUnitPrice * od.QuantityOrdered), 2) AS Total
    FROM OrderDetail od
    JOIN Product p ON od.ProductID = p.ProductID
    JOIN Customer c ON od.CustomerID = c.CustomerID
    GROUP BY c.CustomerID
    ORDER BY Total DESC";

const REGION_TOTALS_SQL: &str = "
    SELECT
        r.Region,
        ROUND(SUM(p.ProductUnitPrice * od.QuantityOrdered), 2) AS Total
    FROM OrderDetail od
    JOIN Product p ON od.ProductID = p.ProductID
    JOIN Customer c ON od.CustomerID = c.CustomerID
    JOIN Country co ON c.CountryID = co.CountryID
    JOIN Region r ON co.RegionID = r.RegionID
    GROUP BY r.RegionID
    ORDER BY Total DESC";

const COUNTRY_TOTALS_SQL: &str = "
    SELECT
        co.Country,
        ROUND(SUM(p.ProductUnitPrice * od.QuantityOrdered), 0) AS Total
    FROM OrderDetail od
    JOIN Customer c ON od.CustomerID = c.CustomerID
    JOIN Product p ON od.ProductID = p.ProductID
    JOIN Country co ON c.CountryID = co.CountryID
    GROUP BY co.Country
    ORDER BY Total DESC";

const COUNTRY_RANK_SQL: &str = "
    WITH CountryTotals AS (
        SELECT
            r.Region,
            co.Country,
            ROUND(SUM(od.QuantityOrdered * p.ProductUnitPrice)) AS CountryTotal
        FROM OrderDetail od
        JOIN Customer c ON od.CustomerID = c.CustomerID
        JOIN Country co ON c.CountryID = co.CountryID
        JOIN Region r ON co.RegionID = r.RegionID
        JOIN Product p ON od.ProductID = p.ProductID
        GROUP BY r.Region, co.Country
    )
    SELECT
        Region,
        Country,
        CountryTotal,
        RANK() OVER (PARTITION BY Region ORDER BY CountryTotal DESC) AS TotalRank
    FROM CountryTotals
    ORDER BY Region ASC, CountryTotal DESC";

const TOP_COUNTRY_SQL: &str = "
    WITH CountryTotals AS (
        SELECT
            r.Region,
            co.Country,
            ROUND(SUM(od.QuantityOrdered * p.ProductUnitPrice)) AS CountryTotal,
            RANK() OVER (
                PARTITION BY r.Region
                ORDER BY SUM(od.QuantityOrdered * p.ProductUnitPrice) DESC
            ) AS CountryRegionalRank
        FROM OrderDetail od
        JOIN Customer c ON od.CustomerID = c.CustomerID
        JOIN Country co ON c.CountryID = co.CountryID
        JOIN Region r ON co.RegionID = r.RegionID
        JOIN Product p ON od.ProductID = p.ProductID
        GROUP BY r.Region, co.Country
    )
    SELECT Region, Country, CountryTotal, CountryRegionalRank
    FROM CountryTotals
    WHERE CountryRegionalRank = 1
    ORDER BY Region ASC";

const QUARTERLY_TOTALS_SQL: &str = "
    WITH CustomerSales AS (
        SELECT
            CASE
                WHEN CAST(SUBSTR(od.OrderDate, 6, 2) AS INTEGER) IN (1, 2, 3) THEN 'Q1'
                WHEN CAST(SUBSTR(od.OrderDate, 6, 2) AS INTEGER) IN (4, 5, 6) THEN 'Q2'
                WHEN CAST(SUBSTR(od.OrderDate, 6, 2) AS INTEGER) IN (7, 8, 9) THEN 'Q3'
                ELSE 'Q4'
            END AS Quarter,
            CAST(SUBSTR(od.OrderDate, 1, 4) AS INTEGER) AS Year,
            od.CustomerID,
            ROUND(SUM(od.QuantityOrdered * p.ProductUnitPrice)) AS Total
        FROM OrderDetail od
        JOIN Product p ON od.ProductID = p.ProductID
        GROUP BY Quarter, Year, od.CustomerID
    )
    SELECT Quarter, Year, CustomerID, Total
    FROM CustomerSales
    ORDER BY Year, Quarter, CustomerID";

const TOP_QUARTERLY_SQL: &str = "
    WITH CustomerSales AS (
        SELECT
            CASE
                WHEN CAST(SUBSTR(od.OrderDate, 6, 2) AS INTEGER) IN (1, 2, 3) THEN 'Q1'
                WHEN CAST(SUBSTR(od.OrderDate, 6, 2) AS INTEGER) IN (4, 5, 6) THEN 'Q2'
                WHEN CAST(SUBSTR(od.OrderDate, 6, 2) AS INTEGER) IN (7, 8, 9) THEN 'Q3'
                ELSE 'Q4'
            END AS Quarter,
            CAST(SUBSTR(od.OrderDate, 1, 4) AS INTEGER) AS Year,
            od.CustomerID,
            ROUND(SUM(od.QuantityOrdered * p.ProductUnitPrice)) AS Total
        FROM OrderDetail od
        JOIN Product p ON od.ProductID = p.ProductID
        GROUP BY Quarter, Year, od.CustomerID
    ),
    RankedSales AS (
        SELECT
            Quarter,
            Year,
            CustomerID,
            Total,
            RANK() OVER (PARTITION BY Quarter, Year ORDER BY Total DESC) AS CustomerRank
        FROM CustomerSales
    )
    SELECT Quarter, Year, CustomerID, Total, CustomerRank
    FROM RankedSales
    WHERE CustomerRank <= 5
    ORDER BY Year, Quarter, CustomerRank";

const MONTHLY_RANKING_SQL: &str = "
    WITH MonthlySales AS (
        SELECT
            SUM(ROUND(p.ProductUnitPrice * od.QuantityOrdered, 0)) AS Total,
            CASE CAST(SUBSTR(od.OrderDate, 6, 2) AS INTEGER)
                WHEN 1 THEN 'January'
                WHEN 2 THEN 'February'
                WHEN 3 THEN 'March'
                WHEN 4 THEN 'April'
                WHEN 5 THEN 'May'
                WHEN 6 THEN 'June'
                WHEN 7 THEN 'July'
                WHEN 8 THEN 'August'
                WHEN 9 THEN 'September'
                WHEN 10 THEN 'October'
                WHEN 11 THEN 'November'
                WHEN 12 THEN 'December'
            END AS Month
        FROM OrderDetail od
        JOIN Product p ON od.ProductID = p.ProductID
        GROUP BY Month
    )
    SELECT
        Month,
        Total,
        ROW_NUMBER() OVER (ORDER BY Total DESC) AS TotalRank
    FROM MonthlySales
    ORDER BY Total DESC";

const MAX_ORDER_GAP_SQL: &str = "
    WITH OrderDates AS (
        SELECT
            CustomerID,
            OrderDate,
            LAG(OrderDate) OVER (PARTITION BY CustomerID ORDER BY OrderDate) AS PreviousOrderDate
        FROM OrderDetail
    ),
    DaysBetweenOrders AS (
        SELECT
            od.CustomerID,
            c.FirstName,
            c.LastName,
            co.Country,
            od.OrderDate,
            od.PreviousOrderDate,
            JULIANDAY(od.OrderDate) - JULIANDAY(od.PreviousOrderDate) AS DaysBetweenOrders
        FROM OrderDates od
        JOIN Customer c ON od.CustomerID = c.CustomerID
        JOIN Country co ON c.CountryID = co.CountryID
        WHERE od.PreviousOrderDate IS NOT NULL
    )
    SELECT
        CustomerID,
        FirstName,
        LastName,
        Country,
        OrderDate,
        PreviousOrderDate,
        MAX(DaysBetweenOrders) AS MaxDaysWithoutOrder
    FROM DaysBetweenOrders
    GROUP BY CustomerID
    ORDER BY MaxDaysWithoutOrder DESC";
