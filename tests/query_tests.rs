mod common;

use common::{Fixture, JANE_DOE};
use retail_etl::{ReportQuery, ResultSet, Storage};
use rusqlite::types::Value;

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn run(storage: &Storage, query: ReportQuery) -> ResultSet {
    let query = query.build();
    let result = storage.run_report(&query).unwrap();
    assert_eq!(result.columns, query.columns, "{}", query.name);
    result
}

fn customer_orders(name: &str) -> ReportQuery {
    ReportQuery::CustomerOrders {
        customer: name.to_string(),
    }
}

fn customer_total(name: &str) -> ReportQuery {
    ReportQuery::CustomerTotal {
        customer: name.to_string(),
    }
}

#[test]
fn test_customer_totals_single_row_fixture() {
    let fixture = Fixture::new(&[JANE_DOE]);
    let (_, storage) = fixture.build();

    let result = run(&storage, ReportQuery::CustomerTotals);
    assert_eq!(result.rows, vec![vec![text("Jane Doe"), Value::Real(39.97)]]);
}

#[test]
fn test_customer_orders_and_total() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();

    let orders = run(&storage, customer_orders("Jane Doe"));
    assert_eq!(
        orders.rows,
        vec![
            vec![
                text("Jane Doe"),
                text("Widget"),
                text("2023-01-15"),
                Value::Real(9.99),
                Value::Integer(2),
                Value::Real(19.98),
            ],
            vec![
                text("Jane Doe"),
                text("Gadget"),
                text("2023-02-01"),
                Value::Real(19.99),
                Value::Integer(1),
                Value::Real(19.99),
            ],
        ]
    );

    let total = run(&storage, customer_total("Ana Souza"));
    assert_eq!(total.rows, vec![vec![text("Ana Souza"), Value::Real(81.97)]]);
}

#[test]
fn test_customer_name_is_bound_not_interpolated() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();

    assert!(run(&storage, customer_orders("x' OR '1'='1")).is_empty());
    assert!(run(&storage, customer_total("Nobody")).is_empty());
}

#[test]
fn test_totals_by_customer_region_and_country() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();

    let customers = run(&storage, ReportQuery::CustomerTotals);
    assert_eq!(
        customers.rows,
        vec![
            vec![text("Ana Souza"), Value::Real(81.97)],
            vec![text("Li Wei"), Value::Real(55.0)],
            vec![text("Jane Doe"), Value::Real(39.97)],
            vec![text("John Roe"), Value::Real(19.98)],
        ]
    );

    let regions = run(&storage, ReportQuery::RegionTotals);
    assert_eq!(
        regions.rows,
        vec![
            vec![text("Europe"), Value::Real(81.97)],
            vec![text("Americas"), Value::Real(59.95)],
            vec![text("Asia"), Value::Real(55.0)],
        ]
    );

    let countries = run(&storage, ReportQuery::CountryTotals);
    assert_eq!(
        countries.rows,
        vec![
            vec![text("Portugal"), Value::Real(82.0)],
            vec![text("China"), Value::Real(55.0)],
            vec![text("USA"), Value::Real(40.0)],
            vec![text("Canada"), Value::Real(20.0)],
        ]
    );
}

#[test]
fn test_country_rankings() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();

    let ranked = run(&storage, ReportQuery::CountryRankInRegion);
    assert_eq!(
        ranked.rows,
        vec![
            vec![text("Americas"), text("USA"), Value::Real(40.0), Value::Integer(1)],
            vec![text("Americas"), text("Canada"), Value::Real(20.0), Value::Integer(2)],
            vec![text("Asia"), text("China"), Value::Real(55.0), Value::Integer(1)],
            vec![text("Europe"), text("Portugal"), Value::Real(82.0), Value::Integer(1)],
        ]
    );

    let top = run(&storage, ReportQuery::TopCountryPerRegion);
    let countries: Vec<&Value> = top.rows.iter().map(|row| &row[1]).collect();
    assert_eq!(countries, vec![&text("USA"), &text("China"), &text("Portugal")]);
}

#[test]
fn test_quarterly_reports() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();

    let quarterly = run(&storage, ReportQuery::QuarterlyCustomerTotals);
    let expected = [
        ("Q1", 1, 60.0),
        ("Q1", 2, 40.0),
        ("Q1", 3, 20.0),
        ("Q3", 1, 22.0),
        ("Q4", 4, 55.0),
    ];
    assert_eq!(quarterly.len(), expected.len());
    for (row, (quarter, customer, total)) in quarterly.rows.iter().zip(expected) {
        assert_eq!(row[0], text(quarter));
        assert_eq!(row[1], Value::Integer(2023));
        assert_eq!(row[2], Value::Integer(customer));
        assert_eq!(row[3], Value::Real(total));
    }

    let top = run(&storage, ReportQuery::TopQuarterlyCustomers);
    let ranks: Vec<(Value, Value)> = top
        .rows
        .iter()
        .map(|row| (row[2].clone(), row[4].clone()))
        .collect();
    assert_eq!(
        ranks,
        vec![
            (Value::Integer(1), Value::Integer(1)),
            (Value::Integer(2), Value::Integer(2)),
            (Value::Integer(3), Value::Integer(3)),
            (Value::Integer(1), Value::Integer(1)),
            (Value::Integer(4), Value::Integer(1)),
        ]
    );
}

#[test]
fn test_monthly_ranking() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();

    let months = run(&storage, ReportQuery::MonthlyRanking);
    assert_eq!(
        months.rows,
        vec![
            vec![text("March"), Value::Real(70.0), Value::Integer(1)],
            vec![text("November"), Value::Real(55.0), Value::Integer(2)],
            vec![text("January"), Value::Real(30.0), Value::Integer(3)],
            vec![text("July"), Value::Real(22.0), Value::Integer(4)],
            vec![text("February"), Value::Real(20.0), Value::Integer(5)],
        ]
    );
}

#[test]
fn test_max_order_gap() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();

    let gaps = run(&storage, ReportQuery::MaxOrderGap);
    let summary: Vec<(Value, Value)> = gaps
        .rows
        .iter()
        .map(|row| (row[1].clone(), row[6].clone()))
        .collect();
    // Li Wei ordered once and has no gap
    assert_eq!(
        summary,
        vec![
            (text("Ana"), Value::Real(117.0)),
            (text("John"), Value::Real(59.0)),
            (text("Jane"), Value::Real(17.0)),
        ]
    );
    assert_eq!(gaps.rows[0][4], text("2023-07-05"));
    assert_eq!(gaps.rows[0][5], text("2023-03-10"));
}

#[test]
fn test_every_query_runs_on_sample() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();

    for report in ReportQuery::all("Jane Doe") {
        let result = run(&storage, report.clone());
        assert!(!result.is_empty(), "{} returned no rows", report);
    }
}

#[test]
fn test_queries_fail_before_build() {
    let storage = Storage::open_in_memory().unwrap();
    let err = storage
        .run_report(&ReportQuery::RegionTotals.build())
        .unwrap_err();
    assert_eq!(err.error_code(), -2);
}
