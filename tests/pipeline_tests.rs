mod common;

use common::{dump, strings, Fixture, JANE_DOE, SAMPLE};
use retail_etl::{Error, MalformedRowPolicy, Pipeline, TableStep};

#[test]
fn test_single_row_scenario() {
    let fixture = Fixture::new(&[JANE_DOE]);
    let (report, storage) = fixture.build();

    assert_eq!(dump(&storage, "Region"), vec![strings(&["1", "Americas"])]);
    assert_eq!(dump(&storage, "Country"), vec![strings(&["1", "USA", "1"])]);
    assert_eq!(
        dump(&storage, "Customer"),
        vec![strings(&["1", "Jane", "Doe", "1 Elm St", "Springfield", "1"])]
    );
    assert_eq!(
        dump(&storage, "ProductCategory"),
        vec![strings(&["1", "Tools", "Hardware"])]
    );
    assert_eq!(
        dump(&storage, "Product"),
        vec![
            strings(&["1", "Gadget", "19.99", "1"]),
            strings(&["2", "Widget", "9.99", "1"]),
        ]
    );
    assert_eq!(
        dump(&storage, "OrderDetail"),
        vec![
            strings(&["1", "1", "2", "2023-01-15", "2"]),
            strings(&["2", "1", "1", "2023-02-01", "1"]),
        ]
    );

    assert_eq!(report.tables.len(), 6);
    assert_eq!(report.total_rows(), 1 + 1 + 1 + 1 + 2 + 2);
    assert_eq!(report.total_skipped(), 0);
}

#[test]
fn test_sample_counts_and_dedup() {
    let fixture = Fixture::sample();
    let (report, storage) = fixture.build();

    let rows = |table: &str| storage.table_row_count(table).unwrap();
    assert_eq!(rows("Region"), 3);
    assert_eq!(rows("Country"), 4);
    assert_eq!(rows("Customer"), 4);
    assert_eq!(rows("ProductCategory"), 2);
    assert_eq!(rows("Product"), 3);
    // John Roe's two identical Widget lines both survive
    assert_eq!(rows("OrderDetail"), 7);

    let detail = report.table("OrderDetail").unwrap();
    assert_eq!(detail.rows_read, SAMPLE.len());
    assert_eq!(detail.rows_inserted, 7);
}

#[test]
fn test_dimension_ids_follow_sorted_order() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();

    assert_eq!(
        dump(&storage, "Region"),
        vec![
            strings(&["1", "Americas"]),
            strings(&["2", "Asia"]),
            strings(&["3", "Europe"]),
        ]
    );
    let first_names: Vec<String> = dump(&storage, "Customer")
        .into_iter()
        .map(|row| row[1].clone())
        .collect();
    assert_eq!(first_names, strings(&["Ana", "Jane", "John", "Li"]));
}

#[test]
fn test_repeated_customer_rows_collapse() {
    let second_order = "Jane Doe\t1 Elm St\tSpringfield\tUSA\tAmericas\tWidget\tTools\tHardware\t9.99\t5\t20230401";
    let fixture = Fixture::new(&[JANE_DOE, second_order]);
    let (_, storage) = fixture.build();

    assert_eq!(storage.table_row_count("Customer").unwrap(), 1);
    assert_eq!(storage.table_row_count("Region").unwrap(), 1);
    assert_eq!(storage.table_row_count("Product").unwrap(), 2);
    assert_eq!(storage.table_row_count("OrderDetail").unwrap(), 3);
}

#[test]
fn test_category_fan_out_is_positional() {
    let row = "Sam Poe\t3 Pine Rd\tAustin\tUSA\tAmericas\tp;q\tA;B\tX;Y\t1;2\t1;1\t20230101;20230102";
    let fixture = Fixture::new(&[row]);
    let (_, storage) = fixture.build();

    assert_eq!(
        dump(&storage, "ProductCategory"),
        vec![strings(&["1", "A", "X"]), strings(&["2", "B", "Y"])]
    );
}

#[test]
fn test_rebuild_is_idempotent() {
    let fixture = Fixture::sample();
    let (_, first) = fixture.build();
    let before: Vec<_> = ["Region", "Country", "Customer", "ProductCategory", "Product", "OrderDetail"]
        .iter()
        .map(|t| dump(&first, t))
        .collect();
    drop(first);

    let (_, second) = fixture.build();
    let after: Vec<_> = ["Region", "Country", "Customer", "ProductCategory", "Product", "OrderDetail"]
        .iter()
        .map(|t| dump(&second, t))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_ids_do_not_depend_on_row_order() {
    let forward = Fixture::sample();
    let mut reversed_rows = SAMPLE.to_vec();
    reversed_rows.reverse();
    let reversed = Fixture::new(&reversed_rows);

    let (_, a) = forward.build();
    let (_, b) = reversed.build();
    for table in ["Region", "Country", "Customer", "ProductCategory", "Product"] {
        assert_eq!(dump(&a, table), dump(&b, table), "{table}");
    }
}

#[test]
fn test_no_foreign_key_violations() {
    let fixture = Fixture::sample();
    let (_, storage) = fixture.build();
    assert!(storage.foreign_key_violations().unwrap().is_empty());

    let orphans = storage
        .execute(
            "SELECT COUNT(*) FROM OrderDetail od
             LEFT JOIN Customer c ON od.CustomerID = c.CustomerID
             LEFT JOIN Product p ON od.ProductID = p.ProductID
             WHERE c.CustomerID IS NULL OR p.ProductID IS NULL",
        )
        .unwrap();
    assert_eq!(orphans[0][0], rusqlite::types::Value::Integer(0));
}

#[test]
fn test_unknown_customer_leaves_order_detail_absent() {
    let fixture = Fixture::sample();
    drop(fixture.build());

    // A customer that the existing Customer table has never seen
    let mut rows = SAMPLE.to_vec();
    rows.push("Max Mustermann\t7 Hauptstr\tBerlin\tGermany\tEurope\tMug\tKitchen\tCookware\t5.5\t1\t20230505");
    fixture.write_source(&rows);

    let mut config = fixture.config();
    config.reset_database = false;
    let mut pipeline = Pipeline::new(config).unwrap();
    let err = pipeline.run_from(TableStep::OrderDetail).unwrap_err();

    assert!(matches!(err, Error::Step { step: "OrderDetail", .. }));
    match err.root() {
        Error::UnresolvedReference { table, line, .. } => {
            assert_eq!(*table, "Customer");
            assert_eq!(*line, 6);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!pipeline.storage().table_exists("OrderDetail").unwrap());
    assert_eq!(pipeline.storage().table_row_count("Customer").unwrap(), 4);
}

#[test]
fn test_malformed_row_aborts_by_default() {
    let bad = "Bad Row\tonly three\tcolumns";
    let fixture = Fixture::new(&[JANE_DOE, bad]);
    let mut pipeline = Pipeline::new(fixture.config()).unwrap();

    let err = pipeline.run().unwrap_err();
    assert!(matches!(err, Error::Step { step: "Region", .. }));
    assert!(matches!(
        err.root(),
        Error::MalformedRow { table: "Region", line: 3, .. }
    ));
    assert!(!pipeline.storage().table_exists("Region").unwrap());
}

#[test]
fn test_skip_policy_counts_and_continues() {
    let mismatched = "Sam Poe\t3 Pine Rd\tAustin\tUSA\tAmericas\tp;q\tA\tX\t1;2\t1;1\t20230101;20230102";
    let fixture = Fixture::new(&[JANE_DOE, mismatched]);
    let mut config = fixture.config();
    config.malformed_rows = MalformedRowPolicy::Skip;

    let report = Pipeline::new(config).unwrap().run().unwrap();

    // Region and Customer rules read only scalar columns
    assert_eq!(report.table("Region").unwrap().rows_skipped, 0);
    assert_eq!(report.table("Customer").unwrap().rows_inserted, 2);
    assert_eq!(report.table("Product").unwrap().rows_skipped, 1);
    assert_eq!(report.table("OrderDetail").unwrap().rows_skipped, 1);
    assert_eq!(report.table("OrderDetail").unwrap().rows_inserted, 2);
}

#[test]
fn test_undecodable_line_is_malformed_row() {
    let fixture = Fixture::new(&[]);
    fixture.write_source_with_undecodable_line(JANE_DOE, SAMPLE[1]);
    let mut pipeline = Pipeline::new(fixture.config()).unwrap();

    let err = pipeline.run().unwrap_err();
    assert_eq!(err.error_code(), -3);
    match err.root() {
        Error::MalformedRow { table, line, reason } => {
            assert_eq!(*table, "Region");
            assert_eq!(*line, 3);
            assert!(reason.contains("not valid UTF-8"), "{}", reason);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!pipeline.storage().table_exists("Region").unwrap());
}

#[test]
fn test_skip_policy_skips_undecodable_line() {
    let fixture = Fixture::new(&[]);
    fixture.write_source_with_undecodable_line(JANE_DOE, SAMPLE[1]);
    let mut config = fixture.config();
    config.malformed_rows = MalformedRowPolicy::Skip;

    let mut pipeline = Pipeline::new(config).unwrap();
    let report = pipeline.run().unwrap();

    for step in TableStep::SEQUENCE {
        let table = report.table(step.name()).unwrap();
        assert_eq!(table.rows_skipped, 1, "{}", step);
    }
    let storage = pipeline.storage();
    assert_eq!(storage.table_row_count("Customer").unwrap(), 2);
    assert_eq!(storage.table_row_count("OrderDetail").unwrap(), 4);
    assert!(storage.foreign_key_violations().unwrap().is_empty());
}

#[test]
fn test_missing_source_keeps_existing_database() {
    let fixture = Fixture::sample();
    drop(fixture.build());
    std::fs::remove_file(&fixture.source).unwrap();

    let err = Pipeline::new(fixture.config()).err().unwrap();
    assert!(matches!(err, Error::MissingFile(ref p) if *p == fixture.source));
    assert_eq!(err.error_code(), -6);
    assert!(fixture.database.exists());
}

#[test]
fn test_blank_lines_and_padding_are_ignored() {
    let padded = " Jane Doe \t1 Elm St\tSpringfield\tUSA\tAmericas\tWidget ; Gadget\tTools;Tools\tHardware;Hardware\t9.99;19.99\t2;1\t20230115;20230201";
    let fixture = Fixture::new(&["", padded, ""]);
    let (_, storage) = fixture.build();

    assert_eq!(
        dump(&storage, "Customer"),
        vec![strings(&["1", "Jane", "Doe", "1 Elm St", "Springfield", "1"])]
    );
    let products: Vec<String> = dump(&storage, "Product")
        .into_iter()
        .map(|row| row[1].clone())
        .collect();
    assert_eq!(products, strings(&["Gadget", "Widget"]));
}

#[test]
fn test_normalize_entry_point() {
    let fixture = Fixture::sample();
    let report = retail_etl::normalize(fixture.config()).unwrap();
    assert_eq!(report.total_rows(), 3 + 4 + 4 + 2 + 3 + 7);
}
