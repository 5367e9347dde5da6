//! Integration tests driving the full split read protocol against real
//! Parquet files: open, pull, convert, close, with and without predicates.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use tempfile::TempDir;

use parquet_split_core::bridge::{RecordBridge, ValueRowConverter};
use parquet_split_core::predicate::Predicate;
use parquet_split_core::record::Value;
use parquet_split_core::schema::compat::SchemaMismatch;
use parquet_split_core::schema::logical::{DeclaredFields, FieldSpec, LogicalType};
use parquet_split_core::schema::physical::PhysicalSchema;
use parquet_split_core::session::ReadOptions;
use parquet_split_core::session::error::{OpenError, ReadError};
use parquet_split_core::source::ParquetSplitSource;
use parquet_split_core::split::FileSplit;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn expected_symbol(i: usize) -> Option<String> {
    if i % 10 == 3 {
        None
    } else {
        Some(format!("S{}", i % 4))
    }
}

fn expected_price(i: usize) -> f64 {
    i as f64 * 0.25
}

/// Writes `num_rows` of (id: int64, symbol: utf8?, price: float64) rows,
/// chunked into row groups of at most `max_row_group_size` rows.
fn write_orders_file(path: &Path, num_rows: usize, max_row_group_size: usize) -> TestResult {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("symbol", DataType::Utf8, true),
        Field::new("price", DataType::Float64, false),
    ]));

    let ids = Int64Array::from_iter_values(0..num_rows as i64);
    let symbols = StringArray::from(
        (0..num_rows).map(expected_symbol).collect::<Vec<_>>(),
    );
    let prices = Float64Array::from_iter_values((0..num_rows).map(expected_price));
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![Arc::new(ids), Arc::new(symbols), Arc::new(prices)],
    )?;

    let file = File::create(path)?;
    let props = WriterProperties::builder()
        .set_max_row_group_size(max_row_group_size)
        .build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

fn orders_fixture(num_rows: usize, max_row_group_size: usize) -> Result<(TempDir, PathBuf), Box<dyn std::error::Error>> {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("orders.parquet");
    write_orders_file(&path, num_rows, max_row_group_size)?;
    Ok((tmp, path))
}

fn declared_orders() -> DeclaredFields {
    DeclaredFields::new(vec![
        FieldSpec::new("id", LogicalType::Int64),
        FieldSpec::new("symbol", LogicalType::Utf8),
        FieldSpec::new("price", LogicalType::Float64),
    ])
    .unwrap()
}

fn full_split(path: &Path) -> Result<FileSplit, Box<dyn std::error::Error>> {
    let length = std::fs::metadata(path)?.len();
    Ok(FileSplit::new(path, 0, length))
}

/// Drains a session through the bridge, returning all converted records.
fn drain_records(
    source: &ParquetSplitSource,
    split: &FileSplit,
) -> Result<Vec<Vec<Value>>, Box<dyn std::error::Error>> {
    let mut bridge = RecordBridge::new(source.session(), ValueRowConverter);
    bridge.open(split)?;

    let mut records = Vec::new();
    let mut reuse = Vec::new();
    while !bridge.reached_end()? {
        bridge.next_record(&mut reuse)?;
        records.push(reuse.clone());
    }
    bridge.close();
    Ok(records)
}

fn record_id(record: &[Value]) -> i64 {
    match record.first() {
        Some(Value::Int64(id)) => *id,
        other => panic!("expected int64 id, got {other:?}"),
    }
}

#[test]
fn open_then_immediate_close_releases_resources() -> TestResult {
    let (_tmp, path) = orders_fixture(100, 1000)?;
    let source = ParquetSplitSource::new(declared_orders());

    let mut session = source.session();
    session.open(&full_split(&path)?)?;
    session.close();
    session.close();
    Ok(())
}

#[test]
fn close_on_a_never_opened_session_is_a_no_op() {
    let source = ParquetSplitSource::new(declared_orders());
    let mut session = source.session();
    session.close();
    session.close();
}

#[test]
fn reads_exactly_n_rows_without_predicate() -> TestResult {
    let (_tmp, path) = orders_fixture(1000, 100)?;
    let source = ParquetSplitSource::new(declared_orders());

    let mut session = source.session();
    session.open(&full_split(&path)?)?;
    assert_eq!(session.rows_in_split(), Some(1000));

    let mut count = 0usize;
    loop {
        // has_more is repeatable without consuming anything.
        let more = session.has_more()?;
        assert_eq!(session.has_more()?, more);
        if !more {
            break;
        }

        let row = session.next()?;
        assert_eq!(row.num_fields(), 3);
        assert_eq!(row.value(0)?, Value::Int64(count as i64));
        match expected_symbol(count) {
            Some(symbol) => assert_eq!(row.value(1)?, Value::Utf8(symbol)),
            None => assert_eq!(row.value(1)?, Value::Null),
        }
        assert_eq!(row.value(2)?, Value::Float64(expected_price(count)));
        count += 1;
    }
    assert_eq!(count, 1000);

    // Pulling past the end is a typed error, and the end state is stable.
    assert!(matches!(session.next().unwrap_err(), ReadError::Exhausted));
    assert!(!session.has_more()?);

    session.close();
    Ok(())
}

#[test]
fn converted_records_follow_declared_field_order() -> TestResult {
    let (_tmp, path) = orders_fixture(10, 1000)?;

    // Declare price before id: the output layout must follow the
    // declaration, not the file's column order.
    let declared = DeclaredFields::new(vec![
        FieldSpec::new("price", LogicalType::Float64),
        FieldSpec::new("id", LogicalType::Int64),
    ])
    .unwrap();
    let source = ParquetSplitSource::new(declared);

    let records = drain_records(&source, &full_split(&path)?)?;
    assert_eq!(records.len(), 10);
    for (i, record) in records.iter().enumerate() {
        assert_eq!(record[0], Value::Float64(expected_price(i)));
        assert_eq!(record[1], Value::Int64(i as i64));
    }
    Ok(())
}

#[test]
fn null_cells_are_projected_as_null_values() -> TestResult {
    let (_tmp, path) = orders_fixture(20, 1000)?;
    let source = ParquetSplitSource::new(declared_orders());

    let records = drain_records(&source, &full_split(&path)?)?;
    assert_eq!(records[3][1], Value::Null);
    assert_eq!(records[4][1], Value::Utf8("S0".to_string()));
    Ok(())
}

#[test]
fn predicate_matching_zero_rows_reports_end_immediately() -> TestResult {
    let (_tmp, path) = orders_fixture(500, 100)?;
    let mut source = ParquetSplitSource::new(declared_orders());
    source.set_predicate(Some(&Predicate::lt("id", Value::Int64(0))))?;

    let mut session = source.session();
    session.open(&full_split(&path)?)?;
    assert!(!session.has_more()?);
    session.close();
    Ok(())
}

#[test]
fn predicate_pushdown_yields_exactly_matching_rows() -> TestResult {
    let (_tmp, path) = orders_fixture(1000, 100)?;
    let mut source = ParquetSplitSource::new(declared_orders());

    // price >= 200.0 AND symbol IS NOT NULL
    source.set_predicate(Some(&Predicate::and(
        Predicate::gt_eq("price", Value::Float64(200.0)),
        Predicate::is_not_null("symbol"),
    )))?;

    let records = drain_records(&source, &full_split(&path)?)?;
    let expected: Vec<i64> = (0..1000)
        .filter(|&i| expected_price(i) >= 200.0 && expected_symbol(i).is_some())
        .map(|i| i as i64)
        .collect();
    let actual: Vec<i64> = records.iter().map(|r| record_id(r)).collect();
    assert_eq!(actual, expected);
    Ok(())
}

#[test]
fn predicate_may_filter_on_undeclared_columns() -> TestResult {
    let (_tmp, path) = orders_fixture(100, 1000)?;

    // Only id is declared, but the filter reads price.
    let declared = DeclaredFields::new(vec![FieldSpec::new("id", LogicalType::Int64)]).unwrap();
    let mut source = ParquetSplitSource::new(declared);
    source.set_predicate(Some(&Predicate::lt("price", Value::Float64(2.0))))?;

    let records = drain_records(&source, &full_split(&path)?)?;
    let actual: Vec<i64> = records.iter().map(|r| record_id(r)).collect();
    assert_eq!(actual, [0, 1, 2, 3, 4, 5, 6, 7]);
    assert!(records.iter().all(|r| r.len() == 1));
    Ok(())
}

#[test]
fn adjacent_splits_partition_the_rows() -> TestResult {
    let (_tmp, path) = orders_fixture(1000, 100)?;
    let source = ParquetSplitSource::new(declared_orders());

    let length = std::fs::metadata(&path)?.len();
    let mid = length / 2;
    let first = FileSplit::new(&path, 0, mid);
    let second = FileSplit::new(&path, mid, length - mid);

    let first_ids: Vec<i64> = drain_records(&source, &first)?
        .iter()
        .map(|r| record_id(r))
        .collect();
    let second_ids: Vec<i64> = drain_records(&source, &second)?
        .iter()
        .map(|r| record_id(r))
        .collect();

    // Both halves see some data, nothing is lost, nothing is duplicated.
    assert!(!first_ids.is_empty());
    assert!(!second_ids.is_empty());
    let mut all = first_ids.clone();
    all.extend(&second_ids);
    all.sort_unstable();
    let expected: Vec<i64> = (0..1000).collect();
    assert_eq!(all, expected);
    Ok(())
}

#[test]
fn zero_length_split_reads_nothing() -> TestResult {
    let (_tmp, path) = orders_fixture(100, 1000)?;
    let source = ParquetSplitSource::new(declared_orders());

    let mut session = source.session();
    session.open(&FileSplit::new(&path, 0, 0))?;
    assert_eq!(session.rows_in_split(), Some(0));
    assert!(!session.has_more()?);
    session.close();
    Ok(())
}

#[test]
fn footer_only_split_reads_nothing() -> TestResult {
    let (_tmp, path) = orders_fixture(100, 1000)?;
    let source = ParquetSplitSource::new(declared_orders());

    // A tail range past every row group midpoint selects no row groups.
    let length = std::fs::metadata(&path)?.len();
    let mut session = source.session();
    session.open(&FileSplit::new(&path, length - 8, 8))?;
    assert!(!session.has_more()?);
    session.close();
    Ok(())
}

#[test]
fn missing_declared_field_fails_open() -> TestResult {
    let (_tmp, path) = orders_fixture(10, 1000)?;
    let declared = DeclaredFields::new(vec![
        FieldSpec::new("id", LogicalType::Int64),
        FieldSpec::new("discount", LogicalType::Float64),
    ])
    .unwrap();
    let source = ParquetSplitSource::new(declared);

    let mut session = source.session();
    let err = session.open(&full_split(&path)?).unwrap_err();
    assert!(
        matches!(&err, OpenError::FieldNotInFile { column } if column == "discount"),
        "unexpected error: {err:?}"
    );
    // Failed open still permits (and requires) a close.
    session.close();
    Ok(())
}

#[test]
fn predicate_on_missing_column_fails_open() -> TestResult {
    let (_tmp, path) = orders_fixture(10, 1000)?;
    let mut source = ParquetSplitSource::new(declared_orders());
    source.set_predicate(Some(&Predicate::is_null("discount")))?;

    let mut session = source.session();
    let err = session.open(&full_split(&path)?).unwrap_err();
    assert!(
        matches!(&err, OpenError::PredicateColumn { column } if column == "discount"),
        "unexpected error: {err:?}"
    );
    session.close();
    Ok(())
}

#[test]
fn corrupt_predicate_bytes_fail_open() -> TestResult {
    let (_tmp, path) = orders_fixture(10, 1000)?;
    let mut source = ParquetSplitSource::new(declared_orders());
    source.set_predicate_bytes(Bytes::from_static(b"\x00\x01 definitely not json"));

    let mut session = source.session();
    let err = session.open(&full_split(&path)?).unwrap_err();
    assert!(
        matches!(&err, OpenError::Predicate { .. }),
        "unexpected error: {err:?}"
    );
    session.close();
    Ok(())
}

#[test]
fn session_reuse_is_rejected() -> TestResult {
    let (_tmp, path) = orders_fixture(10, 1000)?;
    let source = ParquetSplitSource::new(declared_orders());
    let split = full_split(&path)?;

    let mut session = source.session();
    session.open(&split)?;
    let err = session.open(&split).unwrap_err();
    assert!(
        matches!(err, OpenError::SessionReused),
        "unexpected error: {err:?}"
    );
    session.close();
    Ok(())
}

#[test]
fn predicate_rehydrates_per_session_from_shipped_bytes() -> TestResult {
    let (_tmp, path) = orders_fixture(100, 1000)?;

    let mut planner = ParquetSplitSource::new(declared_orders());
    planner.set_predicate(Some(&Predicate::lt("id", Value::Int64(5))))?;
    let wire = planner.predicate_bytes().unwrap().clone();

    // The executor side only ever sees the bytes.
    let mut executor = ParquetSplitSource::new(declared_orders());
    executor.set_predicate_bytes(wire);

    let split = full_split(&path)?;
    for _ in 0..2 {
        let records = drain_records(&executor, &split)?;
        let actual: Vec<i64> = records.iter().map(|r| record_id(r)).collect();
        assert_eq!(actual, [0, 1, 2, 3, 4]);
    }
    Ok(())
}

#[test]
fn check_schema_accepts_the_written_file() -> TestResult {
    let (_tmp, path) = orders_fixture(10, 1000)?;
    let source = ParquetSplitSource::new(declared_orders());

    let physical = PhysicalSchema::from_path(&path)?;
    source.check_schema(&physical)?;
    Ok(())
}

#[test]
fn integer_declaration_over_floating_point_file_fails_naming_the_field() -> TestResult {
    let tmp = TempDir::new()?;
    let path = tmp.path().join("amounts.parquet");

    // "amount" is DOUBLE on disk.
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("amount", DataType::Float64, false),
    ]));
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(Int64Array::from(vec![1, 2])),
            Arc::new(Float64Array::from(vec![9.5, 11.0])),
        ],
    )?;
    let file = File::create(&path)?;
    let mut writer = ArrowWriter::try_new(file, schema, None)?;
    writer.write(&batch)?;
    writer.close()?;

    // But the engine declares it as an integer.
    let declared = DeclaredFields::new(vec![
        FieldSpec::new("id", LogicalType::Int64),
        FieldSpec::new("amount", LogicalType::Int64),
    ])
    .unwrap();
    let source = ParquetSplitSource::new(declared);

    let physical = PhysicalSchema::from_path(&path)?;
    let err = source.check_schema(&physical).unwrap_err();
    assert_eq!(
        err,
        SchemaMismatch::TypeMismatch {
            column: "amount".to_string(),
            declared: LogicalType::Int64,
            actual: LogicalType::Float64,
        }
    );
    Ok(())
}

#[test]
fn small_batch_sizes_stream_the_same_rows() -> TestResult {
    let (_tmp, path) = orders_fixture(257, 100)?;
    let declared = declared_orders();
    let source = ParquetSplitSource::with_options(
        declared,
        ReadOptions::new().with_batch_size(16),
    );

    let records = drain_records(&source, &full_split(&path)?)?;
    assert_eq!(records.len(), 257);
    assert_eq!(record_id(&records[256]), 256);
    Ok(())
}
