//! End-to-end tests of the connection / result / cursor / row protocol.

use std::sync::Arc;

use nowdb_client::protocol::memory::{MemoryTransport, Reply};
use nowdb_client::{
    Connection, CursorState, Error, FieldType, FieldValue, RawField, ResultKind, ResultType,
    Runtime,
};

fn setup(transport: MemoryTransport) -> (Arc<MemoryTransport>, Runtime) {
    let transport = Arc::new(transport);
    let rt = Runtime::new(transport.clone());
    (transport, rt)
}

#[test]
fn test_count_orders() {
    let (transport, rt) = setup(
        MemoryTransport::new()
            .with_database("sales")
            .on_statement("select count(*) from orders", Reply::rows(vec![vec![RawField::uint(1234)]])),
    );

    let mut conn = Connection::connect(&rt, "db.example.com", "4321", "u", "p").unwrap();
    conn.use_database("sales").unwrap();

    let mut result = conn.execute("select count(*) from orders").unwrap();
    assert_eq!(result.kind(), ResultKind::Cursor);
    assert_eq!(result.tell_type(), ResultType::Data);

    let mut cursor = result.open().unwrap();
    {
        let row = cursor.fetch().unwrap();
        assert_eq!(row.count(), 1);
        assert_eq!(row.uint(0).unwrap(), 1234);
    }
    assert_eq!(cursor.fetch().unwrap_err(), Error::Eof);

    cursor.close();
    assert_eq!(cursor.state(), CursorState::Closed);
    drop(cursor);
    drop(result);
    conn.close().unwrap();
    assert!(transport.report().is_clean());
}

#[test]
fn test_empty_table() {
    let (transport, rt) = setup(
        MemoryTransport::new().on_statement("select name from customers", Reply::rows(vec![])),
    );
    let conn = Connection::connect(&rt, "db.example.com", "4321", "u", "p").unwrap();

    let mut result = conn.execute("select name from customers").unwrap();
    let mut cursor = result.open().unwrap();
    assert!(matches!(cursor.fetch(), Err(Error::Eof)));
    assert_eq!(cursor.state(), CursorState::Exhausted);

    drop(cursor);
    drop(result);
    drop(conn);
    assert!(transport.report().is_clean());
}

#[test]
fn test_null_and_type_errors() {
    let (_transport, rt) = setup(
        MemoryTransport::new()
            .on_statement("select price", Reply::Row(vec![RawField::float(9.5)]))
            .on_statement("select nothing", Reply::Row(vec![RawField::null()])),
    );
    let conn = Connection::connect(&rt, "localhost", "4321", "", "").unwrap();

    let mut result = conn.execute("select price").unwrap();
    assert_eq!(result.kind(), ResultKind::Row);
    let mut cursor = result.open().unwrap();
    let row = cursor.fetch().unwrap();
    assert_eq!(row.string(0), Err(Error::type_error("not a string")));
    assert_eq!(row.float(0), Ok(9.5));

    let mut result = conn.execute("select nothing").unwrap();
    let mut cursor = result.open().unwrap();
    let row = cursor.fetch().unwrap();
    assert_eq!(row.string(0), Err(Error::Null));
    assert_eq!(row.field_type(0), FieldType::Nothing);
}

#[test]
fn test_open_twice() {
    let (transport, rt) = setup(
        MemoryTransport::new().on_statement("select name from customers", Reply::rows(vec![vec![RawField::text("a")]])),
    );
    let conn = Connection::connect(&rt, "localhost", "4321", "", "").unwrap();

    let mut result = conn.execute("select name from customers").unwrap();
    let cursor = result.open().unwrap();
    let err = result.open().unwrap_err();
    assert_eq!(err, Error::client("not a cursor"));

    result.destroy();
    drop(cursor);
    drop(result);
    drop(conn);
    assert!(transport.report().is_clean());
}

#[test]
fn test_status_result() {
    let (transport, rt) = setup(MemoryTransport::new().on_statement("create table t", Reply::Status));
    let conn = Connection::connect(&rt, "localhost", "4321", "", "").unwrap();

    let mut result = conn.execute("create table t").unwrap();
    assert_eq!(result.tell_type(), ResultType::Status);
    assert!(result.ok());
    assert_eq!(result.open().unwrap_err(), Error::client("not a cursor"));
    for _ in 0..3 {
        result.destroy();
    }
    drop(result);
    drop(conn);
    assert!(transport.report().is_clean());
}

#[test]
fn test_mixed_types_over_batches() {
    let rows = |start: u64| -> Vec<Vec<RawField>> {
        (start..start + 3)
            .map(|i| {
                vec![
                    RawField::text(&format!("edge-{}", i)),
                    RawField::time(i as i64 * 1_000_000_000),
                    RawField::uint(i),
                    RawField::boolean((i % 2) as u8),
                ]
            })
            .collect()
    };
    let (transport, rt) = setup(
        MemoryTransport::new().on_statement("select * from edges", Reply::batches(vec![rows(0), rows(3)])),
    );
    let conn = Connection::connect(&rt, "localhost", "4321", "", "").unwrap();

    let mut result = conn.execute("select * from edges").unwrap();
    let mut cursor = result.open().unwrap();
    let values = cursor
        .map_rows(|row| Ok((row.string(0)?, row.time(1)?, row.uint(2)?, row.bool(3)?)))
        .unwrap();

    assert_eq!(values.len(), 6);
    assert_eq!(values[0], ("edge-0".to_string(), 0, 0, false));
    assert_eq!(values[5], ("edge-5".to_string(), 5_000_000_000, 5, true));

    drop(cursor);
    drop(result);
    drop(conn);
    assert!(transport.report().is_clean());
}

#[test]
fn test_row_snapshot() {
    let (_transport, rt) = setup(MemoryTransport::new().on_statement(
        "select *",
        Reply::Row(vec![RawField::int(-1), RawField::date(0), RawField::null()]),
    ));
    let conn = Connection::connect(&rt, "localhost", "4321", "", "").unwrap();

    let mut result = conn.execute("select *").unwrap();
    let mut cursor = result.open().unwrap();
    let values = cursor.fetch().unwrap().values();
    assert_eq!(
        values,
        vec![FieldValue::Int(-1), FieldValue::Date(0), FieldValue::Absent]
    );
    assert_eq!(values[1].to_string(), "1970-01-01T00:00:00.000000000");
    assert!(cursor.fetch().unwrap_err().is_eof());
}

#[test]
fn test_dropping_everything_releases_everything() {
    let (transport, rt) = setup(MemoryTransport::new().on_statement(
        "select x",
        Reply::batches(vec![vec![vec![RawField::int(1)]], vec![vec![RawField::int(2)]]]),
    ));
    {
        let conn = Connection::connect(&rt, "localhost", "4321", "", "").unwrap();
        let mut result = conn.execute("select x").unwrap();
        let mut cursor = result.open().unwrap();
        assert_eq!(cursor.fetch().unwrap().int(0), Ok(1));
        // abandoned mid-stream
    }
    let report = transport.report();
    assert!(report.live.is_empty());
    assert!(report.double_releases.is_empty());
    assert!(report.orphaned_row_releases.is_empty());
}

#[test]
fn test_unrecognised_result_type() {
    let (transport, rt) = setup(MemoryTransport::new().on_statement("explain x", Reply::Raw { tag: 0x2f }));
    let conn = Connection::connect(&rt, "localhost", "4321", "", "").unwrap();

    let mut result = conn.execute("explain x").unwrap();
    assert_eq!(result.kind(), ResultKind::Unknown(0x2f));
    assert_eq!(result.tell_type(), ResultType::Invalid);
    assert_eq!(result.open().unwrap_err(), Error::client("not a cursor"));

    drop(result);
    drop(conn);
    assert!(transport.report().is_clean());
}

#[test]
fn test_refused_open_leaves_result_live() {
    let (transport, rt) = setup(
        MemoryTransport::new()
            .on_statement("select name from customers", Reply::rows(vec![vec![RawField::text("a")]]))
            .failing_open_cursor(23),
    );
    let conn = Connection::connect(&rt, "localhost", "4321", "", "").unwrap();

    let mut result = conn.execute("select name from customers").unwrap();
    let err = result.open().unwrap_err();
    assert!(matches!(err, Error::Client { .. }));
    assert_eq!(err.to_string(), "23");
    assert!(result.is_live());
    // session and result
    assert_eq!(transport.live_handles(), 2);

    drop(result);
    drop(conn);
    assert!(transport.report().is_clean());
}

#[test]
fn test_session_outlives_runtime_scope() {
    let transport = Arc::new(MemoryTransport::new().on_statement("select 1", Reply::Status));
    let mut conn = {
        let rt = Runtime::new(transport.clone());
        Connection::connect(&rt, "localhost", "4321", "", "").unwrap()
    };
    assert_eq!(transport.teardown_calls(), 0);

    assert!(conn.execute("select 1").unwrap().ok());
    conn.close().unwrap();
    assert_eq!(transport.teardown_calls(), 0);

    drop(conn);
    assert_eq!(transport.teardown_calls(), 1);
    assert!(transport.report().is_clean());
}
