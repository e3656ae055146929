//! Forward-only cursor over the rows of a result.
//!
//! A cursor is opened from a data-bearing [`QueryResult`](crate::QueryResult)
//! and owns what the result owned. A single-row result has no server-side
//! cursor; its row buffer is the only resource and the cursor releases it
//! directly. A multi-row result is turned into a server-side cursor whose
//! row buffer belongs to the cursor: closing the cursor releases the row
//! buffer, and the buffer is never released on its own.

use crate::error::{Error, Result};
use crate::protocol::transport::{CursorHandle, RowHandle, Transport};
use crate::protocol::types::Row;

/// Iteration state of a cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Opened, nothing fetched yet.
    Fresh,
    /// A row is current.
    Positioned,
    /// No more rows; `fetch` keeps returning `Eof`.
    Exhausted,
    /// Resources released.
    Closed,
}

/// What the cursor is responsible for releasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Resources {
    NoneOwned,
    /// Row buffer of a single-row result, released directly.
    RowBuffer(RowHandle),
    /// Server-side cursor; releasing it releases `row` too.
    CursorResource {
        cursor: CursorHandle,
        row: Option<RowHandle>,
    },
}

/// Row-by-row cursor.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use nowdb_client::{Connection, Runtime};
/// use nowdb_client::protocol::memory::{MemoryTransport, Reply};
/// use nowdb_client::protocol::RawField;
///
/// let transport = MemoryTransport::new().on_statement(
///     "select name from customers",
///     Reply::rows(vec![vec![RawField::text("alice")], vec![RawField::text("bob")]]),
/// );
/// let rt = Runtime::new(Arc::new(transport));
/// let conn = Connection::connect(&rt, "localhost", "55505", "", "")?;
///
/// let mut cursor = conn.execute("select name from customers")?.open()?;
/// let mut names = Vec::new();
/// loop {
///     match cursor.fetch() {
///         Ok(row) => names.push(row.string(0)?),
///         Err(e) if e.is_eof() => break,
///         Err(e) => return Err(e),
///     }
/// }
/// assert_eq!(names, ["alice", "bob"]);
/// # Ok::<(), nowdb_client::Error>(())
/// ```
pub struct Cursor<'c> {
    transport: &'c dyn Transport,
    resources: Resources,
    state: CursorState,
}

impl<'c> Cursor<'c> {
    pub(crate) fn new(transport: &'c dyn Transport, resources: Resources) -> Self {
        Self {
            transport,
            resources,
            state: CursorState::Fresh,
        }
    }

    /// Current iteration state.
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Check if the cursor has been closed.
    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed
    }

    fn current_row(&self) -> Option<RowHandle> {
        match self.resources {
            Resources::RowBuffer(row) => Some(row),
            Resources::CursorResource { row, .. } => row,
            Resources::NoneOwned => None,
        }
    }

    fn make_row(&self, row: RowHandle) -> Row<'_> {
        Row::new(self.transport, Some(row))
    }

    /// Drop the current row buffer; release it only if no cursor owns it.
    fn release_row_buffer(&mut self) {
        match self.resources {
            Resources::RowBuffer(row) => {
                self.transport.destroy_result(row.as_result());
                self.resources = Resources::NoneOwned;
            }
            Resources::CursorResource { cursor, .. } => {
                self.resources = Resources::CursorResource { cursor, row: None };
            }
            Resources::NoneOwned => {}
        }
    }

    /// Fetch the next row.
    ///
    /// Returns `Error::Eof` once the rows are exhausted, and on every call
    /// after that. The returned row is only valid until the next call.
    pub fn fetch(&mut self) -> Result<Row<'_>> {
        match self.state {
            CursorState::Exhausted | CursorState::Closed => return Err(Error::Eof),
            CursorState::Fresh => {
                // the first row was materialised by open
                self.state = CursorState::Positioned;
                if let Some(row) = self.current_row() {
                    return Ok(self.make_row(row));
                }
            }
            CursorState::Positioned => {
                if let Some(row) = self.current_row() {
                    if self.transport.row_next(row).is_ok() {
                        return Ok(self.make_row(row));
                    }
                    self.release_row_buffer();
                }
            }
        }
        self.fetch_from_cursor()
    }

    fn fetch_from_cursor(&mut self) -> Result<Row<'_>> {
        let Resources::CursorResource { cursor, .. } = self.resources else {
            self.state = CursorState::Exhausted;
            return Err(Error::Eof);
        };

        let mut status = self.transport.cursor_fetch(cursor);
        if status.is_ok() {
            status = self.transport.result_error_code(cursor.as_result());
        }
        if status.is_eof() {
            tracing::debug!(cursor = cursor.0, "cursor exhausted");
            self.state = CursorState::Exhausted;
            return Err(Error::Eof);
        }
        if !status.is_ok() {
            let detail = self.transport.result_details(cursor.as_result());
            return Err(Error::server(status.code(), detail));
        }

        match self.transport.cursor_row(cursor) {
            Some(row) => {
                self.resources = Resources::CursorResource {
                    cursor,
                    row: Some(row),
                };
                Ok(self.make_row(row))
            }
            None => {
                self.state = CursorState::Exhausted;
                Err(Error::Eof)
            }
        }
    }

    /// Fetch all remaining rows, applying `f` to each while it is current.
    ///
    /// Stops at the end of the rows or at the first error.
    pub fn map_rows<T, F>(&mut self, mut f: F) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> Result<T>,
    {
        let mut out = Vec::new();
        loop {
            match self.fetch() {
                Ok(row) => out.push(f(&row)?),
                Err(Error::Eof) => return Ok(out),
                Err(e) => return Err(e),
            }
        }
    }

    /// Release the cursor's resources. Closing again is a no-op.
    pub fn close(&mut self) {
        match std::mem::replace(&mut self.resources, Resources::NoneOwned) {
            Resources::NoneOwned => {}
            Resources::RowBuffer(row) => self.transport.destroy_result(row.as_result()),
            Resources::CursorResource { cursor, .. } => {
                let status = self.transport.close_cursor(cursor);
                if !status.is_ok() {
                    tracing::warn!(
                        cursor = cursor.0,
                        code = status.code(),
                        "server refused to close cursor, releasing locally"
                    );
                    self.transport.destroy_result(cursor.as_result());
                }
            }
        }
        if self.state != CursorState::Closed {
            tracing::debug!("cursor closed");
        }
        self.state = CursorState::Closed;
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("resources", &self.resources)
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::memory::{MemoryTransport, Reply};
    use crate::protocol::transport::RawField;
    use crate::protocol::ConnectParams;

    fn open<'t>(t: &'t MemoryTransport, stmt: &str) -> Cursor<'t> {
        let session = t.connect(&ConnectParams::new("localhost", 4321)).unwrap();
        let result = t.execute_statement(session, stmt).unwrap();
        let mut qr = crate::result::QueryResult::new(t, result);
        let cursor = qr.open().unwrap();
        t.close_connection(session);
        cursor
    }

    fn int_rows(values: &[i64]) -> Vec<Vec<RawField>> {
        values.iter().map(|v| vec![RawField::int(*v)]).collect()
    }

    #[test]
    fn test_single_row_result() {
        let t = MemoryTransport::new().on_statement("one", Reply::Row(vec![RawField::uint(42)]));
        let mut cursor = open(&t, "one");
        assert_eq!(cursor.state(), CursorState::Fresh);

        assert_eq!(cursor.fetch().unwrap().uint(0).unwrap(), 42);
        assert_eq!(cursor.state(), CursorState::Positioned);
        assert_eq!(cursor.fetch().unwrap_err(), Error::Eof);
        assert_eq!(cursor.state(), CursorState::Exhausted);
        // the single-row buffer is released as soon as it is exhausted
        assert_eq!(t.live_handles(), 0);

        cursor.close();
        assert!(t.report().is_clean());
    }

    #[test]
    fn test_rows_across_batches() {
        let t = MemoryTransport::new().on_statement(
            "many",
            Reply::batches(vec![int_rows(&[1, 2]), int_rows(&[3]), int_rows(&[4, 5])]),
        );
        let mut cursor = open(&t, "many");
        let values = cursor.map_rows(|row| row.int(0)).unwrap();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
        assert_eq!(cursor.state(), CursorState::Exhausted);
        drop(cursor);
        assert!(t.report().is_clean());
    }

    #[test]
    fn test_empty_cursor() {
        let t = MemoryTransport::new().on_statement("none", Reply::rows(vec![]));
        let mut cursor = open(&t, "none");
        assert_eq!(cursor.fetch().unwrap_err(), Error::Eof);
        cursor.close();
        assert!(t.report().is_clean());
    }

    #[test]
    fn test_eof_is_sticky() {
        let t = MemoryTransport::new().on_statement("x", Reply::rows(int_rows(&[1])));
        let mut cursor = open(&t, "x");
        assert!(cursor.fetch().is_ok());
        for _ in 0..3 {
            assert_eq!(cursor.fetch().unwrap_err(), Error::Eof);
        }
        // exhaustion is detected once, later calls stay local
        assert_eq!(t.fetch_calls(), 1);
    }

    #[test]
    fn test_server_error_during_fetch() {
        let t = MemoryTransport::new().on_statement(
            "x",
            Reply::failing_cursor(vec![int_rows(&[1])], 61, "connection reset"),
        );
        let mut cursor = open(&t, "x");
        assert_eq!(cursor.fetch().unwrap().int(0).unwrap(), 1);
        assert_eq!(
            cursor.fetch().unwrap_err(),
            Error::server(61, Some("connection reset".to_string()))
        );
        assert_eq!(cursor.state(), CursorState::Positioned);
        // the failure is reported once; the stream then ends
        assert_eq!(cursor.fetch().unwrap_err(), Error::Eof);
        cursor.close();
        assert!(t.report().is_clean());
    }

    #[test]
    fn test_close_mid_stream() {
        let t = MemoryTransport::new().on_statement(
            "x",
            Reply::batches(vec![int_rows(&[1, 2]), int_rows(&[3])]),
        );
        let mut cursor = open(&t, "x");
        assert!(cursor.fetch().is_ok());
        cursor.close();
        cursor.close();
        assert!(cursor.is_closed());
        assert_eq!(cursor.fetch().unwrap_err(), Error::Eof);
        assert!(t.report().is_clean());
    }

    #[test]
    fn test_close_fresh_single_row() {
        let t = MemoryTransport::new().on_statement("one", Reply::Row(vec![RawField::int(1)]));
        let cursor = open(&t, "one");
        drop(cursor);
        assert!(t.report().is_clean());
    }

    #[test]
    fn test_close_cursor_failure_falls_back() {
        let t = MemoryTransport::new()
            .failing_close_cursor(17)
            .on_statement("x", Reply::rows(int_rows(&[1, 2])));
        let mut cursor = open(&t, "x");
        assert!(cursor.fetch().is_ok());
        cursor.close();
        assert!(t.report().is_clean());
    }

    #[test]
    fn test_map_rows_stops_on_error() {
        let t = MemoryTransport::new()
            .on_statement("x", Reply::rows(vec![vec![RawField::int(1)], vec![RawField::text("x")]]));
        let mut cursor = open(&t, "x");
        let err = cursor.map_rows(|row| row.int(0)).unwrap_err();
        assert_eq!(err, Error::type_error("not an int value"));
        assert_eq!(cursor.state(), CursorState::Positioned);
    }

    #[test]
    fn test_resources_without_cursor_resource() {
        let t = MemoryTransport::new();
        let row = t.alloc_row_buffer(vec![RawField::int(5)]);
        let mut cursor = Cursor::new(&t, Resources::RowBuffer(row));
        assert_eq!(cursor.fetch().unwrap().int(0).unwrap(), 5);
        assert_eq!(cursor.fetch().unwrap_err(), Error::Eof);
        assert_eq!(cursor.resources, Resources::NoneOwned);
    }
}
