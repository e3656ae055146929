//! Boundary with the transport layer.
//!
//! The client object protocol (connection, result, cursor, row) sits on top
//! of a call-style interface that talks to the server. Every call reports a
//! numeric [`Status`]; `0` is success and `8` marks the end of a stream.
//! Handles are opaque: a cursor and a row buffer may also be addressed as
//! results, exactly as the client library allows.

use bytes::Bytes;
use std::fmt;

use super::connect::ConnectParams;
use super::constants::*;

/// Status code returned by every transport call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(pub i32);

impl Status {
    /// Success.
    pub const OK: Status = Status(NOWDB_OK);
    /// End of stream: no more rows.
    pub const EOF: Status = Status(NOWDB_EOF);

    /// True for the success code.
    pub fn is_ok(self) -> bool {
        self == Self::OK
    }

    /// True for the end-of-stream code.
    pub fn is_eof(self) -> bool {
        self == Self::EOF
    }

    /// The raw numeric code.
    pub fn code(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle of a server session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(pub u64);

/// Opaque handle of a statement result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultHandle(pub u64);

/// Opaque handle of a server-side cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorHandle(pub u64);

/// Opaque handle of a row buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowHandle(pub u64);

impl ResultHandle {
    /// A single-row result is its own row buffer.
    pub fn as_row(self) -> RowHandle {
        RowHandle(self.0)
    }
}

impl CursorHandle {
    /// A cursor carries its error code and details like a result.
    pub fn as_result(self) -> ResultHandle {
        ResultHandle(self.0)
    }
}

impl RowHandle {
    /// Address the row buffer as a result (for release).
    pub fn as_result(self) -> ResultHandle {
        ResultHandle(self.0)
    }
}

/// One field as delivered by the transport: a type tag and an untyped payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RawField {
    /// Field type tag.
    pub tag: i32,
    /// Untyped payload, interpreted according to `tag`.
    pub payload: Bytes,
}

impl RawField {
    /// Create a field from a raw tag and payload.
    pub fn new(tag: i32, payload: impl Into<Bytes>) -> Self {
        Self {
            tag,
            payload: payload.into(),
        }
    }

    /// A NULL field.
    pub fn null() -> Self {
        Self::new(NOWDB_TYP_NOTHING, Bytes::new())
    }

    /// A text field (NUL-terminated like the client library delivers it).
    pub fn text(s: &str) -> Self {
        let mut buf = Vec::with_capacity(s.len() + 1);
        buf.extend_from_slice(s.as_bytes());
        buf.push(0);
        Self::new(NOWDB_TYP_TEXT, buf)
    }

    /// A date field (nanoseconds since the epoch).
    pub fn date(v: i64) -> Self {
        Self::new(NOWDB_TYP_DATE, v.to_ne_bytes().to_vec())
    }

    /// A time field (nanoseconds since the epoch).
    pub fn time(v: i64) -> Self {
        Self::new(NOWDB_TYP_TIME, v.to_ne_bytes().to_vec())
    }

    /// A float field.
    pub fn float(v: f64) -> Self {
        Self::new(NOWDB_TYP_FLOAT, v.to_ne_bytes().to_vec())
    }

    /// A signed integer field.
    pub fn int(v: i64) -> Self {
        Self::new(NOWDB_TYP_INT, v.to_ne_bytes().to_vec())
    }

    /// An unsigned integer field.
    pub fn uint(v: u64) -> Self {
        Self::new(NOWDB_TYP_UINT, v.to_ne_bytes().to_vec())
    }

    /// A boolean field stored as a single byte.
    pub fn boolean(byte: u8) -> Self {
        Self::new(NOWDB_TYP_BOOL, vec![byte])
    }
}

/// Call-style interface to the server.
///
/// Implementations must be shareable across threads: independent
/// connections may be driven from different threads, while a single
/// handle is only ever used by one thread at a time.
pub trait Transport: Send + Sync {
    /// One-time library initialisation.
    fn init(&self) -> Status;

    /// Release library-global resources.
    fn teardown(&self);

    /// Open a session.
    fn connect(&self, params: &ConnectParams) -> Result<SessionHandle, Status>;

    /// Close a session on the server.
    fn close_connection(&self, session: SessionHandle) -> Status;

    /// Release the local session resource unconditionally.
    fn destroy_connection(&self, session: SessionHandle);

    /// Submit a statement and wait for the reply.
    fn execute_statement(&self, session: SessionHandle, stmt: &str)
        -> Result<ResultHandle, Status>;

    /// Raw result type tag.
    fn result_type(&self, result: ResultHandle) -> i32;

    /// Status of the statement that produced the result.
    fn result_status(&self, result: ResultHandle) -> Status;

    /// Server error code attached to the result.
    fn result_error_code(&self, result: ResultHandle) -> Status;

    /// Human-readable error details, if the server sent any.
    fn result_details(&self, result: ResultHandle) -> Option<String>;

    /// Release a result (or a cursor or row buffer addressed as a result).
    fn destroy_result(&self, result: ResultHandle);

    /// Turn a cursor-kind result into a cursor.
    fn open_cursor(&self, result: ResultHandle) -> Result<CursorHandle, Status>;

    /// Close a cursor; releases its row buffer as well.
    fn close_cursor(&self, cursor: CursorHandle) -> Status;

    /// The row buffer currently held by the cursor, if any.
    fn cursor_row(&self, cursor: CursorHandle) -> Option<RowHandle>;

    /// Fetch the next batch of rows into the cursor's row buffer.
    fn cursor_fetch(&self, cursor: CursorHandle) -> Status;

    /// Advance to the next row within the buffer.
    fn row_next(&self, row: RowHandle) -> Status;

    /// Number of fields in the current row.
    fn row_count(&self, row: RowHandle) -> usize;

    /// Field `idx` of the current row; out of range yields a NULL field.
    fn row_field(&self, row: RowHandle, idx: usize) -> RawField;
}
