//! Statement results.

use crate::cursor::{Cursor, Resources};
use crate::error::{Error, Result};
use crate::protocol::constants::*;
use crate::protocol::transport::{ResultHandle, Transport};

/// Result kind as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// Ok / not ok, no data.
    Status,
    /// Status with a report, no data.
    Report,
    /// A single row.
    Row,
    /// A multi-row cursor.
    Cursor,
    /// Unrecognised tag.
    Unknown(i32),
}

impl ResultKind {
    /// Map a raw result type tag.
    pub fn from_tag(tag: i32) -> Self {
        match tag {
            NOWDB_RESULT_STATUS => ResultKind::Status,
            NOWDB_RESULT_REPORT => ResultKind::Report,
            NOWDB_RESULT_ROW => ResultKind::Row,
            NOWDB_RESULT_CURSOR => ResultKind::Cursor,
            other => ResultKind::Unknown(other),
        }
    }

    /// True for kinds that can be opened as a cursor.
    pub fn has_data(self) -> bool {
        matches!(self, ResultKind::Row | ResultKind::Cursor)
    }
}

/// Coarse classification of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultType {
    /// Status only.
    Status,
    /// Row data; open a cursor to read it.
    Data,
    /// Unknown result type.
    Invalid,
}

/// The outcome of one executed statement.
///
/// A data-bearing result is read by opening it as a [`Cursor`], which takes
/// over its server-side resource. Results release their resource on drop.
pub struct QueryResult<'c> {
    transport: &'c dyn Transport,
    /// Owned server-side result; `None` once destroyed or opened.
    handle: Option<ResultHandle>,
    kind: ResultKind,
    error_code: i32,
    details: Option<String>,
}

impl<'c> QueryResult<'c> {
    pub(crate) fn new(transport: &'c dyn Transport, handle: ResultHandle) -> Self {
        let kind = ResultKind::from_tag(transport.result_type(handle));
        let error_code = transport.result_error_code(handle).code();
        let details = transport.result_details(handle);
        Self {
            transport,
            handle: Some(handle),
            kind,
            error_code,
            details,
        }
    }

    /// Result kind.
    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    /// Classify the result as status, data or invalid.
    pub fn tell_type(&self) -> ResultType {
        match self.kind {
            ResultKind::Status | ResultKind::Report => ResultType::Status,
            ResultKind::Row | ResultKind::Cursor => ResultType::Data,
            ResultKind::Unknown(_) => ResultType::Invalid,
        }
    }

    /// True if the server reported success.
    pub fn ok(&self) -> bool {
        self.error_code == NOWDB_OK
    }

    /// Numeric server error code.
    pub fn error_code(&self) -> i32 {
        self.error_code
    }

    /// Error details sent by the server, if any.
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Format the status as "code" or "code: details".
    pub fn error(&self) -> String {
        match &self.details {
            Some(d) => format!("{}: {}", self.error_code, d),
            None => self.error_code.to_string(),
        }
    }

    pub(crate) fn to_server_error(&self) -> Error {
        Error::server(self.error_code, self.details.clone())
    }

    /// Check if the result still owns its server-side resource.
    pub fn is_live(&self) -> bool {
        self.handle.is_some()
    }

    /// Open a cursor over the result's rows.
    ///
    /// The cursor takes over the result's resource; afterwards the result
    /// is empty and opening it again fails with "not a cursor".
    pub fn open(&mut self) -> Result<Cursor<'c>> {
        let handle = match self.handle {
            Some(h) if self.kind.has_data() => h,
            _ => return Err(Error::client("not a cursor")),
        };

        let resources = if self.kind == ResultKind::Cursor {
            let cursor = self
                .transport
                .open_cursor(handle)
                .map_err(|status| Error::client(status.code().to_string()))?;
            Resources::CursorResource {
                cursor,
                row: self.transport.cursor_row(cursor),
            }
        } else {
            Resources::RowBuffer(handle.as_row())
        };
        self.handle = None;
        tracing::debug!(result = handle.0, kind = ?self.kind, "cursor opened");

        Ok(Cursor::new(self.transport, resources))
    }

    /// Release the server-side result. Safe to call any number of times.
    pub fn destroy(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.transport.destroy_result(handle);
        }
    }
}

impl Drop for QueryResult<'_> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for QueryResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResult")
            .field("handle", &self.handle)
            .field("kind", &self.kind)
            .field("error_code", &self.error_code)
            .field("details", &self.details)
            .finish()
    }
}
