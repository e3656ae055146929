//! Error types for the NoWDB client.

use thiserror::Error;

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for client operations.
///
/// Every failure belongs to exactly one of five kinds.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Local misuse of the client (call sequence, configuration).
    #[error("{message}")]
    Client { message: String },

    /// The server reported a non-success code.
    #[error("{}{}", .code, detail_suffix(.detail))]
    Server { code: i32, detail: Option<String> },

    /// A typed accessor was called on a field of another type.
    #[error("{message}")]
    Type { message: String },

    /// A typed accessor was called on a NULL field.
    #[error("NULL")]
    Null,

    /// The cursor is exhausted.
    #[error("end-of-file")]
    Eof,
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(": {}", d),
        None => String::new(),
    }
}

impl Error {
    /// Create a client error.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client {
            message: message.into(),
        }
    }

    /// Create a server error.
    pub fn server(code: i32, detail: Option<String>) -> Self {
        Self::Server { code, detail }
    }

    /// Create a type error.
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::Type {
            message: message.into(),
        }
    }

    /// True if this error marks the end of a result set.
    pub fn is_eof(&self) -> bool {
        matches!(self, Error::Eof)
    }

    /// True if this error reports a NULL field.
    pub fn is_null(&self) -> bool {
        matches!(self, Error::Null)
    }
}
