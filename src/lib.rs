//! NoWDB Client for Rust
//!
//! A client for the NoWDB database server. It opens sessions, submits
//! statements and streams back result rows through four handles:
//! [`Connection`], [`QueryResult`], [`Cursor`] and [`Row`]. Each handle
//! releases the server- and client-side resources it owns exactly once,
//! whether it is closed explicitly or dropped.
//!
//! The wire protocol lives behind the [`Transport`] trait;
//! [`protocol::memory::MemoryTransport`] is an in-process implementation.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use nowdb_client::{Connection, Error, Result, Runtime};
//! use nowdb_client::protocol::memory::{MemoryTransport, Reply};
//! use nowdb_client::protocol::RawField;
//!
//! fn main() -> Result<()> {
//!     let transport = MemoryTransport::new()
//!         .with_database("sales")
//!         .on_statement("select count(*) from orders", Reply::rows(vec![vec![RawField::uint(7)]]));
//!
//!     // Initialise the client library
//!     let rt = Runtime::new(Arc::new(transport));
//!
//!     let mut conn = Connection::connect(&rt, "db.example.com", "4321", "u", "p")?;
//!     conn.use_database("sales")?;
//!
//!     {
//!         let mut result = conn.execute("select count(*) from orders")?;
//!         let mut cursor = result.open()?;
//!         loop {
//!             match cursor.fetch() {
//!                 Ok(row) => println!("Count: {}", row.uint(0)?),
//!                 Err(Error::Eof) => break,
//!                 Err(e) => return Err(e),
//!             }
//!         }
//!     }
//!
//!     conn.close()
//! }
//! ```

pub mod connection;
pub mod cursor;
pub mod error;
pub mod protocol;
pub mod result;
pub mod runtime;

// Re-export main types
pub use connection::Connection;
pub use cursor::{Cursor, CursorState};
pub use error::{Error, Result};
pub use protocol::connect::ConnectParams;
pub use protocol::transport::{RawField, Status, Transport};
pub use protocol::types::{FieldType, FieldValue, Row};
pub use result::{QueryResult, ResultKind, ResultType};
pub use runtime::Runtime;
