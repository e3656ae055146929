//! Transport boundary and field-level protocol for the NoWDB client.

pub mod connect;
pub mod constants;
pub mod decode;
pub mod memory;
pub mod transport;
pub mod types;

pub use connect::ConnectParams;
pub use decode::{decode, decode_field};
pub use transport::{
    CursorHandle, RawField, ResultHandle, RowHandle, SessionHandle, Status, Transport,
};
pub use types::{FieldType, FieldValue, Row};
