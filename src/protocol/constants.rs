//! Client library constants.
//!
//! Values mirror the codes used by the NoWDB client library.

// Status codes
pub const NOWDB_OK: i32 = 0;
pub const NOWDB_EOF: i32 = 8;

// Result type tags
pub const NOWDB_RESULT_STATUS: i32 = 0x21;
pub const NOWDB_RESULT_REPORT: i32 = 0x22;
pub const NOWDB_RESULT_ROW: i32 = 0x23;
pub const NOWDB_RESULT_CURSOR: i32 = 0x24;

// Field type tags
pub const NOWDB_TYP_NOTHING: i32 = 0;
pub const NOWDB_TYP_TEXT: i32 = 1;
pub const NOWDB_TYP_DATE: i32 = 2;
pub const NOWDB_TYP_TIME: i32 = 3;
pub const NOWDB_TYP_FLOAT: i32 = 4;
pub const NOWDB_TYP_INT: i32 = 5;
pub const NOWDB_TYP_UINT: i32 = 6;
pub const NOWDB_TYP_BOOL: i32 = 9;

/// Nanoseconds per second, the resolution of date and time values.
pub const NANOS_PER_SEC: i64 = 1_000_000_000;
