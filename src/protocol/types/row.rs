//! Row view over a cursor's row buffer.

use crate::error::{Error, Result};
use crate::protocol::decode::decode_field;
use crate::protocol::transport::{RawField, RowHandle, Transport};

use super::{FieldType, FieldValue};

/// The current row of a cursor.
///
/// A `Row` is a live window on the cursor's row buffer, not a snapshot.
/// It borrows the cursor, so it cannot outlive the next `fetch` or `close`.
/// Copy values out (e.g. with [`Row::values`]) before advancing.
pub struct Row<'c> {
    transport: &'c dyn Transport,
    handle: Option<RowHandle>,
}

impl<'c> Row<'c> {
    pub(crate) fn new(transport: &'c dyn Transport, handle: Option<RowHandle>) -> Self {
        Self { transport, handle }
    }

    /// Number of fields in the row; 0 without a row buffer.
    pub fn count(&self) -> usize {
        match self.handle {
            Some(h) => self.transport.row_count(h),
            None => 0,
        }
    }

    /// Check if the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Decode field `idx` (0-based).
    ///
    /// Out-of-range indices and NULL fields both yield `FieldValue::Absent`.
    pub fn field(&self, idx: usize) -> FieldValue {
        self.raw(idx)
            .map_or(FieldValue::Absent, |raw| decode_field(&raw))
    }

    /// Type tag of field `idx` as sent by the server, with its decoded value.
    ///
    /// The type is taken from the tag even when the payload is too short to
    /// decode, in which case the value is `FieldValue::Absent`.
    pub fn typed_field(&self, idx: usize) -> (FieldType, FieldValue) {
        match self.raw(idx) {
            Some(raw) => (FieldType::from_tag(raw.tag), decode_field(&raw)),
            None => (FieldType::Nothing, FieldValue::Absent),
        }
    }

    /// Type tag of field `idx`; `Nothing` for NULL and out-of-range fields.
    pub fn field_type(&self, idx: usize) -> FieldType {
        self.raw(idx)
            .map_or(FieldType::Nothing, |raw| FieldType::from_tag(raw.tag))
    }

    fn raw(&self, idx: usize) -> Option<RawField> {
        let h = self.handle?;
        if idx >= self.transport.row_count(h) {
            return None;
        }
        Some(self.transport.row_field(h, idx))
    }

    /// Decode all fields of the row.
    pub fn values(&self) -> Vec<FieldValue> {
        (0..self.count()).map(|i| self.field(i)).collect()
    }

    /// Field `idx` as text.
    pub fn string(&self, idx: usize) -> Result<String> {
        match self.field(idx) {
            FieldValue::Absent => Err(Error::Null),
            FieldValue::Text(s) => Ok(s),
            _ => Err(Error::type_error("not a string")),
        }
    }

    /// Field `idx` as time value (nanoseconds); DATE, TIME and INT qualify.
    pub fn time(&self, idx: usize) -> Result<i64> {
        match self.field(idx) {
            FieldValue::Absent => Err(Error::Null),
            FieldValue::Date(v) | FieldValue::Time(v) | FieldValue::Int(v) => Ok(v),
            _ => Err(Error::type_error("not a time value")),
        }
    }

    /// Field `idx` as signed integer.
    pub fn int(&self, idx: usize) -> Result<i64> {
        match self.field(idx) {
            FieldValue::Absent => Err(Error::Null),
            FieldValue::Int(v) => Ok(v),
            _ => Err(Error::type_error("not an int value")),
        }
    }

    /// Field `idx` as unsigned integer.
    pub fn uint(&self, idx: usize) -> Result<u64> {
        match self.field(idx) {
            FieldValue::Absent => Err(Error::Null),
            FieldValue::UInt(v) => Ok(v),
            _ => Err(Error::type_error("not an uint value")),
        }
    }

    /// Field `idx` as float.
    pub fn float(&self, idx: usize) -> Result<f64> {
        match self.field(idx) {
            FieldValue::Absent => Err(Error::Null),
            FieldValue::Float(v) => Ok(v),
            _ => Err(Error::type_error("not a float value")),
        }
    }

    /// Field `idx` as boolean.
    pub fn bool(&self, idx: usize) -> Result<bool> {
        match self.field(idx) {
            FieldValue::Absent => Err(Error::Null),
            FieldValue::Bool(v) => Ok(v),
            _ => Err(Error::type_error("not a bool value")),
        }
    }
}

impl std::fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Row")
            .field("handle", &self.handle)
            .field("values", &self.values())
            .finish()
    }
}
