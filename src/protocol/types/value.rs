//! Decoded field values.

use chrono::DateTime;
use std::fmt;

use super::FieldType;
use crate::protocol::constants::NANOS_PER_SEC;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// NULL, out-of-range index or unrecognised tag.
    Absent,
    /// Text value.
    Text(String),
    /// Date as nanoseconds since the Unix epoch.
    Date(i64),
    /// Time as nanoseconds since the Unix epoch.
    Time(i64),
    /// 64-bit float.
    Float(f64),
    /// Signed 64-bit integer.
    Int(i64),
    /// Unsigned 64-bit integer.
    UInt(u64),
    /// Boolean.
    Bool(bool),
}

impl FieldValue {
    /// Check if the value is absent.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    /// The type tag this value was decoded from.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Absent => FieldType::Nothing,
            FieldValue::Text(_) => FieldType::Text,
            FieldValue::Date(_) => FieldType::Date,
            FieldValue::Time(_) => FieldType::Time,
            FieldValue::Float(_) => FieldType::Float,
            FieldValue::Int(_) => FieldType::Int,
            FieldValue::UInt(_) => FieldType::UInt,
            FieldValue::Bool(_) => FieldType::Bool,
        }
    }

    /// Try to get the value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get the value as a signed integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the value as an unsigned integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::UInt(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the value as a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get the value as a time value; dates and integers qualify.
    pub fn as_time(&self) -> Option<i64> {
        match self {
            FieldValue::Date(v) | FieldValue::Time(v) | FieldValue::Int(v) => Some(*v),
            _ => None,
        }
    }
}

fn write_timestamp(f: &mut fmt::Formatter<'_>, nanos: i64) -> fmt::Result {
    let secs = nanos.div_euclid(NANOS_PER_SEC);
    let sub = nanos.rem_euclid(NANOS_PER_SEC) as u32;
    match DateTime::from_timestamp(secs, sub) {
        Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.9f")),
        None => write!(f, "{}", nanos),
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Absent => write!(f, "NULL"),
            FieldValue::Text(s) => write!(f, "{}", s),
            FieldValue::Date(v) | FieldValue::Time(v) => write_timestamp(f, *v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::UInt(v) => write!(f, "{}", v),
            FieldValue::Bool(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_absent() {
        let val = FieldValue::Absent;
        assert!(val.is_null());
        assert_eq!(val.field_type(), FieldType::Nothing);
        assert_eq!(val.as_str(), None);
        assert_eq!(format!("{}", val), "NULL");
    }

    #[test]
    fn test_field_value_accessors() {
        assert_eq!(FieldValue::Text("x".into()).as_str(), Some("x"));
        assert_eq!(FieldValue::Int(-3).as_i64(), Some(-3));
        assert_eq!(FieldValue::Int(-3).as_u64(), None);
        assert_eq!(FieldValue::UInt(3).as_u64(), Some(3));
        assert_eq!(FieldValue::Float(1.5).as_f64(), Some(1.5));
        assert_eq!(FieldValue::Bool(true).as_bool(), Some(true));
        assert_eq!(FieldValue::Date(10).as_time(), Some(10));
        assert_eq!(FieldValue::Int(10).as_time(), Some(10));
        assert_eq!(FieldValue::UInt(10).as_time(), None);
    }

    #[test]
    fn test_timestamp_display() {
        let val = FieldValue::Time(1_500_000_000 * NANOS_PER_SEC + 42);
        assert_eq!(format!("{}", val), "2017-07-14T02:40:00.000000042");

        let val = FieldValue::Date(-1);
        assert_eq!(format!("{}", val), "1969-12-31T23:59:59.999999999");
    }
}
