//! Field decoder.
//!
//! Interprets the untyped payload of a field according to its tag:
//!
//! | Tag | Payload |
//! |-----|---------|
//! | TEXT | bytes up to the first NUL, UTF-8 (lossy) |
//! | DATE, TIME, INT | 8 bytes, signed 64-bit, native byte order |
//! | UINT | 8 bytes, unsigned 64-bit, native byte order |
//! | FLOAT | 8 bytes, IEEE 754 double, native byte order |
//! | BOOL | 1 byte, zero is false |
//!
//! Unknown tags and payloads too short for their type decode to `Absent`.

use super::transport::RawField;
use super::types::{FieldType, FieldValue};

/// Decode a raw field.
pub fn decode_field(raw: &RawField) -> FieldValue {
    decode(raw.tag, &raw.payload)
}

/// Decode a payload according to a raw tag.
pub fn decode(tag: i32, payload: &[u8]) -> FieldValue {
    let field_type = FieldType::from_tag(tag);
    match field_type {
        FieldType::Nothing => return FieldValue::Absent,
        FieldType::Text => {
            let end = payload.iter().position(|&b| b == 0).unwrap_or(payload.len());
            return FieldValue::Text(String::from_utf8_lossy(&payload[..end]).into_owned());
        }
        FieldType::Bool => {
            return match payload.first() {
                Some(&b) => FieldValue::Bool(b != 0),
                None => FieldValue::Absent,
            };
        }
        _ => {}
    }

    let Some(w) = word(payload) else {
        return FieldValue::Absent;
    };
    match field_type {
        FieldType::Date => FieldValue::Date(i64::from_ne_bytes(w)),
        FieldType::Time => FieldValue::Time(i64::from_ne_bytes(w)),
        FieldType::Int => FieldValue::Int(i64::from_ne_bytes(w)),
        FieldType::UInt => FieldValue::UInt(u64::from_ne_bytes(w)),
        FieldType::Float => FieldValue::Float(f64::from_ne_bytes(w)),
        FieldType::Nothing | FieldType::Text | FieldType::Bool => FieldValue::Absent,
    }
}

fn word(payload: &[u8]) -> Option<[u8; 8]> {
    payload.get(..8)?.try_into().ok()
}
