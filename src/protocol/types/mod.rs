//! Field types, decoded values and the row view.

mod field_type;
mod row;
mod value;

pub use field_type::FieldType;
pub use row::Row;
pub use value::FieldValue;
