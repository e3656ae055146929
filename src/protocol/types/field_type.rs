//! Field type tags.

use crate::protocol::constants::{
    NOWDB_TYP_BOOL, NOWDB_TYP_DATE, NOWDB_TYP_FLOAT, NOWDB_TYP_INT, NOWDB_TYP_NOTHING,
    NOWDB_TYP_TEXT, NOWDB_TYP_TIME, NOWDB_TYP_UINT,
};

/// Semantic type of a field, as identified by its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// NULL, out of range or unrecognised.
    Nothing,
    Text,
    Date,
    Time,
    Float,
    Int,
    UInt,
    Bool,
}

impl FieldType {
    /// Map a raw tag; unknown tags are `Nothing`.
    pub fn from_tag(tag: i32) -> Self {
        match tag {
            NOWDB_TYP_TEXT => FieldType::Text,
            NOWDB_TYP_DATE => FieldType::Date,
            NOWDB_TYP_TIME => FieldType::Time,
            NOWDB_TYP_FLOAT => FieldType::Float,
            NOWDB_TYP_INT => FieldType::Int,
            NOWDB_TYP_UINT => FieldType::UInt,
            NOWDB_TYP_BOOL => FieldType::Bool,
            _ => FieldType::Nothing,
        }
    }

    /// The raw tag.
    pub fn tag(self) -> i32 {
        match self {
            FieldType::Nothing => NOWDB_TYP_NOTHING,
            FieldType::Text => NOWDB_TYP_TEXT,
            FieldType::Date => NOWDB_TYP_DATE,
            FieldType::Time => NOWDB_TYP_TIME,
            FieldType::Float => NOWDB_TYP_FLOAT,
            FieldType::Int => NOWDB_TYP_INT,
            FieldType::UInt => NOWDB_TYP_UINT,
            FieldType::Bool => NOWDB_TYP_BOOL,
        }
    }

    /// True for the types a time value may be stored as.
    pub fn is_time_compatible(self) -> bool {
        matches!(self, FieldType::Date | FieldType::Time | FieldType::Int)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::Nothing => "NOTHING",
            FieldType::Text => "TEXT",
            FieldType::Date => "DATE",
            FieldType::Time => "TIME",
            FieldType::Float => "FLOAT",
            FieldType::Int => "INT",
            FieldType::UInt => "UINT",
            FieldType::Bool => "BOOL",
        };
        write!(f, "{}", name)
    }
}
