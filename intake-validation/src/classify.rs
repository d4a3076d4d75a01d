//! Value type classification

use crate::errors::{Result, ValidationError};
use intake_core::FieldValue;
use once_cell::sync::Lazy;
use regex::Regex;

static NUMERIC_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?\s*$").unwrap()
});

/// Semantic type of a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Bool,
    Numeric,
    String,
    Array,
    File,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Null => "null",
            ValueType::Bool => "bool",
            ValueType::Numeric => "numeric",
            ValueType::String => "string",
            ValueType::Array => "array",
            ValueType::File => "file",
        }
    }
}

/// Type and emptiness of one value, computed once per validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub value_type: ValueType,
    pub is_empty: bool,
}

impl Classification {
    fn new(value_type: ValueType, is_empty: bool) -> Self {
        Self {
            value_type,
            is_empty,
        }
    }
}

/// Classify a value.
///
/// Numbers and numeric strings are checked before plain strings. A file is
/// empty when its size is below `min_file_size`.
pub fn classify(field: &str, value: &FieldValue, min_file_size: u64) -> Result<Classification> {
    let classification = match value {
        FieldValue::Null => Classification::new(ValueType::Null, true),
        FieldValue::Bool(_) => Classification::new(ValueType::Bool, false),
        FieldValue::Int(_) | FieldValue::Float(_) => Classification::new(ValueType::Numeric, false),
        FieldValue::String(s) if is_numeric_str(s) => Classification::new(ValueType::Numeric, false),
        FieldValue::String(s) => Classification::new(ValueType::String, s.is_empty()),
        FieldValue::List(items) => Classification::new(ValueType::Array, items.is_empty()),
        FieldValue::Map(map) => Classification::new(ValueType::Array, map.is_empty()),
        FieldValue::File(file) => Classification::new(ValueType::File, file.size() < min_file_size),
        FieldValue::Bytes(_) => {
            return Err(ValidationError::UnrecognizedType {
                field: field.to_string(),
                value: value.to_string(),
            });
        }
    };
    Ok(classification)
}

/// Decimal number text, optionally signed, with optional exponent and
/// surrounding whitespace.
pub fn is_numeric_str(s: &str) -> bool {
    NUMERIC_REGEX.is_match(s)
}

/// Numeric value of numbers and numeric strings
pub fn parse_number(value: &FieldValue) -> Option<f64> {
    match value {
        FieldValue::Int(n) => Some(*n as f64),
        FieldValue::Float(f) => Some(*f),
        FieldValue::String(s) => parse_numeric_str(s),
        _ => None,
    }
}

pub(crate) fn parse_numeric_str(s: &str) -> Option<f64> {
    if is_numeric_str(s) {
        s.trim().parse().ok()
    } else {
        None
    }
}
