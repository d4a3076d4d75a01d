//! Field value model shared by body decoding, uploads and validation.

use crate::file::UploadedFile;
use bytes::Bytes;
use indexmap::IndexMap;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Ordered map of field name to value.
///
/// Iteration order is insertion order, which the validator relies on when
/// building its batch of already-validated fields.
pub type FieldMap = IndexMap<String, FieldValue>;

/// A single request field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Explicit null (JSON `null`, empty XML element with no content)
    Null,
    /// Boolean
    Bool(bool),
    /// Integer number
    Int(i64),
    /// Floating point number
    Float(f64),
    /// Text
    String(String),
    /// Positional collection
    List(Vec<FieldValue>),
    /// Keyed collection
    Map(FieldMap),
    /// Uploaded file handle
    File(Arc<UploadedFile>),
    /// Raw bytes that are not valid UTF-8
    Bytes(Bytes),
}

impl FieldValue {
    /// Check for `FieldValue::Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Borrow the text of a `String` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the file of a `File` value.
    pub fn as_file(&self) -> Option<&Arc<UploadedFile>> {
        match self {
            FieldValue::File(file) => Some(file),
            _ => None,
        }
    }

    /// Scalar text form: strings as-is, numbers formatted.
    ///
    /// Booleans, null, collections, files and bytes have no text form.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::String(s) => Some(Cow::Borrowed(s)),
            FieldValue::Int(n) => Some(Cow::Owned(n.to_string())),
            FieldValue::Float(f) => Some(Cow::Owned(f.to_string())),
            _ => None,
        }
    }

    /// Number of entries for `List`/`Map`.
    pub fn collection_len(&self) -> Option<usize> {
        match self {
            FieldValue::List(items) => Some(items.len()),
            FieldValue::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    /// Short kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Float(_) => "float",
            FieldValue::String(_) => "string",
            FieldValue::List(_) => "list",
            FieldValue::Map(_) => "map",
            FieldValue::File(_) => "file",
            FieldValue::Bytes(_) => "bytes",
        }
    }

    /// Convert to a JSON value.
    ///
    /// Files become an object describing the upload; bytes are decoded lossily.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Int(n) => Value::from(*n),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FieldValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            FieldValue::File(file) => serde_json::json!({
                "key": file.key(),
                "name": file.name(),
                "type": file.media_type(),
                "size": file.size(),
            }),
            FieldValue::Bytes(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::File(file) => write!(f, "file({}, {} bytes)", file.name(), file.size()),
            FieldValue::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            other => write!(f, "{}", other.to_json()),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                FieldValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<Vec<FieldValue>> for FieldValue {
    fn from(value: Vec<FieldValue>) -> Self {
        FieldValue::List(value)
    }
}

impl From<FieldMap> for FieldValue {
    fn from(value: FieldMap) -> Self {
        FieldValue::Map(value)
    }
}

impl From<UploadedFile> for FieldValue {
    fn from(value: UploadedFile) -> Self {
        FieldValue::File(Arc::new(value))
    }
}

impl From<Arc<UploadedFile>> for FieldValue {
    fn from(value: Arc<UploadedFile>) -> Self {
        FieldValue::File(value)
    }
}

/// Insert a decoded field, honouring the `name[]` list convention.
///
/// A name ending in `[]` appends to a list stored under the bare name;
/// any other name replaces a previous value.
pub fn insert_field(map: &mut FieldMap, name: &str, value: FieldValue) {
    match name.strip_suffix("[]") {
        Some(bare) if !bare.is_empty() => match map.get_mut(bare) {
            Some(FieldValue::List(items)) => items.push(value),
            _ => {
                map.insert(bare.to_string(), FieldValue::List(vec![value]));
            }
        },
        _ => {
            map.insert(name.to_string(), value);
        }
    }
}

/// Build a `FieldMap` from `(name, value)` pairs.
pub fn field_map<I, K, V>(pairs: I) -> FieldMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<FieldValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
