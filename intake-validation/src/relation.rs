//! Ordering comparison shared by `compare`, `compareField` and their sugar
//!
//! A comparison first measures both sides under one [`ValueKind`] and orders
//! the measurements, then asks the [`Relation`] whether that ordering passes.

use crate::classify::{parse_number, ValueType};
use intake_core::FieldValue;
use std::cmp::Ordering;

/// Relational operator of a comparison rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Lt,
    Gt,
    Eq,
    Ge,
    Le,
    Ne,
}

impl Relation {
    /// Parse one of `< > = == === >= <= != <>`
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "<" => Some(Relation::Lt),
            ">" => Some(Relation::Gt),
            "=" | "==" | "===" => Some(Relation::Eq),
            ">=" => Some(Relation::Ge),
            "<=" => Some(Relation::Le),
            "!=" | "<>" => Some(Relation::Ne),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Relation::Lt => "<",
            Relation::Gt => ">",
            Relation::Eq => "=",
            Relation::Ge => ">=",
            Relation::Le => "<=",
            Relation::Ne => "!=",
        }
    }

    /// Whether `left <op> right` holds given `left.cmp(right)`
    pub fn admits(&self, ordering: Ordering) -> bool {
        use Ordering::*;
        matches!(
            (self, ordering),
            (Relation::Eq | Relation::Ge | Relation::Le, Equal)
                | (Relation::Gt | Relation::Ge | Relation::Ne, Greater)
                | (Relation::Lt | Relation::Le | Relation::Ne, Less)
        )
    }
}

/// What a comparison measures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Truthiness as 0/1
    Bool,
    /// Numeric value
    Numeric,
    /// Length in characters
    String,
    /// Number of entries
    Array,
    /// Size in bytes
    File,
}

impl ValueKind {
    /// Parse a declared kind name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(ValueKind::Bool),
            "numeric" | "integer" | "int" => Some(ValueKind::Numeric),
            "string" => Some(ValueKind::String),
            "array" => Some(ValueKind::Array),
            "file" => Some(ValueKind::File),
            _ => None,
        }
    }

    /// Kind implied by a classified type
    pub fn from_type(value_type: ValueType) -> Option<Self> {
        match value_type {
            ValueType::Null => None,
            ValueType::Bool => Some(ValueKind::Bool),
            ValueType::Numeric => Some(ValueKind::Numeric),
            ValueType::String => Some(ValueKind::String),
            ValueType::Array => Some(ValueKind::Array),
            ValueType::File => Some(ValueKind::File),
        }
    }

    /// Counted kinds compare against whole numbers
    pub fn is_count(&self) -> bool {
        matches!(self, ValueKind::String | ValueKind::Array | ValueKind::File)
    }

    /// Measure a value under this kind; `None` when it cannot be measured.
    ///
    /// Null measures as zero for every kind.
    pub fn measure(&self, value: &FieldValue) -> Option<f64> {
        if value.is_null() {
            return Some(0.0);
        }
        match self {
            ValueKind::Bool => Some(match value {
                FieldValue::Bool(b) => f64::from(u8::from(*b)),
                FieldValue::String(s) => integer_prefix(s) as f64,
                FieldValue::Int(n) => *n as f64,
                FieldValue::Float(f) => f.trunc(),
                other => f64::from(u8::from(other.collection_len().is_none_or(|len| len > 0))),
            }),
            ValueKind::Numeric => match value {
                FieldValue::Bool(b) => Some(f64::from(u8::from(*b))),
                other => parse_number(other),
            },
            ValueKind::String => match value {
                FieldValue::Bool(b) => Some(f64::from(u8::from(*b))),
                other => other.as_text().map(|text| text.chars().count() as f64),
            },
            ValueKind::Array => value.collection_len().map(|len| len as f64),
            ValueKind::File => value.as_file().map(|file| file.size() as f64),
        }
    }
}

/// Integer value of the leading `[+-]digits` of `text`, 0 when there are none.
///
/// `bool` comparisons measure strings this way, so `"abc"` and `"false"`
/// both measure 0 and `"12kg"` measures 12.
pub fn integer_prefix(text: &str) -> i64 {
    let text = text.trim_start();
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let value = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    if negative { -value } else { value }
}

/// Kind argument of a comparison rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindSpec {
    /// Use the classified type of the value
    Inferred,
    /// Use a declared kind
    Declared(ValueKind),
    /// Declared name that is not a kind; the comparison fails
    Unsupported(String),
}

impl KindSpec {
    /// From an optional rule argument
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => KindSpec::Inferred,
            Some(name) => match ValueKind::parse(name) {
                Some(kind) => KindSpec::Declared(kind),
                None => KindSpec::Unsupported(name.to_string()),
            },
        }
    }

    /// Resolve against the classified type of the value under test
    pub fn resolve(&self, value_type: ValueType) -> Option<ValueKind> {
        match self {
            KindSpec::Inferred => ValueKind::from_type(value_type),
            KindSpec::Declared(kind) => Some(*kind),
            KindSpec::Unsupported(_) => None,
        }
    }
}

/// Order two measurements and test them against a relation.
pub fn holds(relation: Relation, left: f64, right: f64) -> bool {
    left.partial_cmp(&right)
        .is_some_and(|ordering| relation.admits(ordering))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_relation() {
        for symbol in ["=", "==", "==="] {
            assert_eq!(Relation::parse(symbol), Some(Relation::Eq));
        }
        assert_eq!(Relation::parse("<>"), Some(Relation::Ne));
        assert_eq!(Relation::parse("=>"), None);
        assert_eq!(Relation::parse(""), None);
    }

    #[test]
    fn test_operator_table() {
        let table = [
            (Relation::Lt, [true, false, false]),
            (Relation::Gt, [false, false, true]),
            (Relation::Eq, [false, true, false]),
            (Relation::Ge, [false, true, true]),
            (Relation::Le, [true, true, false]),
            (Relation::Ne, [true, false, true]),
        ];
        for (relation, expected) in table {
            let actual = [Ordering::Less, Ordering::Equal, Ordering::Greater].map(|o| relation.admits(o));
            assert_eq!(actual, expected, "{}", relation.symbol());
        }
    }

    #[test]
    fn test_measure() {
        assert_eq!(ValueKind::String.measure(&"héllo".into()), Some(5.0));
        assert_eq!(ValueKind::String.measure(&FieldValue::Int(123)), Some(3.0));
        assert_eq!(ValueKind::Numeric.measure(&"9".into()), Some(9.0));
        assert_eq!(ValueKind::Numeric.measure(&"nine".into()), None);
        assert_eq!(ValueKind::Array.measure(&FieldValue::List(vec![1.into(), 2.into()])), Some(2.0));
        assert_eq!(ValueKind::Array.measure(&"x".into()), None);
        assert_eq!(ValueKind::Bool.measure(&"0".into()), Some(0.0));
        assert_eq!(ValueKind::Bool.measure(&"abc".into()), Some(0.0));
        assert_eq!(ValueKind::Bool.measure(&"false".into()), Some(0.0));
        assert_eq!(ValueKind::Bool.measure(&"12kg".into()), Some(12.0));
        assert_eq!(ValueKind::Bool.measure(&FieldValue::Bool(true)), Some(1.0));
        assert_eq!(ValueKind::Bool.measure(&FieldValue::Float(2.7)), Some(2.0));
        assert_eq!(ValueKind::File.measure(&FieldValue::Null), Some(0.0));
    }

    #[test]
    fn test_integer_prefix() {
        assert_eq!(integer_prefix("42"), 42);
        assert_eq!(integer_prefix("  -7 apples"), -7);
        assert_eq!(integer_prefix("+3"), 3);
        assert_eq!(integer_prefix("1.9"), 1);
        assert_eq!(integer_prefix("true"), 0);
        assert_eq!(integer_prefix(""), 0);
        assert_eq!(integer_prefix("-"), 0);
    }

    #[test]
    fn test_kind_spec() {
        assert_eq!(KindSpec::from_arg(None), KindSpec::Inferred);
        assert_eq!(KindSpec::from_arg(Some("int")), KindSpec::Declared(ValueKind::Numeric));
        assert_eq!(KindSpec::from_arg(Some("date")).resolve(ValueType::String), None);
        assert_eq!(KindSpec::Inferred.resolve(ValueType::Array), Some(ValueKind::Array));
    }

    proptest! {
        #[test]
        fn prop_holds_matches_native_operators(a in -1000i64..1000, b in -1000i64..1000) {
            let (x, y) = (a as f64, b as f64);
            prop_assert_eq!(holds(Relation::Lt, x, y), a < b);
            prop_assert_eq!(holds(Relation::Gt, x, y), a > b);
            prop_assert_eq!(holds(Relation::Eq, x, y), a == b);
            prop_assert_eq!(holds(Relation::Ge, x, y), a >= b);
            prop_assert_eq!(holds(Relation::Le, x, y), a <= b);
            prop_assert_eq!(holds(Relation::Ne, x, y), a != b);
        }
    }
}
