//! Per-field rule evaluation

use crate::classify::{classify, Classification, ValueType};
use crate::dates::{matches_format, parse_datetime};
use crate::errors::{Result, RuleViolation, ValidationError};
use crate::parser;
use crate::relation::{holds, KindSpec, ValueKind};
use crate::rules::Rule;
use crate::validator::{Predicate, ValidatorOptions};
use crate::validators::*;
use intake_core::{FieldMap, FieldValue};
use std::borrow::Cow;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Rule name reported when a predicate closure fails
pub const PREDICATE_RULE: &str = "predicate";

/// Evaluates rules against one field's value.
///
/// Holds an immutable snapshot of the value and a read-only view of the
/// fields already validated in the same batch. The value is classified once,
/// on construction.
pub struct RuleEvaluator<'a> {
    field: &'a str,
    value: &'a FieldValue,
    batch: &'a FieldMap,
    classification: Classification,
    options: &'a ValidatorOptions,
}

impl<'a> RuleEvaluator<'a> {
    /// Classify `value` and build an evaluator for it
    pub fn new(
        field: &'a str,
        value: &'a FieldValue,
        batch: &'a FieldMap,
        options: &'a ValidatorOptions,
    ) -> Result<Self> {
        let classification = classify(field, value, options.min_file_size)?;
        Ok(Self {
            field,
            value,
            batch,
            classification,
            options,
        })
    }

    pub fn field(&self) -> &str {
        self.field
    }

    pub fn value(&self) -> &FieldValue {
        self.value
    }

    /// Fields validated earlier in this batch
    pub fn batch(&self) -> &FieldMap {
        self.batch
    }

    pub fn value_type(&self) -> ValueType {
        self.classification.value_type
    }

    pub fn is_empty(&self) -> bool {
        self.classification.is_empty
    }

    /// Apply every rule in `rule_text`, stopping at the first failure.
    pub fn apply(&self, rule_text: &str) -> Result<()> {
        for invocation in parser::parse(rule_text) {
            let Some(rule) = Rule::resolve(&invocation)? else {
                if self.options.strict_rules {
                    return Err(ValidationError::UnknownRule {
                        field: self.field.to_string(),
                        rule: invocation.name,
                    });
                }
                warn!(field = %self.field, rule = %invocation.name, "skipping unknown rule");
                continue;
            };

            if !self.check(&rule) {
                return Err(self.violation(&invocation.name, &invocation.text, None));
            }
        }
        Ok(())
    }

    /// Apply a caller-supplied predicate.
    ///
    /// A message the predicate writes replaces the whole failure message.
    pub fn apply_predicate(&self, predicate: &Predicate) -> Result<()> {
        let mut message = None;
        if predicate(self, &mut message) {
            Ok(())
        } else {
            Err(self.violation(PREDICATE_RULE, PREDICATE_RULE, message))
        }
    }

    /// Evaluate one resolved rule.
    pub fn check(&self, rule: &Rule) -> bool {
        if self.is_empty() && !rule.is_presence() && !matches!(rule, Rule::Array | Rule::File) {
            return true;
        }

        let text = self.value.as_text();
        let text = text.as_deref();

        match rule {
            Rule::Required => !self.is_empty(),
            Rule::RequiredIf { field, value } => {
                !loose_eq(self.other(field), value) || !self.is_empty()
            }
            Rule::RequiredUnless { field, value } => {
                loose_eq(self.other(field), value) || !self.is_empty()
            }
            Rule::RequiredWith(fields) => {
                !fields.iter().any(|f| self.is_present(f)) || !self.is_empty()
            }
            Rule::RequiredWithAll(fields) => {
                !fields.iter().all(|f| self.is_present(f)) || !self.is_empty()
            }
            Rule::RequiredWithout(fields) => {
                !fields.iter().any(|f| !self.is_present(f)) || !self.is_empty()
            }
            Rule::RequiredWithoutAll(fields) => {
                !fields.iter().all(|f| !self.is_present(f)) || !self.is_empty()
            }

            Rule::Accepted => is_accepted(self.value),
            Rule::Boolean => is_boolean(self.value),
            Rule::Integer => is_integer(self.value),
            Rule::Numeric => self.value_type() == ValueType::Numeric,
            Rule::String => matches!(self.value, FieldValue::String(_)),
            Rule::Array => matches!(self.value, FieldValue::List(_) | FieldValue::Map(_)),
            Rule::File => matches!(self.value, FieldValue::File(_)),

            Rule::Alpha => self.value.as_str().is_some_and(is_alpha),
            Rule::AlphaDash => text.is_some_and(is_alpha_dash),
            Rule::AlphaNum => text.is_some_and(is_alpha_num),
            Rule::Email => text.is_some_and(is_email),
            Rule::Url => text.is_some_and(is_url),
            Rule::ActiveUrl => text
                .and_then(host_of)
                .is_some_and(|host| self.options.resolver.resolves(&host)),
            Rule::Ip => text.is_some_and(is_ip),
            Rule::Ipv4 => text.is_some_and(is_ipv4),
            Rule::Ipv6 => text.is_some_and(is_ipv6),
            Rule::Json => self.value.as_str().is_some_and(is_json),
            Rule::Timezone => self.value.as_str().is_some_and(is_timezone),
            Rule::Digits(length) => text.is_some_and(|t| has_digits(t, *length)),
            Rule::DigitsBetween { min, max } => {
                text.is_some_and(|t| has_digits_between(t, *min, *max))
            }

            Rule::In(options) => options.iter().any(|option| loose_eq(self.value, option)),
            Rule::NotIn(options) => !options.iter().any(|option| loose_eq(self.value, option)),
            Rule::Same(field) => self.batch.get(field) == Some(self.value),

            Rule::Regex(re) => self.value.as_str().is_some_and(|s| re.is_match(s)),
            Rule::NotRegex(re) => !self.value.as_str().is_some_and(|s| re.is_match(s)),

            Rule::Date => text.and_then(parse_datetime).is_some(),
            Rule::DateEquals(date) => self.date_relation(text, date, Ordering::Equal),
            Rule::After(date) => self.date_relation(text, date, Ordering::Greater),
            Rule::Before(date) => self.date_relation(text, date, Ordering::Less),
            Rule::DateFormat(format) => text.is_some_and(|t| matches_format(t, format)),

            Rule::Between { min, max, kind } => match self.measure(kind) {
                Some((measured, kind)) => {
                    let (min, max) = bounds(kind, *min, *max);
                    measured >= min && measured <= max
                }
                None => false,
            },
            Rule::Compare {
                relation,
                limit,
                kind,
            } => match self.measure(kind) {
                Some((measured, kind)) => holds(*relation, measured, bounds(kind, *limit, *limit).0),
                None => false,
            },
            Rule::CompareField {
                relation,
                field,
                kind,
            } => {
                let Some(other) = self.batch.get(field) else {
                    return false;
                };
                match self.measure(kind) {
                    Some((measured, kind)) => kind
                        .measure(other)
                        .is_some_and(|theirs| holds(*relation, measured, theirs)),
                    None => false,
                }
            }
        }
    }

    /// Batch value of another field, null when absent
    fn other(&self, field: &str) -> &FieldValue {
        self.batch.get(field).unwrap_or(&FieldValue::Null)
    }

    /// Present means in the batch and not empty
    fn is_present(&self, field: &str) -> bool {
        self.batch.get(field).is_some_and(|value| {
            classify(field, value, self.options.min_file_size)
                .map(|c| !c.is_empty)
                .unwrap_or(true)
        })
    }

    fn measure(&self, kind: &KindSpec) -> Option<(f64, ValueKind)> {
        let kind = kind.resolve(self.value_type())?;
        kind.measure(self.value).map(|measured| (measured, kind))
    }

    fn date_relation(&self, text: Option<&str>, other: &str, expected: Ordering) -> bool {
        match (text.and_then(parse_datetime), parse_datetime(other)) {
            (Some(value), Some(other)) => value.cmp(&other) == expected,
            _ => false,
        }
    }

    fn violation(&self, rule: &str, rule_text: &str, message: Option<String>) -> ValidationError {
        let rendered = self.value.to_string();
        let message = message.unwrap_or_else(|| {
            let reason = match self.options.reasons.get(rule) {
                Some(reason) => Cow::Borrowed(reason.as_str()),
                None => Cow::Owned(format!("does not satisfy the rule `{}`", rule_text)),
            };
            format!("The field `{}` with value {}: {}", self.field, rendered, reason)
        });

        debug!(field = %self.field, rule = %rule, "rule failed");
        RuleViolation::new(self.field, message)
            .with_rule(rule, rule_text)
            .with_value(rendered)
            .into()
    }
}

/// Counted kinds compare against whole numbers
fn bounds(kind: ValueKind, min: f64, max: f64) -> (f64, f64) {
    if kind.is_count() {
        (min.trunc(), max.trunc())
    } else {
        (min, max)
    }
}
