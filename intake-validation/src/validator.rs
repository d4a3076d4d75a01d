//! Batch validation over an ordered rule set

use crate::errors::Result;
use crate::evaluator::RuleEvaluator;
use crate::resolver::{HostResolver, SystemResolver};
use indexmap::IndexMap;
use intake_core::{FieldMap, FieldValue};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Caller-supplied check.
///
/// Receives the evaluator for the field being validated and may write a
/// message that replaces the default failure message.
pub type Predicate = Arc<dyn Fn(&RuleEvaluator<'_>, &mut Option<String>) -> bool + Send + Sync>;

/// Rules attached to one field
#[derive(Clone)]
pub enum RuleSpec {
    /// Pipe-separated rule text, e.g. `required|email`
    Rules(String),
    /// A predicate closure
    Predicate(Predicate),
}

impl fmt::Debug for RuleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSpec::Rules(text) => f.debug_tuple("Rules").field(text).finish(),
            RuleSpec::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<&str> for RuleSpec {
    fn from(text: &str) -> Self {
        RuleSpec::Rules(text.to_string())
    }
}

impl From<String> for RuleSpec {
    fn from(text: String) -> Self {
        RuleSpec::Rules(text)
    }
}

/// Ordered field → rules mapping.
///
/// Fields are validated in insertion order, so a rule may only refer to
/// fields declared before it.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    entries: IndexMap<String, RuleSpec>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field with no rules; it is copied into the output as-is.
    pub fn field(self, name: impl Into<String>) -> Self {
        self.rule(name, "")
    }

    pub fn rule(mut self, name: impl Into<String>, rules: impl Into<RuleSpec>) -> Self {
        self.entries.insert(name.into(), rules.into());
        self
    }

    pub fn predicate<F>(mut self, name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&RuleEvaluator<'_>, &mut Option<String>) -> bool + Send + Sync + 'static,
    {
        self.entries
            .insert(name.into(), RuleSpec::Predicate(Arc::new(predicate)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleSpec)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for RuleSet
where
    K: Into<String>,
    V: Into<RuleSpec>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Settings shared by every evaluation in a pass
#[derive(Clone)]
pub struct ValidatorOptions {
    /// Files smaller than this many bytes count as empty
    pub min_file_size: u64,
    /// Fail on unknown rule names instead of skipping them
    pub strict_rules: bool,
    /// Per-rule replacement for the default failure reason
    pub reasons: HashMap<String, String>,
    /// Host lookup for `activeUrl`
    pub resolver: Arc<dyn HostResolver>,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            min_file_size: 1,
            strict_rules: false,
            reasons: HashMap::new(),
            resolver: Arc::new(SystemResolver),
        }
    }
}

impl fmt::Debug for ValidatorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatorOptions")
            .field("min_file_size", &self.min_file_size)
            .field("strict_rules", &self.strict_rules)
            .field("reasons", &self.reasons)
            .finish_non_exhaustive()
    }
}

/// Validates a field map against a [`RuleSet`].
///
/// # Examples
///
/// ```
/// use intake_core::field_map;
/// use intake_validation::{RuleSet, Validator};
///
/// let rules = RuleSet::new()
///     .rule("name", "required|alphaDash")
///     .rule("age", "integer|between:18,99");
/// let input = field_map([("name", "ada_l"), ("age", "36"), ("extra", "x")]);
///
/// let output = Validator::new().validate(&rules, &input).unwrap();
/// assert_eq!(output.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    options: ValidatorOptions,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ValidatorOptions) -> Self {
        Self { options }
    }

    /// Replace the failure reason reported for `rule`
    pub fn with_reason(mut self, rule: impl Into<String>, reason: impl Into<String>) -> Self {
        self.options.reasons.insert(rule.into(), reason.into());
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.options.strict_rules = strict;
        self
    }

    pub fn min_file_size(mut self, bytes: u64) -> Self {
        self.options.min_file_size = bytes;
        self
    }

    pub fn with_resolver(mut self, resolver: impl HostResolver + 'static) -> Self {
        self.options.resolver = Arc::new(resolver);
        self
    }

    pub fn options(&self) -> &ValidatorOptions {
        &self.options
    }

    /// Validate `input` field by field, in rule order.
    ///
    /// A field missing from `input` is validated as the empty string. Each
    /// value that passes is added to the batch the later fields can see, and
    /// the batch is returned. The first failure ends the pass.
    pub fn validate(&self, rules: &RuleSet, input: &FieldMap) -> Result<FieldMap> {
        let missing = FieldValue::String(String::new());
        let mut batch = FieldMap::with_capacity(rules.len());

        for (field, spec) in rules.iter() {
            let value = input.get(field).unwrap_or(&missing);
            {
                let evaluator = RuleEvaluator::new(field, value, &batch, &self.options)?;
                match spec {
                    RuleSpec::Rules(text) => evaluator.apply(text)?,
                    RuleSpec::Predicate(predicate) => evaluator.apply_predicate(predicate)?,
                }
            }
            debug!(field = %field, "field validated");
            batch.insert(field.to_string(), value.clone());
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ValidationError;
    use intake_core::field_map;

    #[test]
    fn test_output_follows_rule_order() {
        let rules = RuleSet::new().rule("b", "required").rule("a", "required");
        let input = field_map([("a", "1"), ("b", "2"), ("c", "3")]);

        let output = Validator::new().validate(&rules, &input).unwrap();
        let keys: Vec<_> = output.keys().map(String::as_str).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn test_missing_field_defaults_to_empty_string() {
        let rules = RuleSet::new().field("nickname");
        let output = Validator::new().validate(&rules, &FieldMap::new()).unwrap();
        assert_eq!(output.get("nickname"), Some(&FieldValue::from("")));
    }

    #[test]
    fn test_later_fields_see_earlier_values() {
        let rules = RuleSet::new()
            .rule("password", "required")
            .rule("password_confirmation", "same:password");

        let ok = field_map([("password", "secret"), ("password_confirmation", "secret")]);
        assert!(Validator::new().validate(&rules, &ok).is_ok());

        // Reversed order: the referenced field is not in the batch yet.
        let reversed = RuleSet::new()
            .rule("password_confirmation", "same:password")
            .rule("password", "required");
        assert!(Validator::new().validate(&reversed, &ok).is_err());
    }

    #[test]
    fn test_fail_fast() {
        let rules = RuleSet::new().rule("a", "email").rule("b", "required");
        let input = field_map([("a", "nope")]);

        let err = Validator::new().validate(&rules, &input).unwrap_err();
        assert_eq!(err.violation().unwrap().field, "a");
    }

    #[test]
    fn test_from_iterator() {
        let rules: RuleSet = [("a", "required"), ("b", "")].into_iter().collect();
        assert_eq!(rules.len(), 2);
        assert!(!rules.is_empty());
    }

    #[test]
    fn test_builder_options() {
        let validator = Validator::new()
            .strict(true)
            .min_file_size(10)
            .with_reason("email", "bad address");
        assert!(validator.options().strict_rules);
        assert_eq!(validator.options().min_file_size, 10);

        let rules = RuleSet::new().rule("a", "bogus");
        let err = validator.validate(&rules, &field_map([("a", "x")])).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownRule { .. }));
    }
}
