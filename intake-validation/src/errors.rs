// Validation errors

use std::fmt;
use thiserror::Error;

/// Result type for validation
pub type Result<T> = std::result::Result<T, ValidationError>;

/// A field value that failed one of its rules
#[derive(Debug, Clone, PartialEq)]
pub struct RuleViolation {
    /// Field name that failed validation
    pub field: String,

    /// Rule name that failed, e.g. `between`
    pub rule: String,

    /// Full rule text, e.g. `between:2,4`
    pub rule_text: String,

    /// Error message
    pub message: String,

    /// Rendered value that failed validation (optional)
    pub value: Option<String>,
}

impl RuleViolation {
    /// Create a new violation for a field
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: "custom".to_string(),
            rule_text: "custom".to_string(),
            message: message.into(),
            value: None,
        }
    }

    /// Set the rule name and text
    pub fn with_rule(mut self, rule: impl Into<String>, rule_text: impl Into<String>) -> Self {
        self.rule = rule.into();
        self.rule_text = rule_text.into();
        self
    }

    /// Set the invalid value
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Everything validation can fail with.
///
/// Only [`ValidationError::RuleViolation`] is user feedback; the other
/// variants point at a malformed rule set or input map.
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("{0}")]
    RuleViolation(RuleViolation),

    #[error("Value {value} of field `{field}` has no recognized type")]
    UnrecognizedType { field: String, value: String },

    #[error("Invalid argument for rule `{rule}`: {reason}")]
    InvalidArgument { rule: String, reason: String },

    #[error("Unknown rule `{rule}` on field `{field}`")]
    UnknownRule { field: String, rule: String },
}

impl ValidationError {
    /// Shorthand for an `InvalidArgument` error
    pub fn invalid_argument(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidArgument {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status for transports: 422 for violations, 500 for programming errors
    pub fn status_code(&self) -> u16 {
        match self {
            ValidationError::RuleViolation(_) => 422,
            _ => 500,
        }
    }

    /// The violation, if this is user feedback
    pub fn violation(&self) -> Option<&RuleViolation> {
        match self {
            ValidationError::RuleViolation(violation) => Some(violation),
            _ => None,
        }
    }

    /// Convert to JSON representation
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ValidationError::RuleViolation(v) => serde_json::json!({
                "error": "rule_violation",
                "field": v.field,
                "rule": v.rule,
                "rule_text": v.rule_text,
                "message": v.message,
                "value": v.value,
            }),
            ValidationError::UnrecognizedType { field, value } => serde_json::json!({
                "error": "unrecognized_type",
                "field": field,
                "value": value,
            }),
            ValidationError::InvalidArgument { rule, reason } => serde_json::json!({
                "error": "invalid_argument",
                "rule": rule,
                "message": reason,
            }),
            ValidationError::UnknownRule { field, rule } => serde_json::json!({
                "error": "unknown_rule",
                "field": field,
                "rule": rule,
            }),
        }
    }
}

impl From<RuleViolation> for ValidationError {
    fn from(violation: RuleViolation) -> Self {
        ValidationError::RuleViolation(violation)
    }
}

impl From<ValidationError> for intake_core::Error {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::RuleViolation(violation) => {
                intake_core::Error::UnprocessableEntity(violation.message)
            }
            other => intake_core::Error::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_builder() {
        let violation = RuleViolation::new("age", "too small")
            .with_rule("min", "min:18")
            .with_value("\"12\"");

        assert_eq!(violation.rule, "min");
        assert_eq!(violation.rule_text, "min:18");
        assert_eq!(violation.value.as_deref(), Some("\"12\""));
        assert_eq!(violation.to_string(), "too small");
    }

    #[test]
    fn test_status_codes() {
        let violation: ValidationError = RuleViolation::new("a", "b").into();
        assert_eq!(violation.status_code(), 422);
        assert!(violation.violation().is_some());

        let bad = ValidationError::invalid_argument("compare", "unknown operator `~`");
        assert_eq!(bad.status_code(), 500);
        assert!(bad.violation().is_none());
    }

    #[test]
    fn test_to_json() {
        let error: ValidationError = RuleViolation::new("email", "not an email")
            .with_rule("email", "email")
            .into();
        let json = error.to_json();

        assert_eq!(json["error"], "rule_violation");
        assert_eq!(json["field"], "email");
        assert_eq!(json["value"], serde_json::Value::Null);
    }

    #[test]
    fn test_into_core_error() {
        let error: intake_core::Error = ValidationError::from(RuleViolation::new("a", "msg")).into();
        assert_eq!(error.status_code(), 422);

        let error: intake_core::Error = ValidationError::UnknownRule {
            field: "a".into(),
            rule: "nope".into(),
        }
        .into();
        assert_eq!(error.status_code(), 500);
    }
}
