//! Rule-string validation for decoded request input
//!
//! Rules are written as pipe-separated text such as `required|between:2,4`
//! and attached to fields through a [`RuleSet`]. A [`Validator`] checks the
//! fields in declaration order, fails on the first broken rule and returns
//! only the declared fields.
//!
//! # Examples
//!
//! ## Rule sets
//!
//! ```
//! use intake_core::field_map;
//! use intake_validation::{RuleSet, ValidationError, Validator};
//!
//! let rules = RuleSet::new()
//!     .rule("email", "required|email")
//!     .rule("password", "required|min:8,string")
//!     .rule("password_confirmation", "same:password")
//!     .field("nickname");
//!
//! let input = field_map([
//!     ("email", "ada@example.com"),
//!     ("password", "correct horse"),
//!     ("password_confirmation", "correct horse"),
//! ]);
//! let output = Validator::new().validate(&rules, &input).unwrap();
//! assert_eq!(output.len(), 4);
//!
//! let input = field_map([("email", "ada@localhost")]);
//! let err = Validator::new().validate(&rules, &input).unwrap_err();
//! assert!(matches!(err, ValidationError::RuleViolation(ref v) if v.rule == "email"));
//! ```
//!
//! ## Predicates
//!
//! ```
//! use intake_core::field_map;
//! use intake_validation::{RuleSet, Validator};
//!
//! let rules = RuleSet::new().predicate("code", |ev, message| {
//!     let ok = ev.value().as_str().is_some_and(|s| s.starts_with("X-"));
//!     if !ok {
//!         *message = Some("codes start with X-".to_string());
//!     }
//!     ok
//! });
//!
//! let err = Validator::new()
//!     .validate(&rules, &field_map([("code", "Y-1")]))
//!     .unwrap_err();
//! assert_eq!(err.to_string(), "codes start with X-");
//! ```
//!
//! ## Filters
//!
//! ```
//! use intake_validation::FilterRegistry;
//!
//! let filters = FilterRegistry::new();
//! assert!(filters.matches("a12345", "account").unwrap());
//! assert!(filters.matches("abc", "/^[a-z]+$/").unwrap());
//! ```

mod classify;
mod dates;
mod errors;
mod evaluator;
mod filters;
mod parser;
mod pipe;
mod relation;
mod resolver;
mod rules;
mod validator;
mod validators;

pub use classify::{classify, is_numeric_str, parse_number, Classification, ValueType};
pub use dates::{matches_format, parse_datetime};
pub use errors::*;
pub use evaluator::{RuleEvaluator, PREDICATE_RULE};
pub use filters::{FilterRegistry, FilterRule, FILTER_RULE};
pub use parser::{parse as parse_rules, parse_invocation, RuleInvocation};
pub use pipe::*;
pub use relation::{holds, KindSpec, Relation, ValueKind};
pub use resolver::{HostResolver, SystemResolver};
pub use rules::{compile_pattern, Rule};
pub use validator::{Predicate, RuleSet, RuleSpec, Validator, ValidatorOptions};
pub use validators::*;
