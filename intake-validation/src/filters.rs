//! Named single-value filters
//!
//! A filter is a regular expression or a closure registered under a name.
//! [`FilterRegistry::matches`] checks one value against a registered name or,
//! when the name is unknown, against the argument compiled as a pattern.

use crate::errors::{Result, ValidationError};
use crate::rules::compile_pattern;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Rule name reported for filter errors
pub const FILTER_RULE: &str = "filter";

static BUILTIN_FILTERS: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    [
        ("email", r"^[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)*@[A-Za-z0-9_-]+(\.[A-Za-z0-9_-]+)+$"),
        ("url", r"\b(([A-Za-z0-9_-]+://?|www[.])[^\s()<>]+(?:\([A-Za-z0-9_]+\)|([^[:punct:]\s]|/)))"),
        ("int", r"^-?[0-9]+$"),
        ("password", r"^[A-Za-z0-9_]{5,32}$"),
        ("account", r"^[a-zA-Z][a-zA-Z0-9_]{5,16}$"),
        ("id_number", r"^([0-9]{15}|[0-9]{18})$"),
        ("mail", r"^[1-9][0-9]{5}$"),
        ("qq", r"^[1-9][0-9]{4,}$"),
        ("telephone", r"^([0-9]{3}-[0-9]{8}|[0-9]{4}-[0-9]{7})$"),
        ("tel", r"^1[34578][0-9]{9}$"),
        ("string", r"^[A-Za-z0-9_]+$"),
        ("token", r"^[A-Za-z0-9_-]+$"),
        ("sign", r"^[A-Za-z0-9_]{32}$"),
        ("name", r"(?i)^[A-Za-z0-9_\x{4e00}-\x{9fa5}]{2,8}$"),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, Regex::new(pattern).unwrap()))
    .collect()
});

/// A registered filter
#[derive(Clone)]
pub enum FilterRule {
    Pattern(Regex),
    Predicate(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl FilterRule {
    pub fn is_match(&self, value: &str) -> bool {
        match self {
            FilterRule::Pattern(re) => re.is_match(value),
            FilterRule::Predicate(predicate) => predicate(value),
        }
    }
}

impl fmt::Debug for FilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterRule::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            FilterRule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl From<Regex> for FilterRule {
    fn from(re: Regex) -> Self {
        FilterRule::Pattern(re)
    }
}

/// Name → filter registry, seeded with the built-in filters
#[derive(Debug, Clone)]
pub struct FilterRegistry {
    filters: HashMap<String, FilterRule>,
}

impl Default for FilterRegistry {
    fn default() -> Self {
        Self {
            filters: BUILTIN_FILTERS
                .iter()
                .map(|(name, re)| (name.to_string(), FilterRule::Pattern(re.clone())))
                .collect(),
        }
    }
}

impl FilterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry without the built-ins
    pub fn empty() -> Self {
        Self {
            filters: HashMap::new(),
        }
    }

    /// Register a filter; fails if the name is taken.
    pub fn add(&mut self, name: impl Into<String>, rule: impl Into<FilterRule>) -> Result<()> {
        let name = name.into();
        if self.filters.contains_key(&name) {
            return Err(ValidationError::invalid_argument(
                FILTER_RULE,
                format!("filter `{}` already exists", name),
            ));
        }
        self.filters.insert(name, rule.into());
        Ok(())
    }

    /// Register a pattern, written bare or as `/pattern/flags`
    pub fn add_pattern(&mut self, name: impl Into<String>, pattern: &str) -> Result<()> {
        let re = compile_pattern(FILTER_RULE, pattern)?;
        self.add(name, re)
    }

    pub fn add_predicate<F>(&mut self, name: impl Into<String>, predicate: F) -> Result<()>
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.add(name, FilterRule::Predicate(Arc::new(predicate)))
    }

    pub fn has(&self, name: &str) -> bool {
        self.filters.contains_key(name)
    }

    /// Remove a filter; fails if the name is not registered.
    pub fn remove(&mut self, name: &str) -> Result<FilterRule> {
        self.filters.remove(name).ok_or_else(|| {
            ValidationError::invalid_argument(FILTER_RULE, format!("filter `{}` does not exist", name))
        })
    }

    /// Swap the filter registered under an existing name
    pub fn replace(&mut self, name: &str, rule: impl Into<FilterRule>) -> Result<FilterRule> {
        let previous = self.remove(name)?;
        self.filters.insert(name.to_string(), rule.into());
        Ok(previous)
    }

    /// Check `value` against a registered filter, or against
    /// `name_or_pattern` compiled as a pattern when no filter has that name.
    pub fn matches(&self, value: &str, name_or_pattern: &str) -> Result<bool> {
        match self.filters.get(name_or_pattern) {
            Some(rule) => Ok(rule.is_match(value)),
            None => Ok(compile_pattern(FILTER_RULE, name_or_pattern)?.is_match(value)),
        }
    }
}
