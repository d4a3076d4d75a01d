// Configuration validation

use crate::{ConfigError, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Configuration validator with rules
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate that a value is not empty
    pub fn not_empty(value: &str, field: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::invalid(field, "cannot be empty"));
        }
        Ok(())
    }

    /// Validate that a number is at least `min`
    pub fn at_least(value: u64, min: u64, field: &str) -> Result<()> {
        if value < min {
            return Err(ConfigError::invalid(field, format!("must be at least {}", min)));
        }
        Ok(())
    }

    /// Validate that a value parses as `T`
    pub fn parses<T>(value: &str, field: &str) -> Result<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(field, e.to_string()))
    }

    /// Parse a boolean written as true/false, yes/no, on/off or 1/0
    pub fn boolean(value: &str, field: &str) -> Result<bool> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            other => Err(ConfigError::invalid(field, format!("`{}` is not a boolean", other))),
        }
    }
}
