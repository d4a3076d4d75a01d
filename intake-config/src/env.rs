// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;

/// Prefix of every environment key the settings read
pub const ENV_PREFIX: &str = "INTAKE";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all environment variables, keyed without the prefix and lowercased
    pub fn load(&self) -> Result<HashMap<String, String>> {
        Ok(self.filter(env::vars()))
    }

    /// Apply the prefix filter to arbitrary key/value pairs
    pub fn filter<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = HashMap::new();

        for (key, value) in vars {
            match &self.prefix {
                Some(prefix) => {
                    if let Some(rest) = key.strip_prefix(prefix.as_str())
                        && let Some(trimmed_key) = rest.strip_prefix('_')
                    {
                        config.insert(trimmed_key.to_lowercase(), value);
                    }
                }
                None => {
                    config.insert(key.to_lowercase(), value);
                }
            }
        }

        config
    }

    /// Load a specific environment variable
    pub fn load_var(&self, key: &str) -> Result<String> {
        let full_key = if let Some(ref prefix) = self.prefix {
            format!("{}_{}", prefix, key.to_uppercase())
        } else {
            key.to_uppercase()
        };

        env::var(&full_key).map_err(ConfigError::EnvError)
    }

    /// Load with default value
    pub fn load_var_or(&self, key: &str, default: &str) -> String {
        self.load_var(key).unwrap_or_else(|_| default.to_string())
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(ENV_PREFIX.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // std::env::set_var is unsafe, so the prefix logic is tested through
    // `filter` instead of the live environment.

    #[test]
    fn test_env_loader_with_default() {
        let loader = EnvLoader::new(None);
        let value = loader.load_var_or("NONEXISTENT_VAR_12345", "default");

        assert_eq!(value, "default");
    }

    #[test]
    fn test_env_loader_missing_var() {
        let loader = EnvLoader::default();
        let result = loader.load_var("MISSING_VAR_67890");

        assert!(matches!(result, Err(ConfigError::EnvError(_))));
    }

    #[test]
    fn test_prefix_filter() {
        let loader = EnvLoader::default();
        let vars = loader.filter([
            ("INTAKE_LOG_LEVEL".to_string(), "debug".to_string()),
            ("INTAKEX_OTHER".to_string(), "x".to_string()),
            ("PATH".to_string(), "/bin".to_string()),
        ]);

        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("log_level").map(String::as_str), Some("debug"));
    }

    #[test]
    fn test_no_prefix_keeps_everything() {
        let loader = EnvLoader::new(None);
        let vars = loader.filter([("PATH".to_string(), "/bin".to_string())]);
        assert_eq!(vars.get("path").map(String::as_str), Some("/bin"));
    }
}
