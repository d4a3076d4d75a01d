// Configuration management for intake

pub mod env;
pub mod error;
pub mod loader;
pub mod validation;

pub use env::{ENV_PREFIX, EnvLoader};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat};
pub use validation::{ConfigValidator, Validate};

use intake_core::logging::{LogConfig, LogFormat, LogLevel};
use intake_storage::{LocalStorage, LocalStorageConfig, UploadedFileRegistry};
use intake_validation::{Validator, ValidatorOptions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Settings for the validation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationSettings {
    /// Fail on unknown rule names instead of skipping them
    pub strict_rules: bool,
    /// Files below this many bytes count as empty
    pub min_file_size: u64,
    /// Rule name → failure reason
    pub reasons: HashMap<String, String>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            strict_rules: false,
            min_file_size: 1,
            reasons: HashMap::new(),
        }
    }
}

/// Settings for upload persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub directory: PathBuf,
    pub dated_directories: bool,
    pub max_file_size: Option<u64>,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("storage/upload"),
            dated_directories: true,
            max_file_size: None,
        }
    }
}

/// Settings for log output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub level: String,
    pub format: String,
    pub filter: Option<String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
            filter: None,
        }
    }
}

/// Complete intake configuration.
///
/// Every setting is optional. Values come from a JSON, TOML or `.env` file
/// and are then overridden by `INTAKE_`-prefixed environment variables.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    pub validation: ValidationSettings,
    pub uploads: UploadSettings,
    pub log: LogSettings,
}

impl IntakeConfig {
    /// Load from a file, detecting the format from its name
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let loader = ConfigLoader::auto(path)?;
        let value = loader.load_file(path)?;

        let config = match loader.format() {
            FileFormat::Env => {
                let pairs = value
                    .as_object()
                    .into_iter()
                    .flatten()
                    .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())));
                let mut config = Self::default();
                config.apply_env(&EnvLoader::default().filter(pairs))?;
                config
            }
            _ => serde_json::from_value(value)
                .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env(&EnvLoader::default().load()?)?;
        config.validate()?;
        Ok(config)
    }

    /// Load an optional file, then overlay the environment.
    ///
    /// With `dotenv` set, a `.env` file in the working directory is read
    /// into the environment first; a missing `.env` is not an error.
    pub fn load(path: Option<&Path>, dotenv: bool) -> Result<Self> {
        if dotenv {
            dotenvy::dotenv().ok();
        }

        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(&EnvLoader::default().load()?)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides keyed without the `INTAKE_` prefix, lowercased
    pub fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<()> {
        for (key, value) in vars {
            match key.as_str() {
                "strict_rules" => {
                    self.validation.strict_rules = ConfigValidator::boolean(value, "INTAKE_STRICT_RULES")?
                }
                "min_file_size" => {
                    self.validation.min_file_size = ConfigValidator::parses(value, "INTAKE_MIN_FILE_SIZE")?
                }
                "upload_dir" => self.uploads.directory = PathBuf::from(value),
                "dated_directories" => {
                    self.uploads.dated_directories =
                        ConfigValidator::boolean(value, "INTAKE_DATED_DIRECTORIES")?
                }
                "max_file_size" => {
                    self.uploads.max_file_size = if value.trim().is_empty() {
                        None
                    } else {
                        Some(ConfigValidator::parses(value, "INTAKE_MAX_FILE_SIZE")?)
                    }
                }
                "log_level" => self.log.level = value.clone(),
                "log_format" => self.log.format = value.clone(),
                "log_filter" => self.log.filter = Some(value.clone()),
                _ => {}
            }
        }
        Ok(())
    }

    /// Validator configured from the validation settings
    pub fn validator(&self) -> Validator {
        Validator::with_options(ValidatorOptions {
            min_file_size: self.validation.min_file_size,
            strict_rules: self.validation.strict_rules,
            reasons: self.validation.reasons.clone(),
            ..ValidatorOptions::default()
        })
    }

    /// Local storage rooted at the upload directory
    pub fn local_storage(&self) -> Result<LocalStorage> {
        let config = LocalStorageConfig::new(&self.uploads.directory)
            .with_dated_directories(self.uploads.dated_directories);
        LocalStorage::new(config).map_err(|e| ConfigError::invalid("uploads.directory", e.to_string()))
    }

    /// Empty upload registry enforcing the size limit
    pub fn registry(&self) -> UploadedFileRegistry {
        UploadedFileRegistry::new().with_max_file_size(self.uploads.max_file_size)
    }

    /// Log configuration from the log settings
    pub fn log_config(&self) -> Result<LogConfig> {
        let level: LogLevel = ConfigValidator::parses(&self.log.level, "log.level")?;
        let format: LogFormat = ConfigValidator::parses(&self.log.format, "log.format")?;

        let mut config = LogConfig::default().level(level).format(format);
        if let Some(filter) = &self.log.filter {
            config = config.with_env_filter(filter.clone());
        }
        Ok(config)
    }
}

impl Validate for IntakeConfig {
    fn validate(&self) -> Result<()> {
        ConfigValidator::not_empty(&self.uploads.directory.to_string_lossy(), "uploads.directory")?;
        ConfigValidator::parses::<LogLevel>(&self.log.level, "log.level")?;
        ConfigValidator::parses::<LogFormat>(&self.log.format, "log.format")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let config = IntakeConfig::default();
        assert!(!config.validation.strict_rules);
        assert_eq!(config.validation.min_file_size, 1);
        assert_eq!(config.uploads.directory, PathBuf::from("storage/upload"));
        assert!(config.uploads.dated_directories);
        assert_eq!(config.uploads.max_file_size, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_env() {
        let mut config = IntakeConfig::default();
        config
            .apply_env(&vars(&[
                ("strict_rules", "yes"),
                ("min_file_size", "16"),
                ("upload_dir", "/srv/uploads"),
                ("dated_directories", "off"),
                ("max_file_size", "1048576"),
                ("log_level", "debug"),
                ("unrelated", "x"),
            ]))
            .unwrap();

        assert!(config.validation.strict_rules);
        assert_eq!(config.validation.min_file_size, 16);
        assert_eq!(config.uploads.directory, PathBuf::from("/srv/uploads"));
        assert!(!config.uploads.dated_directories);
        assert_eq!(config.uploads.max_file_size, Some(1_048_576));
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_malformed_env_values() {
        let mut config = IntakeConfig::default();
        let err = config.apply_env(&vars(&[("min_file_size", "big")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "INTAKE_MIN_FILE_SIZE"));

        assert!(config.apply_env(&vars(&[("strict_rules", "maybe")])).is_err());
    }

    #[test]
    fn test_validator_from_settings() {
        let mut config = IntakeConfig::default();
        config.validation.strict_rules = true;
        config.validation.min_file_size = 8;
        config
            .validation
            .reasons
            .insert("email".to_string(), "bad address".to_string());

        let validator = config.validator();
        assert!(validator.options().strict_rules);
        assert_eq!(validator.options().min_file_size, 8);
        assert_eq!(
            validator.options().reasons.get("email").map(String::as_str),
            Some("bad address")
        );
    }

    #[test]
    fn test_log_config() {
        let mut config = IntakeConfig::default();
        assert!(config.log_config().is_ok());

        config.log.level = "loud".to_string();
        assert!(config.log_config().is_err());
        assert!(config.validate().is_err());
    }
}
