// Configuration file loaders

use crate::{ConfigError, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Supported configuration file formats
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileFormat {
    Json,
    Toml,
    Env,
}

impl FileFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "toml" => Some(FileFormat::Toml),
            "env" => Some(FileFormat::Env),
            _ => None,
        }
    }

    /// Detect the format of `path`; a bare `.env` file name counts as env.
    pub fn detect(path: &Path) -> Result<Self> {
        if path.file_name().and_then(|n| n.to_str()) == Some(".env") {
            return Ok(FileFormat::Env);
        }

        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ConfigError::LoadError("No file extension found".to_string()))?;

        FileFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::LoadError(format!("Unsupported format: {}", ext)))
    }
}

/// Configuration file loader
pub struct ConfigLoader {
    format: FileFormat,
}

impl ConfigLoader {
    pub fn new(format: FileFormat) -> Self {
        Self { format }
    }

    /// Auto-detect format from file extension
    pub fn auto(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(FileFormat::detect(path.as_ref())?))
    }

    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Load configuration from file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<Value> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("Failed to read file: {}", e)))?;

        self.parse(&content)
    }

    /// Parse configuration from string
    pub fn parse(&self, content: &str) -> Result<Value> {
        match self.format {
            FileFormat::Json => self.parse_json(content),
            FileFormat::Toml => self.parse_toml(content),
            FileFormat::Env => self.parse_env(content),
        }
    }

    fn parse_json(&self, content: &str) -> Result<Value> {
        serde_json::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("JSON parse error: {}", e)))
    }

    fn parse_toml(&self, content: &str) -> Result<Value> {
        let toml_value: toml::Value = toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(format!("TOML parse error: {}", e)))?;

        serde_json::to_value(toml_value)
            .map_err(|e| ConfigError::ParseError(format!("TOML to JSON conversion error: {}", e)))
    }

    /// Flat object of `KEY = value` pairs, parsed by `dotenvy`
    fn parse_env(&self, content: &str) -> Result<Value> {
        let mut map = serde_json::Map::new();

        for item in dotenvy::from_read_iter(content.as_bytes()) {
            let (key, value) =
                item.map_err(|e| ConfigError::ParseError(format!("Env parse error: {}", e)))?;
            map.insert(key, Value::String(value));
        }

        Ok(Value::Object(map))
    }
}
