//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use std::path::Path;

/// Connection string keys that may carry the schema to scaffold.
const SCHEMA_KEYS: &[&str] = &[
    "schema",
    "current schema",
    "currentschema",
    "searchpath",
    "search path",
    "default schema",
];

impl Config {
    /// Load configuration from a YAML (or JSON) file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }
}

impl SourceConfig {
    /// Schema named by a key of the configured connection string, if any.
    ///
    /// Keys are matched case-insensitively. The first non-empty match wins.
    pub fn schema_from_connection_string(&self) -> Option<String> {
        let conn = self.connection_string.as_deref()?;
        conn.split(';').find_map(|part| {
            let (key, value) = part.split_once('=')?;
            let key = key.trim().to_lowercase();
            let value = value.trim();
            (SCHEMA_KEYS.contains(&key.as_str()) && !value.is_empty()).then(|| value.to_string())
        })
    }
}
