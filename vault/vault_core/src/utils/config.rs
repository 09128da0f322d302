//! Configuration utilities.
//!
//! Vault reads a small TOML document describing the pool and the log
//! level. Every field has a default, so an empty document is valid.
//!
//! ```
//! use vault_core::utils::config::VaultConfig;
//!
//! let config = VaultConfig::from_toml_str(r#"
//!     log_level = "debug"
//!
//!     [pool]
//!     capacity = 3
//! "#).unwrap();
//!
//! assert_eq!(config.pool.capacity, 3);
//! assert_eq!(config.pool.name, "safety-deposit-boxes");
//! ```

use crate::error::ConfigError;
use crate::utils::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Number of resources a pool may create when nothing else is configured.
pub const DEFAULT_CAPACITY: i64 = 2;

/// Name given to a pool when nothing else is configured.
pub const DEFAULT_POOL_NAME: &str = "safety-deposit-boxes";

/// Configuration for a resource pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Name used in log output and status reports
    pub name: String,

    /// Maximum number of resources the pool will create.
    ///
    /// Zero or negative means no request can ever be satisfied.
    pub capacity: i64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_POOL_NAME.to_string(),
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl PoolConfig {
    /// Default configuration with a different capacity.
    pub fn with_capacity(capacity: i64) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("pool name must not be empty".into()));
        }
        Ok(())
    }
}

/// Top-level Vault configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    /// Minimum level of log records to emit
    pub log_level: LogLevel,

    /// The pool of safety deposit boxes
    pub pool: PoolConfig,
}

impl VaultConfig {
    /// Parse and validate a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pool.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = VaultConfig::from_toml_str("").unwrap();
        assert_eq!(config, VaultConfig::default());
        assert_eq!(config.pool.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn test_negative_capacity_is_accepted() {
        let config = VaultConfig::from_toml_str("[pool]\ncapacity = -1\n").unwrap();
        assert_eq!(config.pool.capacity, -1);
    }

    #[test]
    fn test_blank_name_is_rejected() {
        let err = VaultConfig::from_toml_str("[pool]\nname = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = VaultConfig::from_toml_str("[pool]\ncapacity = \"two\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.toml");
        std::fs::write(&path, "log_level = \"warn\"\n[pool]\ncapacity = 5\n").unwrap();

        let config = VaultConfig::load(&path).unwrap();
        assert_eq!(config.log_level, LogLevel::Warning);
        assert_eq!(config.pool.capacity, 5);

        let missing = VaultConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
