//! Application configuration loaded from an optional TOML file.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Default `env_logger` filter, overridden by `RUST_LOG`.
    pub log_filter: String,
    /// User to act as when none is given on the command line.
    pub user_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("db.sqlite3"),
            log_filter: "info".to_string(),
            user_id: "local".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Loads `path` when given, otherwise falls back to the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
