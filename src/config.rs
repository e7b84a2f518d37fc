//! Configuration loading and management
//!
//! Handles parsing of `.taskkeep.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::retention::{DEFAULT_ACTIVE_DAYS, DEFAULT_ARCHIVE_THROUGH_DAYS};

/// Name of the configuration file at the data root
pub const CONFIG_FILE: &str = ".taskkeep.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Retention tier boundaries
    #[serde(default)]
    pub retention: RetentionConfig,

    /// Defaults for the completion queries
    #[serde(default)]
    pub queries: QueryConfig,

    /// Store location
    #[serde(default)]
    pub store: StoreConfig,
}

/// Retention tier boundaries, in whole days since completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Last age (inclusive) at which a completed task stays live
    #[serde(default = "default_active_days")]
    pub active_days: u32,

    /// Last age (inclusive) at which a task is archived instead of purged;
    /// log entries older than this are pruned
    #[serde(default = "default_archive_through_days")]
    pub archive_through_days: u32,
}

fn default_active_days() -> u32 {
    DEFAULT_ACTIVE_DAYS
}

fn default_archive_through_days() -> u32 {
    DEFAULT_ARCHIVE_THROUGH_DAYS
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            active_days: default_active_days(),
            archive_through_days: default_archive_through_days(),
        }
    }
}

/// Query defaults used by the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Window for `recent`
    #[serde(default = "default_recent_days")]
    pub recent_days: u32,

    /// Window for `search`
    #[serde(default = "default_search_days")]
    pub search_days: u32,
}

fn default_recent_days() -> u32 {
    7
}

fn default_search_days() -> u32 {
    365
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            recent_days: default_recent_days(),
            search_days: default_search_days(),
        }
    }
}

/// Store location configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Data directory, relative to the root
    #[serde(default = "default_store_dir")]
    pub dir: String,
}

fn default_store_dir() -> String {
    ".taskkeep".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dir: default_store_dir(),
        }
    }
}

impl StoreConfig {
    pub fn resolve(&self, root: &Path) -> PathBuf {
        root.join(self.dir.trim())
    }
}

impl Config {
    /// Load configuration from a `.taskkeep.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the data root, or return defaults
    pub fn load_from_root(root: &Path) -> Self {
        let config_path = root.join(CONFIG_FILE);
        if config_path.exists() {
            match Self::load(&config_path) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!(
                        path = %config_path.display(),
                        error = %err,
                        "ignoring invalid config, using defaults"
                    );
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> crate::error::Result<()> {
        crate::retention::RetentionPolicy::from_config(&self.retention)?;
        self.queries.validate()?;
        self.store.validate()?;
        Ok(())
    }
}

impl QueryConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.recent_days == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "queries.recent_days must be >= 1".to_string(),
            ));
        }
        if self.search_days == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "queries.search_days must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl StoreConfig {
    fn validate(&self) -> crate::error::Result<()> {
        if self.dir.trim().is_empty() {
            return Err(crate::error::Error::InvalidConfig(
                "store.dir cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
