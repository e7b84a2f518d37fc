//! On-disk layout for the file-backed store
//!
//! # Directory Structure
//!
//! ```text
//! <root>/
//!   .taskkeep.toml        # Optional configuration
//!   .taskkeep/            # Data directory (configurable via store.dir)
//!     store.json          # Tasks, tags and log entries
//!     store.lock          # Advisory lock held while saving
//! ```

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::config::{StoreConfig, CONFIG_FILE};
use crate::store::StoreResult;

/// Name of the store document inside the data directory
pub const STORE_FILE: &str = "store.json";

/// Name of the lock file inside the data directory
pub const LOCK_FILE: &str = "store.lock";

/// Path manager for taskkeep state
#[derive(Debug, Clone)]
pub struct Storage {
    /// Root directory (where `.taskkeep.toml` lives)
    root: PathBuf,
    /// Data directory holding the store document
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf, data_dir: PathBuf) -> Self {
        Self { root, data_dir }
    }

    /// Storage rooted at `root` with the data directory from `config`
    pub fn for_root(root: PathBuf, config: &StoreConfig) -> Self {
        let data_dir = config.resolve(&root);
        Self::new(root, data_dir)
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    pub fn store_file(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    pub fn lock_file(&self) -> PathBuf {
        self.data_dir.join(LOCK_FILE)
    }

    // =========================================================================
    // Directory initialization
    // =========================================================================

    pub fn init(&self) -> StoreResult<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.store_file().exists()
    }

    // =========================================================================
    // File I/O helpers (atomic writes for safety)
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(data)?;
        self.write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> StoreResult<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    /// Write data atomically using temp file + rename
    ///
    /// Readers see either the previous document or the new one, never a
    /// partial write.
    pub fn write_atomic(&self, path: &Path, data: &[u8]) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension(format!("tmp.{}", std::process::id()));

        let mut file = File::create(&temp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&temp_path, path)?;

        Ok(())
    }
}
