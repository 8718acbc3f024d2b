//! Catalog configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default directory holding per-database metadata directories
pub const DEFAULT_METADATA_ROOT: &str = "metadata";
/// Default directory under which `data/<database>` is created
pub const DEFAULT_DATA_ROOT: &str = ".";

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root holding `<escaped database>/<escaped object>.sql` files
    pub metadata_root: PathBuf,
    /// Root holding `data/<escaped database>/`
    pub data_root: PathBuf,
    /// Worker threads used for table attach and startup
    pub max_threads: usize,
    /// fsync rewritten metadata files before they replace the originals
    pub fsync_metadata: bool,
    /// Passed to the storage factory for every attached table
    pub force_restore_data: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            metadata_root: PathBuf::from(DEFAULT_METADATA_ROOT),
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            max_threads: default_max_threads(),
            fsync_metadata: true,
            force_restore_data: false,
        }
    }
}

fn default_max_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl CatalogConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the metadata root
    pub fn metadata_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.metadata_root = path.into();
        self
    }

    /// Set the data root
    pub fn data_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_root = path.into();
        self
    }

    /// Set the worker thread count; zero is raised to one
    pub fn max_threads(mut self, threads: usize) -> Self {
        self.max_threads = threads.max(1);
        self
    }

    pub fn fsync_metadata(mut self, fsync: bool) -> Self {
        self.fsync_metadata = fsync;
        self
    }

    pub fn force_restore_data(mut self, force: bool) -> Self {
        self.force_restore_data = force;
        self
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config: CatalogConfig = serde_json::from_str(&json)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty-printed JSON
    pub fn save_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.max_threads == 0 {
            return Err(Error::Config("max_threads must be at least 1".to_string()));
        }
        Ok(())
    }
}
