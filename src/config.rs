//! Catalog configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, CatalogResult};

/// Settings for the embedded store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Filesystem path of the sled database.
    pub storage_path: PathBuf,
    /// When set, the store lives in a temporary location and is discarded
    /// on close. Used by tests and scratch tooling.
    #[serde(default)]
    pub temporary: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("catalog_db"),
            temporary: false,
        }
    }
}

impl CatalogConfig {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Self {
            storage_path: storage_path.into(),
            temporary: false,
        }
    }

    /// A throwaway store, discarded on close.
    pub fn ephemeral() -> Self {
        Self {
            storage_path: PathBuf::new(),
            temporary: true,
        }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| CatalogError::Config(e.to_string()))
    }
}
