//! Shared collaborators handed to every catalog operation

use crate::config::CatalogConfig;
use crate::dictionary::{DictionaryLoader, ExternalDictionaries};
use crate::storage::{EngineFactory, StorageFactory};
use std::fmt;
use std::sync::Arc;

/// Configuration plus the storage factory and dictionary loader
#[derive(Clone)]
pub struct Context {
    config: Arc<CatalogConfig>,
    storage_factory: Arc<dyn StorageFactory>,
    dictionaries: Arc<dyn DictionaryLoader>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new(CatalogConfig::default())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// Context using the built-in engine factory and dictionary loader
    pub fn new(config: CatalogConfig) -> Self {
        Self {
            config: Arc::new(config),
            storage_factory: Arc::new(EngineFactory::new()),
            dictionaries: Arc::new(ExternalDictionaries::new()),
        }
    }

    pub fn with_storage_factory(mut self, factory: Arc<dyn StorageFactory>) -> Self {
        self.storage_factory = factory;
        self
    }

    pub fn with_dictionaries(mut self, loader: Arc<dyn DictionaryLoader>) -> Self {
        self.dictionaries = loader;
        self
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn storage_factory(&self) -> &Arc<dyn StorageFactory> {
        &self.storage_factory
    }

    pub fn dictionaries(&self) -> &Arc<dyn DictionaryLoader> {
        &self.dictionaries
    }
}
