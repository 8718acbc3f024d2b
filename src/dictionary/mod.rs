//! Dictionary loading seam
//!
//! A catalog registers itself as a [`DictionarySource`] with the
//! [`DictionaryLoader`] before its dictionaries are attached; the loader
//! then resolves each dictionary's definition through that source.

mod external;

pub use external::{ExternalDictionaries, LoadedDictionary};

use crate::catalog::ObjectDefinition;
use crate::error::Result;
use std::sync::Arc;

/// Provides dictionary definitions of one catalog
pub trait DictionarySource: Send + Sync {
    fn dictionary_names(&self) -> Vec<String>;

    fn dictionary_definition(&self, name: &str) -> Option<Arc<ObjectDefinition>>;

    /// Whether a table of this name is attached in the same catalog
    fn has_table(&self, name: &str) -> bool;
}

/// Loads dictionaries from registered sources
pub trait DictionaryLoader: Send + Sync {
    /// Register (or replace) the source for `catalog`
    fn add_source(&self, catalog: &str, source: Arc<dyn DictionarySource>);

    fn load_dictionary(&self, catalog: &str, name: &str) -> Result<()>;
}
