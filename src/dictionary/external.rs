//! Built-in dictionary loader

use super::{DictionaryLoader, DictionarySource};
use crate::error::{Error, Result};
use crate::sql::ast::{CreateDictionaryStatement, Expr, Literal};
use dashmap::DashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

const LAYOUTS: &[&str] = &[
    "flat",
    "hashed",
    "sparse_hashed",
    "cache",
    "range_hashed",
    "direct",
    "complex_key_hashed",
    "complex_key_cache",
    "complex_key_direct",
];

const SOURCES: &[&str] = &[
    "clickhouse",
    "file",
    "http",
    "mysql",
    "postgresql",
    "executable",
    "null",
];

/// A dictionary accepted by [`ExternalDictionaries`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedDictionary {
    pub layout: String,
    pub source: String,
    pub attributes: usize,
}

/// Keeps one definition source per catalog and validates dictionaries
/// against them. Data is never fetched.
#[derive(Default)]
pub struct ExternalDictionaries {
    sources: DashMap<String, Arc<dyn DictionarySource>>,
    loaded: DashMap<(String, String), LoadedDictionary>,
}

impl ExternalDictionaries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_source(&self, catalog: &str) -> bool {
        self.sources.contains_key(catalog)
    }

    pub fn loaded(&self, catalog: &str, name: &str) -> Option<LoadedDictionary> {
        self.loaded
            .get(&(catalog.to_string(), name.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Names of the loaded dictionaries of `catalog`, sorted
    pub fn loaded_names(&self, catalog: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .loaded
            .iter()
            .filter(|entry| entry.key().0 == catalog)
            .map(|entry| entry.key().1.clone())
            .collect();
        names.sort();
        names
    }
}

fn invalid(name: &str, reason: String) -> Error {
    Error::DictionaryError(format!("dictionary '{}': {}", name, reason))
}

/// String value of a source parameter written either quoted or bare
fn param_text(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Literal(Literal::String(s)) => Some(s),
        Expr::Column(column) if column.table.is_none() => Some(&column.column),
        _ => None,
    }
}

fn validate(
    catalog: &str,
    dictionary: &CreateDictionaryStatement,
    source: &dyn DictionarySource,
) -> Result<()> {
    let name = &dictionary.name;
    let layout = dictionary.layout.kind.as_str();

    if !LAYOUTS.contains(&layout) {
        return Err(invalid(name, format!("unknown layout '{}'", layout)));
    }
    if !SOURCES.contains(&dictionary.source.kind.as_str()) {
        return Err(invalid(
            name,
            format!("unknown source '{}'", dictionary.source.kind),
        ));
    }

    let attributes: HashSet<&str> = dictionary
        .attributes
        .iter()
        .map(|a| a.name.as_str())
        .collect();
    if let Some(key) = dictionary
        .primary_key
        .iter()
        .find(|key| !attributes.contains(key.as_str()))
    {
        return Err(invalid(name, format!("primary key '{}' is not an attribute", key)));
    }
    if dictionary.primary_key.len() > 1 && !layout.starts_with("complex_key_") {
        return Err(invalid(
            name,
            format!("layout '{}' needs a single-column key", layout),
        ));
    }
    if (layout == "range_hashed") != dictionary.range.is_some() {
        return Err(invalid(name, "RANGE is required by, and only by, range_hashed".to_string()));
    }
    if let Some(lifetime) = dictionary.lifetime {
        if lifetime.min > lifetime.max {
            return Err(invalid(name, "LIFETIME MIN exceeds MAX".to_string()));
        }
    }

    if dictionary.source.kind == "clickhouse" {
        let table = dictionary.source.param("table").and_then(param_text);
        let db = dictionary.source.param("db").and_then(param_text);
        if let Some(table) = table {
            let local = db.map_or(true, |db| db == catalog);
            if local && !source.has_table(table) {
                return Err(invalid(
                    name,
                    format!("source table '{}' is not attached", table),
                ));
            }
        }
    }

    Ok(())
}

impl DictionaryLoader for ExternalDictionaries {
    fn add_source(&self, catalog: &str, source: Arc<dyn DictionarySource>) {
        debug!(database = catalog, "registering dictionary source");
        self.sources.insert(catalog.to_string(), source);
    }

    fn load_dictionary(&self, catalog: &str, name: &str) -> Result<()> {
        let source = self
            .sources
            .get(catalog)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| Error::UnknownDictionarySource(catalog.to_string()))?;

        let definition = source
            .dictionary_definition(name)
            .ok_or_else(|| Error::DictionaryNotFound(name.to_string()))?;
        let dictionary = definition
            .as_dictionary()
            .ok_or_else(|| Error::DictionaryNotFound(name.to_string()))?;

        validate(catalog, dictionary, source.as_ref())?;

        self.loaded.insert(
            (catalog.to_string(), name.to_string()),
            LoadedDictionary {
                layout: dictionary.layout.kind.clone(),
                source: dictionary.source.kind.clone(),
                attributes: dictionary.attributes.len(),
            },
        );
        info!(database = catalog, dictionary = name, "dictionary loaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ObjectDefinition;
    use std::collections::HashMap;

    #[derive(Default)]
    struct StaticSource {
        tables: Vec<String>,
        dictionaries: HashMap<String, Arc<ObjectDefinition>>,
    }

    impl StaticSource {
        fn with(mut self, sql: &str) -> Self {
            let def = ObjectDefinition::parse(sql).unwrap();
            self.dictionaries.insert(def.name.clone(), Arc::new(def));
            self
        }
    }

    impl DictionarySource for StaticSource {
        fn dictionary_names(&self) -> Vec<String> {
            self.dictionaries.keys().cloned().collect()
        }

        fn dictionary_definition(&self, name: &str) -> Option<Arc<ObjectDefinition>> {
            self.dictionaries.get(name).cloned()
        }

        fn has_table(&self, name: &str) -> bool {
            self.tables.iter().any(|t| t == name)
        }
    }

    fn loader_with(source: StaticSource) -> ExternalDictionaries {
        let loader = ExternalDictionaries::new();
        loader.add_source("default", Arc::new(source));
        loader
    }

    #[test]
    fn test_load_without_source() {
        let loader = ExternalDictionaries::new();
        assert!(matches!(
            loader.load_dictionary("default", "d"),
            Err(Error::UnknownDictionarySource(_))
        ));
    }

    #[test]
    fn test_load_valid_dictionary() {
        let loader = loader_with(StaticSource::default().with(
            "ATTACH DICTIONARY regions (id UInt64, name String) PRIMARY KEY id \
             SOURCE(FILE(path '/data/regions.tsv' format 'TabSeparated')) LAYOUT(FLAT()) LIFETIME(300)",
        ));

        loader.load_dictionary("default", "regions").unwrap();
        let loaded = loader.loaded("default", "regions").unwrap();
        assert_eq!(loaded.layout, "flat");
        assert_eq!(loaded.source, "file");
        assert_eq!(loader.loaded_names("default"), vec!["regions".to_string()]);
        assert!(matches!(
            loader.load_dictionary("default", "missing"),
            Err(Error::DictionaryNotFound(_))
        ));
    }

    #[test]
    fn test_local_source_table_must_be_attached() {
        let sql = "ATTACH DICTIONARY d (id UInt64) PRIMARY KEY id \
                   SOURCE(CLICKHOUSE(TABLE 'src')) LAYOUT(HASHED())";

        let loader = loader_with(StaticSource::default().with(sql));
        assert!(matches!(
            loader.load_dictionary("default", "d"),
            Err(Error::DictionaryError(_))
        ));

        let mut source = StaticSource::default().with(sql);
        source.tables.push("src".to_string());
        let loader = loader_with(source);
        assert!(loader.load_dictionary("default", "d").is_ok());
    }

    #[test]
    fn test_foreign_database_is_not_checked() {
        let loader = loader_with(StaticSource::default().with(
            "ATTACH DICTIONARY d (id UInt64) PRIMARY KEY id \
             SOURCE(CLICKHOUSE(DB 'other' TABLE 'src')) LAYOUT(HASHED())",
        ));
        assert!(loader.load_dictionary("default", "d").is_ok());
    }

    #[test]
    fn test_layout_rules() {
        let loader = loader_with(
            StaticSource::default()
                .with("ATTACH DICTIONARY unknown (id UInt64) PRIMARY KEY id SOURCE(NULL()) LAYOUT(TRIE())")
                .with("ATTACH DICTIONARY composite (a UInt64, b String) PRIMARY KEY a, b SOURCE(NULL()) LAYOUT(HASHED())")
                .with("ATTACH DICTIONARY ranged (id UInt64) PRIMARY KEY id SOURCE(NULL()) LAYOUT(RANGE_HASHED())")
                .with("ATTACH DICTIONARY keyless (id UInt64) PRIMARY KEY other SOURCE(NULL()) LAYOUT(FLAT())")
                .with("ATTACH DICTIONARY complex (a UInt64, b String) PRIMARY KEY a, b SOURCE(NULL()) LAYOUT(COMPLEX_KEY_HASHED())"),
        );

        for name in ["unknown", "composite", "ranged", "keyless"] {
            assert!(
                matches!(loader.load_dictionary("default", name), Err(Error::DictionaryError(_))),
                "{} should be rejected",
                name
            );
        }
        assert!(loader.load_dictionary("default", "complex").is_ok());
    }
}
