//! Registry of live catalog objects
//!
//! Tables and dictionaries share one name space held in a single sharded
//! `DashMap`, so the map's entry lock is the only uniqueness check. Table
//! attach tasks insert concurrently; a handle becomes visible only once it
//! is fully constructed.

use super::definition::ObjectDefinition;
use super::escape::metadata_file_name;
use crate::dictionary::DictionarySource;
use crate::error::{Error, Result};
use crate::storage::StorageHandle;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// A table handle together with the statement it was attached from
#[derive(Debug, Clone)]
pub struct AttachedTable {
    pub name: String,
    pub handle: Arc<dyn StorageHandle>,
    pub query: Arc<str>,
}

#[derive(Debug, Clone)]
pub enum CatalogObject {
    Table(AttachedTable),
    Dictionary(Arc<ObjectDefinition>),
}

impl CatalogObject {
    fn already_exists(&self, name: &str) -> Error {
        match self {
            CatalogObject::Table(_) => Error::TableAlreadyExists(name.to_string()),
            CatalogObject::Dictionary(_) => Error::DictionaryAlreadyExists(name.to_string()),
        }
    }
}

#[derive(Debug, Default)]
pub struct CatalogRegistry {
    objects: DashMap<String, CatalogObject>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, name: &str, object: CatalogObject) -> Result<()> {
        match self.objects.entry(name.to_string()) {
            Entry::Occupied(entry) => Err(entry.get().already_exists(name)),
            Entry::Vacant(slot) => {
                slot.insert(object);
                Ok(())
            }
        }
    }

    /// Register a table attached from `query`. Fails if the name is taken by
    /// a table or a dictionary.
    pub fn insert_table(
        &self,
        name: &str,
        handle: Arc<dyn StorageHandle>,
        query: impl Into<Arc<str>>,
    ) -> Result<()> {
        let table = AttachedTable {
            name: name.to_string(),
            handle,
            query: query.into(),
        };
        self.insert(name, CatalogObject::Table(table))
    }

    /// Register a dictionary definition under its name
    pub fn insert_dictionary(&self, definition: Arc<ObjectDefinition>) -> Result<()> {
        let name = definition.name.clone();
        self.insert(&name, CatalogObject::Dictionary(definition))
    }

    pub fn remove_dictionary(&self, name: &str) -> Option<Arc<ObjectDefinition>> {
        match self
            .objects
            .remove_if(name, |_, object| matches!(object, CatalogObject::Dictionary(_)))
        {
            Some((_, CatalogObject::Dictionary(definition))) => Some(definition),
            _ => None,
        }
    }

    pub fn get(&self, name: &str) -> Option<CatalogObject> {
        self.objects.get(name).map(|entry| entry.value().clone())
    }

    pub fn get_table(&self, name: &str) -> Option<Arc<dyn StorageHandle>> {
        match self.objects.get(name)?.value() {
            CatalogObject::Table(table) => Some(table.handle.clone()),
            CatalogObject::Dictionary(_) => None,
        }
    }

    pub fn get_dictionary(&self, name: &str) -> Option<Arc<ObjectDefinition>> {
        match self.objects.get(name)?.value() {
            CatalogObject::Dictionary(definition) => Some(definition.clone()),
            CatalogObject::Table(_) => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Tables in metadata file order
    pub fn tables(&self) -> Vec<AttachedTable> {
        let mut tables: Vec<AttachedTable> = self
            .objects
            .iter()
            .filter_map(|entry| match entry.value() {
                CatalogObject::Table(table) => Some(table.clone()),
                CatalogObject::Dictionary(_) => None,
            })
            .collect();
        tables.sort_by_cached_key(|table| metadata_file_name(&table.name));
        tables
    }

    pub fn table_names(&self) -> Vec<String> {
        self.tables().into_iter().map(|table| table.name).collect()
    }

    /// Dictionary names in metadata file order
    pub fn dictionary_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .objects
            .iter()
            .filter(|entry| matches!(entry.value(), CatalogObject::Dictionary(_)))
            .map(|entry| entry.key().clone())
            .collect();
        names.sort_by_cached_key(|name| metadata_file_name(name));
        names
    }

    pub fn table_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|entry| matches!(entry.value(), CatalogObject::Table(_)))
            .count()
    }

    pub fn dictionary_count(&self) -> usize {
        self.objects.len() - self.table_count()
    }

    /// No tables are registered
    pub fn is_empty(&self) -> bool {
        self.table_count() == 0
    }
}

impl DictionarySource for CatalogRegistry {
    fn dictionary_names(&self) -> Vec<String> {
        CatalogRegistry::dictionary_names(self)
    }

    fn dictionary_definition(&self, name: &str) -> Option<Arc<ObjectDefinition>> {
        self.get_dictionary(name)
    }

    fn has_table(&self, name: &str) -> bool {
        self.get_table(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[derive(Debug)]
    struct Handle {
        name: String,
        started: AtomicBool,
    }

    impl Handle {
        fn new(name: &str) -> Arc<dyn StorageHandle> {
            Arc::new(Self {
                name: name.to_string(),
                started: AtomicBool::new(false),
            })
        }
    }

    impl StorageHandle for Handle {
        fn name(&self) -> &str {
            &self.name
        }

        fn engine(&self) -> &str {
            "Memory"
        }

        fn startup(&self) -> Result<()> {
            self.started.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn is_started(&self) -> bool {
            self.started.load(Ordering::SeqCst)
        }
    }

    fn dictionary(name: &str) -> Arc<ObjectDefinition> {
        let sql = format!(
            "ATTACH DICTIONARY {} (id UInt64) PRIMARY KEY id SOURCE(NULL()) LAYOUT(FLAT())",
            name
        );
        Arc::new(ObjectDefinition::parse(&sql).unwrap())
    }

    #[test]
    fn test_names_are_unique_across_kinds() {
        let registry = CatalogRegistry::new();
        registry.insert_table("hits", Handle::new("hits"), "").unwrap();

        assert!(matches!(
            registry.insert_table("hits", Handle::new("hits"), ""),
            Err(Error::TableAlreadyExists(_))
        ));
        assert!(matches!(
            registry.insert_dictionary(dictionary("hits")),
            Err(Error::TableAlreadyExists(_))
        ));

        registry.insert_dictionary(dictionary("regions")).unwrap();
        assert!(matches!(
            registry.insert_table("regions", Handle::new("regions"), ""),
            Err(Error::DictionaryAlreadyExists(_))
        ));
        assert!(registry.has_table("hits"));
        assert!(!registry.has_table("regions"));
    }

    #[test]
    fn test_tables_sorted_in_file_order() {
        let registry = CatalogRegistry::new();
        for name in ["b", "a b", "a_b", "A"] {
            registry.insert_table(name, Handle::new(name), "").unwrap();
        }
        // "a b" is stored as "a%20b.sql", which sorts before "a_b.sql"
        assert_eq!(registry.table_names(), vec!["A", "a b", "a_b", "b"]);

        // Same order as the files: "x%20y.sql" < "x.sql"
        registry.insert_table("x", Handle::new("x"), "").unwrap();
        registry.insert_table("x y", Handle::new("x y"), "").unwrap();
        assert_eq!(&registry.table_names()[4..], ["x y", "x"]);
    }

    #[test]
    fn test_concurrent_inserts() {
        let registry = Arc::new(CatalogRegistry::new());
        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let name = format!("t_{}_{}", worker, i);
                        registry.insert_table(&name, Handle::new(&name), "").unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(registry.table_count(), 800);
    }

    #[test]
    fn test_concurrent_table_and_dictionary_with_one_name() {
        for round in 0..200 {
            let registry = Arc::new(CatalogRegistry::new());
            let name = format!("x{}", round);

            let tables = {
                let registry = registry.clone();
                let name = name.clone();
                thread::spawn(move || registry.insert_table(&name, Handle::new(&name), "").is_ok())
            };
            let dictionaries = {
                let registry = registry.clone();
                let name = name.clone();
                thread::spawn(move || registry.insert_dictionary(dictionary(&name)).is_ok())
            };

            let inserted = [tables.join().unwrap(), dictionaries.join().unwrap()];
            assert_eq!(inserted.iter().filter(|ok| **ok).count(), 1);
            assert_eq!(registry.table_count() + registry.dictionary_count(), 1);
        }
    }

    #[test]
    fn test_remove_dictionary_leaves_tables() {
        let registry = CatalogRegistry::new();
        registry.insert_table("hits", Handle::new("hits"), "").unwrap();
        registry.insert_dictionary(dictionary("regions")).unwrap();

        assert!(registry.remove_dictionary("hits").is_none());
        assert!(registry.get_table("hits").is_some());
        assert!(registry.remove_dictionary("regions").is_some());
        assert_eq!(registry.dictionary_count(), 0);
    }
}
