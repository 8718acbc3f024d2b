//! Ordinary database: one metadata directory, one data directory
//!
//! Layout:
//! - `<metadata_root>/<escaped name>/<escaped object>.sql`
//! - `<data_root>/data/<escaped name>/<escaped table>/`

use super::alter::{AlterRequest, SchemaAlterer};
use super::definition::ObjectDefinition;
use super::escape::{escape_for_file_name, metadata_file_name};
use super::loader::{self, LoadSummary, ObjectLoader};
use super::registry::CatalogRegistry;
use super::scanner::MetadataScanner;
use crate::config::CatalogConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::pool::{ThreadPool, WorkerPool};
use crate::storage::StorageHandle;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

#[derive(Debug)]
pub struct OrdinaryDatabase {
    name: String,
    metadata_path: PathBuf,
    data_path: PathBuf,
    registry: Arc<CatalogRegistry>,
}

impl OrdinaryDatabase {
    /// Open a database, creating its data directory
    pub fn new(name: impl Into<String>, config: &CatalogConfig) -> Result<Self> {
        let name = name.into();
        let escaped = escape_for_file_name(&name);
        let metadata_path = config.metadata_root.join(&escaped);
        let data_path = config.data_root.join("data").join(&escaped);

        fs::create_dir_all(&data_path)?;

        Ok(Self {
            name,
            metadata_path,
            data_path,
            registry: Arc::new(CatalogRegistry::new()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn registry(&self) -> &Arc<CatalogRegistry> {
        &self.registry
    }

    /// Attach every object persisted in the metadata directory
    pub fn load_stored_objects(&self, context: &Context) -> Result<LoadSummary> {
        let pool = ThreadPool::new(format!("load-{}", self.name), context.config().max_threads);
        self.load_with_pool(&pool, context)
    }

    /// [`load_stored_objects`](Self::load_stored_objects) on a caller-provided pool
    pub fn load_with_pool(&self, pool: &dyn WorkerPool, context: &Context) -> Result<LoadSummary> {
        let files = MetadataScanner::new(&self.metadata_path).scan()?;
        let summary = ObjectLoader::new(&self.name, &self.data_path, &self.registry)
            .load(files, pool, context)?;

        info!(
            database = %self.name,
            tables = summary.tables,
            dictionaries = summary.dictionaries,
            "database loaded"
        );
        Ok(summary)
    }

    pub fn object_metadata_path(&self, name: &str) -> PathBuf {
        self.metadata_path.join(metadata_file_name(name))
    }

    pub fn table_data_path(&self, name: &str) -> PathBuf {
        loader::table_data_path(&self.data_path, name)
    }

    /// Build and register a table from its definition
    pub fn attach_table(&self, definition: &ObjectDefinition, context: &Context) -> Result<()> {
        let statement = definition
            .as_table()
            .ok_or_else(|| Error::NotATable(definition.name.clone()))?;
        loader::attach_table(
            &self.registry,
            statement,
            &definition.raw_statement,
            &self.table_data_path(&definition.name),
            context,
            context.config().force_restore_data,
        )
    }

    /// Register a dictionary and load it through the context's loader
    pub fn attach_dictionary(&self, definition: ObjectDefinition, context: &Context) -> Result<()> {
        if !definition.is_dictionary() {
            return Err(Error::DictionaryNotFound(definition.name));
        }
        loader::attach_dictionary(&self.name, &self.registry, Arc::new(definition), context)
    }

    /// Rewrite a table's metadata file with a new schema
    pub fn alter_table(&self, context: &Context, request: &AlterRequest) -> Result<()> {
        if self.registry.get_table(&request.table_name).is_none() {
            return Err(if self.registry.get_dictionary(&request.table_name).is_some() {
                Error::NotATable(request.table_name.clone())
            } else {
                Error::TableNotFound(request.table_name.clone())
            });
        }

        SchemaAlterer::new(&self.metadata_path, context.config().fsync_metadata).alter(request)
    }

    pub fn get_table(&self, name: &str) -> Result<Arc<dyn StorageHandle>> {
        self.registry
            .get_table(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    pub fn table_names(&self) -> Vec<String> {
        self.registry.table_names()
    }

    pub fn dictionary_names(&self) -> Vec<String> {
        self.registry.dictionary_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DataType;
    use crate::pool::InlinePool;
    use crate::sql::ast::ColumnDef;

    fn config(root: &Path) -> CatalogConfig {
        CatalogConfig::new()
            .metadata_root(root.join("metadata"))
            .data_root(root)
            .max_threads(2)
    }

    #[test]
    fn test_paths_are_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let db = OrdinaryDatabase::new("my db", &config(dir.path())).unwrap();

        assert!(dir.path().join("data").join("my%20db").is_dir());
        assert_eq!(
            db.object_metadata_path("a.b"),
            dir.path().join("metadata").join("my%20db").join("a%2Eb.sql")
        );
        assert_eq!(
            db.table_data_path("a.b"),
            dir.path().join("data").join("my%20db").join("a%2Eb")
        );
    }

    #[test]
    fn test_load_and_alter() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let db = OrdinaryDatabase::new("default", &config).unwrap();
        fs::create_dir_all(db.metadata_path()).unwrap();
        fs::write(
            db.object_metadata_path("hits"),
            "ATTACH TABLE hits (id UInt64) ENGINE = MergeTree() ORDER BY id",
        )
        .unwrap();

        let context = Context::new(config);
        let summary = db.load_stored_objects(&context).unwrap();
        assert_eq!(summary.tables, 1);
        assert!(db.get_table("hits").unwrap().is_started());

        let request = AlterRequest::new(
            "hits",
            vec![
                ColumnDef::new("id", DataType::UInt64),
                ColumnDef::new("url", DataType::String),
            ],
        );
        db.alter_table(&context, &request).unwrap();
        let text = fs::read_to_string(db.object_metadata_path("hits")).unwrap();
        assert!(text.contains("url String"));

        assert!(matches!(
            db.alter_table(&context, &AlterRequest::new("nope", request.columns.clone())),
            Err(Error::TableNotFound(_))
        ));
    }

    #[test]
    fn test_attach_dictionary_directly() {
        let dir = tempfile::tempdir().unwrap();
        let config = config(dir.path());
        let db = OrdinaryDatabase::new("default", &config).unwrap();
        let context = Context::new(config);
        db.load_with_pool(&InlinePool::new(), &context).unwrap();

        let table = ObjectDefinition::parse("CREATE TABLE src (id UInt64) ENGINE = Log").unwrap();
        db.attach_table(&table, &context).unwrap();

        let dictionary = ObjectDefinition::parse(
            "CREATE DICTIONARY d (id UInt64) PRIMARY KEY id SOURCE(CLICKHOUSE(TABLE 'src')) LAYOUT(FLAT())",
        )
        .unwrap();
        db.attach_dictionary(dictionary.clone(), &context).unwrap();
        assert_eq!(db.dictionary_names(), vec!["d".to_string()]);

        assert!(matches!(
            db.attach_dictionary(dictionary, &context),
            Err(Error::DictionaryAlreadyExists(_))
        ));
        assert!(matches!(
            db.attach_table(&table, &context),
            Err(Error::TableAlreadyExists(_))
        ));
    }
}
