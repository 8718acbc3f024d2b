//! Attaches scanned definitions to a catalog
//!
//! Tables are attached in parallel on a worker pool, then started. Only then
//! is the catalog registered as a dictionary source and are dictionaries
//! attached one by one in file order.

use super::definition::{ObjectDefinition, ObjectKind};
use super::escape::escape_for_file_name;
use super::progress::ProgressCounters;
use super::registry::CatalogRegistry;
use super::scanner::MetadataFiles;
use super::startup::StartupCoordinator;
use crate::context::Context;
use crate::dictionary::DictionarySource;
use crate::error::{Error, Result};
use crate::pool::{FirstError, WorkerPool};
use crate::sql::ast::CreateTableStatement;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Objects attached by one load
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub tables: usize,
    pub dictionaries: usize,
}

/// `<database data path>/<escaped table name>/`
pub fn table_data_path(database_data_path: &Path, table: &str) -> PathBuf {
    database_data_path.join(escape_for_file_name(table))
}

pub struct ObjectLoader<'a> {
    database: &'a str,
    data_path: &'a Path,
    registry: &'a Arc<CatalogRegistry>,
}

impl<'a> ObjectLoader<'a> {
    pub fn new(database: &'a str, data_path: &'a Path, registry: &'a Arc<CatalogRegistry>) -> Self {
        Self {
            database,
            data_path,
            registry,
        }
    }

    /// Attach every definition. Stops at the first failed pass; tables
    /// attached before a failure stay registered.
    pub fn load(&self, files: MetadataFiles, pool: &dyn WorkerPool, context: &Context) -> Result<LoadSummary> {
        let (dictionaries, tables): (Vec<_>, Vec<_>) =
            files.into_values().partition(ObjectDefinition::is_dictionary);

        info!(
            database = self.database,
            "Total {} tables and {} dictionaries.",
            tables.len(),
            dictionaries.len()
        );

        self.attach_tables(tables, pool, context)?;

        StartupCoordinator::new(self.database, self.registry).startup(pool)?;

        let source: Arc<dyn DictionarySource> = self.registry.clone();
        context.dictionaries().add_source(self.database, source);

        self.attach_dictionaries(dictionaries, context)?;

        Ok(LoadSummary {
            tables: self.registry.table_count(),
            dictionaries: self.registry.dictionary_count(),
        })
    }

    fn attach_tables(&self, tables: Vec<ObjectDefinition>, pool: &dyn WorkerPool, context: &Context) -> Result<()> {
        let progress = Arc::new(ProgressCounters::new("tables", tables.len()));
        let first_error = Arc::new(FirstError::new());
        let force_restore = context.config().force_restore_data;

        for definition in tables {
            let ObjectDefinition {
                name,
                raw_statement,
                kind,
            } = definition;
            let statement = match kind {
                ObjectKind::Table(statement) => statement,
                ObjectKind::Dictionary(_) => continue,
            };

            let registry = self.registry.clone();
            let data_path = table_data_path(self.data_path, &name);
            let context = context.clone();
            let progress = progress.clone();
            let slot = first_error.clone();

            let scheduled = pool.schedule(Box::new(move || {
                match attach_table(&registry, &statement, &raw_statement, &data_path, &context, force_restore) {
                    Ok(()) => {
                        progress.report();
                    }
                    Err(source) => {
                        slot.set(Error::AttachTable {
                            name,
                            query: raw_statement,
                            source: Box::new(source),
                        });
                    }
                }
                Ok(())
            }));

            if let Err(error) = scheduled {
                pool.wait()?;
                return Err(first_error.take().unwrap_or(error));
            }
        }

        pool.wait()?;
        first_error.into_result()
    }

    fn attach_dictionaries(&self, dictionaries: Vec<ObjectDefinition>, context: &Context) -> Result<()> {
        let progress = ProgressCounters::new("dictionaries", dictionaries.len());

        for definition in dictionaries {
            let name = definition.name.clone();
            let query = definition.raw_statement.clone();

            attach_dictionary(self.database, self.registry, Arc::new(definition), context).map_err(
                |source| Error::AttachDictionary {
                    name,
                    query,
                    source: Box::new(source),
                },
            )?;
            progress.report();
        }
        Ok(())
    }
}

/// Build a table handle and publish it
pub(crate) fn attach_table(
    registry: &CatalogRegistry,
    statement: &CreateTableStatement,
    query: &str,
    data_path: &Path,
    context: &Context,
    force_restore: bool,
) -> Result<()> {
    let handle = context
        .storage_factory()
        .create(statement, data_path, context, force_restore)?;
    registry.insert_table(&statement.table_name, handle, query)
}

/// Register a dictionary and load it. A dictionary that fails to load is
/// unregistered again.
pub(crate) fn attach_dictionary(
    database: &str,
    registry: &CatalogRegistry,
    definition: Arc<ObjectDefinition>,
    context: &Context,
) -> Result<()> {
    let name = definition.name.clone();
    registry.insert_dictionary(definition)?;

    if let Err(error) = context.dictionaries().load_dictionary(database, &name) {
        warn!(database, dictionary = %name, error = %error, "dictionary failed to load");
        registry.remove_dictionary(&name);
        return Err(error);
    }
    Ok(())
}
