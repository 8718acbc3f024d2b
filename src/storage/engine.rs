//! Built-in table engines
//!
//! [`EngineFactory`] checks that a definition is valid for its engine and
//! builds a [`TableStorage`] for it.

use super::table::TableStorage;
use super::{StorageFactory, StorageHandle};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::sql::ast::{CreateTableStatement, Expr, StorageDef};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Engine families known to the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineKind {
    /// `MergeTree` and its `Replacing`/`Summing`/... variants
    MergeTree,
    Memory,
    Log,
    TinyLog,
    StripeLog,
}

const MERGE_TREE_FAMILY: &[&str] = &[
    "MergeTree",
    "ReplacingMergeTree",
    "SummingMergeTree",
    "AggregatingMergeTree",
    "CollapsingMergeTree",
    "VersionedCollapsingMergeTree",
    "GraphiteMergeTree",
];

impl EngineKind {
    /// Resolve an engine name; names are case-sensitive
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "Memory" => Ok(EngineKind::Memory),
            "Log" => Ok(EngineKind::Log),
            "TinyLog" => Ok(EngineKind::TinyLog),
            "StripeLog" => Ok(EngineKind::StripeLog),
            _ if MERGE_TREE_FAMILY.contains(&name) => Ok(EngineKind::MergeTree),
            _ => Err(Error::UnknownEngine(name.to_string())),
        }
    }

    /// Whether tables of this engine keep files under their data path
    pub fn is_persistent(&self) -> bool {
        !matches!(self, EngineKind::Memory)
    }
}

/// Default [`StorageFactory`]
#[derive(Debug, Default, Clone)]
pub struct EngineFactory;

impl EngineFactory {
    pub fn new() -> Self {
        Self
    }

    fn validate(&self, definition: &CreateTableStatement, kind: EngineKind) -> Result<()> {
        let mut names = HashSet::with_capacity(definition.columns.len());
        for column in &definition.columns {
            if !names.insert(column.name.as_str()) {
                return Err(Error::StorageError(format!(
                    "column '{}' is declared more than once in table '{}'",
                    column.name, definition.table_name
                )));
            }
        }

        let storage = &definition.storage;
        match kind {
            EngineKind::MergeTree => validate_merge_tree(&definition.table_name, storage),
            _ => validate_simple(&definition.table_name, storage),
        }
    }
}

fn validate_merge_tree(table: &str, storage: &StorageDef) -> Result<()> {
    match (&storage.primary_key, &storage.order_by) {
        (None, None) => Err(Error::StorageError(format!(
            "table '{}' with engine {} needs ORDER BY or PRIMARY KEY",
            table, storage.engine.name
        ))),
        (Some(primary_key), Some(order_by)) => {
            let primary_key = key_columns(primary_key);
            let order_by = key_columns(order_by);
            if primary_key.len() > order_by.len() || order_by[..primary_key.len()] != primary_key[..] {
                return Err(Error::StorageError(format!(
                    "primary key of table '{}' must be a prefix of its sorting key",
                    table
                )));
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

fn validate_simple(table: &str, storage: &StorageDef) -> Result<()> {
    let clauses = [
        ("PARTITION BY", storage.partition_by.is_some()),
        ("PRIMARY KEY", storage.primary_key.is_some()),
        ("ORDER BY", storage.order_by.is_some()),
        ("SAMPLE BY", storage.sample_by.is_some()),
        ("TTL", storage.ttl.is_some()),
        ("SETTINGS", storage.settings.is_some()),
    ];
    if let Some((clause, _)) = clauses.iter().find(|(_, present)| *present) {
        return Err(Error::StorageError(format!(
            "engine {} of table '{}' does not support {}",
            storage.engine.name, table, clause
        )));
    }

    if storage.engine.args.as_ref().map_or(false, |args| !args.is_empty()) {
        return Err(Error::StorageError(format!(
            "engine {} of table '{}' takes no arguments",
            storage.engine.name, table
        )));
    }
    Ok(())
}

/// Elements of a key expression: a tuple lists them, anything else is a
/// single-element key.
fn key_columns(expr: &Expr) -> &[Expr] {
    match expr {
        Expr::Tuple(items) => items,
        Expr::Function { name, args } if name.eq_ignore_ascii_case("tuple") => args,
        single => std::slice::from_ref(single),
    }
}

impl StorageFactory for EngineFactory {
    fn create(
        &self,
        definition: &CreateTableStatement,
        data_path: &Path,
        _context: &Context,
        force_restore: bool,
    ) -> Result<Arc<dyn StorageHandle>> {
        let kind = EngineKind::from_name(&definition.storage.engine.name)?;
        self.validate(definition, kind)?;

        debug!(
            table = %definition.table_name,
            engine = %definition.storage.engine.name,
            data_path = %data_path.display(),
            "creating table handle"
        );

        Ok(Arc::new(TableStorage::new(
            definition.table_name.clone(),
            definition.storage.engine.name.clone(),
            kind,
            definition.columns.clone(),
            data_path,
            force_restore,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::ast::Statement;
    use crate::sql::parse_statement;

    fn create(sql: &str) -> Result<Arc<dyn StorageHandle>> {
        let stmt = match parse_statement(sql).unwrap() {
            Statement::CreateTable(stmt) => stmt,
            other => panic!("expected table, got {:?}", other),
        };
        EngineFactory::new().create(&stmt, Path::new("/tmp/unused"), &Context::default(), false)
    }

    #[test]
    fn test_merge_tree_family() {
        let table = create("CREATE TABLE t (a UInt8, b String) ENGINE = ReplacingMergeTree(a) ORDER BY (a, b)").unwrap();
        assert_eq!(table.name(), "t");
        assert_eq!(table.engine(), "ReplacingMergeTree");
        assert!(!table.is_started());
    }

    #[test]
    fn test_merge_tree_requires_key() {
        assert!(matches!(
            create("CREATE TABLE t (a UInt8) ENGINE = MergeTree()"),
            Err(Error::StorageError(_))
        ));
        assert!(create("CREATE TABLE t (a UInt8) ENGINE = MergeTree() PRIMARY KEY a").is_ok());
    }

    #[test]
    fn test_primary_key_prefix_of_order_by() {
        assert!(create(
            "CREATE TABLE t (a UInt8, b UInt8) ENGINE = MergeTree() PRIMARY KEY a ORDER BY (a, b)"
        )
        .is_ok());
        assert!(matches!(
            create("CREATE TABLE t (a UInt8, b UInt8) ENGINE = MergeTree() PRIMARY KEY b ORDER BY (a, b)"),
            Err(Error::StorageError(_))
        ));
        assert!(matches!(
            create("CREATE TABLE t (a UInt8, b UInt8) ENGINE = MergeTree() PRIMARY KEY (a, b) ORDER BY a"),
            Err(Error::StorageError(_))
        ));
    }

    #[test]
    fn test_simple_engines_reject_clauses() {
        assert!(create("CREATE TABLE t (a UInt8) ENGINE = TinyLog").is_ok());
        assert!(matches!(
            create("CREATE TABLE t (a UInt8) ENGINE = Log ORDER BY a"),
            Err(Error::StorageError(_))
        ));
        assert!(matches!(
            create("CREATE TABLE t (a UInt8) ENGINE = Memory SETTINGS x = 1"),
            Err(Error::StorageError(_))
        ));
        assert!(matches!(
            create("CREATE TABLE t (a UInt8) ENGINE = StripeLog(1)"),
            Err(Error::StorageError(_))
        ));
    }

    #[test]
    fn test_unknown_engine_and_duplicate_columns() {
        assert!(matches!(
            create("CREATE TABLE t (a UInt8) ENGINE = Kafka"),
            Err(Error::UnknownEngine(_))
        ));
        assert!(matches!(
            create("CREATE TABLE t (a UInt8, a String) ENGINE = Memory"),
            Err(Error::StorageError(_))
        ));
    }
}
