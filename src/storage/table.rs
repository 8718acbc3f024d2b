//! Table handle produced by the built-in engine factory

use super::engine::EngineKind;
use super::StorageHandle;
use crate::error::{Error, Result};
use crate::sql::ast::ColumnDef;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A table whose data lives under its own directory
#[derive(Debug)]
pub struct TableStorage {
    name: String,
    engine_name: String,
    kind: EngineKind,
    columns: Vec<ColumnDef>,
    data_path: PathBuf,
    force_restore: bool,
    started: AtomicBool,
}

impl TableStorage {
    pub fn new(
        name: impl Into<String>,
        engine_name: impl Into<String>,
        kind: EngineKind,
        columns: Vec<ColumnDef>,
        data_path: impl Into<PathBuf>,
        force_restore: bool,
    ) -> Self {
        Self {
            name: name.into(),
            engine_name: engine_name.into(),
            kind,
            columns,
            data_path: data_path.into(),
            force_restore,
            started: AtomicBool::new(false),
        }
    }

    pub fn kind(&self) -> EngineKind {
        self.kind
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Whether the table was attached with `force_restore_data`
    pub fn force_restore(&self) -> bool {
        self.force_restore
    }
}

impl StorageHandle for TableStorage {
    fn name(&self) -> &str {
        &self.name
    }

    fn engine(&self) -> &str {
        &self.engine_name
    }

    fn startup(&self) -> Result<()> {
        if self.started.load(Ordering::SeqCst) {
            return Err(Error::StorageError(format!(
                "table '{}' is already started",
                self.name
            )));
        }

        if self.kind.is_persistent() {
            fs::create_dir_all(&self.data_path)?;
        }
        self.started.store(true, Ordering::SeqCst);

        debug!(table = %self.name, engine = %self.engine_name, "table started");
        Ok(())
    }

    fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DataType;

    #[test]
    fn test_startup_creates_data_directory() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("hits");
        let table = TableStorage::new(
            "hits",
            "MergeTree",
            EngineKind::MergeTree,
            vec![ColumnDef::new("id", DataType::UInt64)],
            &data_path,
            false,
        );

        assert!(!table.is_started());
        table.startup().unwrap();
        assert!(table.is_started());
        assert!(data_path.is_dir());

        // A second startup is a bug in the caller
        assert!(matches!(table.startup(), Err(Error::StorageError(_))));
    }

    #[test]
    fn test_memory_table_has_no_directory() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("scratch");
        let table = TableStorage::new(
            "scratch",
            "Memory",
            EngineKind::Memory,
            vec![ColumnDef::new("id", DataType::UInt64)],
            &data_path,
            true,
        );

        table.startup().unwrap();
        assert!(!data_path.exists());
        assert!(table.force_restore());
    }
}
