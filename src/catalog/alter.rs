//! Crash-safe rewrite of a table's metadata file
//!
//! The new definition is written to `<file>.tmp`, created exclusively, and
//! renamed over the original. The rename is the only commit point: until it
//! happens the original file is untouched.

use super::definition::ObjectDefinition;
use super::escape::metadata_file_name;
use crate::error::{Error, Result};
use crate::sql::ast::{
    ColumnDef, ConstraintDef, CreateTableStatement, Expr, IndexDef, Settings, Statement,
};
use crate::sql::metadata_text;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// New schema for one table
#[derive(Debug, Clone, PartialEq)]
pub struct AlterRequest {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
    pub indices: Vec<IndexDef>,
    pub constraints: Vec<ConstraintDef>,
    /// Applied only when the table already has a sorting key
    pub order_by: Option<Expr>,
    pub primary_key: Option<Expr>,
    pub ttl: Option<Expr>,
    pub settings: Option<Settings>,
}

impl AlterRequest {
    pub fn new(table_name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            table_name: table_name.into(),
            columns,
            indices: Vec::new(),
            constraints: Vec::new(),
            order_by: None,
            primary_key: None,
            ttl: None,
            settings: None,
        }
    }

    /// Request that turns the table into `statement`, keeping its engine
    pub fn from_statement(statement: &CreateTableStatement) -> Self {
        let storage = &statement.storage;
        Self {
            table_name: statement.table_name.clone(),
            columns: statement.columns.clone(),
            indices: statement.indices.clone(),
            constraints: statement.constraints.clone(),
            order_by: storage.order_by.clone(),
            primary_key: storage.primary_key.clone(),
            ttl: storage.ttl.clone(),
            settings: storage.settings.clone(),
        }
    }

    pub fn indices(mut self, indices: Vec<IndexDef>) -> Self {
        self.indices = indices;
        self
    }

    pub fn constraints(mut self, constraints: Vec<ConstraintDef>) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn order_by(mut self, expr: Expr) -> Self {
        self.order_by = Some(expr);
        self
    }

    pub fn primary_key(mut self, expr: Expr) -> Self {
        self.primary_key = Some(expr);
        self
    }

    pub fn ttl(mut self, expr: Expr) -> Self {
        self.ttl = Some(expr);
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }
}

/// Rewrites metadata files of one database directory
#[derive(Debug, Clone)]
pub struct SchemaAlterer {
    metadata_path: PathBuf,
    fsync_metadata: bool,
}

/// A written temp file waiting to replace the original
#[derive(Debug)]
#[must_use = "the new definition only takes effect on commit"]
pub struct PendingAlter {
    tmp_path: PathBuf,
    target_path: PathBuf,
}

impl SchemaAlterer {
    pub fn new(metadata_path: impl Into<PathBuf>, fsync_metadata: bool) -> Self {
        Self {
            metadata_path: metadata_path.into(),
            fsync_metadata,
        }
    }

    /// Rewrite the table's definition
    pub fn alter(&self, request: &AlterRequest) -> Result<()> {
        self.prepare(request)?.commit()
    }

    /// Write the new definition next to the original without replacing it
    pub fn prepare(&self, request: &AlterRequest) -> Result<PendingAlter> {
        if request.columns.is_empty() {
            return Err(Error::EmptyColumnList(request.table_name.clone()));
        }

        let target_path = self
            .metadata_path
            .join(metadata_file_name(&request.table_name));
        let text = fs::read_to_string(&target_path).map_err(|e| Error::alter_io(&target_path, e))?;

        let definition = ObjectDefinition::parse(&text).map_err(|source| Error::MetadataParse {
            path: target_path.clone(),
            source: Box::new(source),
        })?;
        let mut statement = definition
            .as_table()
            .cloned()
            .ok_or_else(|| Error::NotATable(request.table_name.clone()))?;

        statement.columns = request.columns.clone();
        statement.indices = request.indices.clone();
        statement.constraints = request.constraints.clone();

        let storage = &mut statement.storage;
        if let Some(order_by) = &request.order_by {
            if storage.order_by.is_some() {
                storage.order_by = Some(order_by.clone());
            } else {
                debug!(table = %request.table_name, "table has no ORDER BY, keeping it that way");
            }
        }
        if let Some(primary_key) = &request.primary_key {
            storage.primary_key = Some(primary_key.clone());
        }
        if let Some(ttl) = &request.ttl {
            storage.ttl = Some(ttl.clone());
        }
        if let Some(settings) = &request.settings {
            storage.settings = Some(settings.clone());
        }

        let text = metadata_text(&Statement::CreateTable(statement));
        let tmp_path = target_path.with_extension("sql.tmp");
        self.write_tmp(&tmp_path, &text)?;

        Ok(PendingAlter {
            tmp_path,
            target_path,
        })
    }

    fn write_tmp(&self, tmp_path: &Path, text: &str) -> Result<()> {
        // Fails if another alter of the same table left or holds a temp file
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(tmp_path)
            .map_err(|e| Error::alter_io(tmp_path, e))?;

        let written = file.write_all(text.as_bytes()).and_then(|()| {
            if self.fsync_metadata {
                file.sync_all()
            } else {
                Ok(())
            }
        });
        drop(file);

        if let Err(e) = written {
            if let Err(remove) = fs::remove_file(tmp_path) {
                warn!(file = %tmp_path.display(), error = %remove, "cannot remove temp metadata file");
            }
            return Err(Error::alter_io(tmp_path, e));
        }
        Ok(())
    }
}

impl PendingAlter {
    pub fn tmp_path(&self) -> &Path {
        &self.tmp_path
    }

    pub fn target_path(&self) -> &Path {
        &self.target_path
    }

    /// Atomically replace the original file
    pub fn commit(self) -> Result<()> {
        if let Err(e) = fs::rename(&self.tmp_path, &self.target_path) {
            if let Err(remove) = fs::remove_file(&self.tmp_path) {
                warn!(file = %self.tmp_path.display(), error = %remove, "cannot remove temp metadata file");
            }
            return Err(Error::alter_io(&self.target_path, e));
        }

        info!(file = %self.target_path.display(), "metadata rewritten");
        Ok(())
    }
}
