//! Storage engine seam
//!
//! The catalog builds table handles through a [`StorageFactory`] and brings
//! them online through [`StorageHandle::startup`]. [`EngineFactory`] is the
//! built-in factory.

pub mod engine;
pub mod table;

pub use engine::{EngineFactory, EngineKind};
pub use table::TableStorage;

use crate::context::Context;
use crate::error::Result;
use crate::sql::ast::CreateTableStatement;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// A live table. Constructed by a factory, then started exactly once.
pub trait StorageHandle: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Engine name as written in the definition
    fn engine(&self) -> &str;

    /// Bring the table online
    fn startup(&self) -> Result<()>;

    fn is_started(&self) -> bool;
}

/// Builds table handles from parsed definitions
pub trait StorageFactory: Send + Sync {
    fn create(
        &self,
        definition: &CreateTableStatement,
        data_path: &Path,
        context: &Context,
        force_restore: bool,
    ) -> Result<Arc<dyn StorageHandle>>;
}
