//! Catalog module
//!
//! Discovery of persisted object definitions, their attachment to a live
//! registry, table startup and metadata rewrites.

pub mod alter;
pub mod database;
pub mod definition;
pub mod escape;
pub mod loader;
pub mod progress;
pub mod registry;
pub mod scanner;
pub mod startup;
pub mod types;

pub use alter::{AlterRequest, PendingAlter, SchemaAlterer};
pub use database::OrdinaryDatabase;
pub use definition::{ObjectDefinition, ObjectKind};
pub use escape::{escape_for_file_name, metadata_file_name, unescape_for_file_name};
pub use loader::{LoadSummary, ObjectLoader};
pub use progress::ProgressCounters;
pub use registry::CatalogRegistry;
pub use scanner::{MetadataFiles, MetadataScanner};
pub use startup::StartupCoordinator;
pub use types::{DataType, TupleType};
