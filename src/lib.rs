//! ArcDB catalog - on-disk object catalog for the ArcDB engine
//!
//! This library provides:
//! - A definition language (lexer, parser, AST, canonical formatter)
//! - Metadata scanning and bounded-parallel table attach and startup
//! - Dictionary attachment through a pluggable loader
//! - Crash-safe rewriting of table metadata on ALTER

pub mod catalog;
pub mod config;
pub mod context;
pub mod dictionary;
pub mod error;
pub mod pool;
pub mod sql;
pub mod storage;

pub use catalog::{AlterRequest, OrdinaryDatabase};
pub use config::CatalogConfig;
pub use context::Context;
pub use error::{Error, Result};
