//! Error types for the ArcDB catalog
//!
//! This module defines all error types used by metadata scanning, object
//! attachment, table startup and metadata alteration.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the catalog
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lexer Errors ==========
    #[error("Lexer error: unexpected character '{0}' at position {1}")]
    UnexpectedCharacter(char, usize),

    #[error("Lexer error: unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("Lexer error: unterminated quoted identifier starting at position {0}")]
    UnterminatedIdentifier(usize),

    #[error("Lexer error: invalid number format at position {0}")]
    InvalidNumber(usize),

    // ========== Parser Errors ==========
    #[error("Parse error: unexpected token '{found}', expected {expected}")]
    UnexpectedToken { expected: String, found: String },

    #[error("Parse error: unexpected end of input, expected {0}")]
    UnexpectedEof(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Parse error: table '{0}' declares no columns")]
    EmptyColumnList(String),

    // ========== Type Errors ==========
    #[error("Type error: unknown data type '{0}'")]
    UnknownDataType(String),

    #[error("Type error: Tuple cannot be empty")]
    EmptyTuple,

    #[error("Type error: names are specified not for all elements of Tuple type")]
    PartiallyNamedTuple,

    #[error("Type error: invalid Tuple element name '{0}'")]
    InvalidTupleElementName(String),

    #[error("Type error: names of Tuple elements must be unique, '{0}' is repeated")]
    DuplicateTupleElement(String),

    #[error("Type error: Tuple doesn't have element with name '{0}'")]
    TupleElementNotFound(String),

    // ========== Catalog Errors ==========
    #[error("Catalog error: table '{0}' not found")]
    TableNotFound(String),

    #[error("Catalog error: table '{0}' already exists")]
    TableAlreadyExists(String),

    #[error("Catalog error: dictionary '{0}' not found")]
    DictionaryNotFound(String),

    #[error("Catalog error: dictionary '{0}' already exists")]
    DictionaryAlreadyExists(String),

    #[error("Catalog error: '{0}' is a dictionary, not a table")]
    NotATable(String),

    #[error("Catalog error: no dictionary source registered for catalog '{0}'")]
    UnknownDictionarySource(String),

    // ========== Metadata Errors ==========
    #[error("Cannot parse definition from metadata file {}: {source}", path.display())]
    MetadataParse {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Metadata error: unexpected file {} in metadata directory", .0.display())]
    UnexpectedMetadataFile(PathBuf),

    #[error("Cannot attach table '{name}' from query {query}. Error: {source}")]
    AttachTable {
        name: String,
        query: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Cannot create dictionary '{name}' from query {query}. Error: {source}")]
    AttachDictionary {
        name: String,
        query: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Cannot start up table '{name}' from query {query}. Error: {source}")]
    StartupTable {
        name: String,
        query: String,
        #[source]
        source: Box<Error>,
    },

    // ========== Alter Errors ==========
    #[error("Cannot rewrite metadata file {}: {source}", path.display())]
    AlterIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ========== Storage Errors ==========
    #[error("Storage error: unknown table engine '{0}'")]
    UnknownEngine(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Dictionary error: {0}")]
    DictionaryError(String),

    // ========== Worker Pool Errors ==========
    #[error("Worker pool error: a previously scheduled task failed")]
    WorkerPoolFailed,

    #[error("Worker pool error: task panicked: {0}")]
    WorkerPanicked(String),

    #[error("Worker pool error: cannot start threads: {0}")]
    WorkerPoolBuild(#[from] rayon::ThreadPoolBuildError),

    // ========== Configuration Errors ==========
    #[error("Configuration error: {0}")]
    Config(String),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    // ========== Internal Errors ==========
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is the result of a failed table or dictionary attach,
    /// including a failed table startup.
    pub fn is_attach_error(&self) -> bool {
        matches!(
            self,
            Error::AttachTable { .. } | Error::AttachDictionary { .. } | Error::StartupTable { .. }
        )
    }

    /// Wrap an I/O failure that happened while rewriting `path`.
    pub fn alter_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::AlterIo {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, Error>;
