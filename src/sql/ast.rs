//! Definition language Abstract Syntax Tree (AST)
//!
//! This module defines the AST nodes for table and dictionary definitions.

use crate::catalog::DataType;
use indexmap::IndexMap;

/// A metadata statement
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// CREATE TABLE / ATTACH TABLE
    CreateTable(CreateTableStatement),
    /// CREATE DICTIONARY / ATTACH DICTIONARY
    CreateDictionary(CreateDictionaryStatement),
}

impl Statement {
    /// Name of the defined object
    pub fn name(&self) -> &str {
        match self {
            Statement::CreateTable(stmt) => &stmt.table_name,
            Statement::CreateDictionary(stmt) => &stmt.name,
        }
    }
}

/// CREATE TABLE statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStatement {
    /// ATTACH rather than CREATE
    pub attach: bool,
    /// IF NOT EXISTS flag
    pub if_not_exists: bool,
    /// Table name
    pub table_name: String,
    /// Column definitions
    pub columns: Vec<ColumnDef>,
    /// Data skipping indices
    pub indices: Vec<IndexDef>,
    /// CHECK constraints
    pub constraints: Vec<ConstraintDef>,
    /// ENGINE and the clauses that follow it
    pub storage: StorageDef,
}

/// Column definition
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Column name
    pub name: String,
    /// Data type
    pub data_type: DataType,
    /// DEFAULT / MATERIALIZED / ALIAS expression
    pub default: Option<ColumnDefault>,
    /// COMMENT text
    pub comment: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            default: None,
            comment: None,
        }
    }

    /// Set a DEFAULT expression
    pub fn default(mut self, expr: Expr) -> Self {
        self.default = Some(ColumnDefault {
            kind: DefaultKind::Default,
            expr,
        });
        self
    }

    /// Set a comment
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// How a column obtains its value when not written explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    Default,
    Materialized,
    Alias,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefault {
    pub kind: DefaultKind,
    pub expr: Expr,
}

/// INDEX name expr TYPE type GRANULARITY n
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDef {
    pub name: String,
    pub expr: Expr,
    pub index_type: Expr,
    pub granularity: u64,
}

/// CONSTRAINT name CHECK expr
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDef {
    pub name: String,
    pub check: Expr,
}

/// ENGINE = Name(args) and the storage clauses
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StorageDef {
    pub engine: EngineDef,
    pub partition_by: Option<Expr>,
    pub primary_key: Option<Expr>,
    pub order_by: Option<Expr>,
    pub sample_by: Option<Expr>,
    pub ttl: Option<Expr>,
    pub settings: Option<Settings>,
}

/// Table engine reference
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineDef {
    /// Engine name, e.g. `MergeTree`
    pub name: String,
    /// Engine arguments; `None` when written without parentheses
    pub args: Option<Vec<Expr>>,
}

/// Ordered SETTINGS name = value pairs
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings(pub IndexMap<String, Literal>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a setting, keeping the position of an existing one
    pub fn set(mut self, name: impl Into<String>, value: Literal) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Literal> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Literal)> {
        self.0.iter()
    }
}

/// CREATE DICTIONARY statement
#[derive(Debug, Clone, PartialEq)]
pub struct CreateDictionaryStatement {
    pub attach: bool,
    pub if_not_exists: bool,
    pub name: String,
    pub attributes: Vec<DictionaryAttribute>,
    /// PRIMARY KEY columns
    pub primary_key: Vec<String>,
    pub source: DictionaryClause,
    pub layout: DictionaryClause,
    pub lifetime: Option<Lifetime>,
    pub range: Option<DictionaryRange>,
}

/// Dictionary attribute declaration
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryAttribute {
    pub name: String,
    pub data_type: DataType,
    pub default: Option<Expr>,
    pub expression: Option<Expr>,
    pub hierarchical: bool,
    pub injective: bool,
}

/// SOURCE(kind(key value ...)) and LAYOUT(kind(key value ...))
#[derive(Debug, Clone, PartialEq)]
pub struct DictionaryClause {
    /// Lower-cased kind, e.g. `clickhouse` or `hashed`
    pub kind: String,
    /// Parameters in declaration order
    pub params: Vec<(String, Expr)>,
}

impl DictionaryClause {
    /// Look up a parameter by case-insensitive key
    pub fn param(&self, key: &str) -> Option<&Expr> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }
}

/// LIFETIME(MIN n MAX m), refresh window in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    pub min: u64,
    pub max: u64,
}

/// RANGE(MIN start MAX end)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryRange {
    pub min: String,
    pub max: String,
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference
    Column(ColumnRef),
    /// Literal value
    Literal(Literal),
    /// Binary operation
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// Unary operation
    UnaryOp { op: UnaryOperator, expr: Box<Expr> },
    /// Function call
    Function { name: String, args: Vec<Expr> },
    /// (a, b, ...)
    Tuple(Vec<Expr>),
    /// [a, b, ...]
    Array(Vec<Expr>),
    /// INTERVAL n UNIT
    Interval { value: Box<Expr>, unit: String },
}

impl Expr {
    /// Column reference without a qualifier
    pub fn column(name: impl Into<String>) -> Self {
        Expr::Column(ColumnRef::from(name.into()))
    }

    pub fn function(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Function {
            name: name.into(),
            args,
        }
    }

    pub fn integer(value: i64) -> Self {
        Expr::Literal(Literal::Integer(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expr::Literal(Literal::String(value.into()))
    }
}

/// Column reference
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnRef {
    /// Qualifier (optional)
    pub table: Option<String>,
    /// Column name
    pub column: String,
}

impl From<String> for ColumnRef {
    fn from(column: String) -> Self {
        Self {
            table: None,
            column,
        }
    }
}

/// Literal value
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// NULL
    Null,
    /// Boolean
    Boolean(bool),
    /// Integer
    Integer(i64),
    /// Integer above `i64::MAX`, e.g. a `UInt64` default
    UnsignedInteger(u64),
    /// Float
    Float(f64),
    /// String
    String(String),
}

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOperator {
    // Comparison
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    // Logical
    And,
    Or,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // String
    Concat,
}

impl BinaryOperator {
    /// Get the precedence of this operator (higher = binds tighter)
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Eq
            | BinaryOperator::Neq
            | BinaryOperator::Lt
            | BinaryOperator::Gt
            | BinaryOperator::Lte
            | BinaryOperator::Gte => 3,
            BinaryOperator::Add | BinaryOperator::Sub | BinaryOperator::Concat => 4,
            BinaryOperator::Mul | BinaryOperator::Div | BinaryOperator::Mod => 5,
        }
    }
}

/// Unary operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOperator {
    /// NOT
    Not,
    /// - (negation)
    Minus,
}
