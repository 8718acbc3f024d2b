//! Definition language: lexer, parser, AST and canonical formatting

pub mod ast;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod token;

pub use ast::Statement;
pub use formatter::{metadata_text, quote_identifier};
pub use parser::{parse_expression, parse_statement, Parser};
