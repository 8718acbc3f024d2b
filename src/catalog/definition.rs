//! Parsed object definitions

use crate::error::Result;
use crate::sql::ast::{CreateDictionaryStatement, CreateTableStatement, Statement};
use crate::sql::{metadata_text, parse_statement};

/// What a metadata file defines
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectKind {
    Table(CreateTableStatement),
    Dictionary(CreateDictionaryStatement),
}

/// One persisted object: its name, the text it was parsed from and the
/// parsed statement. Read-only once parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDefinition {
    pub name: String,
    pub raw_statement: String,
    pub kind: ObjectKind,
}

impl ObjectDefinition {
    /// Parse definition text
    pub fn parse(text: &str) -> Result<Self> {
        let statement = parse_statement(text)?;
        Ok(Self::from_statement(statement, text.to_string()))
    }

    pub fn from_statement(statement: Statement, raw_statement: String) -> Self {
        let name = statement.name().to_string();
        let kind = match statement {
            Statement::CreateTable(stmt) => ObjectKind::Table(stmt),
            Statement::CreateDictionary(stmt) => ObjectKind::Dictionary(stmt),
        };
        Self {
            name,
            raw_statement,
            kind,
        }
    }

    pub fn is_dictionary(&self) -> bool {
        matches!(self.kind, ObjectKind::Dictionary(_))
    }

    pub fn as_table(&self) -> Option<&CreateTableStatement> {
        match &self.kind {
            ObjectKind::Table(stmt) => Some(stmt),
            ObjectKind::Dictionary(_) => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&CreateDictionaryStatement> {
        match &self.kind {
            ObjectKind::Dictionary(stmt) => Some(stmt),
            ObjectKind::Table(_) => None,
        }
    }

    /// The parsed statement
    pub fn statement(&self) -> Statement {
        match &self.kind {
            ObjectKind::Table(stmt) => Statement::CreateTable(stmt.clone()),
            ObjectKind::Dictionary(stmt) => Statement::CreateDictionary(stmt.clone()),
        }
    }

    /// Canonical `ATTACH ...` text as written to a metadata file
    pub fn to_metadata_text(&self) -> String {
        metadata_text(&self.statement())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_table_definition() {
        let text = "CREATE TABLE hits (id UInt64) ENGINE = Memory";
        let def = ObjectDefinition::parse(text).unwrap();

        assert_eq!(def.name, "hits");
        assert_eq!(def.raw_statement, text);
        assert!(!def.is_dictionary());
        assert!(def.as_table().is_some());
        assert_eq!(
            def.to_metadata_text(),
            "ATTACH TABLE hits\n(\n    id UInt64\n)\nENGINE = Memory\n"
        );
    }

    #[test]
    fn test_parse_dictionary_definition() {
        let def = ObjectDefinition::parse(
            "ATTACH DICTIONARY d (id UInt64) PRIMARY KEY id SOURCE(NULL()) LAYOUT(FLAT())",
        )
        .unwrap();

        assert!(def.is_dictionary());
        assert!(def.as_table().is_none());
        assert_eq!(def.as_dictionary().map(|d| d.layout.kind.as_str()), Some("flat"));
    }
}
