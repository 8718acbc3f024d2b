//! Definition language parser
//!
//! This module parses metadata statement tokens into an AST.

use super::ast::*;
use super::lexer::Lexer;
use super::token::{Keyword, Token};
use crate::catalog::types::TupleType;
use crate::catalog::DataType;
use crate::error::{Error, Result};

/// Statement parser
pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    /// Create a new parser from statement text
    pub fn new(sql: &str) -> Result<Self> {
        let mut lexer = Lexer::new(sql);
        let tokens = lexer.tokenize()?;

        Ok(Self {
            tokens,
            position: 0,
        })
    }

    /// Parse exactly one statement, with an optional trailing semicolon
    pub fn parse(&mut self) -> Result<Statement> {
        let stmt = self.parse_statement()?;

        if self.check(&Token::Semicolon) {
            self.advance();
        }

        if !self.is_at_end() {
            return Err(Error::UnexpectedToken {
                expected: "end of statement".to_string(),
                found: format!("{}", self.current()),
            });
        }

        Ok(stmt)
    }

    /// Parse a standalone expression (used for ALTER requests)
    pub fn parse_expression(&mut self) -> Result<Expr> {
        let expr = self.parse_expr()?;
        if !self.is_at_end() {
            return Err(Error::UnexpectedToken {
                expected: "end of expression".to_string(),
                found: format!("{}", self.current()),
            });
        }
        Ok(expr)
    }

    fn parse_statement(&mut self) -> Result<Statement> {
        let attach = if self.check_keyword(Keyword::Attach) {
            self.advance();
            true
        } else if self.check_keyword(Keyword::Create) {
            self.advance();
            false
        } else {
            return Err(Error::UnexpectedToken {
                expected: "CREATE or ATTACH".to_string(),
                found: format!("{}", self.current()),
            });
        };

        if self.check_keyword(Keyword::Table) {
            self.advance();
            self.parse_create_table(attach).map(Statement::CreateTable)
        } else if self.check_keyword(Keyword::Dictionary) {
            self.advance();
            self.parse_create_dictionary(attach)
                .map(Statement::CreateDictionary)
        } else {
            Err(Error::UnexpectedToken {
                expected: "TABLE or DICTIONARY".to_string(),
                found: format!("{}", self.current()),
            })
        }
    }

    fn parse_if_not_exists(&mut self) -> Result<bool> {
        if self.check_keyword(Keyword::If) {
            self.advance();
            self.expect_keyword(Keyword::Not)?;
            self.expect_keyword(Keyword::Exists)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // ========== CREATE TABLE ==========

    fn parse_create_table(&mut self, attach: bool) -> Result<CreateTableStatement> {
        let if_not_exists = self.parse_if_not_exists()?;
        let table_name = self.expect_identifier()?;

        self.expect(&Token::LParen)?;

        let mut columns = Vec::new();
        let mut indices = Vec::new();
        let mut constraints = Vec::new();

        loop {
            // A column may itself be called `index` or `constraint`
            if self.check_keyword(Keyword::Index) {
                match self.try_parse(|p| {
                    p.advance();
                    p.parse_index_def()
                }) {
                    Some(index) => indices.push(index),
                    None => columns.push(self.parse_column_def()?),
                }
            } else if self.check_keyword(Keyword::Constraint) {
                match self.try_parse(|p| {
                    p.advance();
                    p.parse_constraint_def()
                }) {
                    Some(constraint) => constraints.push(constraint),
                    None => columns.push(self.parse_column_def()?),
                }
            } else {
                columns.push(self.parse_column_def()?);
            }

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(&Token::RParen)?;

        if columns.is_empty() {
            return Err(Error::EmptyColumnList(table_name));
        }

        let storage = self.parse_storage()?;

        Ok(CreateTableStatement {
            attach,
            if_not_exists,
            table_name,
            columns,
            indices,
            constraints,
            storage,
        })
    }

    /// Run `parse`, rewinding to the current token if it fails
    fn try_parse<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Option<T> {
        let saved = self.position;
        match parse(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.position = saved;
                None
            }
        }
    }

    fn parse_column_def(&mut self) -> Result<ColumnDef> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;
        let mut column = ColumnDef::new(name, data_type);

        let kind = if self.check_keyword(Keyword::Default) {
            Some(DefaultKind::Default)
        } else if self.check_keyword(Keyword::Materialized) {
            Some(DefaultKind::Materialized)
        } else if self.check_keyword(Keyword::Alias) {
            Some(DefaultKind::Alias)
        } else {
            None
        };
        if let Some(kind) = kind {
            self.advance();
            let expr = self.parse_expr()?;
            column.default = Some(ColumnDefault { kind, expr });
        }

        if self.check_keyword(Keyword::Comment) {
            self.advance();
            column.comment = Some(self.expect_string()?);
        }

        Ok(column)
    }

    fn parse_index_def(&mut self) -> Result<IndexDef> {
        let name = self.expect_identifier()?;
        let expr = self.parse_expr()?;
        self.expect_keyword(Keyword::Type)?;
        let index_type = self.parse_primary_expr()?;
        self.expect_keyword(Keyword::Granularity)?;
        let granularity = self.expect_unsigned()?;

        Ok(IndexDef {
            name,
            expr,
            index_type,
            granularity,
        })
    }

    fn parse_constraint_def(&mut self) -> Result<ConstraintDef> {
        let name = self.expect_identifier()?;
        self.expect_keyword(Keyword::Check)?;
        let check = self.parse_expr()?;
        Ok(ConstraintDef { name, check })
    }

    fn parse_storage(&mut self) -> Result<StorageDef> {
        self.expect_keyword(Keyword::Engine)?;
        if self.check(&Token::Eq) {
            self.advance();
        }

        let mut storage = StorageDef {
            engine: EngineDef {
                name: self.expect_identifier()?,
                args: None,
            },
            ..Default::default()
        };
        if self.check(&Token::LParen) {
            self.advance();
            let args = if self.check(&Token::RParen) {
                Vec::new()
            } else {
                self.parse_expr_list()?
            };
            self.expect(&Token::RParen)?;
            storage.engine.args = Some(args);
        }

        // The clauses may appear in any order, each at most once
        loop {
            let slot = if self.check_keyword(Keyword::Partition) {
                self.advance();
                self.expect_keyword(Keyword::By)?;
                &mut storage.partition_by
            } else if self.check_keyword(Keyword::Primary) {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                &mut storage.primary_key
            } else if self.check_keyword(Keyword::Order) {
                self.advance();
                self.expect_keyword(Keyword::By)?;
                &mut storage.order_by
            } else if self.check_keyword(Keyword::Sample) {
                self.advance();
                self.expect_keyword(Keyword::By)?;
                &mut storage.sample_by
            } else if self.check_keyword(Keyword::Ttl) {
                self.advance();
                &mut storage.ttl
            } else if self.check_keyword(Keyword::Settings) {
                self.advance();
                if storage.settings.is_some() {
                    return Err(Error::ParseError("duplicate SETTINGS clause".to_string()));
                }
                storage.settings = Some(self.parse_settings()?);
                continue;
            } else {
                break;
            };

            if slot.is_some() {
                return Err(Error::ParseError("duplicate storage clause".to_string()));
            }
            let expr = self.parse_expr()?;
            *slot = Some(expr);
        }

        Ok(storage)
    }

    /// `name = literal, ...`
    pub(crate) fn parse_settings(&mut self) -> Result<Settings> {
        let mut settings = Settings::new();
        loop {
            let name = self.expect_identifier()?;
            self.expect(&Token::Eq)?;
            let value = self.parse_literal()?;
            settings.0.insert(name, value);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        Ok(settings)
    }

    // ========== CREATE DICTIONARY ==========

    fn parse_create_dictionary(&mut self, attach: bool) -> Result<CreateDictionaryStatement> {
        let if_not_exists = self.parse_if_not_exists()?;
        let name = self.expect_identifier()?;

        self.expect(&Token::LParen)?;
        let mut attributes = Vec::new();
        loop {
            attributes.push(self.parse_dictionary_attribute()?);
            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&Token::RParen)?;

        let mut primary_key = None;
        let mut source = None;
        let mut layout = None;
        let mut lifetime = None;
        let mut range = None;

        loop {
            if self.check_keyword(Keyword::Primary) {
                self.advance();
                self.expect_keyword(Keyword::Key)?;
                primary_key = Some(self.parse_identifier_list()?);
            } else if self.check_keyword(Keyword::Source) {
                self.advance();
                source = Some(self.parse_dictionary_clause()?);
            } else if self.check_keyword(Keyword::Layout) {
                self.advance();
                layout = Some(self.parse_dictionary_clause()?);
            } else if self.check_keyword(Keyword::Lifetime) {
                self.advance();
                lifetime = Some(self.parse_lifetime()?);
            } else if self.check_keyword(Keyword::Range) {
                self.advance();
                range = Some(self.parse_range()?);
            } else {
                break;
            }
        }

        let missing = |clause: &str| Error::ParseError(format!("dictionary '{}' has no {}", name, clause));
        let primary_key = primary_key.ok_or_else(|| missing("PRIMARY KEY"))?;
        let source = source.ok_or_else(|| missing("SOURCE"))?;
        let layout = layout.ok_or_else(|| missing("LAYOUT"))?;

        Ok(CreateDictionaryStatement {
            attach,
            if_not_exists,
            name,
            attributes,
            primary_key,
            source,
            layout,
            lifetime,
            range,
        })
    }

    fn parse_dictionary_attribute(&mut self) -> Result<DictionaryAttribute> {
        let name = self.expect_identifier()?;
        let data_type = self.parse_data_type()?;
        let mut attribute = DictionaryAttribute {
            name,
            data_type,
            default: None,
            expression: None,
            hierarchical: false,
            injective: false,
        };

        loop {
            if self.check_keyword(Keyword::Default) {
                self.advance();
                attribute.default = Some(self.parse_expr()?);
            } else if self.check_keyword(Keyword::Expression) {
                self.advance();
                attribute.expression = Some(self.parse_expr()?);
            } else if self.check_keyword(Keyword::Hierarchical) {
                self.advance();
                attribute.hierarchical = true;
            } else if self.check_keyword(Keyword::Injective) {
                self.advance();
                attribute.injective = true;
            } else {
                break;
            }
        }

        Ok(attribute)
    }

    /// `(kind(key value key value ...))`
    fn parse_dictionary_clause(&mut self) -> Result<DictionaryClause> {
        self.expect(&Token::LParen)?;
        let kind = self.expect_identifier()?.to_ascii_lowercase();
        self.expect(&Token::LParen)?;

        let mut params = Vec::new();
        while !self.check(&Token::RParen) {
            let key = self.expect_identifier()?;
            let value = self.parse_primary_expr()?;
            params.push((key, value));
            if self.check(&Token::Comma) {
                self.advance();
            }
        }

        self.expect(&Token::RParen)?;
        self.expect(&Token::RParen)?;
        Ok(DictionaryClause { kind, params })
    }

    /// `(n)` or `(MIN n MAX m)` in either order
    fn parse_lifetime(&mut self) -> Result<Lifetime> {
        self.expect(&Token::LParen)?;
        let lifetime = if let Token::IntegerLiteral(_) | Token::UnsignedLiteral(_) = self.current() {
            Lifetime {
                min: 0,
                max: self.expect_unsigned()?,
            }
        } else {
            let (mut min, mut max) = (None, None);
            for _ in 0..2 {
                if self.check_keyword(Keyword::Min) {
                    self.advance();
                    min = Some(self.expect_unsigned()?);
                } else if self.check_keyword(Keyword::Max) {
                    self.advance();
                    max = Some(self.expect_unsigned()?);
                }
            }
            match (min, max) {
                (Some(min), Some(max)) => Lifetime { min, max },
                _ => {
                    return Err(Error::ParseError(
                        "LIFETIME needs both MIN and MAX".to_string(),
                    ))
                }
            }
        };
        self.expect(&Token::RParen)?;
        Ok(lifetime)
    }

    fn parse_range(&mut self) -> Result<DictionaryRange> {
        self.expect(&Token::LParen)?;
        self.expect_keyword(Keyword::Min)?;
        let min = self.expect_identifier()?;
        self.expect_keyword(Keyword::Max)?;
        let max = self.expect_identifier()?;
        self.expect(&Token::RParen)?;
        Ok(DictionaryRange { min, max })
    }

    // ========== Data Types ==========

    fn parse_data_type(&mut self) -> Result<DataType> {
        let name = self.expect_identifier()?;

        match name.to_ascii_lowercase().as_str() {
            "nullable" => {
                self.expect(&Token::LParen)?;
                let inner = self.parse_data_type()?;
                self.expect(&Token::RParen)?;
                Ok(DataType::Nullable(Box::new(inner)))
            }
            "array" => {
                self.expect(&Token::LParen)?;
                let inner = self.parse_data_type()?;
                self.expect(&Token::RParen)?;
                Ok(DataType::Array(Box::new(inner)))
            }
            "tuple" | "nested" => {
                self.expect(&Token::LParen)?;
                let (elements, names) = self.parse_tuple_elements()?;
                self.expect(&Token::RParen)?;
                if name.eq_ignore_ascii_case("nested") {
                    DataType::nested(elements, names)
                } else if names.is_empty() {
                    Ok(DataType::Tuple(TupleType::new(elements)?))
                } else {
                    Ok(DataType::Tuple(TupleType::with_names(elements, names)?))
                }
            }
            "decimal" | "numeric" => {
                self.expect(&Token::LParen)?;
                let precision = self.expect_unsigned()?;
                let scale = if self.check(&Token::Comma) {
                    self.advance();
                    self.expect_unsigned()?
                } else {
                    0
                };
                self.expect(&Token::RParen)?;
                if precision == 0 || precision > 76 || scale > precision {
                    return Err(Error::ParseError(format!(
                        "invalid Decimal({}, {})",
                        precision, scale
                    )));
                }
                Ok(DataType::Decimal(precision as u8, scale as u8))
            }
            "fixedstring" => {
                self.expect(&Token::LParen)?;
                let n = self.expect_unsigned()?;
                self.expect(&Token::RParen)?;
                Ok(DataType::FixedString(n as usize))
            }
            "varchar" | "char" if self.check(&Token::LParen) => {
                // Length is accepted for compatibility and ignored
                self.advance();
                self.expect_unsigned()?;
                self.expect(&Token::RParen)?;
                Ok(DataType::String)
            }
            _ => DataType::from_name(&name),
        }
    }

    /// Elements of `Tuple(...)`: either all `name Type` or all `Type`
    fn parse_tuple_elements(&mut self) -> Result<(Vec<DataType>, Vec<String>)> {
        let mut elements = Vec::new();
        let mut names = Vec::new();

        loop {
            let named = matches!(
                self.peek(),
                Some(Token::Identifier(_)) | Some(Token::QuotedIdentifier(_))
            );
            if named {
                names.push(self.expect_identifier()?);
            }
            elements.push(self.parse_data_type()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        if !names.is_empty() && names.len() != elements.len() {
            return Err(Error::PartiallyNamedTuple);
        }
        Ok((elements, names))
    }

    // ========== Expressions ==========

    pub(crate) fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or_expr()
    }

    fn parse_or_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_and_expr()?;

        while self.check_keyword(Keyword::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Or,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_not_expr()?;

        while self.check_keyword(Keyword::And) {
            self.advance();
            let right = self.parse_not_expr()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::And,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_not_expr(&mut self) -> Result<Expr> {
        if self.check_keyword(Keyword::Not) {
            self.advance();
            let expr = self.parse_not_expr()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Not,
                expr: Box::new(expr),
            });
        }

        self.parse_comparison_expr()
    }

    fn parse_comparison_expr(&mut self) -> Result<Expr> {
        let left = self.parse_additive_expr()?;

        let op = match self.current() {
            Token::Eq => BinaryOperator::Eq,
            Token::Neq => BinaryOperator::Neq,
            Token::Lt => BinaryOperator::Lt,
            Token::Gt => BinaryOperator::Gt,
            Token::Lte => BinaryOperator::Lte,
            Token::Gte => BinaryOperator::Gte,
            _ => return Ok(left),
        };
        self.advance();
        let right = self.parse_additive_expr()?;

        Ok(Expr::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_additive_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_multiplicative_expr()?;

        loop {
            let op = match self.current() {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Sub,
                Token::Concat => BinaryOperator::Concat,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative_expr()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_multiplicative_expr(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary_expr()?;

        loop {
            let op = match self.current() {
                Token::Asterisk => BinaryOperator::Mul,
                Token::Slash => BinaryOperator::Div,
                Token::Percent => BinaryOperator::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_unary_expr()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    fn parse_unary_expr(&mut self) -> Result<Expr> {
        if self.check(&Token::Minus) {
            self.advance();
            // A minus directly before a number is part of the literal
            let negative = match *self.current() {
                Token::IntegerLiteral(n) => Some(Literal::Integer(-n)),
                Token::FloatLiteral(n) => Some(Literal::Float(-n)),
                Token::UnsignedLiteral(n) if n == i64::MIN.unsigned_abs() => {
                    Some(Literal::Integer(i64::MIN))
                }
                _ => None,
            };
            if let Some(literal) = negative {
                self.advance();
                return Ok(Expr::Literal(literal));
            }

            let expr = self.parse_unary_expr()?;
            return Ok(Expr::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(expr),
            });
        }

        self.parse_primary_expr()
    }

    fn parse_primary_expr(&mut self) -> Result<Expr> {
        match self.current().clone() {
            Token::IntegerLiteral(_)
            | Token::UnsignedLiteral(_)
            | Token::FloatLiteral(_)
            | Token::StringLiteral(_) => {
                self.parse_literal().map(Expr::Literal)
            }
            Token::LParen => {
                self.advance();
                let first = self.parse_expr()?;
                if self.check(&Token::RParen) {
                    self.advance();
                    return Ok(first);
                }

                let mut items = vec![first];
                while self.check(&Token::Comma) {
                    self.advance();
                    if self.check(&Token::RParen) {
                        break;
                    }
                    items.push(self.parse_expr()?);
                }
                self.expect(&Token::RParen)?;
                Ok(Expr::Tuple(items))
            }
            Token::LBracket => {
                self.advance();
                let items = if self.check(&Token::RBracket) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                self.expect(&Token::RBracket)?;
                Ok(Expr::Array(items))
            }
            Token::Identifier(word)
                if Keyword::Null.matches(&word)
                    || Keyword::True.matches(&word)
                    || Keyword::False.matches(&word) =>
            {
                self.parse_literal().map(Expr::Literal)
            }
            Token::Identifier(word) if Keyword::Interval.matches(&word) => {
                self.advance();
                let value = self.parse_unary_expr()?;
                let unit = match self.current().clone() {
                    Token::Identifier(unit) => {
                        self.advance();
                        unit.to_ascii_uppercase()
                    }
                    other => {
                        return Err(Error::UnexpectedToken {
                            expected: "interval unit".to_string(),
                            found: format!("{}", other),
                        })
                    }
                };
                Ok(Expr::Interval {
                    value: Box::new(value),
                    unit,
                })
            }
            Token::Identifier(_) | Token::QuotedIdentifier(_) => {
                let name = self.expect_identifier()?;

                if self.check(&Token::LParen) {
                    self.advance();
                    let args = if self.check(&Token::RParen) {
                        Vec::new()
                    } else {
                        self.parse_expr_list()?
                    };
                    self.expect(&Token::RParen)?;
                    return Ok(Expr::Function { name, args });
                }

                if self.check(&Token::Dot) {
                    self.advance();
                    let column = self.expect_identifier()?;
                    return Ok(Expr::Column(ColumnRef {
                        table: Some(name),
                        column,
                    }));
                }

                Ok(Expr::column(name))
            }
            Token::Eof => Err(Error::UnexpectedEof("expression".to_string())),
            other => Err(Error::UnexpectedToken {
                expected: "expression".to_string(),
                found: format!("{}", other),
            }),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal> {
        let literal = match self.current().clone() {
            Token::IntegerLiteral(n) => Literal::Integer(n),
            Token::UnsignedLiteral(n) => Literal::UnsignedInteger(n),
            Token::FloatLiteral(n) => Literal::Float(n),
            Token::StringLiteral(s) => Literal::String(s),
            Token::Identifier(word) if Keyword::Null.matches(&word) => Literal::Null,
            Token::Identifier(word) if Keyword::True.matches(&word) => Literal::Boolean(true),
            Token::Identifier(word) if Keyword::False.matches(&word) => Literal::Boolean(false),
            Token::Minus => {
                self.advance();
                return match self.parse_literal()? {
                    Literal::Integer(n) => Ok(Literal::Integer(-n)),
                    Literal::UnsignedInteger(n) if n == i64::MIN.unsigned_abs() => {
                        Ok(Literal::Integer(i64::MIN))
                    }
                    Literal::Float(n) => Ok(Literal::Float(-n)),
                    other => Err(Error::ParseError(format!("cannot negate {:?}", other))),
                };
            }
            other => {
                return Err(Error::UnexpectedToken {
                    expected: "literal".to_string(),
                    found: format!("{}", other),
                })
            }
        };
        self.advance();
        Ok(literal)
    }

    fn parse_expr_list(&mut self) -> Result<Vec<Expr>> {
        let mut exprs = Vec::new();

        loop {
            exprs.push(self.parse_expr()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(exprs)
    }

    fn parse_identifier_list(&mut self) -> Result<Vec<String>> {
        let mut identifiers = Vec::new();

        loop {
            identifiers.push(self.expect_identifier()?);

            if !self.check(&Token::Comma) {
                break;
            }
            self.advance();
        }

        Ok(identifiers)
    }

    // ========== Token helpers ==========

    fn current(&self) -> &Token {
        self.tokens.get(self.position).unwrap_or(&Token::Eof)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position + 1)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }

    fn check(&self, token: &Token) -> bool {
        std::mem::discriminant(self.current()) == std::mem::discriminant(token)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.current().is_keyword(keyword)
    }

    fn expect(&mut self, token: &Token) -> Result<()> {
        if self.check(token) {
            self.advance();
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                expected: format!("{}", token),
                found: format!("{}", self.current()),
            })
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<()> {
        if self.check_keyword(keyword) {
            self.advance();
            Ok(())
        } else {
            Err(Error::UnexpectedToken {
                expected: keyword.to_string(),
                found: format!("{}", self.current()),
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::Identifier(name) | Token::QuotedIdentifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(Error::UnexpectedToken {
                expected: "identifier".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }

    fn expect_string(&mut self) -> Result<String> {
        match self.current().clone() {
            Token::StringLiteral(s) => {
                self.advance();
                Ok(s)
            }
            _ => Err(Error::UnexpectedToken {
                expected: "string".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }

    fn expect_unsigned(&mut self) -> Result<u64> {
        match self.current().clone() {
            Token::IntegerLiteral(n) if n >= 0 => {
                self.advance();
                Ok(n as u64)
            }
            Token::UnsignedLiteral(n) => {
                self.advance();
                Ok(n)
            }
            _ => Err(Error::UnexpectedToken {
                expected: "non-negative integer".to_string(),
                found: format!("{}", self.current()),
            }),
        }
    }
}

/// Parse one metadata statement
pub fn parse_statement(sql: &str) -> Result<Statement> {
    Parser::new(sql)?.parse()
}

/// Parse a standalone expression such as `(id, ts)` or `d + INTERVAL 1 DAY`
pub fn parse_expression(sql: &str) -> Result<Expr> {
    Parser::new(sql)?.parse_expression()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HITS: &str = "CREATE TABLE hits (\
        id UInt64, \
        d Date DEFAULT today(), \
        url String COMMENT 'page', \
        INDEX idx_url url TYPE bloom_filter(0.01) GRANULARITY 4, \
        CONSTRAINT positive CHECK id > 0\
        ) ENGINE = MergeTree() PARTITION BY toYYYYMM(d) ORDER BY (id, d) \
        TTL d + INTERVAL 30 DAY SETTINGS index_granularity = 8192";

    fn parse_table(sql: &str) -> CreateTableStatement {
        match parse_statement(sql).unwrap() {
            Statement::CreateTable(stmt) => stmt,
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_create_table() {
        let stmt = parse_table(HITS);

        assert!(!stmt.attach);
        assert_eq!(stmt.table_name, "hits");
        assert_eq!(stmt.columns.len(), 3);
        assert_eq!(stmt.columns[0].data_type, DataType::UInt64);
        assert_eq!(
            stmt.columns[1].default.as_ref().map(|d| d.kind),
            Some(DefaultKind::Default)
        );
        assert_eq!(stmt.columns[2].comment.as_deref(), Some("page"));
        assert_eq!(stmt.indices.len(), 1);
        assert_eq!(stmt.indices[0].granularity, 4);
        assert_eq!(stmt.constraints.len(), 1);
        assert_eq!(stmt.storage.engine.name, "MergeTree");
        assert_eq!(stmt.storage.engine.args, Some(vec![]));
        assert!(stmt.storage.partition_by.is_some());
        assert_eq!(
            stmt.storage.order_by,
            Some(Expr::Tuple(vec![Expr::column("id"), Expr::column("d")]))
        );
        assert!(stmt.storage.ttl.is_some());
        assert_eq!(
            stmt.storage.settings.as_ref().and_then(|s| s.get("index_granularity")),
            Some(&Literal::Integer(8192))
        );
    }

    #[test]
    fn test_parse_attach_with_keyword_named_columns() {
        let stmt = parse_table(
            "ATTACH TABLE kv (key String, `order` UInt8, index UInt32) ENGINE = Memory",
        );

        assert!(stmt.attach);
        let names: Vec<_> = stmt.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["key", "order", "index"]);
        assert!(stmt.indices.is_empty());
        assert_eq!(stmt.storage.engine.args, None);
    }

    #[test]
    fn test_parse_composite_types() {
        let stmt = parse_table(
            "CREATE TABLE t (a Nullable(String), b Array(UInt8), \
             c Tuple(x Int32, y Float64), n Nested(k String, v UInt64)) ENGINE = Log",
        );

        assert_eq!(
            stmt.columns[0].data_type,
            DataType::Nullable(Box::new(DataType::String))
        );
        assert_eq!(
            stmt.columns[1].data_type,
            DataType::Array(Box::new(DataType::UInt8))
        );
        match &stmt.columns[2].data_type {
            DataType::Tuple(t) => assert_eq!(t.position_by_name("y").unwrap(), 1),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(stmt.columns[3].data_type, DataType::Array(_)));
    }

    #[test]
    fn test_parse_partially_named_tuple() {
        let result = parse_statement("CREATE TABLE t (c Tuple(x Int32, Float64)) ENGINE = Log");
        assert!(matches!(result, Err(Error::PartiallyNamedTuple)));
    }

    #[test]
    fn test_parse_create_dictionary() {
        let stmt = parse_statement(
            "CREATE DICTIONARY regions (id UInt64, name String DEFAULT '', parent UInt64 HIERARCHICAL) \
             PRIMARY KEY id \
             SOURCE(CLICKHOUSE(TABLE 'region_src' USER 'default')) \
             LAYOUT(HASHED()) LIFETIME(MIN 300 MAX 600)",
        )
        .unwrap();

        match stmt {
            Statement::CreateDictionary(dict) => {
                assert_eq!(dict.name, "regions");
                assert_eq!(dict.attributes.len(), 3);
                assert!(dict.attributes[2].hierarchical);
                assert_eq!(dict.primary_key, vec!["id".to_string()]);
                assert_eq!(dict.source.kind, "clickhouse");
                assert_eq!(dict.source.param("table"), Some(&Expr::string("region_src")));
                assert_eq!(dict.layout.kind, "hashed");
                assert_eq!(dict.lifetime, Some(Lifetime { min: 300, max: 600 }));
            }
            other => panic!("expected dictionary, got {:?}", other),
        }
    }

    #[test]
    fn test_dictionary_requires_layout() {
        let result = parse_statement(
            "CREATE DICTIONARY d (id UInt64) PRIMARY KEY id SOURCE(NULL())",
        );
        assert!(matches!(result, Err(Error::ParseError(_))));
    }

    #[test]
    fn test_empty_column_list() {
        let result = parse_statement("CREATE TABLE t (INDEX i x TYPE minmax GRANULARITY 1) ENGINE = Log");
        assert!(matches!(result, Err(Error::EmptyColumnList(_))));
    }

    #[test]
    fn test_operator_precedence() {
        let expr = parse_expression("a + b * c = d AND NOT e").unwrap();
        match expr {
            Expr::BinaryOp { op, left, right } => {
                assert_eq!(op, BinaryOperator::And);
                assert!(matches!(*left, Expr::BinaryOp { op: BinaryOperator::Eq, .. }));
                assert!(matches!(*right, Expr::UnaryOp { op: UnaryOperator::Not, .. }));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_trailing_garbage_rejected() {
        let result = parse_statement("CREATE TABLE t (a UInt8) ENGINE = Log garbage");
        assert!(matches!(result, Err(Error::UnexpectedToken { .. })));
    }
}
