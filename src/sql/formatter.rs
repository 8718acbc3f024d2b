//! Canonical statement text
//!
//! `Display` implementations that turn the AST back into definition text.
//! Output re-parses to an equal AST. [`metadata_text`] produces the form that
//! is persisted in metadata files.

use super::ast::*;
use super::token::Keyword;
use std::fmt::{self, Display, Formatter, Write};

const INDENT: &str = "    ";

/// Back-quote an identifier unless it is a plain word that is not a keyword
pub fn quote_identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if plain && Keyword::from_word(name).is_none() {
        return name.to_string();
    }

    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for c in name.chars() {
        match c {
            '`' => quoted.push_str("\\`"),
            '\\' => quoted.push_str("\\\\"),
            _ => quoted.push(c),
        }
    }
    quoted.push('`');
    quoted
}

/// Quote a string literal
pub fn quote_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        match c {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            '\0' => quoted.push_str("\\0"),
            _ => quoted.push(c),
        }
    }
    quoted.push('\'');
    quoted
}

/// Text persisted in a metadata file: always `ATTACH`, never `IF NOT EXISTS`
pub fn metadata_text(statement: &Statement) -> String {
    let mut statement = statement.clone();
    match &mut statement {
        Statement::CreateTable(stmt) => {
            stmt.attach = true;
            stmt.if_not_exists = false;
        }
        Statement::CreateDictionary(stmt) => {
            stmt.attach = true;
            stmt.if_not_exists = false;
        }
    }
    format!("{}\n", statement)
}

fn write_list<T: Display>(f: &mut Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i != 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_header(f: &mut Formatter<'_>, attach: bool, if_not_exists: bool, kind: &str, name: &str) -> fmt::Result {
    write!(f, "{} {} ", if attach { "ATTACH" } else { "CREATE" }, kind)?;
    if if_not_exists {
        f.write_str("IF NOT EXISTS ")?;
    }
    writeln!(f, "{}", quote_identifier(name))
}

fn write_elements(f: &mut Formatter<'_>, elements: &[String]) -> fmt::Result {
    f.write_str("(\n")?;
    for (i, element) in elements.iter().enumerate() {
        f.write_str(INDENT)?;
        f.write_str(element)?;
        if i + 1 != elements.len() {
            f.write_char(',')?;
        }
        f.write_char('\n')?;
    }
    f.write_str(")")
}

impl Display for Statement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Statement::CreateTable(stmt) => stmt.fmt(f),
            Statement::CreateDictionary(stmt) => stmt.fmt(f),
        }
    }
}

impl Display for CreateTableStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_header(f, self.attach, self.if_not_exists, "TABLE", &self.table_name)?;

        let elements: Vec<String> = self
            .columns
            .iter()
            .map(ToString::to_string)
            .chain(self.indices.iter().map(ToString::to_string))
            .chain(self.constraints.iter().map(ToString::to_string))
            .collect();
        write_elements(f, &elements)?;

        write!(f, "\n{}", self.storage)
    }
}

impl Display for ColumnDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", quote_identifier(&self.name), self.data_type)?;
        if let Some(default) = &self.default {
            let kind = match default.kind {
                DefaultKind::Default => "DEFAULT",
                DefaultKind::Materialized => "MATERIALIZED",
                DefaultKind::Alias => "ALIAS",
            };
            write!(f, " {} {}", kind, default.expr)?;
        }
        if let Some(comment) = &self.comment {
            write!(f, " COMMENT {}", quote_string(comment))?;
        }
        Ok(())
    }
}

impl Display for IndexDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "INDEX {} {} TYPE {} GRANULARITY {}",
            quote_identifier(&self.name),
            self.expr,
            self.index_type,
            self.granularity
        )
    }
}

impl Display for ConstraintDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "CONSTRAINT {} CHECK {}", quote_identifier(&self.name), self.check)
    }
}

impl Display for StorageDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ENGINE = {}", self.engine)?;

        let clauses = [
            ("PARTITION BY", &self.partition_by),
            ("PRIMARY KEY", &self.primary_key),
            ("ORDER BY", &self.order_by),
            ("SAMPLE BY", &self.sample_by),
            ("TTL", &self.ttl),
        ];
        for (keyword, clause) in clauses {
            if let Some(expr) = clause {
                write!(f, "\n{} {}", keyword, expr)?;
            }
        }

        if let Some(settings) = &self.settings {
            write!(f, "\nSETTINGS {}", settings)?;
        }
        Ok(())
    }
}

impl Display for EngineDef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", quote_identifier(&self.name))?;
        if let Some(args) = &self.args {
            f.write_char('(')?;
            write_list(f, args)?;
            f.write_char(')')?;
        }
        Ok(())
    }
}

impl Display for Settings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.iter().enumerate() {
            if i != 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} = {}", quote_identifier(name), value)?;
        }
        Ok(())
    }
}

impl Display for CreateDictionaryStatement {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_header(f, self.attach, self.if_not_exists, "DICTIONARY", &self.name)?;

        let attributes: Vec<String> = self.attributes.iter().map(ToString::to_string).collect();
        write_elements(f, &attributes)?;

        let keys: Vec<String> = self.primary_key.iter().map(|k| quote_identifier(k)).collect();
        write!(f, "\nPRIMARY KEY {}", keys.join(", "))?;
        write!(f, "\nSOURCE({})", self.source)?;
        if let Some(lifetime) = &self.lifetime {
            write!(f, "\nLIFETIME(MIN {} MAX {})", lifetime.min, lifetime.max)?;
        }
        write!(f, "\nLAYOUT({})", self.layout)?;
        if let Some(range) = &self.range {
            write!(
                f,
                "\nRANGE(MIN {} MAX {})",
                quote_identifier(&range.min),
                quote_identifier(&range.max)
            )?;
        }
        Ok(())
    }
}

impl Display for DictionaryAttribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", quote_identifier(&self.name), self.data_type)?;
        if let Some(default) = &self.default {
            write!(f, " DEFAULT {}", default)?;
        }
        if let Some(expression) = &self.expression {
            write!(f, " EXPRESSION {}", expression)?;
        }
        if self.hierarchical {
            f.write_str(" HIERARCHICAL")?;
        }
        if self.injective {
            f.write_str(" INJECTIVE")?;
        }
        Ok(())
    }
}

impl Display for DictionaryClause {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.kind.to_ascii_uppercase())?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i != 0 {
                f.write_char(' ')?;
            }
            write!(f, "{} {}", key, value)?;
        }
        f.write_char(')')
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("NULL"),
            Literal::Boolean(true) => f.write_str("TRUE"),
            Literal::Boolean(false) => f.write_str("FALSE"),
            Literal::Integer(n) => write!(f, "{}", n),
            Literal::UnsignedInteger(n) => write!(f, "{}", n),
            // Debug keeps the fractional part so the value re-parses as a float
            Literal::Float(n) => write!(f, "{:?}", n),
            Literal::String(s) => f.write_str(&quote_string(s)),
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOperator::Eq => "=",
            BinaryOperator::Neq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lte => "<=",
            BinaryOperator::Gte => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Concat => "||",
        };
        f.write_str(symbol)
    }
}

impl BinaryOperator {
    fn is_comparison(&self) -> bool {
        self.precedence() == 3
    }
}

/// Write `child` as an operand of `parent`, parenthesized when the tree
/// shape would otherwise change on re-parse.
fn write_operand(f: &mut Formatter<'_>, child: &Expr, parent: BinaryOperator, right: bool) -> fmt::Result {
    let needs_parens = match child {
        Expr::BinaryOp { op, .. } => {
            op.precedence() < parent.precedence()
                || (op.precedence() == parent.precedence() && (right || parent.is_comparison()))
        }
        // NOT binds looser than comparison and arithmetic
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            ..
        } => parent.precedence() > BinaryOperator::And.precedence() || right,
        _ => false,
    };

    if needs_parens {
        write!(f, "({})", child)
    } else {
        write!(f, "{}", child)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(column) => {
                if let Some(table) = &column.table {
                    write!(f, "{}.", quote_identifier(table))?;
                }
                f.write_str(&quote_identifier(&column.column))
            }
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::BinaryOp { left, op, right } => {
                write_operand(f, left, *op, false)?;
                write!(f, " {} ", op)?;
                write_operand(f, right, *op, true)
            }
            Expr::UnaryOp { op, expr } => {
                let operand = expr.to_string();
                let nested = matches!(**expr, Expr::BinaryOp { .. });
                let number = matches!(
                    **expr,
                    Expr::Literal(Literal::Integer(_) | Literal::UnsignedInteger(_) | Literal::Float(_))
                );
                match op {
                    UnaryOperator::Not if nested => write!(f, "NOT ({})", operand),
                    UnaryOperator::Not => write!(f, "NOT {}", operand),
                    // `--` would start a comment
                    UnaryOperator::Minus if nested || number || operand.starts_with('-') => {
                        write!(f, "-({})", operand)
                    }
                    UnaryOperator::Minus => write!(f, "-{}", operand),
                }
            }
            Expr::Function { name, args } => {
                write!(f, "{}(", quote_identifier(name))?;
                write_list(f, args)?;
                f.write_char(')')
            }
            Expr::Tuple(items) => {
                f.write_char('(')?;
                write_list(f, items)?;
                if items.len() == 1 {
                    f.write_char(',')?;
                }
                f.write_char(')')
            }
            Expr::Array(items) => {
                f.write_char('[')?;
                write_list(f, items)?;
                f.write_char(']')
            }
            Expr::Interval { value, unit } => match **value {
                Expr::BinaryOp { .. } => write!(f, "INTERVAL ({}) {}", value, unit),
                _ => write!(f, "INTERVAL {} {}", value, unit),
            },
        }
    }
}
