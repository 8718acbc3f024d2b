//! Definition language token definitions
//!
//! This module defines all tokens that can appear in a metadata statement.
//! Keywords are contextual: the lexer emits every bare word as an
//! [`Token::Identifier`] and the parser asks [`Keyword::matches`] whether a
//! word plays a keyword role at the current position. This keeps common column
//! names such as `key`, `type` or `source` usable without quoting.

use std::fmt;

/// Definition language tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // ========== Literals ==========
    /// Integer literal
    IntegerLiteral(i64),
    /// Integer literal above `i64::MAX`
    UnsignedLiteral(u64),
    /// Float literal
    FloatLiteral(f64),
    /// String literal (single-quoted)
    StringLiteral(String),
    /// Bare word: identifier or contextual keyword
    Identifier(String),
    /// Back-quoted or double-quoted identifier, never a keyword
    QuotedIdentifier(String),

    // ========== Operators ==========
    /// =
    Eq,
    /// <> or !=
    Neq,
    /// <
    Lt,
    /// >
    Gt,
    /// <=
    Lte,
    /// >=
    Gte,
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Asterisk,
    /// /
    Slash,
    /// %
    Percent,
    /// ||
    Concat,

    // ========== Delimiters ==========
    /// (
    LParen,
    /// )
    RParen,
    /// [
    LBracket,
    /// ]
    RBracket,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,

    // ========== Special ==========
    /// End of input
    Eof,
}

impl Token {
    /// Whether this token is the bare word for `keyword`
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        match self {
            Token::Identifier(word) => keyword.matches(word),
            _ => false,
        }
    }
}

/// Contextual keywords of the definition language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Alias,
    And,
    Attach,
    By,
    Check,
    Comment,
    Constraint,
    Create,
    Default,
    Dictionary,
    Engine,
    Exists,
    Expression,
    False,
    Granularity,
    Hierarchical,
    If,
    Index,
    Injective,
    Interval,
    Key,
    Layout,
    Lifetime,
    Materialized,
    Max,
    Min,
    Not,
    Null,
    Or,
    Order,
    Partition,
    Primary,
    Range,
    Sample,
    Settings,
    Source,
    Table,
    True,
    Ttl,
    Type,
}

impl Keyword {
    /// Every keyword, used to decide whether an identifier needs quoting
    pub const ALL: &'static [Keyword] = &[
        Keyword::Alias,
        Keyword::And,
        Keyword::Attach,
        Keyword::By,
        Keyword::Check,
        Keyword::Comment,
        Keyword::Constraint,
        Keyword::Create,
        Keyword::Default,
        Keyword::Dictionary,
        Keyword::Engine,
        Keyword::Exists,
        Keyword::Expression,
        Keyword::False,
        Keyword::Granularity,
        Keyword::Hierarchical,
        Keyword::If,
        Keyword::Index,
        Keyword::Injective,
        Keyword::Interval,
        Keyword::Key,
        Keyword::Layout,
        Keyword::Lifetime,
        Keyword::Materialized,
        Keyword::Max,
        Keyword::Min,
        Keyword::Not,
        Keyword::Null,
        Keyword::Or,
        Keyword::Order,
        Keyword::Partition,
        Keyword::Primary,
        Keyword::Range,
        Keyword::Sample,
        Keyword::Settings,
        Keyword::Source,
        Keyword::Table,
        Keyword::True,
        Keyword::Ttl,
        Keyword::Type,
    ];

    /// Canonical upper-case spelling
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Alias => "ALIAS",
            Keyword::And => "AND",
            Keyword::Attach => "ATTACH",
            Keyword::By => "BY",
            Keyword::Check => "CHECK",
            Keyword::Comment => "COMMENT",
            Keyword::Constraint => "CONSTRAINT",
            Keyword::Create => "CREATE",
            Keyword::Default => "DEFAULT",
            Keyword::Dictionary => "DICTIONARY",
            Keyword::Engine => "ENGINE",
            Keyword::Exists => "EXISTS",
            Keyword::Expression => "EXPRESSION",
            Keyword::False => "FALSE",
            Keyword::Granularity => "GRANULARITY",
            Keyword::Hierarchical => "HIERARCHICAL",
            Keyword::If => "IF",
            Keyword::Index => "INDEX",
            Keyword::Injective => "INJECTIVE",
            Keyword::Interval => "INTERVAL",
            Keyword::Key => "KEY",
            Keyword::Layout => "LAYOUT",
            Keyword::Lifetime => "LIFETIME",
            Keyword::Materialized => "MATERIALIZED",
            Keyword::Max => "MAX",
            Keyword::Min => "MIN",
            Keyword::Not => "NOT",
            Keyword::Null => "NULL",
            Keyword::Or => "OR",
            Keyword::Order => "ORDER",
            Keyword::Partition => "PARTITION",
            Keyword::Primary => "PRIMARY",
            Keyword::Range => "RANGE",
            Keyword::Sample => "SAMPLE",
            Keyword::Settings => "SETTINGS",
            Keyword::Source => "SOURCE",
            Keyword::Table => "TABLE",
            Keyword::True => "TRUE",
            Keyword::Ttl => "TTL",
            Keyword::Type => "TYPE",
        }
    }

    /// Case-insensitive comparison against a bare word
    pub fn matches(&self, word: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(word)
    }

    /// Try to recognize a keyword from a word
    pub fn from_word(word: &str) -> Option<Keyword> {
        Self::ALL.iter().copied().find(|k| k.matches(word))
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::IntegerLiteral(n) => write!(f, "{}", n),
            Token::UnsignedLiteral(n) => write!(f, "{}", n),
            Token::FloatLiteral(n) => write!(f, "{}", n),
            Token::StringLiteral(s) => write!(f, "'{}'", s),
            Token::Identifier(s) => write!(f, "{}", s),
            Token::QuotedIdentifier(s) => write!(f, "`{}`", s),
            Token::Eq => write!(f, "="),
            Token::Neq => write!(f, "<>"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::Lte => write!(f, "<="),
            Token::Gte => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Concat => write!(f, "||"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Dot => write!(f, "."),
            Token::Eof => write!(f, "EOF"),
        }
    }
}
