//! Column data types
//!
//! This module defines the data types a column or dictionary attribute may
//! declare, including the composite `Nullable`, `Array` and `Tuple` types.

use crate::error::{Error, Result};
use crate::sql::formatter::quote_identifier;
use std::collections::HashSet;
use std::fmt;

/// Column data types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    /// Fixed-point decimal with precision and scale
    Decimal(u8, u8),
    /// Variable-length byte string
    String,
    /// Fixed-length byte string
    FixedString(usize),
    /// Calendar date
    Date,
    /// Date and time with second precision
    DateTime,
    Uuid,
    Nullable(Box<DataType>),
    Array(Box<DataType>),
    Tuple(TupleType),
}

impl DataType {
    /// Resolve a type name with its already-parsed arguments.
    ///
    /// Simple names are matched case-insensitively so the usual SQL aliases
    /// (`INT`, `BIGINT`, `VARCHAR`, ...) are accepted as well.
    pub fn from_name(name: &str) -> Result<DataType> {
        let data_type = match name.to_ascii_lowercase().as_str() {
            "uint8" | "bool" | "boolean" => DataType::UInt8,
            "uint16" => DataType::UInt16,
            "uint32" => DataType::UInt32,
            "uint64" => DataType::UInt64,
            "int8" | "tinyint" => DataType::Int8,
            "int16" | "smallint" => DataType::Int16,
            "int32" | "int" | "integer" => DataType::Int32,
            "int64" | "bigint" => DataType::Int64,
            "float32" | "float" | "real" => DataType::Float32,
            "float64" | "double" => DataType::Float64,
            "string" | "text" | "varchar" | "blob" => DataType::String,
            "date" => DataType::Date,
            "datetime" | "timestamp" => DataType::DateTime,
            "uuid" => DataType::Uuid,
            _ => return Err(Error::UnknownDataType(name.to_string())),
        };
        Ok(data_type)
    }

    /// `Nested(...)` is sugar for `Array(Tuple(...))` with named elements
    pub fn nested(elements: Vec<DataType>, names: Vec<String>) -> Result<DataType> {
        let tuple = TupleType::with_names(elements, names)?;
        Ok(DataType::Array(Box::new(DataType::Tuple(tuple))))
    }

    /// Size in bytes of a single value, for fixed-size types
    pub fn size(&self) -> Option<usize> {
        match self {
            DataType::UInt8 | DataType::Int8 => Some(1),
            DataType::UInt16 | DataType::Int16 | DataType::Date => Some(2),
            DataType::UInt32 | DataType::Int32 | DataType::Float32 | DataType::DateTime => Some(4),
            DataType::UInt64 | DataType::Int64 | DataType::Float64 => Some(8),
            DataType::Decimal(p, _) => Some(match p {
                0..=9 => 4,
                10..=18 => 8,
                _ => 16,
            }),
            DataType::Uuid => Some(16),
            DataType::FixedString(n) => Some(*n),
            // Null map byte plus the nested value
            DataType::Nullable(inner) => inner.size().map(|n| n + 1),
            DataType::Tuple(tuple) => tuple
                .elements()
                .iter()
                .map(DataType::size)
                .sum::<Option<usize>>(),
            DataType::String | DataType::Array(_) => None,
        }
    }

    /// Check if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::Float32
                | DataType::Float64
                | DataType::Decimal(_, _)
        )
    }

    /// Check if this type is a string type
    pub fn is_string(&self) -> bool {
        matches!(self, DataType::String | DataType::FixedString(_))
    }

    /// Whether values of this type can be ordered, e.g. used in a sorting key
    pub fn is_comparable(&self) -> bool {
        match self {
            DataType::Nullable(inner) | DataType::Array(inner) => inner.is_comparable(),
            DataType::Tuple(tuple) => tuple.is_comparable(),
            _ => true,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::UInt8 => write!(f, "UInt8"),
            DataType::UInt16 => write!(f, "UInt16"),
            DataType::UInt32 => write!(f, "UInt32"),
            DataType::UInt64 => write!(f, "UInt64"),
            DataType::Int8 => write!(f, "Int8"),
            DataType::Int16 => write!(f, "Int16"),
            DataType::Int32 => write!(f, "Int32"),
            DataType::Int64 => write!(f, "Int64"),
            DataType::Float32 => write!(f, "Float32"),
            DataType::Float64 => write!(f, "Float64"),
            DataType::Decimal(p, s) => write!(f, "Decimal({}, {})", p, s),
            DataType::String => write!(f, "String"),
            DataType::FixedString(n) => write!(f, "FixedString({})", n),
            DataType::Date => write!(f, "Date"),
            DataType::DateTime => write!(f, "DateTime"),
            DataType::Uuid => write!(f, "UUID"),
            DataType::Nullable(inner) => write!(f, "Nullable({})", inner),
            DataType::Array(inner) => write!(f, "Array({})", inner),
            DataType::Tuple(tuple) => write!(f, "{}", tuple),
        }
    }
}

/// Tuple type: ordered elements with either implicit or explicit names.
///
/// Implicit names are the 1-based positions `"1"`, `"2"`, ... Explicit names
/// are non-empty, unique and never start with a digit, so they cannot collide
/// with implicit ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleType {
    elements: Vec<DataType>,
    names: Vec<String>,
    explicit_names: bool,
}

impl TupleType {
    /// Tuple with positional names
    pub fn new(elements: Vec<DataType>) -> Result<Self> {
        if elements.is_empty() {
            return Err(Error::EmptyTuple);
        }
        let names = (1..=elements.len()).map(|i| i.to_string()).collect();
        Ok(Self {
            elements,
            names,
            explicit_names: false,
        })
    }

    /// Tuple with explicitly named elements
    pub fn with_names(elements: Vec<DataType>, names: Vec<String>) -> Result<Self> {
        if elements.is_empty() {
            return Err(Error::EmptyTuple);
        }
        if names.len() != elements.len() {
            return Err(Error::PartiallyNamedTuple);
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(Error::InvalidTupleElementName(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateTupleElement(name.clone()));
            }
        }

        Ok(Self {
            elements,
            names,
            explicit_names: true,
        })
    }

    pub fn elements(&self) -> &[DataType] {
        &self.elements
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn has_explicit_names(&self) -> bool {
        self.explicit_names
    }

    /// Position of the element called `name`
    pub fn position_by_name(&self, name: &str) -> Result<usize> {
        self.names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| Error::TupleElementNotFound(name.to_string()))
    }

    pub fn is_comparable(&self) -> bool {
        self.elements.iter().all(DataType::is_comparable)
    }
}

impl fmt::Display for TupleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tuple(")?;
        for (i, (name, element)) in self.names.iter().zip(&self.elements).enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            if self.explicit_names {
                write!(f, "{} ", quote_identifier(name))?;
            }
            write!(f, "{}", element)?;
        }
        write!(f, ")")
    }
}
