//! Column type vocabulary.

use serde::Serialize;
use std::fmt;

/// Declared column types, normalized from the metadata extractor's vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 32-bit integer (`int`, `integer`).
    Integer,
    /// 64-bit integer.
    BigInt,
    /// 16-bit integer.
    SmallInt,
    /// 8-bit integer.
    TinyInt,
    /// Boolean or single bit.
    Boolean,
    /// Fixed-precision decimal (`decimal`, `numeric`).
    Decimal,
    /// Currency amount.
    Money,
    /// Floating point (`float`, `real`, `double`).
    Float,
    /// Fixed-length text.
    Char,
    /// Variable-length text.
    VarChar,
    /// Unbounded text.
    Text,
    /// Calendar date.
    Date,
    /// Time of day.
    Time,
    /// Date and time.
    DateTime,
    /// 128-bit identifier.
    Uuid,
    /// Binary data.
    Binary,
    /// JSON document.
    Json,
    /// Anything outside the known vocabulary, kept verbatim.
    Other(String),
}

/// Base type families used to decide foreign-key compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    /// Whole numbers of any width.
    Integer,
    /// Exact fractional numbers.
    Exact,
    /// Approximate numbers.
    Approximate,
    /// True/false.
    Boolean,
    /// Character data.
    Text,
    /// Dates.
    Date,
    /// Times of day.
    Time,
    /// Timestamps.
    Timestamp,
    /// Identifiers.
    Uuid,
    /// Bytes.
    Binary,
    /// JSON.
    Json,
    /// Unrecognized type, compared by lowercased name.
    Other(String),
}

impl DataType {
    /// Parse a declared type name.
    ///
    /// Matching is case-insensitive and ignores any parenthesized length or
    /// precision suffix (`varchar(255)`, `decimal(10,2)`).
    pub fn parse(declared: &str) -> Self {
        let base = declared
            .split('(')
            .next()
            .unwrap_or(declared)
            .trim()
            .to_ascii_lowercase();

        match base.as_str() {
            "int" | "integer" | "int4" | "mediumint" | "serial" => DataType::Integer,
            "bigint" | "int8" | "bigserial" => DataType::BigInt,
            "smallint" | "int2" | "smallserial" => DataType::SmallInt,
            "tinyint" => DataType::TinyInt,
            "bit" | "bool" | "boolean" => DataType::Boolean,
            "decimal" | "numeric" | "dec" => DataType::Decimal,
            "money" | "smallmoney" => DataType::Money,
            "float" | "float4" | "float8" | "real" | "double" | "double precision" => {
                DataType::Float
            }
            "char" | "nchar" | "character" | "bpchar" => DataType::Char,
            "varchar" | "nvarchar" | "character varying" | "varchar2" | "nvarchar2" => {
                DataType::VarChar
            }
            "text" | "ntext" | "clob" | "tinytext" | "mediumtext" | "longtext" => DataType::Text,
            "date" => DataType::Date,
            "time" | "time without time zone" | "time with time zone" | "timetz" => DataType::Time,
            "datetime" | "datetime2" | "smalldatetime" | "datetimeoffset" | "timestamp"
            | "timestamptz" | "timestamp without time zone" | "timestamp with time zone" => {
                DataType::DateTime
            }
            "uuid" | "uniqueidentifier" => DataType::Uuid,
            "binary" | "varbinary" | "bytea" | "blob" | "image" | "longblob" => DataType::Binary,
            "json" | "jsonb" => DataType::Json,
            _ => DataType::Other(base),
        }
    }

    /// Get the base type family.
    pub fn family(&self) -> TypeFamily {
        match self {
            DataType::Integer | DataType::BigInt | DataType::SmallInt | DataType::TinyInt => {
                TypeFamily::Integer
            }
            DataType::Decimal | DataType::Money => TypeFamily::Exact,
            DataType::Float => TypeFamily::Approximate,
            DataType::Boolean => TypeFamily::Boolean,
            DataType::Char | DataType::VarChar | DataType::Text => TypeFamily::Text,
            DataType::Date => TypeFamily::Date,
            DataType::Time => TypeFamily::Time,
            DataType::DateTime => TypeFamily::Timestamp,
            DataType::Uuid => TypeFamily::Uuid,
            DataType::Binary => TypeFamily::Binary,
            DataType::Json => TypeFamily::Json,
            DataType::Other(name) => TypeFamily::Other(name.clone()),
        }
    }

    /// Check if a foreign key between columns of these types is well-typed.
    pub fn is_compatible_with(&self, other: &DataType) -> bool {
        self.family() == other.family()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "integer",
            DataType::BigInt => "bigint",
            DataType::SmallInt => "smallint",
            DataType::TinyInt => "tinyint",
            DataType::Boolean => "boolean",
            DataType::Decimal => "decimal",
            DataType::Money => "money",
            DataType::Float => "float",
            DataType::Char => "char",
            DataType::VarChar => "varchar",
            DataType::Text => "text",
            DataType::Date => "date",
            DataType::Time => "time",
            DataType::DateTime => "datetime",
            DataType::Uuid => "uuid",
            DataType::Binary => "binary",
            DataType::Json => "json",
            DataType::Other(name) => name,
        };
        f.write_str(name)
    }
}
