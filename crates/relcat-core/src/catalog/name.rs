//! Qualified table names.

use serde::{Serialize, Serializer};
use std::fmt;

/// A globally unique table identity: `(schema, table)`.
///
/// Table names are only unique within a schema, so lookups always go through
/// the pair, never the bare table name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    /// Schema name.
    pub schema: String,
    /// Table name.
    pub table: String,
}

impl QualifiedName {
    /// Create a qualified name.
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Parse a `schema.table` string.
    ///
    /// Splits on the first `.`; returns `None` for unqualified or empty parts.
    pub fn parse(name: &str) -> Option<Self> {
        let (schema, table) = name.split_once('.')?;
        if schema.is_empty() || table.is_empty() {
            return None;
        }
        Some(Self::new(schema, table))
    }

    /// Parse a possibly unqualified name, resolving bare names against `default_schema`.
    pub fn parse_in(name: &str, default_schema: &str) -> Self {
        Self::parse(name).unwrap_or_else(|| Self::new(default_schema, name))
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

impl Serialize for QualifiedName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
