//! Schema namespaces.

use super::table::TableId;

/// A schema and the tables it owns, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaDef {
    /// Schema name.
    pub name: String,
    /// Tables in declaration order.
    pub tables: Vec<TableId>,
}

impl SchemaDef {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: Vec::new(),
        }
    }

    /// Number of tables in the schema.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Check if the schema has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
