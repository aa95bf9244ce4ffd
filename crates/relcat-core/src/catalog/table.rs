//! Table definitions.

use super::column::ColumnDef;
use super::index::{IndexDef, PrimaryKey};
use super::name::QualifiedName;
use serde::Serialize;

/// Identity of a table within one catalog (its declaration position).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TableId(pub(crate) usize);

impl TableId {
    /// Position of the table in catalog declaration order.
    pub fn index(self) -> usize {
        self.0
    }
}

/// A table: its columns, primary key, and indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDef {
    /// Catalog identity.
    pub id: TableId,
    /// Qualified name.
    pub name: QualifiedName,
    /// Columns in declaration order.
    pub columns: Vec<ColumnDef>,
    /// Primary key, if any column is flagged as a key column.
    pub primary_key: Option<PrimaryKey>,
    /// Indexes in order of first appearance.
    pub indexes: Vec<IndexDef>,
}

impl TableDef {
    pub(crate) fn new(id: TableId, name: QualifiedName) -> Self {
        Self {
            id,
            name,
            columns: Vec::new(),
            primary_key: None,
            indexes: Vec::new(),
        }
    }

    /// Schema name.
    pub fn schema(&self) -> &str {
        &self.name.schema
    }

    /// Unqualified table name.
    pub fn table_name(&self) -> &str {
        &self.name.table
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Check if the table has a column.
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Get an index by name.
    pub fn index(&self, name: &str) -> Option<&IndexDef> {
        self.indexes.iter().find(|i| i.name == name)
    }

    /// Get all unique indexes.
    pub fn unique_indexes(&self) -> impl Iterator<Item = &IndexDef> {
        self.indexes.iter().filter(|i| i.unique)
    }

    /// Check if the table has a primary key.
    pub fn has_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }

    /// Check if a column is part of the primary key or of any unique index.
    pub fn is_key_column(&self, column: &str) -> bool {
        self.primary_key
            .as_ref()
            .is_some_and(|pk| pk.contains(column))
            || self.unique_indexes().any(|i| i.covers(column))
    }
}
