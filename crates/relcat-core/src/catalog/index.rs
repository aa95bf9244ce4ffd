//! Index and primary-key descriptors.

use serde::Serialize;

/// An index on one table, possibly spanning several columns.
///
/// Documents encode a composite index as one record per column under a shared
/// name; the builder collapses those into a single `IndexDef`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDef {
    /// Index name.
    pub name: String,
    /// Indexed columns in record order.
    pub columns: Vec<String>,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// Whether the index name follows a primary-key naming convention.
    pub is_primary: bool,
}

impl IndexDef {
    /// Create a single-column index, inferring uniqueness from its name.
    pub fn new(name: impl Into<String>, column: impl Into<String>) -> Self {
        let name = name.into();
        let is_primary = is_primary_key_name(&name);
        Self {
            unique: is_primary || is_unique_name(&name),
            is_primary,
            name,
            columns: vec![column.into()],
        }
    }

    /// Append a column, ignoring repeats of one already present.
    pub fn push_column(&mut self, column: impl Into<String>) {
        let column = column.into();
        if !self.covers(&column) {
            self.columns.push(column);
        }
    }

    /// Check if the index includes a column.
    pub fn covers(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Check if the index spans more than one column.
    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }
}

/// A table's primary key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKey {
    /// Name of the backing index, when the document has one.
    pub name: Option<String>,
    /// Key columns in table declaration order.
    pub columns: Vec<String>,
}

impl PrimaryKey {
    /// Check if a column is part of the key.
    pub fn contains(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Check if the key spans more than one column.
    pub fn is_composite(&self) -> bool {
        self.columns.len() > 1
    }

    /// Compare key columns with another column list, ignoring order.
    pub fn same_columns(&self, columns: &[String]) -> bool {
        let mut ours: Vec<&str> = self.columns.iter().map(String::as_str).collect();
        let mut theirs: Vec<&str> = columns.iter().map(String::as_str).collect();
        ours.sort_unstable();
        ours.dedup();
        theirs.sort_unstable();
        theirs.dedup();
        ours == theirs
    }
}

/// Check if an index name follows a primary-key convention.
///
/// Recognizes SQL Server (`PK__orders__46596229…`, `PK_orders`), PostgreSQL
/// (`orders_pkey`) and MySQL (`PRIMARY`).
pub fn is_primary_key_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("pk_") || lower.ends_with("_pkey") || lower == "primary"
}

/// Check if an index name follows a unique-constraint convention.
///
/// Recognizes `UQ__staffs__…`, `UQ_staffs_email`, `staffs_email_key`, and `…_unique`.
pub fn is_unique_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    lower.starts_with("uq_")
        || lower.starts_with("ux_")
        || lower.ends_with("_key")
        || lower.ends_with("_unique")
}
