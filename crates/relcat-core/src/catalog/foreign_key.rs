//! Foreign-key edges.

use super::name::QualifiedName;
use super::table::TableId;

/// A directed edge from `(source table, column)` to `(referenced table, referenced column)`.
///
/// Edges are a relation of their own rather than owned by either endpoint.
/// `target` is `None` when the referenced table is not in the catalog; the
/// validator reports that, the builder does not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    /// Referencing table.
    pub source: TableId,
    /// Referencing table name.
    pub source_table: QualifiedName,
    /// Referencing column.
    pub column: String,
    /// Referenced table name as declared.
    pub referenced_table: QualifiedName,
    /// Referenced column as declared.
    pub referenced_column: String,
    /// Resolved referenced table.
    pub target: Option<TableId>,
}

impl ForeignKeyDef {
    /// Check if the referenced table was found.
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }

    /// Check if the edge points back at its own table.
    pub fn is_self_reference(&self) -> bool {
        self.target == Some(self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_reference() {
        let fk = ForeignKeyDef {
            source: TableId(3),
            source_table: QualifiedName::new("hr", "staffs"),
            column: "manager_id".to_string(),
            referenced_table: QualifiedName::new("hr", "staffs"),
            referenced_column: "manager_id".to_string(),
            target: Some(TableId(3)),
        };
        assert!(fk.is_resolved());
        assert!(fk.is_self_reference());
    }

    #[test]
    fn test_unresolved() {
        let fk = ForeignKeyDef {
            source: TableId(0),
            source_table: QualifiedName::new("sales", "orders"),
            column: "staff_id".to_string(),
            referenced_table: QualifiedName::new("hr", "staffs"),
            referenced_column: "staff_id".to_string(),
            target: None,
        };
        assert!(!fk.is_resolved());
        assert!(!fk.is_self_reference());
    }
}
