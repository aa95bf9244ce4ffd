//! Column definitions.

use super::types::DataType;
use serde::Serialize;

/// A column of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDef {
    /// Column name (unique within its table).
    pub name: String,
    /// Type name as declared in the document.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Normalized type.
    #[serde(skip)]
    pub data_type: DataType,
    /// Whether the column accepts nulls.
    pub nullable: bool,
    /// Default expression, kept opaque.
    pub default: Option<String>,
    /// Whether the document flags this column as part of the primary key.
    pub is_primary_key: bool,
    /// Whether the document flags this column as a foreign key.
    pub is_foreign_key: bool,
}

impl ColumnDef {
    /// Create a non-nullable column with no default and no key flags.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            data_type: DataType::parse(&type_name),
            type_name,
            nullable: false,
            default: None,
            is_primary_key: false,
            is_foreign_key: false,
        }
    }
}
