//! Serializable view of a validated catalog.
//!
//! Mirrors the input document's layout (schema, then table, then records) with
//! composite indexes collapsed, plus the derived primary keys and the
//! validation diagnostics.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::catalog::{Catalog, ColumnDef, IndexDef, PrimaryKey};
use crate::error::Result;
use crate::validate::{Diagnostic, ValidationReport};

type PerTable<'a, T> = IndexMap<&'a str, IndexMap<&'a str, T>>;

/// A catalog and its diagnostics, ready for `serde_json`.
#[derive(Debug, Serialize)]
pub struct CatalogReport<'a> {
    pub version: &'a Value,
    pub tables: IndexMap<&'a str, Vec<&'a str>>,
    pub columns: PerTable<'a, IndexMap<&'a str, ColumnEntry<'a>>>,
    pub indexes: PerTable<'a, Vec<IndexEntry<'a>>>,
    pub primary_keys: PerTable<'a, &'a PrimaryKey>,
    pub foreign_keys: PerTable<'a, Vec<ForeignKeyEntry<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub views: Option<&'a Value>,
    pub diagnostics: &'a [Diagnostic],
}

/// One column record, keyed by column name in [`CatalogReport::columns`].
#[derive(Debug, Serialize)]
pub struct ColumnEntry<'a> {
    #[serde(rename = "type")]
    pub type_name: &'a str,
    pub nullable: bool,
    pub default: Option<&'a str>,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
}

impl<'a> From<&'a ColumnDef> for ColumnEntry<'a> {
    fn from(column: &'a ColumnDef) -> Self {
        Self {
            type_name: &column.type_name,
            nullable: column.nullable,
            default: column.default.as_deref(),
            is_primary_key: column.is_primary_key,
            is_foreign_key: column.is_foreign_key,
        }
    }
}

/// A collapsed index.
#[derive(Debug, Serialize)]
pub struct IndexEntry<'a> {
    pub index_name: &'a str,
    pub columns: &'a [String],
    pub unique: bool,
    pub primary: bool,
}

impl<'a> From<&'a IndexDef> for IndexEntry<'a> {
    fn from(index: &'a IndexDef) -> Self {
        Self {
            index_name: &index.name,
            columns: &index.columns,
            unique: index.unique,
            primary: index.is_primary,
        }
    }
}

/// A foreign-key record with its resolution status.
#[derive(Debug, Serialize)]
pub struct ForeignKeyEntry<'a> {
    pub column: &'a str,
    pub referenced_table: String,
    pub referenced_column: &'a str,
    pub resolved: bool,
}

impl<'a> CatalogReport<'a> {
    /// Assemble a report from a catalog and the result of validating it.
    pub fn new(catalog: &'a Catalog, report: &'a ValidationReport) -> Self {
        let mut tables: IndexMap<&str, Vec<&str>> = IndexMap::new();
        let mut columns: PerTable<'a, IndexMap<&str, ColumnEntry<'a>>> = IndexMap::new();
        let mut indexes: PerTable<'a, Vec<IndexEntry<'a>>> = IndexMap::new();
        let mut primary_keys: PerTable<'a, &PrimaryKey> = IndexMap::new();
        let mut foreign_keys: PerTable<'a, Vec<ForeignKeyEntry<'a>>> = IndexMap::new();

        for table in catalog.tables() {
            let schema = table.schema();
            let name = table.table_name();
            tables.entry(schema).or_default().push(name);

            if !table.columns.is_empty() {
                columns.entry(schema).or_default().insert(
                    name,
                    table
                        .columns
                        .iter()
                        .map(|c| (c.name.as_str(), ColumnEntry::from(c)))
                        .collect(),
                );
            }
            if !table.indexes.is_empty() {
                indexes
                    .entry(schema)
                    .or_default()
                    .insert(name, table.indexes.iter().map(IndexEntry::from).collect());
            }
            if let Some(key) = &table.primary_key {
                primary_keys.entry(schema).or_default().insert(name, key);
            }

            let edges: Vec<ForeignKeyEntry<'a>> = catalog
                .outgoing_of(table.id)
                .map(|fk| ForeignKeyEntry {
                    column: &fk.column,
                    referenced_table: fk.referenced_table.to_string(),
                    referenced_column: &fk.referenced_column,
                    resolved: fk.is_resolved(),
                })
                .collect();
            if !edges.is_empty() {
                foreign_keys.entry(schema).or_default().insert(name, edges);
            }
        }

        Self {
            version: catalog.version(),
            tables,
            columns,
            indexes,
            primary_keys,
            foreign_keys,
            views: catalog.views(),
            diagnostics: report.diagnostics(),
        }
    }

    /// Render as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::loader::MetadataDocument;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_report_mirrors_document() {
        let document = MetadataDocument::from_value(&json!({
            "version": "1.1",
            "tables": { "production": ["stocks", "products"] },
            "columns": {
                "production": {
                    "stocks": {
                        "store_id": { "type": "int", "nullable": false, "is_primary_key": true },
                        "product_id": { "type": "int", "nullable": false, "is_primary_key": true }
                    },
                    "products": {
                        "product_id": { "type": "int", "nullable": false, "default": "0", "is_primary_key": true }
                    }
                }
            },
            "indexes": {
                "production": {
                    "stocks": [
                        { "index_name": "PK__stocks__E68284D3", "column": "store_id" },
                        { "index_name": "PK__stocks__E68284D3", "column": "product_id" }
                    ]
                }
            },
            "foreign_keys": {
                "production": {
                    "stocks": [{ "column": "product_id", "referenced_table": "production.products", "referenced_column": "product_id" }]
                }
            },
            "views": {}
        }))
        .unwrap();
        let catalog = build(&document).unwrap();
        let validation = catalog.validate();

        let value = serde_json::to_value(CatalogReport::new(&catalog, &validation)).unwrap();

        assert_eq!(value["version"], json!("1.1"));
        assert_eq!(value["tables"], json!({ "production": ["stocks", "products"] }));
        assert_eq!(
            value["columns"]["production"]["products"]["product_id"],
            json!({ "type": "int", "nullable": false, "default": "0", "is_primary_key": true, "is_foreign_key": false })
        );
        assert_eq!(
            value["indexes"]["production"]["stocks"],
            json!([{ "index_name": "PK__stocks__E68284D3", "columns": ["store_id", "product_id"], "unique": true, "primary": true }])
        );
        assert_eq!(
            value["primary_keys"]["production"]["stocks"]["columns"],
            json!(["store_id", "product_id"])
        );
        assert_eq!(
            value["foreign_keys"]["production"]["stocks"][0]["referenced_table"],
            json!("production.products")
        );
        assert_eq!(value["views"], json!({}));
        assert!(value["diagnostics"].is_array());
    }
}
