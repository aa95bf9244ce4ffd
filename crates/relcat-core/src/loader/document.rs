//! Decoding of the metadata document into flat intermediate records.

use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::records::{RawColumn, RawForeignKey, RawIndex, RawTable};
use crate::error::{Error, Result};

/// A decoded metadata document.
///
/// Records are flattened out of the nested `schema → table → ...` maps in
/// document order. Nothing is cross-referenced here: a foreign key naming a
/// missing table decodes just fine.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataDocument {
    /// `version` member, kept opaque.
    pub version: Value,
    /// `views` member, kept opaque.
    pub views: Option<Value>,
    /// Table declarations from `tables`.
    pub tables: Vec<RawTable>,
    /// Column records from `columns`.
    pub columns: Vec<RawColumn>,
    /// Index records from `indexes`, one per (index, column).
    pub indexes: Vec<RawIndex>,
    /// Foreign-key records from `foreign_keys`.
    pub foreign_keys: Vec<RawForeignKey>,
}

/// Top-level members. Sections stay as JSON until they are decoded under
/// their own paths; unknown members are ignored.
#[derive(Deserialize)]
struct DocumentFile {
    version: Value,
    #[serde(default)]
    views: Option<Value>,
    tables: Value,
    columns: Value,
    indexes: Value,
    foreign_keys: Value,
}

/// `schema → table → T`
type Nested<T> = IndexMap<String, IndexMap<String, T>>;

impl MetadataDocument {
    /// Parse a document from JSON text.
    pub fn parse(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Read and parse a document from a file.
    ///
    /// The file is read completely before decoding starts.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), bytes = json.len(), "read metadata document");
        Self::parse(&json)
    }

    /// Decode a document from an already parsed JSON value.
    pub fn from_value(value: &Value) -> Result<Self> {
        let file: DocumentFile = decode(value, "<root>")?;

        let document = Self {
            tables: decode_tables(&file.tables)?,
            columns: decode_columns(&file.columns)?,
            indexes: decode_indexes(&file.indexes)?,
            foreign_keys: decode_foreign_keys(&file.foreign_keys)?,
            version: file.version,
            views: file.views,
        };

        debug!(
            tables = document.tables.len(),
            columns = document.columns.len(),
            indexes = document.indexes.len(),
            foreign_keys = document.foreign_keys.len(),
            "decoded metadata document"
        );
        Ok(document)
    }
}

impl FromStr for MetadataDocument {
    type Err = Error;

    fn from_str(json: &str) -> Result<Self> {
        Self::parse(json)
    }
}

/// Deserialize `value`, reporting failures against `path`.
fn decode<'de, T: Deserialize<'de>>(value: &'de Value, path: impl Into<String>) -> Result<T> {
    T::deserialize(value).map_err(|e| Error::malformed(path, e.to_string()))
}

fn decode_tables(value: &Value) -> Result<Vec<RawTable>> {
    let sections: IndexMap<String, Vec<String>> = decode(value, "tables")?;
    Ok(sections
        .into_iter()
        .flat_map(|(schema, names)| {
            names.into_iter().map(move |name| RawTable {
                schema: schema.clone(),
                name,
            })
        })
        .collect())
}

fn decode_columns(value: &Value) -> Result<Vec<RawColumn>> {
    let sections: Nested<IndexMap<String, Value>> = decode(value, "columns")?;
    let mut columns = Vec::new();
    for (schema, tables) in sections {
        for (table, records) in tables {
            for (name, record) in records {
                let mut column: RawColumn =
                    decode(&record, format!("columns/{schema}/{table}/{name}"))?;
                column.schema = schema.clone();
                column.table = table.clone();
                column.name = name;
                columns.push(column);
            }
        }
    }
    Ok(columns)
}

fn decode_indexes(value: &Value) -> Result<Vec<RawIndex>> {
    let sections: Nested<Vec<Value>> = decode(value, "indexes")?;
    let mut indexes = Vec::new();
    for (schema, tables) in sections {
        for (table, records) in tables {
            for (position, record) in records.iter().enumerate() {
                let mut index: RawIndex =
                    decode(record, format!("indexes/{schema}/{table}[{position}]"))?;
                index.schema = schema.clone();
                index.table = table.clone();
                indexes.push(index);
            }
        }
    }
    Ok(indexes)
}

fn decode_foreign_keys(value: &Value) -> Result<Vec<RawForeignKey>> {
    let sections: Nested<Vec<Value>> = decode(value, "foreign_keys")?;
    let mut foreign_keys = Vec::new();
    for (schema, tables) in sections {
        for (table, records) in tables {
            for (position, record) in records.iter().enumerate() {
                let mut foreign_key: RawForeignKey =
                    decode(record, format!("foreign_keys/{schema}/{table}[{position}]"))?;
                foreign_key.schema = schema.clone();
                foreign_key.table = table.clone();
                foreign_keys.push(foreign_key);
            }
        }
    }
    Ok(foreign_keys)
}
