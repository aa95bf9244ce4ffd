//! Intermediate records produced by the loader.
//!
//! Record bodies are decoded with serde. The schema, table and column names
//! come from the enclosing map keys and are filled in by the loader.

use serde::{de, Deserialize, Deserializer};
use serde_json::Value;

/// A `tables` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTable {
    /// Schema name.
    pub schema: String,
    /// Table name.
    pub name: String,
}

/// A `columns` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawColumn {
    /// Schema name.
    #[serde(skip)]
    pub schema: String,
    /// Table name.
    #[serde(skip)]
    pub table: String,
    /// Column name.
    #[serde(skip)]
    pub name: String,
    /// Declared type name.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Nullability flag.
    pub nullable: bool,
    /// Default expression, if any.
    #[serde(default, deserialize_with = "opaque_scalar")]
    pub default: Option<String>,
    /// Primary-key membership flag.
    #[serde(default, deserialize_with = "flag")]
    pub is_primary_key: bool,
    /// Foreign-key membership flag.
    #[serde(default, deserialize_with = "flag")]
    pub is_foreign_key: bool,
}

/// One `indexes` entry: a single column of a possibly composite index.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawIndex {
    /// Schema name.
    #[serde(skip)]
    pub schema: String,
    /// Table name.
    #[serde(skip)]
    pub table: String,
    /// Index name, shared by all records of a composite index.
    pub index_name: String,
    /// Indexed column.
    pub column: String,
    /// Explicit uniqueness, when the extractor reports it.
    #[serde(default)]
    pub unique: Option<bool>,
}

/// A `foreign_keys` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawForeignKey {
    /// Schema of the referencing table.
    #[serde(skip)]
    pub schema: String,
    /// Referencing table.
    #[serde(skip)]
    pub table: String,
    /// Referencing column.
    pub column: String,
    /// Referenced table, normally `schema.table`.
    pub referenced_table: String,
    /// Referenced column.
    pub referenced_column: String,
}

/// Optional boolean flag; `null` reads as `false`.
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Scalar kept as opaque text: strings as-is, numbers and booleans rendered.
fn opaque_scalar<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        scalar @ (Value::Number(_) | Value::Bool(_)) => Ok(Some(scalar.to_string())),
        other => Err(de::Error::invalid_type(
            unexpected(&other),
            &"a string, number or boolean",
        )),
    }
}

fn unexpected(value: &Value) -> de::Unexpected<'static> {
    match value {
        Value::Array(_) => de::Unexpected::Seq,
        _ => de::Unexpected::Map,
    }
}
