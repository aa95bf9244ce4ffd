//! Catalog model.
//!
//! Schemas own tables; tables own their columns, primary key, and indexes.
//! Foreign keys are a separate relation referring to tables by identity.

mod catalog;
mod column;
mod foreign_key;
mod index;
mod name;
mod schema;
mod table;
mod types;

pub use catalog::{Catalog, UndeclaredRecords};
pub use column::ColumnDef;
pub use foreign_key::ForeignKeyDef;
pub use index::{is_primary_key_name, is_unique_name, IndexDef, PrimaryKey};
pub use name::QualifiedName;
pub use schema::SchemaDef;
pub use table::{TableDef, TableId};
pub use types::{DataType, TypeFamily};
