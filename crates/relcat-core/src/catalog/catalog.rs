//! The immutable catalog graph and its read-only query façade.

use std::collections::HashMap;

use serde_json::Value;

use super::{
    ColumnDef, ForeignKeyDef, IndexDef, PrimaryKey, QualifiedName, SchemaDef, TableDef, TableId,
};
use crate::analysis::DependencyGraph;
use crate::error::{Error, Result};
use crate::validate::{self, ValidationReport};

/// A normalized, cross-referenced catalog of schemas, tables, and foreign keys.
///
/// Built once by [`CatalogBuilder`](crate::builder::CatalogBuilder) and never mutated
/// afterwards, so it can be shared across threads freely. To pick up a changed
/// document, build a new catalog and drop the old one.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub(crate) version: Value,
    pub(crate) views: Option<Value>,
    pub(crate) schemas: Vec<SchemaDef>,
    pub(crate) tables: Vec<TableDef>,
    pub(crate) foreign_keys: Vec<ForeignKeyDef>,
    pub(crate) lookup: HashMap<QualifiedName, TableId>,
    /// Foreign-key positions per source table.
    pub(crate) outgoing: Vec<Vec<usize>>,
    /// Resolved foreign-key positions per target table.
    pub(crate) incoming: Vec<Vec<usize>>,
    pub(crate) undeclared: Vec<UndeclaredRecords>,
}

/// Records skipped because their table is missing from `tables`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndeclaredRecords {
    /// The table the records name.
    pub table: QualifiedName,
    /// Skipped `columns` entries.
    pub columns: usize,
    /// Skipped `indexes` entries.
    pub indexes: usize,
    /// Skipped `foreign_keys` entries.
    pub foreign_keys: usize,
}

impl UndeclaredRecords {
    pub(crate) fn new(table: QualifiedName) -> Self {
        Self {
            table,
            columns: 0,
            indexes: 0,
            foreign_keys: 0,
        }
    }
}

impl Catalog {
    /// Document version, passed through unchanged.
    pub fn version(&self) -> &Value {
        &self.version
    }

    /// Document views member, passed through unchanged.
    pub fn views(&self) -> Option<&Value> {
        self.views.as_ref()
    }

    /// Records the builder skipped because their table was never declared,
    /// in order of first appearance. Views are not listed here.
    pub fn undeclared_records(&self) -> &[UndeclaredRecords] {
        &self.undeclared
    }

    /// Schemas in declaration order.
    pub fn schemas(&self) -> &[SchemaDef] {
        &self.schemas
    }

    /// Get a schema by name.
    pub fn schema(&self, name: &str) -> Option<&SchemaDef> {
        self.schemas.iter().find(|s| s.name == name)
    }

    /// All tables in declaration order.
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    /// Tables of one schema in declaration order.
    pub fn tables_in(&self, schema: &str) -> impl Iterator<Item = &TableDef> {
        self.schema(schema)
            .into_iter()
            .flat_map(move |s| s.tables.iter().map(move |id| self.table_by_id(*id)))
    }

    /// All qualified table names (`schema.table`) in declaration order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|t| t.name.to_string()).collect()
    }

    /// Resolve a qualified name to a table identity.
    pub fn lookup(&self, name: &QualifiedName) -> Option<TableId> {
        self.lookup.get(name).copied()
    }

    /// Resolve a `schema.table` string to a table identity.
    pub fn table_id(&self, name: &str) -> Result<TableId> {
        QualifiedName::parse(name)
            .and_then(|qualified| self.lookup(&qualified))
            .ok_or_else(|| Error::TableNotFound {
                name: name.to_string(),
            })
    }

    /// Look up a table by `schema.table`.
    pub fn table(&self, name: &str) -> Result<&TableDef> {
        self.table_id(name).map(|id| self.table_by_id(id))
    }

    /// Get a table by identity, if it belongs to this catalog.
    pub fn get(&self, id: TableId) -> Option<&TableDef> {
        self.tables.get(id.0)
    }

    /// Identities handed out by this catalog are always in range.
    pub(crate) fn table_by_id(&self, id: TableId) -> &TableDef {
        &self.tables[id.0]
    }

    /// Columns of a table in declaration order.
    pub fn columns(&self, table: &str) -> Result<&[ColumnDef]> {
        self.table(table).map(|t| t.columns.as_slice())
    }

    /// Get one column of a table.
    pub fn column(&self, table: &str, column: &str) -> Result<Option<&ColumnDef>> {
        self.table(table).map(|t| t.column(column))
    }

    /// Indexes of a table.
    pub fn indexes(&self, table: &str) -> Result<&[IndexDef]> {
        self.table(table).map(|t| t.indexes.as_slice())
    }

    /// Primary key of a table.
    pub fn primary_key(&self, table: &str) -> Result<Option<&PrimaryKey>> {
        self.table(table).map(|t| t.primary_key.as_ref())
    }

    /// All foreign keys in declaration order.
    pub fn foreign_keys(&self) -> &[ForeignKeyDef] {
        &self.foreign_keys
    }

    /// Foreign keys declared on a table.
    pub fn foreign_keys_from(&self, table: &str) -> Result<Vec<&ForeignKeyDef>> {
        let id = self.table_id(table)?;
        Ok(self.outgoing_of(id).collect())
    }

    /// Resolved foreign keys referencing a table.
    pub fn foreign_keys_to(&self, table: &str) -> Result<Vec<&ForeignKeyDef>> {
        let id = self.table_id(table)?;
        Ok(self.incoming_of(id).collect())
    }

    pub(crate) fn outgoing_of(&self, id: TableId) -> impl Iterator<Item = &ForeignKeyDef> {
        self.outgoing[id.0]
            .iter()
            .map(move |&i| &self.foreign_keys[i])
    }

    pub(crate) fn incoming_of(&self, id: TableId) -> impl Iterator<Item = &ForeignKeyDef> {
        self.incoming[id.0]
            .iter()
            .map(move |&i| &self.foreign_keys[i])
    }

    /// Build the table dependency graph.
    pub fn dependency_graph(&self) -> DependencyGraph<'_> {
        DependencyGraph::new(self)
    }

    /// Run every integrity check; see [`validate::validate`].
    pub fn validate(&self) -> ValidationReport {
        validate::validate(self)
    }
}
