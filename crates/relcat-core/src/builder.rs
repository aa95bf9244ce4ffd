//! Catalog builder.
//!
//! Turns decoded [`MetadataDocument`] records into a normalized [`Catalog`]:
//! - interns `(schema, table)` pairs into table identities
//! - collapses repeated index records into composite indexes
//! - derives primary keys from column flags
//! - resolves foreign-key targets, keeping unresolved edges for the validator
//! - skips records for tables missing from `tables`, remembering them for the validator

use std::collections::HashMap;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::catalog::{
    Catalog, ColumnDef, ForeignKeyDef, IndexDef, PrimaryKey, QualifiedName, SchemaDef, TableDef,
    TableId, UndeclaredRecords,
};
use crate::config::CatalogConfig;
use crate::error::{Error, Result};
use crate::loader::{MetadataDocument, RawColumn, RawForeignKey, RawIndex};

/// Builds catalogs from decoded documents.
#[derive(Debug, Clone, Default)]
pub struct CatalogBuilder {
    config: CatalogConfig,
}

impl CatalogBuilder {
    /// Create a builder with the given configuration.
    pub fn new(config: CatalogConfig) -> Self {
        Self { config }
    }

    /// Build a catalog.
    ///
    /// Fails on duplicate tables and on index records naming unknown columns.
    /// Foreign keys whose source column or target cannot be found are kept as
    /// edges for the validator to report. Records for undeclared tables are
    /// skipped; those belonging to a declared view are skipped silently.
    #[instrument(skip_all)]
    pub fn build(&self, document: &MetadataDocument) -> Result<Catalog> {
        let mut state = BuildState {
            views: document.views.as_ref(),
            ..BuildState::default()
        };

        for raw in &document.tables {
            if self.config.is_excluded(&raw.schema) {
                debug!(schema = %raw.schema, table = %raw.name, "skipping excluded schema");
                continue;
            }
            state.declare(QualifiedName::new(&raw.schema, &raw.name))?;
        }

        for raw in &document.columns {
            if !self.config.is_excluded(&raw.schema) {
                state.add_column(raw);
            }
        }

        let mut index_groups: Vec<IndexMap<String, IndexDef>> =
            vec![IndexMap::new(); state.tables.len()];
        let mut explicit_unique: HashMap<(TableId, String), bool> = HashMap::new();
        for raw in &document.indexes {
            if self.config.is_excluded(&raw.schema) {
                continue;
            }
            let Some(id) = state.add_index_record(raw, &mut index_groups)? else {
                continue;
            };
            if let Some(unique) = raw.unique {
                let entry = explicit_unique
                    .entry((id, raw.index_name.clone()))
                    .or_insert(false);
                *entry |= unique;
            }
        }

        for (table, groups) in state.tables.iter_mut().zip(index_groups) {
            let id = table.id;
            table.indexes = groups
                .into_values()
                .map(|mut index| {
                    if let Some(&unique) = explicit_unique.get(&(id, index.name.clone())) {
                        index.unique = unique || index.is_primary;
                    }
                    index
                })
                .collect();
            table.primary_key = derive_primary_key(table);
        }

        for raw in &document.foreign_keys {
            if !self.config.is_excluded(&raw.schema) {
                state.add_foreign_key(raw);
            }
        }

        let catalog = state.finish(document);
        let dangling = catalog
            .foreign_keys
            .iter()
            .filter(|fk| !fk.is_resolved())
            .count();
        info!(
            schemas = catalog.schemas.len(),
            tables = catalog.tables.len(),
            foreign_keys = catalog.foreign_keys.len(),
            dangling,
            undeclared = catalog.undeclared.len(),
            "catalog built"
        );
        Ok(catalog)
    }
}

/// Build a catalog with the default configuration.
pub fn build(document: &MetadataDocument) -> Result<Catalog> {
    CatalogBuilder::default().build(document)
}

/// Key columns come from column flags in declaration order, never from index record order.
fn derive_primary_key(table: &TableDef) -> Option<PrimaryKey> {
    let columns: Vec<String> = table
        .columns
        .iter()
        .filter(|c| c.is_primary_key)
        .map(|c| c.name.clone())
        .collect();
    if columns.is_empty() {
        return None;
    }
    let name = table
        .indexes
        .iter()
        .find(|i| i.is_primary)
        .map(|i| i.name.clone());
    Some(PrimaryKey { name, columns })
}

#[derive(Clone, Copy)]
enum Section {
    Columns,
    Indexes,
    ForeignKeys,
}

impl Section {
    fn as_str(self) -> &'static str {
        match self {
            Section::Columns => "columns",
            Section::Indexes => "indexes",
            Section::ForeignKeys => "foreign_keys",
        }
    }
}

/// Whether the opaque `views` member declares `schema.table`, either as
/// `{ "schema": ["view", ...] }` or `{ "schema": { "view": ... } }`.
fn declares_view(views: Option<&Value>, schema: &str, table: &str) -> bool {
    match views.and_then(|views| views.get(schema)) {
        Some(Value::Array(names)) => names.iter().any(|name| name.as_str() == Some(table)),
        Some(Value::Object(names)) => names.contains_key(table),
        _ => false,
    }
}

#[derive(Default)]
struct BuildState<'a> {
    views: Option<&'a Value>,
    undeclared: IndexMap<QualifiedName, UndeclaredRecords>,
    schemas: IndexMap<String, SchemaDef>,
    tables: Vec<TableDef>,
    lookup: HashMap<QualifiedName, TableId>,
    foreign_keys: Vec<ForeignKeyDef>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl BuildState<'_> {
    fn declare(&mut self, name: QualifiedName) -> Result<TableId> {
        if self.lookup.contains_key(&name) {
            return Err(Error::DuplicateTable {
                schema: name.schema,
                table: name.table,
            });
        }

        let id = TableId(self.tables.len());
        self.schemas
            .entry(name.schema.clone())
            .or_insert_with(|| SchemaDef::new(name.schema.clone()))
            .tables
            .push(id);
        self.lookup.insert(name.clone(), id);
        self.tables.push(TableDef::new(id, name));
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        Ok(id)
    }

    /// Table owning a record, or `None` when the record is skipped.
    fn resolve(&mut self, section: Section, schema: &str, table: &str) -> Option<TableId> {
        let name = QualifiedName::new(schema, table);
        if let Some(&id) = self.lookup.get(&name) {
            return Some(id);
        }

        if declares_view(self.views, schema, table) {
            debug!(section = section.as_str(), view = %name, "skipping view record");
            return None;
        }

        let skipped = self
            .undeclared
            .entry(name.clone())
            .or_insert_with(|| UndeclaredRecords::new(name));
        match section {
            Section::Columns => skipped.columns += 1,
            Section::Indexes => skipped.indexes += 1,
            Section::ForeignKeys => skipped.foreign_keys += 1,
        }
        warn!(
            section = section.as_str(),
            table = %skipped.table,
            "skipping record for undeclared table"
        );
        None
    }

    fn add_column(&mut self, raw: &RawColumn) {
        let Some(id) = self.resolve(Section::Columns, &raw.schema, &raw.table) else {
            return;
        };
        self.tables[id.0].columns.push(ColumnDef {
            nullable: raw.nullable,
            default: raw.default.clone(),
            is_primary_key: raw.is_primary_key,
            is_foreign_key: raw.is_foreign_key,
            ..ColumnDef::new(&raw.name, &raw.type_name)
        });
    }

    fn add_index_record(
        &mut self,
        raw: &RawIndex,
        groups: &mut [IndexMap<String, IndexDef>],
    ) -> Result<Option<TableId>> {
        let Some(id) = self.resolve(Section::Indexes, &raw.schema, &raw.table) else {
            return Ok(None);
        };
        if !self.tables[id.0].has_column(&raw.column) {
            return Err(Error::IndexColumnUnknown {
                schema: raw.schema.clone(),
                table: raw.table.clone(),
                index: raw.index_name.clone(),
                column: raw.column.clone(),
            });
        }

        groups[id.0]
            .entry(raw.index_name.clone())
            .and_modify(|index| index.push_column(&raw.column))
            .or_insert_with(|| IndexDef::new(&raw.index_name, &raw.column));
        Ok(Some(id))
    }

    fn add_foreign_key(&mut self, raw: &RawForeignKey) {
        let Some(source) = self.resolve(Section::ForeignKeys, &raw.schema, &raw.table) else {
            return;
        };
        if !self.tables[source.0].has_column(&raw.column) {
            warn!(
                table = %self.tables[source.0].name,
                column = %raw.column,
                "foreign key source column not found"
            );
        }

        let referenced_table = QualifiedName::parse_in(&raw.referenced_table, &raw.schema);
        let target = self.lookup.get(&referenced_table).copied();
        if target.is_none() {
            warn!(
                table = %self.tables[source.0].name,
                column = %raw.column,
                referenced_table = %referenced_table,
                "foreign key target not found; keeping unresolved edge"
            );
        }

        let position = self.foreign_keys.len();
        self.foreign_keys.push(ForeignKeyDef {
            source,
            source_table: self.tables[source.0].name.clone(),
            column: raw.column.clone(),
            referenced_table,
            referenced_column: raw.referenced_column.clone(),
            target,
        });
        self.outgoing[source.0].push(position);
        if let Some(target) = target {
            self.incoming[target.0].push(position);
        }
    }

    fn finish(self, document: &MetadataDocument) -> Catalog {
        Catalog {
            version: document.version.clone(),
            views: document.views.clone(),
            schemas: self.schemas.into_values().collect(),
            tables: self.tables,
            foreign_keys: self.foreign_keys,
            lookup: self.lookup,
            outgoing: self.outgoing,
            incoming: self.incoming,
            undeclared: self.undeclared.into_values().collect(),
        }
    }
}
