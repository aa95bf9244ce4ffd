//! Individual integrity checks.

use std::collections::{BTreeSet, HashMap};

use super::diagnostic::{Diagnostic, DiagnosticKind, Location};
use crate::catalog::{Catalog, ForeignKeyDef, TableDef, TableId};
use crate::config::Deadline;
use crate::error::{render_cycle, Result};

/// Shared, read-only state for the per-table checks.
pub(crate) struct CheckContext<'a> {
    catalog: &'a Catalog,
    /// (schema, index name) -> tables using that name.
    index_owners: HashMap<(&'a str, &'a str), Vec<TableId>>,
}

impl<'a> CheckContext<'a> {
    pub(crate) fn new(catalog: &'a Catalog) -> Self {
        let mut index_owners: HashMap<(&str, &str), Vec<TableId>> = HashMap::new();
        for table in &catalog.tables {
            for index in &table.indexes {
                index_owners
                    .entry((table.schema(), index.name.as_str()))
                    .or_default()
                    .push(table.id);
            }
        }
        Self {
            catalog,
            index_owners,
        }
    }

    /// Run every per-table check against one table.
    pub(crate) fn check_table(&self, table: &'a TableDef) -> Vec<Diagnostic> {
        let mut out = Vec::new();
        for fk in self.catalog.outgoing_of(table.id) {
            self.check_foreign_key(table, fk, &mut out);
        }
        self.check_orphan(table, &mut out);
        self.check_index_names(table, &mut out);
        check_nullable_key(table, &mut out);
        check_missing_key(table, &mut out);
        self.check_flags(table, &mut out);
        check_key_index(table, &mut out);
        check_columns_present(table, &mut out);
        out
    }

    /// One diagnostic per elementary cycle, located at the cycle's first table.
    pub(crate) fn check_cycles(&self, deadline: Option<&Deadline>) -> Result<Vec<Diagnostic>> {
        let graph = self.catalog.dependency_graph();
        let cycles = match deadline {
            Some(deadline) => graph.cycles_within(deadline)?,
            None => graph.cycles(),
        };
        Ok(cycles
            .into_iter()
            .map(|cycle| {
                let names: Vec<_> = cycle
                    .iter()
                    .map(|&id| self.catalog.table_by_id(id).name.clone())
                    .collect();
                let first = &names[0];
                let message = if names.len() == 1 {
                    format!("table references itself: {}", render_cycle(&names))
                } else {
                    format!("dependency cycle: {}", render_cycle(&names))
                };
                Diagnostic::new(
                    DiagnosticKind::DependencyCycle,
                    Location::table(&first.schema, &first.table),
                    message,
                )
            })
            .collect())
    }

    /// One diagnostic per undeclared table that records were skipped for.
    pub(crate) fn check_undeclared(&self) -> Vec<Diagnostic> {
        self.catalog
            .undeclared_records()
            .iter()
            .map(|skipped| {
                let counts: Vec<String> = [
                    (skipped.columns, "column"),
                    (skipped.indexes, "index"),
                    (skipped.foreign_keys, "foreign-key"),
                ]
                .into_iter()
                .filter(|(count, _)| *count > 0)
                .map(|(count, section)| format!("{count} {section}"))
                .collect();
                Diagnostic::new(
                    DiagnosticKind::UndeclaredTableRecords,
                    Location::table(&skipped.table.schema, &skipped.table.table),
                    format!(
                        "table is not declared in `tables`; ignored {} record(s)",
                        counts.join(" and ")
                    ),
                )
            })
            .collect()
    }

    fn check_foreign_key(&self, table: &TableDef, fk: &ForeignKeyDef, out: &mut Vec<Diagnostic>) {
        let location = || Location::column(table.schema(), table.table_name(), &fk.column);
        let target_name = format!("{}.{}", fk.referenced_table, fk.referenced_column);

        let Some(source_column) = table.column(&fk.column) else {
            out.push(Diagnostic::new(
                DiagnosticKind::DanglingForeignKey,
                location(),
                format!(
                    "references {target_name}, but column {} does not exist in {}",
                    fk.column, table.name
                ),
            ));
            return;
        };
        let Some(target) = fk.target.map(|id| self.catalog.table_by_id(id)) else {
            out.push(Diagnostic::new(
                DiagnosticKind::DanglingForeignKey,
                location(),
                format!("references {target_name}, but table {} does not exist", fk.referenced_table),
            ));
            return;
        };
        let Some(target_column) = target.column(&fk.referenced_column) else {
            out.push(Diagnostic::new(
                DiagnosticKind::DanglingForeignKey,
                location(),
                format!(
                    "references {target_name}, but column {} does not exist",
                    fk.referenced_column
                ),
            ));
            return;
        };

        if !target.is_key_column(&fk.referenced_column) {
            out.push(Diagnostic::new(
                DiagnosticKind::NonKeyForeignKeyTarget,
                location(),
                format!("references {target_name}, which is not in a primary key or unique index"),
            ));
        }

        if !source_column
            .data_type
            .is_compatible_with(&target_column.data_type)
        {
            out.push(Diagnostic::new(
                DiagnosticKind::ForeignKeyTypeMismatch,
                location(),
                format!(
                    "column type {} is incompatible with {target_name} of type {}",
                    source_column.type_name, target_column.type_name
                ),
            ));
        }
    }

    fn check_orphan(&self, table: &TableDef, out: &mut Vec<Diagnostic>) {
        let isolated = self.catalog.outgoing[table.id.0].is_empty()
            && self.catalog.incoming[table.id.0].is_empty();
        if isolated && !table.has_primary_key() {
            out.push(Diagnostic::new(
                DiagnosticKind::OrphanTableNoKey,
                Location::table(table.schema(), table.table_name()),
                "table has no foreign-key edges and no primary key",
            ));
        }
    }

    fn check_index_names(&self, table: &'a TableDef, out: &mut Vec<Diagnostic>) {
        for index in &table.indexes {
            let Some(owners) = self.index_owners.get(&(table.schema(), index.name.as_str())) else {
                continue;
            };
            if owners.len() < 2 {
                continue;
            }
            let others: Vec<String> = owners
                .iter()
                .filter(|&&id| id != table.id)
                .map(|&id| self.catalog.table_by_id(id).name.to_string())
                .collect();
            out.push(Diagnostic::new(
                DiagnosticKind::AmbiguousIndexName,
                Location::index(table.schema(), table.table_name(), &index.name),
                format!("index name is also used by {}", others.join(", ")),
            ));
        }
    }

    fn check_flags(&self, table: &TableDef, out: &mut Vec<Diagnostic>) {
        let edge_columns: BTreeSet<&str> = self
            .catalog
            .outgoing_of(table.id)
            .map(|fk| fk.column.as_str())
            .collect();

        for column in &table.columns {
            let has_edge = edge_columns.contains(column.name.as_str());
            let message = if column.is_foreign_key && !has_edge {
                "flagged as a foreign key, but no foreign key is declared on it"
            } else if has_edge && !column.is_foreign_key && !column.is_primary_key {
                "has a declared foreign key, but is not flagged as a foreign key"
            } else {
                continue;
            };
            out.push(Diagnostic::new(
                DiagnosticKind::ForeignKeyFlagMismatch,
                Location::column(table.schema(), table.table_name(), &column.name),
                message,
            ));
        }
    }
}

fn check_nullable_key(table: &TableDef, out: &mut Vec<Diagnostic>) {
    let Some(key) = &table.primary_key else {
        return;
    };
    for column in table.columns.iter().filter(|c| key.contains(&c.name)) {
        if column.nullable {
            out.push(Diagnostic::new(
                DiagnosticKind::NullablePrimaryKeyColumn,
                Location::column(table.schema(), table.table_name(), &column.name),
                "primary key column is nullable",
            ));
        }
    }
}

fn check_missing_key(table: &TableDef, out: &mut Vec<Diagnostic>) {
    if !table.has_primary_key() {
        out.push(Diagnostic::new(
            DiagnosticKind::MissingPrimaryKey,
            Location::table(table.schema(), table.table_name()),
            "table has no primary key columns",
        ));
    }
}

fn check_key_index(table: &TableDef, out: &mut Vec<Diagnostic>) {
    for index in table.indexes.iter().filter(|i| i.is_primary) {
        let matches = table
            .primary_key
            .as_ref()
            .is_some_and(|key| key.same_columns(&index.columns));
        if !matches {
            let key_columns = table
                .primary_key
                .as_ref()
                .map(|key| key.columns.join(", "))
                .unwrap_or_default();
            out.push(Diagnostic::new(
                DiagnosticKind::PrimaryKeyIndexMismatch,
                Location::index(table.schema(), table.table_name(), &index.name),
                format!(
                    "primary key index covers ({}) but the primary key is ({key_columns})",
                    index.columns.join(", ")
                ),
            ));
        }
    }
}

fn check_columns_present(table: &TableDef, out: &mut Vec<Diagnostic>) {
    if table.columns.is_empty() {
        out.push(Diagnostic::new(
            DiagnosticKind::TableWithoutColumns,
            Location::table(table.schema(), table.table_name()),
            "table has no columns defined",
        ));
    }
}
