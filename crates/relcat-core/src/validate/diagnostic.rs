//! Validation findings.

use std::cmp::Ordering;
use std::fmt;

use serde::Serialize;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Questionable but usable structure.
    Warning,
    /// Structure that downstream consumers should not rely on.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Kind of finding. Variant order is the check order used when sorting diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Foreign key whose source column, target table or target column is missing.
    DanglingForeignKey,
    /// Foreign key whose target column is in no primary key or unique index.
    NonKeyForeignKeyTarget,
    /// Foreign key between columns of incompatible base types.
    ForeignKeyTypeMismatch,
    /// Table with no foreign-key edges and no primary key.
    OrphanTableNoKey,
    /// Index name used by more than one table of a schema.
    AmbiguousIndexName,
    /// Primary-key column that accepts nulls.
    NullablePrimaryKeyColumn,
    /// Table with no primary-key columns.
    MissingPrimaryKey,
    /// Column flag disagreeing with the declared foreign keys.
    ForeignKeyFlagMismatch,
    /// Primary-key index whose columns differ from the primary key.
    PrimaryKeyIndexMismatch,
    /// Declared table with no columns.
    TableWithoutColumns,
    /// Elementary cycle in the dependency graph.
    DependencyCycle,
    /// Column, index or foreign-key records naming a table that was never declared.
    UndeclaredTableRecords,
}

impl DiagnosticKind {
    /// Severity attached to every finding of this kind.
    pub fn severity(self) -> Severity {
        match self {
            DiagnosticKind::DanglingForeignKey
            | DiagnosticKind::ForeignKeyTypeMismatch
            | DiagnosticKind::NullablePrimaryKeyColumn => Severity::Error,
            _ => Severity::Warning,
        }
    }

    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticKind::DanglingForeignKey => "dangling_foreign_key",
            DiagnosticKind::NonKeyForeignKeyTarget => "non_key_foreign_key_target",
            DiagnosticKind::ForeignKeyTypeMismatch => "foreign_key_type_mismatch",
            DiagnosticKind::OrphanTableNoKey => "orphan_table_no_key",
            DiagnosticKind::AmbiguousIndexName => "ambiguous_index_name",
            DiagnosticKind::NullablePrimaryKeyColumn => "nullable_primary_key_column",
            DiagnosticKind::MissingPrimaryKey => "missing_primary_key",
            DiagnosticKind::ForeignKeyFlagMismatch => "foreign_key_flag_mismatch",
            DiagnosticKind::PrimaryKeyIndexMismatch => "primary_key_index_mismatch",
            DiagnosticKind::TableWithoutColumns => "table_without_columns",
            DiagnosticKind::DependencyCycle => "dependency_cycle",
            DiagnosticKind::UndeclaredTableRecords => "undeclared_table_records",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finding applies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Location {
    /// A whole table.
    Table { schema: String, table: String },
    /// One column of a table.
    Column {
        schema: String,
        table: String,
        column: String,
    },
    /// One index of a table.
    Index {
        schema: String,
        table: String,
        index: String,
    },
}

impl Location {
    /// Location covering a whole table.
    pub fn table(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Location::Table {
            schema: schema.into(),
            table: table.into(),
        }
    }

    /// Location of one column.
    pub fn column(
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Location::Column {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    /// Location of one index, by name.
    pub fn index(
        schema: impl Into<String>,
        table: impl Into<String>,
        index: impl Into<String>,
    ) -> Self {
        Location::Index {
            schema: schema.into(),
            table: table.into(),
            index: index.into(),
        }
    }

    /// Schema name.
    pub fn schema(&self) -> &str {
        match self {
            Location::Table { schema, .. }
            | Location::Column { schema, .. }
            | Location::Index { schema, .. } => schema,
        }
    }

    /// Table name.
    pub fn table_name(&self) -> &str {
        match self {
            Location::Table { table, .. }
            | Location::Column { table, .. }
            | Location::Index { table, .. } => table,
        }
    }

    /// Column or index name, if the location is narrower than a table.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Location::Table { .. } => None,
            Location::Column { column, .. } => Some(column),
            Location::Index { index, .. } => Some(index),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema(), self.table_name())?;
        if let Some(detail) = self.detail() {
            write!(f, ".{detail}")?;
        }
        Ok(())
    }
}

/// A non-fatal finding about a built catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Diagnostic {
    /// Which check produced the finding.
    pub kind: DiagnosticKind,
    /// Always `kind.severity()`.
    pub severity: Severity,
    /// Table, column or index the finding is about.
    pub location: Location,
    /// Human-readable detail.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic with the kind's severity.
    pub fn new(kind: DiagnosticKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            location,
            message: message.into(),
        }
    }

    /// Check if this is an error-level finding.
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    fn sort_key(&self) -> (&str, &str, DiagnosticKind, Option<&str>, &str) {
        (
            self.location.schema(),
            self.location.table_name(),
            self.kind,
            self.location.detail(),
            &self.message,
        )
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] {}: {}",
            self.severity, self.kind, self.location, self.message
        )
    }
}

/// Ordered findings of one validation run.
///
/// Diagnostics are sorted by schema, table, kind, column or index name, then
/// message, so repeated runs compare equal regardless of scheduling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationReport {
    diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    pub(crate) fn from_unsorted(mut diagnostics: Vec<Diagnostic>) -> Self {
        diagnostics.sort();
        Self { diagnostics }
    }

    /// All diagnostics in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Iterate over diagnostics in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.diagnostics.iter()
    }

    /// Error-level diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    /// Warning-level diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }

    /// Check if any error-level diagnostic was produced.
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Check if validation found nothing at all.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of diagnostics.
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Same as [`is_clean`](Self::is_clean).
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

impl<'a> IntoIterator for &'a ValidationReport {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_by_kind() {
        assert_eq!(DiagnosticKind::DanglingForeignKey.severity(), Severity::Error);
        assert_eq!(DiagnosticKind::NonKeyForeignKeyTarget.severity(), Severity::Warning);
        assert_eq!(DiagnosticKind::ForeignKeyTypeMismatch.severity(), Severity::Error);
        assert_eq!(DiagnosticKind::NullablePrimaryKeyColumn.severity(), Severity::Error);
        assert_eq!(DiagnosticKind::DependencyCycle.severity(), Severity::Warning);
        assert_eq!(DiagnosticKind::UndeclaredTableRecords.severity(), Severity::Warning);
        assert!(Severity::Error > Severity::Warning);
    }

    #[test]
    fn test_report_ordering() {
        let report = ValidationReport::from_unsorted(vec![
            Diagnostic::new(
                DiagnosticKind::DependencyCycle,
                Location::table("production", "products"),
                "cycle",
            ),
            Diagnostic::new(
                DiagnosticKind::NonKeyForeignKeyTarget,
                Location::column("production", "products", "category_id"),
                "not a key",
            ),
            Diagnostic::new(
                DiagnosticKind::NonKeyForeignKeyTarget,
                Location::column("production", "products", "brand_id"),
                "not a key",
            ),
            Diagnostic::new(
                DiagnosticKind::DependencyCycle,
                Location::table("hr", "staffs"),
                "cycle",
            ),
        ]);

        let locations: Vec<String> = report.iter().map(|d| d.location.to_string()).collect();
        assert_eq!(
            locations,
            vec![
                "hr.staffs",
                "production.products.brand_id",
                "production.products.category_id",
                "production.products",
            ]
        );
        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 4);
    }

    #[test]
    fn test_display() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::DanglingForeignKey,
            Location::column("sales", "orders", "staff_id"),
            "references missing table hr.staffs",
        );

        assert_eq!(
            diagnostic.to_string(),
            "error [dangling_foreign_key] sales.orders.staff_id: references missing table hr.staffs"
        );
    }

    #[test]
    fn test_serialize() {
        let diagnostic = Diagnostic::new(
            DiagnosticKind::AmbiguousIndexName,
            Location::index("sales", "orders", "ix_date"),
            "shared",
        );

        let json = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(json["kind"], "ambiguous_index_name");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["location"]["scope"], "index");
        assert_eq!(json["location"]["index"], "ix_date");
    }
}
