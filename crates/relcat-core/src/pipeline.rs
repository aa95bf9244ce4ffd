//! Load, build, and validate in one call.

use std::path::Path;

use tracing::{info, instrument};

use crate::builder::CatalogBuilder;
use crate::catalog::Catalog;
use crate::config::{CatalogConfig, Deadline};
use crate::error::Result;
use crate::loader::MetadataDocument;
use crate::report::CatalogReport;
use crate::validate::{ValidationReport, Validator};

/// An immutable catalog together with the findings from validating it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedCatalog {
    pub catalog: Catalog,
    pub report: ValidationReport,
}

impl ValidatedCatalog {
    /// Serializable view of the catalog and its diagnostics.
    pub fn to_report(&self) -> CatalogReport<'_> {
        CatalogReport::new(&self.catalog, &self.report)
    }
}

/// Build and validate a decoded document.
///
/// The configured deadline covers both stages. It is checked between them,
/// between per-table checks, and while enumerating dependency cycles.
#[instrument(skip_all)]
pub fn load(document: &MetadataDocument, config: &CatalogConfig) -> Result<ValidatedCatalog> {
    run(document, config, config.start_deadline())
}

/// Parse, build, and validate a document held in memory.
pub fn load_str(json: &str, config: &CatalogConfig) -> Result<ValidatedCatalog> {
    let deadline = config.start_deadline();
    let document = MetadataDocument::parse(json)?;
    run(&document, config, deadline)
}

/// Read, parse, build, and validate a document file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_path(path: impl AsRef<Path>, config: &CatalogConfig) -> Result<ValidatedCatalog> {
    let deadline = config.start_deadline();
    let document = MetadataDocument::from_path(path)?;
    run(&document, config, deadline)
}

fn run(
    document: &MetadataDocument,
    config: &CatalogConfig,
    deadline: Option<Deadline>,
) -> Result<ValidatedCatalog> {
    let check = || deadline.as_ref().map_or(Ok(()), Deadline::check);

    check()?;
    let catalog = CatalogBuilder::new(config.clone()).build(document)?;
    check()?;

    let mut validator = Validator::new().with_parallel(config.parallel_validation);
    if let Some(deadline) = deadline {
        validator = validator.with_deadline(deadline);
    }
    let report = validator.validate(&catalog)?;

    info!(
        tables = catalog.tables().len(),
        diagnostics = report.len(),
        "catalog loaded"
    );
    Ok(ValidatedCatalog { catalog, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::time::Duration;

    const DOCUMENT: &str = r#"{
        "version": "1.0",
        "tables": { "hr": ["staffs"] },
        "columns": {
            "hr": {
                "staffs": {
                    "staff_id": { "type": "int", "nullable": false, "is_primary_key": true },
                    "manager_id": { "type": "int", "nullable": true, "is_foreign_key": true }
                }
            }
        },
        "indexes": { "hr": { "staffs": [{ "index_name": "PK__staffs__1963DD9C", "column": "staff_id" }] } },
        "foreign_keys": {
            "hr": { "staffs": [{ "column": "manager_id", "referenced_table": "hr.staffs", "referenced_column": "staff_id" }] }
        }
    }"#;

    #[test]
    fn test_load_str() {
        let loaded = load_str(DOCUMENT, &CatalogConfig::default()).unwrap();

        assert_eq!(loaded.catalog.table_names(), vec!["hr.staffs"]);
        assert_eq!(loaded.report.len(), 1);
        assert!(!loaded.report.has_errors());
    }

    #[test]
    fn test_load_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, DOCUMENT).unwrap();

        let from_path = load_path(&path, &CatalogConfig::default().with_parallel_validation(false)).unwrap();
        let from_str = load_str(DOCUMENT, &CatalogConfig::default()).unwrap();
        assert_eq!(from_path, from_str);
    }

    #[test]
    fn test_view_columns_and_unknown_source_column_load() {
        let document = r#"{
            "version": "1.0",
            "tables": { "sales": ["orders", "customers"] },
            "views": { "sales": ["v_order_summary"] },
            "columns": {
                "sales": {
                    "orders": {
                        "order_id": { "type": "int", "nullable": false, "is_primary_key": true },
                        "customer_id": { "type": "int", "nullable": true, "is_foreign_key": true }
                    },
                    "customers": {
                        "customer_id": { "type": "int", "nullable": false, "is_primary_key": true }
                    },
                    "v_order_summary": {
                        "order_id": { "type": "int", "nullable": false },
                        "total": { "type": "decimal", "nullable": true }
                    }
                }
            },
            "indexes": {},
            "foreign_keys": {
                "sales": {
                    "orders": [
                        { "column": "customer_id", "referenced_table": "sales.customers", "referenced_column": "customer_id" },
                        { "column": "salesperson_id", "referenced_table": "sales.customers", "referenced_column": "customer_id" }
                    ]
                }
            }
        }"#;

        let loaded = load_str(document, &CatalogConfig::default()).unwrap();
        assert_eq!(loaded.catalog.table_names(), vec!["sales.orders", "sales.customers"]);
        assert_eq!(loaded.catalog.foreign_keys().len(), 2);

        let locations: Vec<String> = loaded
            .report
            .of_kind(crate::DiagnosticKind::DanglingForeignKey)
            .map(|d| d.location.to_string())
            .collect();
        assert_eq!(locations, vec!["sales.orders.salesperson_id"]);
    }

    #[test]
    fn test_load_failure_is_fatal() {
        let err = load_str(r#"{ "version": "1.0" }"#, &CatalogConfig::default()).unwrap_err();
        assert!(err.is_load_failure());
    }

    #[test]
    fn test_deadline() {
        let config = CatalogConfig::default().with_deadline(Duration::ZERO);
        assert!(matches!(
            load_str(DOCUMENT, &config),
            Err(Error::DeadlineExceeded { .. })
        ));

        let config = CatalogConfig::default().with_deadline(Duration::from_secs(3600));
        assert!(load_str(DOCUMENT, &config).is_ok());
    }
}
