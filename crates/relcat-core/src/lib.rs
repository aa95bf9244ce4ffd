//! relcat core - relational catalog model and referential-integrity validator.
//!
//! A metadata document (schemas, tables, columns, indexes, foreign keys) goes
//! through four stages:
//!
//! 1. [`loader`] decodes it into flat records.
//! 2. [`builder`] normalizes those into an immutable [`Catalog`].
//! 3. [`validate`] reports structural findings as [`Diagnostic`]s.
//! 4. [`analysis`] orders tables by their foreign-key dependencies.
//!
//! [`load`] runs the first three under one [`CatalogConfig`].

pub mod analysis;
pub mod builder;
pub mod catalog;
pub mod config;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod validate;

pub use analysis::{DependencyGraph, TopologicalOrder};
pub use builder::{build, CatalogBuilder};
pub use catalog::{
    Catalog, ColumnDef, DataType, ForeignKeyDef, IndexDef, PrimaryKey, QualifiedName, SchemaDef,
    TableDef, TableId, TypeFamily, UndeclaredRecords,
};
pub use config::{CatalogConfig, Deadline};
pub use error::{CyclicDependency, Error, Result};
pub use loader::MetadataDocument;
pub use pipeline::{load, load_path, load_str, ValidatedCatalog};
pub use report::CatalogReport;
pub use validate::{
    validate, Diagnostic, DiagnosticKind, Location, Severity, ValidationReport, Validator,
};
