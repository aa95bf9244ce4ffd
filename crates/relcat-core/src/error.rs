//! Core error types.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::QualifiedName;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Catalog errors.
///
/// Load-time variants (`MalformedDocument`, `DuplicateTable`, `IndexColumnUnknown`, ...) are
/// fatal to the catalog being built. Structural findings about a built catalog are reported as
/// [`Diagnostic`](crate::validate::Diagnostic)s instead.
#[derive(Debug, Error)]
pub enum Error {
    /// A required member is absent or has the wrong shape.
    #[error("malformed document at {path}: {reason}")]
    MalformedDocument {
        /// Slash-separated location of the offending record.
        path: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The document or configuration file could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The same (schema, table) pair is declared twice.
    #[error("table {schema}.{table} is declared more than once")]
    DuplicateTable {
        /// Schema name.
        schema: String,
        /// Table name.
        table: String,
    },

    /// An index record names a column the table does not have.
    #[error("index {index} on {schema}.{table} references unknown column {column}")]
    IndexColumnUnknown {
        /// Schema name.
        schema: String,
        /// Table name.
        table: String,
        /// Index name.
        index: String,
        /// Missing column.
        column: String,
    },

    /// Lookup of a qualified table name failed.
    #[error("table not found: {name}")]
    TableNotFound {
        /// The name that was looked up.
        name: String,
    },

    /// The dependency graph is not acyclic.
    #[error(transparent)]
    CyclicDependency(#[from] CyclicDependency),

    /// The load/validate pipeline ran past its configured budget.
    #[error("deadline exceeded after {elapsed:?}")]
    DeadlineExceeded {
        /// Time spent before aborting.
        elapsed: Duration,
    },

    /// Invalid configuration.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },
}

impl Error {
    pub(crate) fn malformed(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedDocument {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error means no catalog could be built from the document.
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Error::MalformedDocument { .. }
                | Error::Parse(_)
                | Error::Io { .. }
                | Error::DuplicateTable { .. }
                | Error::IndexColumnUnknown { .. }
        )
    }
}

/// A dependency cycle reported by [`DependencyGraph::topological_order`].
///
/// The cycle lists each table once, in edge order; the last table depends on the first.
///
/// [`DependencyGraph::topological_order`]: crate::analysis::DependencyGraph::topological_order
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cyclic dependency: {}", render_cycle(.cycle))]
pub struct CyclicDependency {
    /// Tables on the cycle.
    pub cycle: Vec<QualifiedName>,
}

impl CyclicDependency {
    /// Check if the cycle is a single table referencing itself.
    pub fn is_self_reference(&self) -> bool {
        self.cycle.len() == 1
    }
}

/// Render a cycle as `a -> b -> a`.
pub(crate) fn render_cycle(cycle: &[QualifiedName]) -> String {
    let mut parts: Vec<String> = cycle.iter().map(ToString::to_string).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.to_string());
    }
    parts.join(" -> ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::IndexColumnUnknown {
            schema: "sales".to_string(),
            table: "orders".to_string(),
            index: "ix_orders_date".to_string(),
            column: "ordered_on".to_string(),
        };
        assert!(err.to_string().contains("sales.orders"));
        assert!(err.to_string().contains("ordered_on"));
        assert!(err.is_load_failure());

        let err = Error::TableNotFound {
            name: "sales.nope".to_string(),
        };
        assert!(!err.is_load_failure());
    }

    #[test]
    fn test_cycle_display() {
        let cycle = CyclicDependency {
            cycle: vec![QualifiedName::new("hr", "staffs")],
        };
        assert!(cycle.is_self_reference());
        assert_eq!(
            cycle.to_string(),
            "cyclic dependency: hr.staffs -> hr.staffs"
        );

        let cycle = CyclicDependency {
            cycle: vec![
                QualifiedName::new("sales", "orders"),
                QualifiedName::new("sales", "invoices"),
            ],
        };
        assert_eq!(
            cycle.to_string(),
            "cyclic dependency: sales.orders -> sales.invoices -> sales.orders"
        );
    }
}
