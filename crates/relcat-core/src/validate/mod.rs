//! Integrity validation.
//!
//! Every check runs; none short-circuits another. Per-table checks are
//! independent and may run on the rayon pool. Results are merged and sorted,
//! so the report does not depend on completion order.

mod checks;
mod diagnostic;

pub use diagnostic::{Diagnostic, DiagnosticKind, Location, Severity, ValidationReport};

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::catalog::Catalog;
use crate::config::Deadline;
use crate::error::Result;
use checks::CheckContext;

/// Runs the integrity checks over a catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    parallel: bool,
    deadline: Option<Deadline>,
}

impl Validator {
    /// Create a sequential validator with no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run per-table checks on the rayon pool.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Abort between per-table checks, and during cycle enumeration, once the
    /// deadline has passed.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Validate a catalog.
    ///
    /// Only fails with [`Error::DeadlineExceeded`](crate::Error::DeadlineExceeded);
    /// structural problems become diagnostics.
    #[instrument(skip_all, fields(tables = catalog.tables().len(), parallel = self.parallel))]
    pub fn validate(&self, catalog: &Catalog) -> Result<ValidationReport> {
        let context = CheckContext::new(catalog);
        let check = |table| -> Result<_> {
            self.check_deadline()?;
            Ok(context.check_table(table))
        };

        let per_table: Vec<_> = if self.parallel {
            catalog
                .tables
                .par_iter()
                .map(check)
                .collect::<Result<_>>()?
        } else {
            catalog.tables.iter().map(check).collect::<Result<_>>()?
        };

        self.check_deadline()?;
        let mut diagnostics: Vec<Diagnostic> = per_table.into_iter().flatten().collect();
        debug!(count = diagnostics.len(), "per-table checks done");
        diagnostics.extend(context.check_cycles(self.deadline.as_ref())?);
        diagnostics.extend(context.check_undeclared());

        let report = ValidationReport::from_unsorted(diagnostics);
        info!(
            errors = report.errors().count(),
            warnings = report.warnings().count(),
            "validation complete"
        );
        Ok(report)
    }

    fn check_deadline(&self) -> Result<()> {
        match &self.deadline {
            Some(deadline) => deadline.check(),
            None => Ok(()),
        }
    }
}

/// Validate a catalog sequentially with no deadline.
pub fn validate(catalog: &Catalog) -> ValidationReport {
    // Only the deadline can fail a validation run.
    Validator::new().validate(catalog).unwrap_or_default()
}
