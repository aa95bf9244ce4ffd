//! Catalog pipeline configuration.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::{Error, Result};

/// System schemas dropped by default.
pub const DEFAULT_EXCLUDED_SCHEMAS: &[&str] = &["information_schema", "sys", "pg_catalog"];

/// Configuration for loading, building, and validating a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Schemas left out of the catalog (compared case-insensitively).
    pub excluded_schemas: Vec<String>,

    /// Run per-table checks on the rayon thread pool.
    pub parallel_validation: bool,

    /// Budget for the whole load/build/validate pipeline. None means unbounded.
    pub deadline: Option<Duration>,
}

/// On-disk shape of a configuration file. Absent keys keep their defaults;
/// keys meant for other tools sharing the file are ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    excluded_schemas: Option<Vec<String>>,
    parallel_validation: Option<bool>,
    deadline_secs: Option<u64>,
}

impl CatalogConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            excluded_schemas: DEFAULT_EXCLUDED_SCHEMAS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            parallel_validation: true,
            deadline: None,
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Parse configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ConfigFile = serde_json::from_str(json).map_err(|e| Error::Config {
            message: e.to_string(),
        })?;

        let mut config = Self::new();
        if let Some(schemas) = file.excluded_schemas {
            config.excluded_schemas = schemas;
        }
        if let Some(parallel) = file.parallel_validation {
            config.parallel_validation = parallel;
        }
        if let Some(secs) = file.deadline_secs {
            if secs == 0 {
                return Err(Error::Config {
                    message: "deadline_secs must be greater than zero".to_string(),
                });
            }
            config.deadline = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }

    /// Replace the excluded schema list.
    pub fn with_excluded_schemas<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded_schemas = schemas.into_iter().map(Into::into).collect();
        self
    }

    /// Exclude one more schema.
    pub fn exclude_schema(mut self, schema: impl Into<String>) -> Self {
        self.excluded_schemas.push(schema.into());
        self
    }

    /// Keep every schema.
    pub fn without_excluded_schemas(mut self) -> Self {
        self.excluded_schemas.clear();
        self
    }

    /// Enable or disable parallel validation.
    pub fn with_parallel_validation(mut self, parallel: bool) -> Self {
        self.parallel_validation = parallel;
        self
    }

    /// Set the pipeline deadline.
    pub fn with_deadline(mut self, budget: Duration) -> Self {
        self.deadline = Some(budget);
        self
    }

    /// Check if a schema is excluded.
    pub fn is_excluded(&self, schema: &str) -> bool {
        self.excluded_schemas
            .iter()
            .any(|s| s.eq_ignore_ascii_case(schema))
    }

    /// Start the deadline clock, if a budget is configured.
    pub fn start_deadline(&self) -> Option<Deadline> {
        self.deadline.map(Deadline::new)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A running time budget, checked between units of work.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    budget: Duration,
}

impl Deadline {
    /// Start a budget now.
    pub fn new(budget: Duration) -> Self {
        Self::starting_at(Instant::now(), budget)
    }

    /// Start a budget at a given instant.
    pub fn starting_at(started: Instant, budget: Duration) -> Self {
        Self { started, budget }
    }

    /// Time spent so far.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Check if the budget is used up.
    pub fn is_expired(&self) -> bool {
        self.elapsed() >= self.budget
    }

    /// Fail with [`Error::DeadlineExceeded`] once the budget is used up.
    pub fn check(&self) -> Result<()> {
        if self.is_expired() {
            return Err(Error::DeadlineExceeded {
                elapsed: self.elapsed(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::default();

        assert!(config.is_excluded("information_schema"));
        assert!(config.is_excluded("PG_CATALOG"));
        assert!(!config.is_excluded("dbo"));
        assert!(config.parallel_validation);
        assert!(config.start_deadline().is_none());
    }

    #[test]
    fn test_builder() {
        let config = CatalogConfig::new()
            .without_excluded_schemas()
            .exclude_schema("staging")
            .with_parallel_validation(false)
            .with_deadline(Duration::from_secs(5));

        assert_eq!(config.excluded_schemas, vec!["staging"]);
        assert!(!config.parallel_validation);
        assert_eq!(config.deadline, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_from_json_partial() {
        let config = CatalogConfig::from_json(r#"{ "excluded_schemas": ["sys", "dbo"] }"#).unwrap();

        assert!(config.is_excluded("dbo"));
        assert!(!config.is_excluded("information_schema"));
        assert!(config.parallel_validation);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(
            CatalogConfig::from_json(r#"{ "deadline_secs": 0 }"#),
            Err(Error::Config { .. })
        ));
        assert!(matches!(
            CatalogConfig::from_json(r#"{ "excluded_schemas": "sys" }"#),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_from_json_ignores_unknown_keys() {
        let config = CatalogConfig::from_json(
            r#"{
                "server": "localhost",
                "database": "BikeStores",
                "excluded_schemas": ["dbo"],
                "output_file": "schema_cache.json"
            }"#,
        )
        .unwrap();

        assert!(config.is_excluded("DBO"));
        assert!(!config.is_excluded("sys"));
        assert!(config.parallel_validation);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "parallel_validation": false, "deadline_secs": 30 }"#).unwrap();

        let config = CatalogConfig::from_path(&path).unwrap();
        assert!(!config.parallel_validation);
        assert_eq!(config.deadline, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_deadline() {
        assert!(Deadline::new(Duration::from_secs(3600)).check().is_ok());

        let expired = Deadline::new(Duration::ZERO);
        assert!(expired.is_expired());
        assert!(matches!(
            expired.check(),
            Err(Error::DeadlineExceeded { .. })
        ));
    }
}
