//! relcat - check a relational catalog metadata document.
//!
//! Loads the document, builds the catalog, runs the integrity checks, and
//! prints the findings. Exit status is 0 when nothing blocking was found,
//! 1 when it was, and 2 when the document could not be loaded at all.

mod formatter;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use formatter::OutputFormat;
use relcat_core::{CatalogConfig, ValidatedCatalog};
use tracing_subscriber::EnvFilter;

/// Relational catalog checker
#[derive(Parser, Debug)]
#[command(name = "relcat")]
#[command(version, about = "Check a relational catalog metadata document for referential integrity")]
pub struct Args {
    /// Metadata document (JSON)
    pub document: PathBuf,

    /// Configuration file (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Schema to leave out of the catalog (repeatable)
    #[arg(short = 'x', long = "exclude-schema")]
    pub exclude_schemas: Vec<String>,

    /// Run checks on a single thread
    #[arg(long)]
    pub sequential: bool,

    /// Abort if loading and validation take longer than this many seconds
    #[arg(long, value_name = "SECS", value_parser = parse_timeout_secs)]
    pub timeout_secs: Option<u64>,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Also print the table dependency order
    #[arg(long)]
    pub order: bool,

    /// Treat warnings as blocking findings
    #[arg(long)]
    pub deny_warnings: bool,
}

fn parse_timeout_secs(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|err| format!("invalid timeout '{value}': {err}"))?;
    if parsed == 0 {
        return Err("timeout must be at least one second".into());
    }
    Ok(parsed)
}

impl Args {
    /// Merge command-line overrides onto the file (or default) configuration.
    fn catalog_config(&self) -> relcat_core::Result<CatalogConfig> {
        let mut config = match &self.config {
            Some(path) => CatalogConfig::from_path(path)?,
            None => CatalogConfig::default(),
        };
        for schema in &self.exclude_schemas {
            config = config.exclude_schema(schema);
        }
        if self.sequential {
            config = config.with_parallel_validation(false);
        }
        if let Some(secs) = self.timeout_secs {
            config = config.with_deadline(Duration::from_secs(secs));
        }
        Ok(config)
    }

    fn is_blocking(&self, loaded: &ValidatedCatalog) -> bool {
        loaded.report.has_errors() || (self.deny_warnings && !loaded.report.is_clean())
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("relcat=info")),
        )
        .init();

    let args = Args::parse();
    let formatter = formatter::create_formatter(args.format);

    let loaded = match args
        .catalog_config()
        .and_then(|config| relcat_core::load_path(&args.document, &config))
    {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", formatter.format_error(&e.to_string()));
            return ExitCode::from(2);
        }
    };

    println!("{}", formatter.format_report(&loaded));
    if args.order {
        println!("{}", formatter.format_order(&loaded));
    }

    if args.is_blocking(&loaded) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "relcat",
            "catalog.json",
            "-x",
            "staging",
            "--exclude-schema",
            "dbo",
            "--sequential",
            "--timeout-secs",
            "10",
            "--format",
            "json",
        ]);

        assert_eq!(args.document, PathBuf::from("catalog.json"));
        assert_eq!(args.format, OutputFormat::Json);

        let config = args.catalog_config().unwrap();
        assert!(config.is_excluded("staging"));
        assert!(config.is_excluded("dbo"));
        assert!(config.is_excluded("information_schema"));
        assert!(!config.parallel_validation);
        assert_eq!(config.deadline, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = Args::try_parse_from(["relcat", "catalog.json", "--timeout-secs", "0"]).unwrap_err();
        assert!(err.to_string().contains("at least one second"));

        assert!(Args::try_parse_from(["relcat", "catalog.json", "--timeout-secs", "soon"]).is_err());
        let args = Args::try_parse_from(["relcat", "catalog.json", "--timeout-secs", "1"]).unwrap();
        assert_eq!(args.timeout_secs, Some(1));
    }

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["relcat", "catalog.json"]);

        assert_eq!(args.format, OutputFormat::Table);
        assert!(!args.order);
        assert!(!args.deny_warnings);
        assert_eq!(args.catalog_config().unwrap(), CatalogConfig::default());
    }
}
