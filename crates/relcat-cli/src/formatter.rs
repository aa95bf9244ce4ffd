//! Output formatters for validation results.

use clap::ValueEnum;
use comfy_table::{Cell, Color, Table};
use relcat_core::{Catalog, Severity, ValidatedCatalog};
use serde_json::json;

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// ASCII table format
    Table,
    /// JSON format
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Trait for formatting output.
pub trait Formatter: Send + Sync {
    /// Format the catalog summary and its diagnostics.
    fn format_report(&self, loaded: &ValidatedCatalog) -> String;

    /// Format the table dependency order.
    fn format_order(&self, loaded: &ValidatedCatalog) -> String;

    /// Format an error message.
    fn format_error(&self, error: &str) -> String;
}

/// Create a formatter for the given output format.
pub fn create_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Table => Box::new(TableFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
    }
}

/// Dependency order of a catalog: a strict order when the graph is acyclic,
/// strongly connected components otherwise.
enum DependencyOrder {
    Strict(Vec<String>),
    Components {
        components: Vec<Vec<String>>,
        cycle: String,
    },
}

fn ordering(catalog: &Catalog) -> DependencyOrder {
    let graph = catalog.dependency_graph();
    match graph.topological_order() {
        Ok(order) => DependencyOrder::Strict(order.map(|t| t.name.to_string()).collect()),
        Err(cycle) => DependencyOrder::Components {
            components: graph
                .component_order()
                .into_iter()
                .map(|component| {
                    component
                        .into_iter()
                        .filter_map(|id| catalog.get(id))
                        .map(|t| t.name.to_string())
                        .collect()
                })
                .collect(),
            cycle: cycle.to_string(),
        },
    }
}

/// Table formatter using comfy-table.
pub struct TableFormatter;

impl Formatter for TableFormatter {
    fn format_report(&self, loaded: &ValidatedCatalog) -> String {
        let catalog = &loaded.catalog;
        let report = &loaded.report;
        let summary = format!(
            "{} schema(s), {} table(s), {} foreign key(s): {} error(s), {} warning(s)",
            catalog.schemas().len(),
            catalog.tables().len(),
            catalog.foreign_keys().len(),
            report.errors().count(),
            report.warnings().count(),
        );
        if report.is_clean() {
            return summary;
        }

        let mut table = Table::new();
        table.set_header(vec!["Severity", "Kind", "Location", "Message"]);
        for diagnostic in report {
            let color = match diagnostic.severity {
                Severity::Error => Color::Red,
                Severity::Warning => Color::Yellow,
            };
            table.add_row(vec![
                Cell::new(diagnostic.severity).fg(color),
                Cell::new(diagnostic.kind),
                Cell::new(&diagnostic.location),
                Cell::new(&diagnostic.message),
            ]);
        }

        format!("{table}\n{summary}")
    }

    fn format_order(&self, loaded: &ValidatedCatalog) -> String {
        let mut table = Table::new();
        match ordering(&loaded.catalog) {
            DependencyOrder::Strict(names) => {
                table.set_header(vec!["#", "Table"]);
                for (position, name) in names.iter().enumerate() {
                    table.add_row(vec![(position + 1).to_string(), name.clone()]);
                }
                table.to_string()
            }
            DependencyOrder::Components { components, cycle } => {
                table.set_header(vec!["#", "Tables"]);
                for (position, names) in components.iter().enumerate() {
                    table.add_row(vec![(position + 1).to_string(), names.join(", ")]);
                }
                format!("{table}\nNo strict order: {cycle}")
            }
        }
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}", error)
    }
}

/// JSON formatter.
pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_report(&self, loaded: &ValidatedCatalog) -> String {
        loaded
            .to_report()
            .to_json_pretty()
            .unwrap_or_else(|e| self.format_error(&e.to_string()))
    }

    fn format_order(&self, loaded: &ValidatedCatalog) -> String {
        let value = match ordering(&loaded.catalog) {
            DependencyOrder::Strict(names) => json!({ "order": names }),
            DependencyOrder::Components { components, cycle } => {
                json!({ "components": components, "cycle": cycle })
            }
        };
        serde_json::to_string_pretty(&value).unwrap_or_else(|_| "{}".to_string())
    }

    fn format_error(&self, error: &str) -> String {
        json!({ "error": error }).to_string()
    }
}
