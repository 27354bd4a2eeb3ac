//! Output formatting for bx (table, json, csv)

use clap::ValueEnum;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Whether a progress spinner may be drawn
    pub fn interactive(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Table
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => print!("{}", render_csv(data)),
        }
    }

    /// Print a single item in the configured format
    pub fn print_one<T: Tabled + Serialize>(&self, data: &T) {
        match self.format {
            OutputFormat::Table => println!("{}", Table::new([data])),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => print!("{}", render_csv(&[data])),
        }
    }

    /// Report the continuation offset of a paginated listing
    pub fn next_page(&self, next: Option<u64>, total: Option<u64>) {
        if let Some(next) = next {
            let total = total.map(|t| format!(" of {}", t)).unwrap_or_default();
            self.info(&format!("More results{}: rerun with --start {}", total, next));
        }
    }
}

/// Render data as CSV with a header row taken from the first item
fn render_csv<T: Serialize>(data: &[T]) -> String {
    let Some(first) = data.first() else {
        return String::new();
    };

    let mut out = String::new();
    if let Ok(serde_json::Value::Object(map)) = serde_json::to_value(first) {
        let headers: Vec<&str> = map.keys().map(|s| s.as_str()).collect();
        out.push_str(&headers.join(","));
        out.push('\n');

        for item in data {
            if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
                let values: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        row.get(*h)
                            .map(|v| match v {
                                serde_json::Value::String(s) => escape_csv(s),
                                other => escape_csv(&other.to_string()),
                            })
                            .unwrap_or_default()
                    })
                    .collect();
                out.push_str(&values.join(","));
                out.push('\n');
            }
        }
    }
    out
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// `-` for absent values
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Method or scope name
#[derive(Debug, Tabled, Serialize)]
pub struct NameRow {
    #[tabled(rename = "Name")]
    pub name: String,
}

/// Catalog entry for catalog command
#[derive(Debug, Tabled, Serialize)]
pub struct CatalogRow {
    #[tabled(rename = "Method")]
    pub method: String,
    #[tabled(rename = "Params")]
    pub params: String,
    #[tabled(rename = "Result")]
    pub output: String,
}

/// Storage display for storages/storage commands
#[derive(Debug, Tabled, Serialize)]
pub struct StorageRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Entity")]
    pub entity: String,
    #[tabled(rename = "Root Folder")]
    pub root_folder: String,
}

/// Folder or file display for folder/children/file commands
#[derive(Debug, Tabled, Serialize)]
pub struct ObjectRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Size")]
    pub size: String,
    #[tabled(rename = "Updated")]
    pub updated: String,
}

/// Smart-process type display for types command
#[derive(Debug, Tabled, Serialize)]
pub struct TypeRow {
    #[tabled(rename = "ID")]
    pub id: i64,
    #[tabled(rename = "Entity Type")]
    pub entity_type_id: i64,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Stages")]
    pub stages: String,
    #[tabled(rename = "Automation")]
    pub automation: String,
}

/// CRM item display for items command
#[derive(Debug, Tabled, Serialize)]
pub struct ItemRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Title")]
    pub title: String,
    #[tabled(rename = "Fields")]
    pub fields: String,
}
