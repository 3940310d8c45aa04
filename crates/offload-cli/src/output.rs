//! Rendering of command results: aligned fields and tables for people,
//! JSON for scripts.

use std::fmt::Display;

use serde::Serialize;
use tabled::{Table, Tabled};

use offload_core::error::AppError;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Table,
    /// JSON output
    Json,
}

/// Marker for a one-line notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Done,
    Attention,
    Failure,
}

/// Print a one-line notice; failures go to stderr
pub fn notice(tone: Tone, msg: &str) {
    match tone {
        Tone::Done => println!("✓ {msg}"),
        Tone::Attention => println!("⚠ {msg}"),
        Tone::Failure => eprintln!("✗ {msg}"),
    }
}

/// Print `item` as JSON, or hand it to `human` for text output
pub fn emit<T: Serialize>(
    item: &T,
    format: OutputFormat,
    human: impl FnOnce(&T),
) -> Result<(), AppError> {
    match format {
        OutputFormat::Table => human(item),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
    }
    Ok(())
}

/// Print rows as a table (or `empty` when there are none), or as a JSON
/// array
pub fn emit_rows<T: Serialize + Tabled>(
    rows: &[T],
    format: OutputFormat,
    empty: &str,
) -> Result<(), AppError> {
    match format {
        OutputFormat::Table if rows.is_empty() => println!("{empty}"),
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(rows)?),
    }
    Ok(())
}

/// Key/value block with values aligned after the longest key
#[derive(Debug, Default)]
pub struct Fields {
    rows: Vec<(String, String)>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(mut self, key: &str, value: impl Display) -> Self {
        self.rows.push((format!("{key}:"), value.to_string()));
        self
    }

    pub fn render(&self) -> String {
        let width = self.rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        self.rows
            .iter()
            .map(|(k, v)| format!("  {k:<width$} {v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print(&self) {
        if !self.rows.is_empty() {
            println!("{}", self.render());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_align_on_longest_key() {
        let fields = Fields::new().add("Pending", 3).add("Local-only", "yes");
        assert_eq!(
            fields.render(),
            "  Pending:    3\n  Local-only: yes"
        );
    }

    #[test]
    fn test_empty_fields_render_nothing() {
        assert_eq!(Fields::new().render(), "");
    }
}
