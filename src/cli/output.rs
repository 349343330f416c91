//! Shared output formatting utilities for CLI commands
//!
//! Commands print either pretty JSON or a fixed-width table.

use std::str::FromStr;

use anyhow::{Context, Result};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Table,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "table" => Ok(OutputFormat::Table),
            _ => anyhow::bail!("Unsupported output format: '{}'. Use 'json' or 'table'.", s),
        }
    }
}

/// Print data as JSON
pub fn print_json<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize to JSON")?;
    println!("{}", json);
    Ok(())
}

/// Render rows as a table with the given column headers and widths.
pub fn render_table(columns: &[(&str, usize)], rows: &[Vec<String>]) -> String {
    let mut out = String::new();

    let header: Vec<String> =
        columns.iter().map(|(name, width)| format!("{:<width$}", name, width = width)).collect();
    out.push_str(header.join(" ").trim_end());
    out.push('\n');

    let total_width: usize = columns.iter().map(|(_, w)| w + 1).sum();
    out.push_str(&"-".repeat(total_width.saturating_sub(1)));
    out.push('\n');

    for row in rows {
        let cells: Vec<String> = columns
            .iter()
            .zip(row)
            .map(|((_, width), cell)| {
                format!("{:<width$}", truncate(cell, *width), width = width)
            })
            .collect();
        out.push_str(cells.join(" ").trim_end());
        out.push('\n');
    }

    out
}

/// Print a table, or a note when there is nothing to show
pub fn print_table(columns: &[(&str, usize)], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("No entries found");
        return;
    }
    print!("{}", render_table(columns, rows));
}

/// Print key/value pairs, one per line
pub fn print_fields(fields: &[(&str, String)]) {
    let width = fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in fields {
        println!("{:<width$}  {}", key, value, width = width);
    }
}

/// Truncate string to maximum length with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
