//! Markdown pipe-table rendering for query results.

use rusqlite::types::Value as SqlValue;
use serde_json::{Value, json};

/// Returned instead of a table when a statement produces no rows.
pub const NO_RESULTS: &str = "No results found.";

/// Columns are never narrower than their header plus this much padding.
const MIN_HEADER_PADDING: usize = 2;

/// Integral reals below this magnitude render without a fractional part.
const MAX_INTEGRAL_REAL: f64 = 1e15;

/// A fully materialized result set.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
}

impl ResultTable {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Rows as JSON objects keyed by column name.
    #[must_use]
    pub fn json_rows(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let record = self
                    .columns
                    .iter()
                    .zip(row)
                    .map(|(column, value)| (column.clone(), json_value_from_sql(value)))
                    .collect::<serde_json::Map<_, _>>();
                Value::Object(record)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Alignment {
    Left,
    Right,
}

/// The sentinel for an empty result, otherwise the markdown table.
#[must_use]
pub fn render_result(table: &ResultTable) -> String {
    if table.is_empty() {
        NO_RESULTS.to_string()
    } else {
        render_markdown(table)
    }
}

#[must_use]
pub fn render_markdown(table: &ResultTable) -> String {
    let header = table
        .columns
        .iter()
        .map(|column| escape_cell(column))
        .collect::<Vec<_>>();
    let body = table
        .rows
        .iter()
        .map(|row| row.iter().map(format_cell).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let alignments = (0..header.len())
        .map(|index| column_alignment(table.rows.iter().filter_map(|row| row.get(index))))
        .collect::<Vec<_>>();
    let widths = header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            body.iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .fold(name.chars().count() + MIN_HEADER_PADDING, usize::max)
        })
        .collect::<Vec<_>>();

    let mut lines = Vec::with_capacity(body.len() + 2);
    lines.push(render_row(&header, &widths, &alignments));
    lines.push(render_alignment_row(&widths, &alignments));
    for row in &body {
        lines.push(render_row(row, &widths, &alignments));
    }

    lines.join("\n")
}

fn column_alignment<'a>(values: impl Iterator<Item = &'a SqlValue>) -> Alignment {
    let mut saw_number = false;
    for value in values {
        match value {
            SqlValue::Null => {}
            SqlValue::Integer(_) | SqlValue::Real(_) => saw_number = true,
            SqlValue::Text(_) | SqlValue::Blob(_) => return Alignment::Left,
        }
    }

    if saw_number {
        Alignment::Right
    } else {
        Alignment::Left
    }
}

fn render_row(cells: &[String], widths: &[usize], alignments: &[Alignment]) -> String {
    let padded = cells
        .iter()
        .zip(widths)
        .zip(alignments)
        .map(|((cell, width), alignment)| match alignment {
            Alignment::Left => format!(" {cell:<width$} "),
            Alignment::Right => format!(" {cell:>width$} "),
        })
        .collect::<Vec<_>>();
    format!("|{}|", padded.join("|"))
}

fn render_alignment_row(widths: &[usize], alignments: &[Alignment]) -> String {
    let markers = widths
        .iter()
        .zip(alignments)
        .map(|(width, alignment)| match alignment {
            Alignment::Left => format!(":{}", "-".repeat(width + 1)),
            Alignment::Right => format!("{}:", "-".repeat(width + 1)),
        })
        .collect::<Vec<_>>();
    format!("|{}|", markers.join("|"))
}

fn format_cell(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => String::new(),
        SqlValue::Integer(value) => value.to_string(),
        SqlValue::Real(value) => format_real(*value),
        SqlValue::Text(value) => escape_cell(value),
        SqlValue::Blob(value) => encode_blob_hex(value),
    }
}

fn escape_cell(value: &str) -> String {
    value
        .replace("\r\n", "<br>")
        .replace(['\n', '\r'], "<br>")
        .replace('|', "\\|")
}

#[must_use]
pub fn format_real(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < MAX_INTEGRAL_REAL {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[must_use]
pub fn json_value_from_sql(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(value) => json!(value),
        SqlValue::Real(value) => json!(value),
        SqlValue::Text(value) => json!(value),
        SqlValue::Blob(value) => json!(encode_blob_hex(value)),
    }
}

fn encode_blob_hex(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut output = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        output.push(HEX[(byte >> 4) as usize] as char);
        output.push(HEX[(byte & 0x0f) as usize] as char);
    }
    output
}
