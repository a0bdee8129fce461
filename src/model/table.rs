//! Table types.

use serde::{Deserialize, Serialize};

/// A single cell value; `None` marks an absent or blank cell.
pub type Cell = Option<String>;

/// A table: ordered rows of ordered cell values.
///
/// Serializes as a bare array of arrays (`[["Name", "Age"], ["Bob", null]]`),
/// the shape consumers of the extraction result expect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Table {
    /// Rows in the table
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from already-built rows.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Add a row of text values; blank values become `None`.
    pub fn add_text_row<S: AsRef<str>>(&mut self, values: impl IntoIterator<Item = S>) {
        let row = values.into_iter().map(|v| cell(v.as_ref())).collect();
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tab-separated plain text, one line per row.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|c| c.as_deref().unwrap_or(""))
                    .collect::<Vec<_>>()
                    .join("\t")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Build a cell from raw text: trimmed, `None` when blank.
pub(crate) fn cell(text: &str) -> Cell {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
