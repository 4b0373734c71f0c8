//! In-memory tabular input model.
//!
//! Inputs arrive as rows of strings under named columns; all typing is done
//! by the normalizer. Column lookup is case-insensitive so that workflow
//! conventions like `Date` / `date` / `DATE` all resolve.

use serde::{Deserialize, Serialize};

use crate::error::{ReconError, ReconResult};

/// A rectangular table of string cells with named columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from column names and rows.
    ///
    /// Short rows are padded with empty cells; long rows are truncated.
    pub fn from_rows<S: Into<String>>(columns: Vec<S>, rows: Vec<Vec<S>>) -> Self {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|row| {
                let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    /// Append a row, padding or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Column names in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cells of the row at `idx`.
    pub fn row(&self, idx: usize) -> &[String] {
        &self.rows[idx]
    }

    /// Cell contents, or the empty string when the column is absent.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Find a column index by name, case-insensitively and ignoring
    /// surrounding whitespace.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.columns
            .iter()
            .position(|c| c.trim().to_lowercase() == wanted)
    }

    /// Find the first column whose name matches any of `names`, in the order
    /// the aliases are given.
    pub fn find_column_any(&self, names: &[&str]) -> Option<usize> {
        names.iter().find_map(|name| self.find_column(name))
    }

    /// Resolve a required column or report a configuration error naming the
    /// table it was expected in.
    pub fn require_column(&self, table_name: &str, name: &str) -> ReconResult<usize> {
        self.find_column(name)
            .ok_or_else(|| ReconError::missing_column(table_name, name))
    }

    /// All values of one column, top to bottom.
    pub fn column_values(&self, col: usize) -> Vec<&str> {
        self.rows.iter().map(|r| r[col].as_str()).collect()
    }

    /// Insert a new column immediately after `after`, so that derived fields
    /// sit next to the column they were extracted from.
    ///
    /// `values` shorter than the row count are padded with empty cells.
    pub fn insert_column_after(&mut self, after: usize, name: impl Into<String>, values: Vec<String>) {
        let at = (after + 1).min(self.columns.len());
        self.columns.insert(at, name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.insert(at, values.next().unwrap_or_default());
        }
    }

    /// Overwrite an existing column's values in place.
    pub fn set_column(&mut self, col: usize, values: Vec<String>) {
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[col] = values.next().unwrap_or_default();
        }
    }

    /// Copy out a subset of rows into a new table with the same columns.
    pub fn select_rows(&self, indices: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }
}
