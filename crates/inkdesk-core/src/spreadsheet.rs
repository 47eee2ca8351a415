//! Tabular grid model for the spreadsheet surface.
//!
//! The grid is never empty and always rectangular: every row holds the same
//! number of cells. All mutations preserve both properties.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Grid errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("Grid has no rows")]
    Empty,
    #[error("Row {row} has {len} cells, expected {expected}")]
    Ragged {
        row: usize,
        len: usize,
        expected: usize,
    },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// A rectangular grid of string cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Create the initial grid: a single row holding a single empty cell.
    pub fn new() -> Self {
        Self {
            rows: vec![vec![String::new()]],
        }
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (the width of row 0).
    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// All rows, top to bottom.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Get a cell's value.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// Header labels shown above each column ("Column 1", "Column 2", ...).
    pub fn column_headers(&self) -> Vec<String> {
        (1..=self.column_count())
            .map(|n| format!("Column {}", n))
            .collect()
    }

    /// Overwrite one cell.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> Result<(), GridError> {
        let rows = self.row_count();
        let cols = self.column_count();
        let cell = self
            .rows
            .get_mut(row)
            .and_then(|r| r.get_mut(col))
            .ok_or(GridError::IndexOutOfRange { row, col, rows, cols })?;
        *cell = value.into();
        Ok(())
    }

    /// Append an empty row as wide as the first row.
    pub fn add_row(&mut self) -> Result<(), GridError> {
        let width = self.rows.first().ok_or(GridError::Empty)?.len();
        self.rows.push(vec![String::new(); width]);
        Ok(())
    }

    /// Append one empty cell to every row.
    pub fn add_column(&mut self) {
        for row in &mut self.rows {
            row.push(String::new());
        }
    }

    /// Replace the grid with a single empty cell.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Serialize to JSON (an array of rows).
    pub fn to_json(&self) -> Result<String, GridError> {
        serde_json::to_string(&self.rows).map_err(|e| GridError::Serialization(e.to_string()))
    }

    /// Deserialize from JSON, rejecting empty or ragged grids.
    pub fn from_json(json: &str) -> Result<Self, GridError> {
        let rows: Vec<Vec<String>> =
            serde_json::from_str(json).map_err(|e| GridError::Serialization(e.to_string()))?;
        Self::try_from(rows)
    }
}

impl TryFrom<Vec<Vec<String>>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self, Self::Error> {
        let expected = rows.first().ok_or(GridError::Empty)?.len();
        if expected == 0 {
            return Err(GridError::Empty);
        }
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(GridError::Ragged {
                row,
                len: r.len(),
                expected,
            });
        }
        Ok(Self { rows })
    }
}

impl From<Grid> for Vec<Vec<String>> {
    fn from(grid: Grid) -> Self {
        grid.rows
    }
}
