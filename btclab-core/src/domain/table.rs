//! FeatureTable — the fused, aligned, fully-populated feature matrix.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from table construction and column selection.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("row {row} has {got} values, expected {expected}")]
    RaggedRow {
        row: usize,
        got: usize,
        expected: usize,
    },
    #[error("date count {dates} does not match row count {rows}")]
    ShapeMismatch { dates: usize, rows: usize },
    #[error("dates are not strictly increasing at row {row}")]
    UnorderedDates { row: usize },
    #[error("non-finite value in column '{column}' at row {row}")]
    NonFinite { column: String, row: usize },
    #[error("column '{0}' not present in table")]
    MissingColumn(String),
}

/// A finalized feature table: one row per date, one value per column.
///
/// Invariants, enforced by the constructor:
/// - dates strictly increasing, one per row
/// - every row has exactly one value per column
/// - every value is finite (the row-drop happens before construction)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    dates: Vec<NaiveDate>,
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

/// A single row lifted out of a table, paired with its date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub values: Vec<f64>,
}

impl FeatureTable {
    pub fn new(
        dates: Vec<NaiveDate>,
        columns: Vec<String>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, TableError> {
        if dates.len() != rows.len() {
            return Err(TableError::ShapeMismatch {
                dates: dates.len(),
                rows: rows.len(),
            });
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableError::RaggedRow {
                    row: i,
                    got: row.len(),
                    expected: columns.len(),
                });
            }
            for (j, v) in row.iter().enumerate() {
                if !v.is_finite() {
                    return Err(TableError::NonFinite {
                        column: columns[j].clone(),
                        row: i,
                    });
                }
            }
        }
        for i in 1..dates.len() {
            if dates[i] <= dates[i - 1] {
                return Err(TableError::UnorderedDates { row: i });
            }
        }
        Ok(Self {
            dates,
            columns,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy of one named column.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, TableError> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))?;
        Ok(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Row-major matrix of the named columns, in the order given.
    pub fn select(&self, names: &[String]) -> Result<Vec<Vec<f64>>, TableError> {
        let indices: Vec<usize> = names
            .iter()
            .map(|n| {
                self.column_index(n)
                    .ok_or_else(|| TableError::MissingColumn(n.clone()))
            })
            .collect::<Result<_, _>>()?;
        Ok(self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r[i]).collect())
            .collect())
    }

    pub fn last_row(&self) -> Option<FeatureRow> {
        let row = self.rows.last()?;
        Some(FeatureRow {
            date: *self.dates.last()?,
            values: row.clone(),
        })
    }
}
