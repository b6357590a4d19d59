use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Name of the iteration column. Its presence on a line marks the header.
pub const ITERATION_COLUMN: &str = "Inner_Iter";

/// A single data row: the iteration counter followed by the metric values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub iteration: i64,
    pub values: Vec<f64>,
}

/// Typed table recovered from a solver log.
///
/// The first column is always the iteration counter; every other column is
/// a floating-point metric. Rows keep the order they had in the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

#[derive(Debug, Error, PartialEq)]
#[error("row {row} has {actual} values, expected {expected}")]
pub struct RowWidthError {
    pub row: usize,
    pub expected: usize,
    pub actual: usize,
}

impl<'de> Deserialize<'de> for LogTable {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            columns: Vec<String>,
            rows: Vec<Row>,
        }

        let raw = Raw::deserialize(deserializer)?;
        LogTable::try_new(raw.columns, raw.rows).map_err(serde::de::Error::custom)
    }
}

impl LogTable {
    /// Builds a table from a schema and rows that already match it.
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        debug_assert!(
            rows.iter().all(|r| r.values.len() + 1 == columns.len()),
            "row width does not match schema"
        );
        Self { columns, rows }
    }

    /// Like [`LogTable::new`], but rejects rows whose width does not match
    /// the schema. A table without columns cannot hold rows.
    pub fn try_new(columns: Vec<String>, rows: Vec<Row>) -> Result<Self, RowWidthError> {
        let expected = columns.len().saturating_sub(1);
        if let Some((row, r)) = rows
            .iter()
            .enumerate()
            .find(|(_, r)| columns.is_empty() || r.values.len() != expected)
        {
            return Err(RowWidthError {
                row,
                expected,
                actual: r.values.len(),
            });
        }
        Ok(Self { columns, rows })
    }

    /// All column names, iteration column included.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Column names except the leading iteration column.
    pub fn metric_columns(&self) -> &[String] {
        self.columns.get(1..).unwrap_or(&[])
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iterations(&self) -> Vec<i64> {
        self.rows.iter().map(|r| r.iteration).collect()
    }

    /// Values of the named column, in row order.
    ///
    /// The first column is returned converted to `f64` so it can be used
    /// directly as an x axis.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        if idx == 0 {
            return Some(self.rows.iter().map(|r| r.iteration as f64).collect());
        }
        Some(self.rows.iter().map(|r| r.values[idx - 1]).collect())
    }

    /// The first `n` rows (fewer if the table is shorter).
    pub fn head(&self, n: usize) -> &[Row] {
        &self.rows[..n.min(self.rows.len())]
    }
}

/// A note produced while scanning, tied to a 1-based input line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub line: usize,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum DiagnosticKind {
    HeaderFound {
        columns: Vec<String>,
    },
    FieldCountMismatch {
        expected: usize,
        actual: usize,
    },
    InvalidNumber {
        column: String,
        value: String,
    },
}

impl Diagnostic {
    /// True for diagnostics that report a discarded row.
    pub fn is_skip(&self) -> bool {
        !matches!(self.kind, DiagnosticKind::HeaderFound { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::HeaderFound { columns } => {
                write!(f, "Line {} - Header found: {:?}", self.line, columns)
            }
            DiagnosticKind::FieldCountMismatch { expected, actual } => write!(
                f,
                "Line {} - Skipped: Expected {} values, got {}",
                self.line, expected, actual
            ),
            DiagnosticKind::InvalidNumber { column, value } => write!(
                f,
                "Line {} - Skipped: Invalid data - {:?} is not a valid {} value",
                self.line, value, column
            ),
        }
    }
}
