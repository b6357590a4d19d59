//! # cfdplot log parser
//!
//! Recovers a typed table from the console log a CFD solver writes while it
//! iterates (`screen.dat`).
//!
//! ## Overview
//!
//! The log is mostly free-form text: a banner, configuration echo, mesh
//! statistics. Somewhere in it the solver starts printing a pipe-delimited
//! convergence table:
//!
//! ```text
//! +--------------------------------------------+
//! |  Inner_Iter|      rms[T]|       Heat_Flux|
//! +--------------------------------------------+
//! |           0|   -2.431234|      1.2345e+03|
//! |           1|   -2.874401|      1.1022e+03|
//! ```
//!
//! [`TableParser`] makes one forward pass over the lines:
//!
//! - **Seeking header**: everything is skipped until a line contains
//!   `Inner_Iter`. That line gives the column names and the line after it
//!   is consumed as a rule.
//! - **In data**: blank lines and `+` rules are skipped, every other line is
//!   a candidate row. Rows with the wrong field count or a field that is not
//!   a number are dropped and reported as a [`Diagnostic`](ir::Diagnostic).
//!
//! A missing header or a table with no usable row is a
//! [`FormatError`]; anything else yields a [`LogTable`](ir::LogTable).
//!
//! ## Examples
//!
//! ```
//! use cfdplot_log::TableParser;
//!
//! let log = "Inner_Iter | Residual\n-----\n0 | 1.5\n1 | 0.002\nx | bad\n";
//! let mut parser = TableParser::new();
//! let table = parser.parse(log)?;
//!
//! assert_eq!(table.len(), 2);
//! assert_eq!(parser.diagnostics().iter().filter(|d| d.is_skip()).count(), 1);
//! # Ok::<(), cfdplot_log::FormatError>(())
//! ```
//!
//! ### Collecting diagnostics through a callback
//!
//! ```
//! use cfdplot_log::TableParser;
//!
//! let mut seen = Vec::new();
//! let result = TableParser::with_sink(|d| seen.push(d.line)).parse("no table here\n");
//! assert!(result.is_err());
//! assert!(seen.is_empty());
//! ```

/// Table and diagnostic types.
pub mod ir;
/// Line scanner.
pub mod parser;


pub use ir::{Diagnostic, DiagnosticKind, LogTable, Row, RowWidthError};
pub use parser::{FormatError, TableParser};
