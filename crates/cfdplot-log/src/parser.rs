use std::io::{self, BufRead};

use thiserror::Error;

use crate::ir::{Diagnostic, DiagnosticKind, ITERATION_COLUMN, LogTable, Row};

const DELIMITER: char = '|';
const RULE_CHAR: char = '+';

/// Structural failures that abort a parse.
///
/// Malformed rows are not errors; they are reported as [`Diagnostic`]s and
/// skipped.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("missing header: no line contains `Inner_Iter`")]
    MissingHeader,
    #[error("no data: header found but no valid rows followed it")]
    NoData,
    #[error("failed to read log: {0}")]
    Io(#[from] io::Error),
}

/// Scanner mode. Moves from `SeekingHeader` to `InData` exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseState {
    SeekingHeader,
    InData { columns: Vec<String> },
}

/// What a single line means in the current [`ParseState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass<'a> {
    /// Free-form text before the header.
    Preamble,
    /// The header line with its column names.
    Header(Vec<String>),
    /// Blank line or separator rule inside the data block.
    Rule,
    /// Candidate data row, already split and trimmed.
    Fields(Vec<&'a str>),
}

impl ParseState {
    pub fn classify<'a>(&self, line: &'a str) -> LineClass<'a> {
        match self {
            ParseState::SeekingHeader => {
                if line.contains(ITERATION_COLUMN) {
                    LineClass::Header(split_fields(line).map(str::to_string).collect())
                } else {
                    LineClass::Preamble
                }
            }
            ParseState::InData { .. } => {
                let trimmed = line.trim();
                if trimmed.is_empty() || trimmed.starts_with(RULE_CHAR) {
                    LineClass::Rule
                } else {
                    LineClass::Fields(split_fields(trimmed).collect())
                }
            }
        }
    }

    /// Only a header seen while seeking changes the state.
    pub fn transition(self, class: &LineClass<'_>) -> ParseState {
        match (self, class) {
            (ParseState::SeekingHeader, LineClass::Header(columns)) => ParseState::InData {
                columns: columns.clone(),
            },
            (state, _) => state,
        }
    }
}

fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(DELIMITER).map(str::trim).filter(|s| !s.is_empty())
}

/// Converts a candidate row against the schema, or says why it was rejected.
fn convert_row(columns: &[String], fields: &[&str]) -> Result<Row, DiagnosticKind> {
    if fields.len() != columns.len() {
        return Err(DiagnosticKind::FieldCountMismatch {
            expected: columns.len(),
            actual: fields.len(),
        });
    }
    let invalid = |i: usize| DiagnosticKind::InvalidNumber {
        column: columns[i].clone(),
        value: fields[i].to_string(),
    };

    let iteration = fields[0].parse::<i64>().map_err(|_| invalid(0))?;
    let values = fields[1..]
        .iter()
        .enumerate()
        .map(|(i, f)| f.parse::<f64>().map_err(|_| invalid(i + 1)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Row { iteration, values })
}

/// Parser for pipe-delimited solver logs.
///
/// Each call to one of the `parse*` methods is an independent pass; the
/// diagnostics of the most recent pass stay available through
/// [`diagnostics`](Self::diagnostics).
pub struct TableParser<'s> {
    sink: Option<Box<dyn FnMut(&Diagnostic) + 's>>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for TableParser<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'s> TableParser<'s> {
    pub fn new() -> Self {
        Self {
            sink: None,
            diagnostics: Vec::new(),
        }
    }

    /// Creates a parser that also hands every diagnostic to `sink` as it is
    /// produced.
    pub fn with_sink(sink: impl FnMut(&Diagnostic) + 's) -> Self {
        Self {
            sink: Some(Box::new(sink)),
            diagnostics: Vec::new(),
        }
    }

    /// Diagnostics collected during the last parse.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Parses a whole log held in memory.
    pub fn parse(&mut self, input: &str) -> Result<LogTable, FormatError> {
        self.parse_lines(input.lines())
    }

    pub fn parse_lines<I, S>(&mut self, lines: I) -> Result<LogTable, FormatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.scan(lines.into_iter().map(Ok::<S, io::Error>))
    }

    /// Parses line by line from a buffered reader.
    pub fn parse_reader<R: BufRead>(&mut self, reader: R) -> Result<LogTable, FormatError> {
        self.scan(reader.lines())
    }

    fn scan<I, S>(&mut self, lines: I) -> Result<LogTable, FormatError>
    where
        I: Iterator<Item = io::Result<S>>,
        S: AsRef<str>,
    {
        self.diagnostics.clear();

        let mut state = ParseState::SeekingHeader;
        let mut rows = Vec::new();
        let mut lines = lines.enumerate();

        while let Some((idx, line)) = lines.next() {
            let line = line?;
            let line_no = idx + 1;
            let class = state.classify(line.as_ref());

            match &class {
                LineClass::Preamble | LineClass::Rule => {}
                LineClass::Header(columns) => {
                    self.report(Diagnostic {
                        line: line_no,
                        kind: DiagnosticKind::HeaderFound {
                            columns: columns.clone(),
                        },
                    });
                    // The line under the header is a rule, whatever it holds.
                    if let Some((_, skipped)) = lines.next() {
                        skipped?;
                    }
                }
                LineClass::Fields(fields) => {
                    if let ParseState::InData { columns } = &state {
                        match convert_row(columns, fields) {
                            Ok(row) => rows.push(row),
                            Err(kind) => self.report(Diagnostic {
                                line: line_no,
                                kind,
                            }),
                        }
                    }
                }
            }

            state = state.transition(&class);
        }

        match state {
            ParseState::SeekingHeader => Err(FormatError::MissingHeader),
            ParseState::InData { .. } if rows.is_empty() => Err(FormatError::NoData),
            ParseState::InData { columns } => Ok(LogTable::new(columns, rows)),
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_skip() {
            log::warn!("{}", diagnostic);
        } else {
            log::info!("{}", diagnostic);
        }
        if let Some(sink) = self.sink.as_mut() {
            sink(&diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }
}
