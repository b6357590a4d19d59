//! Surface output of a finished run (`surface.csv`) and helpers for
//! comparing several runs side by side.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod runs;
pub mod summary;

pub use runs::{discover_runs, RunFilter, SurfaceRun, SURFACE_FILE};
pub use summary::{write_summary_csv, RunSummary, HEAT_FLUX};

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("missing header row")]
    MissingHeader,
    #[error("column `{0}` not found")]
    MissingColumn(String),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Numeric table read from a comma-separated surface file.
///
/// Data is stored column-major; every column has the same length.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SurfaceTable {
    columns: Vec<String>,
    data: Vec<Vec<f64>>,
}

impl SurfaceTable {
    pub fn new(columns: Vec<String>) -> Self {
        let data = vec![Vec::new(); columns.len()];
        Self { columns, data }
    }

    pub fn read(path: &Path) -> Result<Self, SurfaceError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reads a header line followed by numeric rows.
    ///
    /// Empty cells read as NaN. Rows with the wrong number of cells or a
    /// non-numeric cell are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, SurfaceError> {
        let mut lines = reader.lines().enumerate();
        let columns = loop {
            let Some((_, line)) = lines.next() else {
                return Err(SurfaceError::MissingHeader);
            };
            let line = line?;
            if !line.trim().is_empty() {
                break line
                    .split(',')
                    .map(|c| clean_cell(c).to_string())
                    .collect::<Vec<_>>();
            }
        };
        let mut table = SurfaceTable::new(columns);

        for (idx, line) in lines {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let cells: Vec<&str> = line.split(',').map(clean_cell).collect();
            if cells.len() != table.columns.len() {
                log::warn!(
                    "line {}: expected {} cells, got {}",
                    idx + 1,
                    table.columns.len(),
                    cells.len()
                );
                continue;
            }
            match cells
                .iter()
                .map(|c| parse_cell(c))
                .collect::<Result<Vec<_>, _>>()
            {
                Ok(row) => table.push_row(&row),
                Err(e) => log::warn!("line {}: invalid number: {}", idx + 1, e),
            }
        }

        Ok(table)
    }

    fn push_row(&mut self, row: &[f64]) {
        for (col, value) in self.data.iter_mut().zip(row) {
            col.push(*value);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(&self.data[idx])
    }

    pub fn len(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collapses rows sharing the same `key` value into one row holding the
    /// mean of every column. The result is sorted by `key`; rows whose key is
    /// NaN are dropped. Means skip NaN cells and are NaN only when the whole
    /// group is.
    pub fn average_duplicates(&self, key: &str) -> Result<SurfaceTable, SurfaceError> {
        let key_idx = self
            .columns
            .iter()
            .position(|c| c == key)
            .ok_or_else(|| SurfaceError::MissingColumn(key.to_string()))?;
        let keys = &self.data[key_idx];

        let mut order: Vec<usize> = (0..self.len()).filter(|&i| !keys[i].is_nan()).collect();
        order.sort_by(|&a, &b| keys[a].total_cmp(&keys[b]));

        let mut out = SurfaceTable::new(self.columns.clone());
        let mut start = 0;
        while start < order.len() {
            let mut end = start + 1;
            while end < order.len() && keys[order[end]] == keys[order[start]] {
                end += 1;
            }
            let group = &order[start..end];
            let row: Vec<f64> = self
                .data
                .iter()
                .map(|col| nan_mean(group.iter().map(|&i| col[i])))
                .collect();
            out.push_row(&row);
            start = end;
        }
        Ok(out)
    }
}

fn parse_cell(cell: &str) -> Result<f64, std::num::ParseFloatError> {
    if cell.is_empty() {
        Ok(f64::NAN)
    } else {
        cell.parse()
    }
}

pub(crate) fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Solver CSV headers are quoted (`"x","Pressure"`).
fn clean_cell(cell: &str) -> &str {
    cell.trim().trim_matches('"').trim()
}
