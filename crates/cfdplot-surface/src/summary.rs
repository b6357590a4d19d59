use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::{nan_mean, SurfaceTable};

/// Column summarised for grid convergence studies.
pub const HEAT_FLUX: &str = "Heat_Flux";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub mean_heat_flux: f64,
    pub max_heat_flux: f64,
    pub points: usize,
}

impl RunSummary {
    /// `None` when the table has no heat flux column or no rows. Missing
    /// (NaN) values are left out of the mean and max but still count as
    /// points.
    pub fn from_table(table: &SurfaceTable) -> Option<Self> {
        let values = table.column(HEAT_FLUX)?;
        if values.is_empty() {
            return None;
        }
        let mean_heat_flux = nan_mean(values.iter().copied());
        // f64::max ignores NaN operands.
        let max_heat_flux = values.iter().copied().fold(f64::NAN, f64::max);
        Some(Self {
            mean_heat_flux,
            max_heat_flux,
            points: values.len(),
        })
    }
}

/// Writes one line per run, keyed by run name in the first (unnamed) column.
pub fn write_summary_csv<W: Write>(mut out: W, summaries: &[(String, RunSummary)]) -> io::Result<()> {
    writeln!(out, ",mean_heat_flux,max_heat_flux,points")?;
    for (name, s) in summaries {
        writeln!(
            out,
            "{},{},{},{}",
            name, s.mean_heat_flux, s.max_heat_flux, s.points
        )?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_summary_from_table() {
        let table =
            SurfaceTable::from_reader(Cursor::new("x,Heat_Flux\n0,10\n1,30\n2,20\n")).unwrap();
        let s = RunSummary::from_table(&table).unwrap();
        assert_eq!(s.mean_heat_flux, 20.0);
        assert_eq!(s.max_heat_flux, 30.0);
        assert_eq!(s.points, 3);
    }

    #[test]
    fn test_summary_skips_missing_values() {
        let table =
            SurfaceTable::from_reader(Cursor::new("x,Heat_Flux\n0,10\n1,\n2,20\n")).unwrap();
        let s = RunSummary::from_table(&table).unwrap();
        assert_eq!(s.mean_heat_flux, 15.0);
        assert_eq!(s.max_heat_flux, 20.0);
        assert_eq!(s.points, 3);
    }

    #[test]
    fn test_summary_requires_heat_flux() {
        let table = SurfaceTable::from_reader(Cursor::new("x,p\n0,1\n")).unwrap();
        assert!(RunSummary::from_table(&table).is_none());
        let empty = SurfaceTable::from_reader(Cursor::new("x,Heat_Flux\n")).unwrap();
        assert!(RunSummary::from_table(&empty).is_none());
    }

    #[test]
    fn test_write_summary_csv() {
        let rows = vec![(
            "wedge_r1".to_string(),
            RunSummary {
                mean_heat_flux: 1.5,
                max_heat_flux: 3.0,
                points: 4,
            },
        )];
        let mut buf = Vec::new();
        write_summary_csv(&mut buf, &rows).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            ",mean_heat_flux,max_heat_flux,points\nwedge_r1,1.5,3,4\n"
        );
    }
}
