use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use cfdplot_surface::{
    discover_runs, write_summary_csv, RunFilter, RunSummary, SurfaceRun, HEAT_FLUX,
};
use plotters::prelude::*;

/// Run directories taking part in a grid convergence study.
pub const RUN_PREFIX: &str = "wedge_r";
/// Pseudo column selecting the row index as x axis.
pub const INDEX_AXIS: &str = "index";

pub struct ConvergenceOutput {
    pub plot: PathBuf,
    pub summary: PathBuf,
}

/// x values for a run: the requested column when the run has it, otherwise
/// the row index.
fn x_values(run: &SurfaceRun, x_variable: &str) -> Vec<f64> {
    match run.table.column(x_variable) {
        Some(values) if x_variable != INDEX_AXIS => values.to_vec(),
        _ => (0..run.table.len()).map(|i| i as f64).collect(),
    }
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        (0.0, 1.0)
    } else if lo == hi {
        (lo - 1.0, hi + 1.0)
    } else {
        (lo, hi)
    }
}

/// Overlays the heat flux of every `wedge_r*` run and writes per-run summary
/// statistics next to the plot.
pub fn run(base: &Path, x_variable: &str, output_name: &str) -> Result<ConvergenceOutput> {
    let runs: Vec<SurfaceRun> = discover_runs(base, &RunFilter::Prefix(RUN_PREFIX.into()))
        .with_context(|| format!("failed to scan {}", base.display()))?
        .into_iter()
        .filter(|r| {
            let ok = r.table.has_column(HEAT_FLUX);
            if !ok {
                log::warn!("{}: no {} column, skipping", r.name, HEAT_FLUX);
            }
            ok
        })
        .collect();
    if runs.is_empty() {
        bail!("no {}* runs with {} data in {}", RUN_PREFIX, HEAT_FLUX, base.display());
    }

    let plot = base.join(format!("{}.svg", output_name));
    let summary = base.join(format!("{}_summary.csv", output_name));

    render(&runs, x_variable, &plot)?;

    let summaries: Vec<(String, RunSummary)> = runs
        .iter()
        .filter_map(|r| RunSummary::from_table(&r.table).map(|s| (r.name.clone(), s)))
        .collect();
    let file = File::create(&summary)
        .with_context(|| format!("failed to create {}", summary.display()))?;
    write_summary_csv(BufWriter::new(file), &summaries)?;

    log::info!("Plot saved as: {}", plot.display());
    log::info!("Summary data saved as: {}", summary.display());
    Ok(ConvergenceOutput { plot, summary })
}

fn render(runs: &[SurfaceRun], x_variable: &str, out_path: &Path) -> Result<()> {
    let series: Vec<(&SurfaceRun, Vec<(f64, f64)>)> = runs
        .iter()
        .map(|r| {
            let ys = r.table.column(HEAT_FLUX).unwrap_or(&[]);
            let points: Vec<(f64, f64)> = x_values(r, x_variable)
                .into_iter()
                .zip(ys.iter().copied())
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .collect();
            (r, points)
        })
        .collect();

    let x_label = if x_variable != INDEX_AXIS && runs.iter().all(|r| r.table.has_column(x_variable))
    {
        x_variable
    } else {
        "Surface Point Index"
    };
    let (x_min, x_max) = bounds(series.iter().flat_map(|(_, p)| p.iter().map(|pt| pt.0)));
    let (y_min, y_max) = bounds(series.iter().flat_map(|(_, p)| p.iter().map(|pt| pt.1)));
    let pad = (y_max - y_min) * 0.05;

    let root = SVGBackend::new(out_path, (1200, 800)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(
            "Grid Convergence Study - Heat Flux Distribution",
            ("sans-serif", 22),
        )
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, (y_min - pad)..(y_max + pad))?;

    chart
        .configure_mesh()
        .x_desc(x_label)
        .y_desc("Heat Flux (W/m²)")
        .draw()?;

    for (i, (run, points)) in series.into_iter().enumerate() {
        let color = Palette99::pick(i).mix(0.7);
        chart
            .draw_series(LineSeries::new(points, &color))?
            .label(run.name.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_run(base: &Path, name: &str, csv: &str) {
        let dir = base.join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("surface.csv"), csv).unwrap();
    }

    #[test]
    fn test_convergence_outputs() {
        let tmp = tempfile::tempdir().unwrap();
        write_run(tmp.path(), "wedge_r1_a1_z1", "\"x\",\"Heat_Flux\"\n0,10\n0.1,20\n");
        write_run(tmp.path(), "wedge_r2_a1_z1", "\"x\",\"Heat_Flux\"\n0,12\n0.05,16\n0.1,22\n");
        write_run(tmp.path(), "other", "\"x\",\"Heat_Flux\"\n0,1\n");

        let out = run(tmp.path(), INDEX_AXIS, "grid_convergence").unwrap();
        assert!(out.plot.ends_with("grid_convergence.svg"));
        let svg = fs::read_to_string(&out.plot).unwrap();
        assert!(svg.contains("wedge_r2_a1_z1"));
        assert!(!svg.contains(">other<"));

        let summary = fs::read_to_string(&out.summary).unwrap();
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines[0], ",mean_heat_flux,max_heat_flux,points");
        assert_eq!(lines[1], "wedge_r1_a1_z1,15,20,2");
        assert_eq!(lines[2], "wedge_r2_a1_z1,16.666666666666668,22,3");
    }

    #[test]
    fn test_no_runs_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(run(tmp.path(), INDEX_AXIS, "grid_convergence").is_err());
    }

    #[test]
    fn test_x_values_fall_back_to_index() {
        let tmp = tempfile::tempdir().unwrap();
        write_run(tmp.path(), "wedge_r1", "x,Heat_Flux\n0.5,1\n0.7,2\n");
        let runs = discover_runs(tmp.path(), &RunFilter::All).unwrap();
        assert_eq!(x_values(&runs[0], "x"), vec![0.5, 0.7]);
        assert_eq!(x_values(&runs[0], "y"), vec![0.0, 1.0]);
        assert_eq!(x_values(&runs[0], INDEX_AXIS), vec![0.0, 1.0]);
    }
}
