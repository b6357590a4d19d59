use std::path::Path;

use anyhow::{bail, Result};
use cfdplot_log::ir::ITERATION_COLUMN;
use cfdplot_log::{LogTable, Row};
use plotters::prelude::*;

const PANEL_WIDTH: u32 = 500;
const PANEL_HEIGHT: u32 = 400;

/// Rows and columns of the panel grid for `n` plots: one row for up to two
/// plots, otherwise two rows.
pub fn grid_shape(n: usize) -> (usize, usize) {
    if n <= 2 {
        (1, n.max(1))
    } else {
        (2, n.div_ceil(2))
    }
}

fn value_range(values: impl Iterator<Item = f64>, log_scale: bool) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .filter(|v| v.is_finite() && (!log_scale || *v > 0.0))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if lo > hi {
        return None;
    }
    if lo == hi {
        return Some(if log_scale {
            (lo / 10.0, hi * 10.0)
        } else {
            (lo - 1.0, hi + 1.0)
        });
    }
    Some((lo, hi))
}

/// Draws one panel per metric column against the iteration counter.
pub fn render(table: &LogTable, out_path: &Path, log_scale: bool) -> Result<()> {
    let metrics = table.metric_columns();
    if metrics.is_empty() {
        bail!("no columns to plot: the log only contains {}", ITERATION_COLUMN);
    }
    log::info!("Plotting the following columns: {:?}", metrics);

    let (rows, cols) = grid_shape(metrics.len());
    let size = (PANEL_WIDTH * cols as u32, PANEL_HEIGHT * rows as u32);
    let root = SVGBackend::new(out_path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((rows, cols));

    let x_range = value_range(table.rows().iter().map(|r| r.iteration as f64), false)
        .unwrap_or((0.0, 1.0));

    for (i, name) in metrics.iter().enumerate() {
        let bottom_row = i >= (rows - 1) * cols;
        draw_panel(
            &panels[i],
            table.rows(),
            i,
            name,
            x_range,
            bottom_row,
            log_scale,
        )?;
    }

    root.present()?;
    log::info!("Saved residual plot to {}", out_path.display());
    Ok(())
}

fn draw_panel(
    area: &DrawingArea<SVGBackend, plotters::coord::Shift>,
    rows: &[Row],
    index: usize,
    name: &str,
    (x_min, x_max): (f64, f64),
    x_label: bool,
    log_scale: bool,
) -> Result<()> {
    let color = Palette99::pick(index).mix(0.9);
    let points: Vec<(f64, f64)> = rows
        .iter()
        .map(|r| (r.iteration as f64, r.values[index]))
        .filter(|(_, y)| y.is_finite() && (!log_scale || *y > 0.0))
        .collect();
    if points.len() < rows.len() {
        log::warn!(
            "{}: {} points cannot be drawn and were left out",
            name,
            rows.len() - points.len()
        );
    }
    let caption = format!("{} vs {}", name, ITERATION_COLUMN);

    // Linear and logarithmic charts have different coordinate types.
    macro_rules! finish_chart {
        ($chart:expr) => {{
            let mut chart = $chart;
            let mut mesh = chart.configure_mesh();
            mesh.y_desc(name);
            if x_label {
                mesh.x_desc(ITERATION_COLUMN);
            }
            mesh.draw()?;

            chart
                .draw_series(LineSeries::new(points, &color))?
                .label(name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
            chart
                .configure_series_labels()
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }};
    }

    let mut builder = ChartBuilder::on(area);
    builder
        .caption(caption, ("sans-serif", 18))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(70);

    if log_scale {
        let (y_min, y_max) =
            value_range(points.iter().map(|p| p.1), true).unwrap_or((1.0, 10.0));
        finish_chart!(builder.build_cartesian_2d(x_min..x_max, (y_min..y_max).log_scale())?);
    } else {
        let (y_min, y_max) = value_range(points.iter().map(|p| p.1), false).unwrap_or((0.0, 1.0));
        finish_chart!(builder.build_cartesian_2d(x_min..x_max, y_min..y_max)?);
    }
    Ok(())
}

/// Plain-text preview of the first rows, one line per row.
pub fn preview(table: &LogTable, n: usize) -> String {
    let mut out = table.columns().join("\t");
    for row in table.head(n) {
        out.push('\n');
        out.push_str(&row.iteration.to_string());
        for v in &row.values {
            out.push('\t');
            out.push_str(&v.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfdplot_log::TableParser;

    #[test]
    fn test_grid_shape() {
        assert_eq!(grid_shape(1), (1, 1));
        assert_eq!(grid_shape(2), (1, 2));
        assert_eq!(grid_shape(3), (2, 2));
        assert_eq!(grid_shape(4), (2, 2));
        assert_eq!(grid_shape(5), (2, 3));
        assert_eq!(grid_shape(8), (2, 4));
    }

    #[test]
    fn test_value_range() {
        let v = [3.0, -1.0, f64::NAN, 2.0];
        assert_eq!(value_range(v.iter().copied(), false), Some((-1.0, 3.0)));
        assert_eq!(value_range(v.iter().copied(), true), Some((2.0, 3.0)));
        assert_eq!(value_range([-1.0].into_iter(), true), None);
        assert_eq!(value_range([5.0].into_iter(), false), Some((4.0, 6.0)));
    }

    #[test]
    fn test_preview() {
        let table = TableParser::new()
            .parse("Inner_Iter | a\n-\n0 | 1.5\n1 | 2\n2 | 3\n")
            .unwrap();
        assert_eq!(preview(&table, 2), "Inner_Iter\ta\n0\t1.5\n1\t2");
    }

    #[test]
    fn test_render_writes_svg() {
        let table = TableParser::new()
            .parse("Inner_Iter | a | b | c\n-\n0 | 1 | -2 | 1e-3\n1 | 0.5 | -3 | 1e-4\n")
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        for log_scale in [false, true] {
            let out = dir.path().join(format!("res_{}.svg", log_scale));
            render(&table, &out, log_scale).unwrap();
            let svg = std::fs::read_to_string(&out).unwrap();
            assert!(svg.contains("<svg"));
            assert!(svg.contains("b vs Inner_Iter"));
        }
    }

    #[test]
    fn test_render_rejects_iteration_only_table() {
        let table = TableParser::new().parse("Inner_Iter\n-\n0\n1\n").unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(render(&table, &dir.path().join("x.svg"), false).is_err());
    }
}
