//! Interactive comparison page: every variable of every run as a Plotly
//! trace, with a dropdown that shows one variable at a time.

use std::path::Path;

use anyhow::{bail, Context, Result};
use cfdplot_surface::{discover_runs, RunFilter, SurfaceRun};
use serde_json::{json, Value};

/// Key column of surface files; duplicate points are averaged over it.
pub const X_COLUMN: &str = "x";
const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";
const FONT: &str = "Arial, sans-serif";

/// y-axis title for a variable; unknown variables use their own name.
pub fn axis_label(variable: &str) -> &str {
    match variable {
        "Heat_Flux" => "Heat Flux (W/m²)",
        "Temperature_tr" => "Temperature (K)",
        "Pressure" => "Pressure (Pa)",
        other => other,
    }
}

fn title(variable: &str) -> String {
    format!("{} Comparison Across Simulations", variable)
}

#[derive(Debug)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Value,
    /// Variable index of each trace in `data`.
    trace_variable: Vec<usize>,
    pub variables: Vec<String>,
}

impl Figure {
    /// Which traces are visible when `variable` is selected.
    pub fn visibility(&self, variable: usize) -> Vec<bool> {
        self.trace_variable.iter().map(|&v| v == variable).collect()
    }
}

/// Averages each run over `x` and drops runs that lack the column.
pub fn prepare_runs(runs: Vec<SurfaceRun>) -> Vec<SurfaceRun> {
    runs.into_iter()
        .filter_map(|run| match run.table.average_duplicates(X_COLUMN) {
            Ok(table) => Some(SurfaceRun { table, ..run }),
            Err(e) => {
                log::warn!("{:?}: {}. Skipping file.", run.path, e);
                None
            }
        })
        .collect()
}

pub fn build_figure(runs: &[SurfaceRun]) -> Result<Figure> {
    let Some(first) = runs.first() else {
        bail!("no data found");
    };
    let variables: Vec<String> = first
        .table
        .columns()
        .iter()
        .filter(|c| c.as_str() != X_COLUMN)
        .cloned()
        .collect();
    if variables.is_empty() {
        bail!("no variables found to plot");
    }

    let mut data = Vec::new();
    let mut trace_variable = Vec::new();
    for (var_idx, variable) in variables.iter().enumerate() {
        for run in runs {
            let (Some(x), Some(y)) = (run.table.column(X_COLUMN), run.table.column(variable))
            else {
                continue;
            };
            data.push(json!({
                "type": "scatter",
                "mode": "lines",
                "x": finite_or_null(x),
                "y": finite_or_null(y),
                "name": run.label(),
                "line": { "width": 2 },
                "visible": var_idx == 0,
            }));
            trace_variable.push(var_idx);
        }
    }

    let mut figure = Figure {
        data,
        layout: Value::Null,
        trace_variable,
        variables,
    };

    let buttons: Vec<Value> = figure
        .variables
        .iter()
        .enumerate()
        .map(|(i, variable)| {
            json!({
                "label": variable,
                "method": "update",
                "args": [
                    { "visible": figure.visibility(i) },
                    { "title.text": title(variable), "yaxis.title.text": axis_label(variable) },
                ],
            })
        })
        .collect();

    let first_var = &figure.variables[0];
    figure.layout = json!({
        "title": {
            "text": title(first_var),
            "y": 0.95,
            "x": 0.5,
            "xanchor": "center",
            "yanchor": "top",
            "font": { "size": 16, "family": FONT },
        },
        "font": { "family": FONT, "size": 12, "color": "black" },
        "plot_bgcolor": "white",
        "paper_bgcolor": "white",
        "legend": {
            "title": { "text": "Simulation" },
            "x": 1.02,
            "y": 1.0,
            "xanchor": "left",
            "yanchor": "top",
            "bgcolor": "rgba(255,255,255,0)",
            "borderwidth": 0,
            "font": { "size": 12, "family": FONT },
        },
        "xaxis": axis_style("x (m)", ".3f", 20),
        "yaxis": axis_style(axis_label(first_var), ".2e", 15),
        "margin": { "l": 50, "r": 150, "t": 50, "b": 50 },
        "updatemenus": [{
            "buttons": buttons,
            "direction": "down",
            "showactive": true,
            "x": 0.17,
            "xanchor": "left",
            "y": 1.15,
            "yanchor": "top",
            "font": { "family": FONT, "size": 12, "color": "black" },
        }],
    });

    Ok(figure)
}

fn axis_style(title: &str, tickformat: &str, nticks: u32) -> Value {
    json!({
        "title": { "text": title, "font": { "size": 14 }, "standoff": 20 },
        "tickformat": tickformat,
        "nticks": nticks,
        "gridcolor": "lightgray",
        "showline": true,
        "linewidth": 1,
        "linecolor": "black",
        "mirror": true,
        "tickfont": { "size": 12 },
    })
}

/// JSON has no NaN or infinity; Plotly treats null as a gap.
fn finite_or_null(values: &[f64]) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|v| if v.is_finite() { Some(*v) } else { None })
        .collect()
}

/// Escapes text placed in HTML element content.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

/// Standalone page loading Plotly from its CDN, without the mode bar logo.
pub fn render_html(figure: &Figure) -> Result<String> {
    // Keep `</script>` inside string values from closing the script block.
    let embed = |v: &Value| -> Result<String> { Ok(serde_json::to_string(v)?.replace("</", "<\\/")) };
    let data = embed(&Value::Array(figure.data.clone()))?;
    let layout = embed(&figure.layout)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8" />
<title>{title}</title>
<script src="{cdn}" charset="utf-8"></script>
</head>
<body>
<div id="plot" style="width:100%;height:95vh;"></div>
<script>
Plotly.newPlot("plot", {data}, {layout}, {{"displaylogo": false, "responsive": true}});
</script>
</body>
</html>
"#,
        title = escape_html(&title(&figure.variables[0])),
        cdn = PLOTLY_CDN,
        data = data,
        layout = layout,
    ))
}

pub fn run(base: &Path, output: &Path) -> Result<()> {
    let runs = discover_runs(base, &RunFilter::All)
        .with_context(|| format!("failed to scan {}", base.display()))?;
    let runs = prepare_runs(runs);
    let figure = build_figure(&runs)?;
    let html = render_html(&figure)?;
    std::fs::write(output, html)
        .with_context(|| format!("failed to write {}", output.display()))?;
    log::info!("Interactive plot saved as '{}'", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfdplot_surface::SurfaceTable;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn make_run(name: &str, csv: &str) -> SurfaceRun {
        SurfaceRun {
            name: name.to_string(),
            path: PathBuf::from(name).join("surface.csv"),
            table: SurfaceTable::from_reader(Cursor::new(csv)).unwrap(),
        }
    }

    fn runs() -> Vec<SurfaceRun> {
        prepare_runs(vec![
            make_run("wedge_a", "x,Heat_Flux,Pressure\n0.1,1,10\n0.0,2,20\n0.1,3,30\n"),
            make_run("wedge_b", "x,Heat_Flux,Pressure\n0.0,4,40\n"),
            make_run("no_x", "y,Heat_Flux\n0.0,4\n"),
        ])
    }

    #[test]
    fn test_prepare_runs_drops_runs_without_x() {
        let runs = runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].table.column("x").unwrap(), &[0.0, 0.1]);
        assert_eq!(runs[0].table.column("Heat_Flux").unwrap(), &[2.0, 2.0]);
    }

    #[test]
    fn test_figure_traces_and_visibility() {
        let figure = build_figure(&runs()).unwrap();
        assert_eq!(figure.variables, ["Heat_Flux", "Pressure"]);
        assert_eq!(figure.data.len(), 4);
        assert_eq!(figure.data[0]["name"], "a");
        assert_eq!(figure.data[0]["visible"], true);
        assert_eq!(figure.data[2]["visible"], false);
        assert_eq!(figure.visibility(1), vec![false, false, true, true]);

        let buttons = &figure.layout["updatemenus"][0]["buttons"];
        assert_eq!(buttons[1]["label"], "Pressure");
        assert_eq!(buttons[1]["args"][1]["yaxis.title.text"], "Pressure (Pa)");
        assert_eq!(
            figure.layout["yaxis"]["title"]["text"],
            "Heat Flux (W/m²)"
        );
    }

    #[test]
    fn test_visibility_with_missing_variable() {
        let runs = prepare_runs(vec![
            make_run("wedge_a", "x,Heat_Flux,Pressure\n0,1,2\n"),
            make_run("wedge_b", "x,Heat_Flux\n0,1\n"),
        ]);
        let figure = build_figure(&runs).unwrap();
        assert_eq!(figure.data.len(), 3);
        assert_eq!(figure.visibility(0), vec![true, true, false]);
        assert_eq!(figure.visibility(1), vec![false, false, true]);
    }

    #[test]
    fn test_empty_inputs_are_errors() {
        assert!(build_figure(&[]).is_err());
        let only_x = prepare_runs(vec![make_run("r", "x\n0\n")]);
        assert!(build_figure(&only_x).is_err());
    }

    #[test]
    fn test_render_html() {
        let mut runs = runs();
        runs[0].name = "wedge_</script>".to_string();
        let html = render_html(&build_figure(&runs).unwrap()).unwrap();
        assert!(html.contains(PLOTLY_CDN));
        assert!(html.contains("\"displaylogo\": false"));
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_title_is_escaped() {
        let runs = prepare_runs(vec![make_run(
            "wedge_a",
            "x,</title><b>T&P\n0,1\n",
        )]);
        let html = render_html(&build_figure(&runs).unwrap()).unwrap();
        assert!(html.contains(
            "<title>&lt;/title&gt;&lt;b&gt;T&amp;P Comparison Across Simulations</title>"
        ));
        assert_eq!(html.matches("</title>").count(), 1);
    }

    #[test]
    fn test_axis_labels() {
        assert_eq!(axis_label("Temperature_tr"), "Temperature (K)");
        assert_eq!(axis_label("Cf_x"), "Cf_x");
    }
}
