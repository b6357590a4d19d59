use cfdplot_surface::{discover_runs, RunFilter, RunSummary, SurfaceError, SURFACE_FILE};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_run(base: &Path, name: &str, csv: &str) {
    let dir = base.join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(SURFACE_FILE), csv).unwrap();
}

fn study() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let base = tmp.path();
    write_run(base, "wedge_r2_a1_z0", "\"x\",\"Heat_Flux\"\n0.0,5\n0.1,7\n");
    write_run(base, "wedge_r1_a1_z0", "\"x\",\"Heat_Flux\"\n0.0,4\n0.1,6\n0.2,8\n");
    write_run(base, "baseline", "\"x\",\"Pressure\"\n0.0,101325\n");
    fs::create_dir_all(base.join("wedge_r3_empty")).unwrap();
    fs::write(base.join("notes.txt"), "not a run").unwrap();
    tmp
}

#[test]
fn test_discovers_all_runs_sorted() {
    let tmp = study();
    let runs = discover_runs(tmp.path(), &RunFilter::All).unwrap();
    let names: Vec<_> = runs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["baseline", "wedge_r1_a1_z0", "wedge_r2_a1_z0"]);
}

#[test]
fn test_prefix_filter() {
    let tmp = study();
    let runs = discover_runs(tmp.path(), &RunFilter::Prefix("wedge_r".into())).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].label(), "r1_a1_z0");

    let summary = RunSummary::from_table(&runs[0].table).unwrap();
    assert_eq!(summary.points, 3);
    assert_eq!(summary.max_heat_flux, 8.0);
}

#[test]
fn test_unreadable_run_is_skipped() {
    let tmp = study();
    // A header-less file fails to load but does not stop discovery.
    write_run(tmp.path(), "wedge_r0_broken", "");
    let runs = discover_runs(tmp.path(), &RunFilter::Prefix("wedge_r".into())).unwrap();
    assert_eq!(runs.len(), 2);
}

#[test]
fn test_missing_base_directory() {
    let tmp = TempDir::new().unwrap();
    let err = discover_runs(&tmp.path().join("nope"), &RunFilter::All).unwrap_err();
    assert!(matches!(err, SurfaceError::NotADirectory(_)));
}
