use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::{SurfaceError, SurfaceTable};

/// File every run directory is expected to contain.
pub const SURFACE_FILE: &str = "surface.csv";

/// Which run directories to pick up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunFilter {
    All,
    Prefix(String),
}

impl RunFilter {
    pub fn accepts(&self, name: &str) -> bool {
        match self {
            RunFilter::All => true,
            RunFilter::Prefix(prefix) => name.starts_with(prefix.as_str()),
        }
    }
}

/// One simulation's surface data, named after its directory.
#[derive(Debug, Clone)]
pub struct SurfaceRun {
    pub name: String,
    pub path: PathBuf,
    pub table: SurfaceTable,
}

impl SurfaceRun {
    /// Legend label: the directory name without the `wedge_` prefix.
    pub fn label(&self) -> &str {
        self.name.strip_prefix("wedge_").unwrap_or(&self.name)
    }
}

/// Loads `surface.csv` from every immediate subdirectory of `base` that the
/// filter accepts, ordered by directory name.
///
/// Runs whose file cannot be read are logged and left out.
pub fn discover_runs(base: &Path, filter: &RunFilter) -> Result<Vec<SurfaceRun>, SurfaceError> {
    if !base.is_dir() {
        return Err(SurfaceError::NotADirectory(base.to_path_buf()));
    }

    let mut runs = Vec::new();
    log::info!("Scanning runs in: {:?}", base);
    for entry in WalkDir::new(base)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if !filter.accepts(&name) {
            continue;
        }
        let csv_path = entry.path().join(SURFACE_FILE);
        if !csv_path.is_file() {
            log::debug!("{} has no {}, skipping", name, SURFACE_FILE);
            continue;
        }

        match SurfaceTable::read(&csv_path) {
            Ok(table) => {
                log::debug!("Loaded {} rows from {:?}", table.len(), csv_path);
                runs.push(SurfaceRun {
                    name,
                    path: csv_path,
                    table,
                });
            }
            Err(e) => log::error!("Error reading {:?}: {}", csv_path, e),
        }
    }
    Ok(runs)
}
