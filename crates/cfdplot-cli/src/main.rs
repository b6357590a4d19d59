use anyhow::{bail, Context};
use cfdplot_log::TableParser;
use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::LevelFilter;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

mod convergence;
mod dashboard;
mod residuals;

#[derive(Parser)]
#[command(name = "cfdplot")]
#[command(about = "Plot CFD solver logs and surface output", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Plot every column of a solver log against Inner_Iter
    Residuals {
        /// Path to the solver log
        #[arg(value_name = "FILE", default_value = "screen.dat")]
        path: PathBuf,
        /// Use a logarithmic y axis
        #[arg(long = "log")]
        log_scale: bool,
        /// Where to write the plot
        #[arg(short, long, default_value = "residuals.svg")]
        output: PathBuf,
    },
    /// Parse a solver log and emit the table as JSON
    Parse {
        #[arg(value_name = "FILE")]
        path: PathBuf,
    },
    /// Compare heat flux across wedge_r* grid refinement runs
    Convergence {
        /// Directory holding the run directories
        #[arg(long, default_value = ".")]
        base: PathBuf,
        /// Column used as x axis, or `index`
        #[arg(long, default_value = convergence::INDEX_AXIS)]
        x_variable: String,
        /// Base name of the plot and summary files
        #[arg(short, long, default_value = "grid_convergence")]
        output: String,
    },
    /// Build an interactive HTML comparison of all runs
    Dashboard {
        /// Directory holding the run directories
        #[arg(long, default_value = ".")]
        base: PathBuf,
        #[arg(short, long, default_value = "interactive_plot.html")]
        output: PathBuf,
    },
}

fn parse_log(path: &Path) -> anyhow::Result<cfdplot_log::LogTable> {
    if !path.is_file() {
        bail!("'{}' not found", path.display());
    }
    log::info!("Reading file: {}", path.display());
    let file = File::open(path)?;
    TableParser::new()
        .parse_reader(BufReader::new(file))
        .with_context(|| format!("error processing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        })
        .parse_default_env()
        .init();

    match &cli.command {
        Commands::Residuals {
            path,
            log_scale,
            output,
        } => {
            let table = parse_log(path)?;
            println!("First 5 rows of data:");
            println!("{}", residuals::preview(&table, 5));
            residuals::render(&table, output, *log_scale)?;
        }
        Commands::Parse { path } => {
            let table = parse_log(path)?;
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Commands::Convergence {
            base,
            x_variable,
            output,
        } => {
            let out = convergence::run(base, x_variable, output)?;
            println!("Plot saved as: {}", out.plot.display());
            println!("Summary data saved as: {}", out.summary.display());
        }
        Commands::Dashboard { base, output } => {
            dashboard::run(base, output)?;
            println!("Interactive plot saved as '{}'", output.display());
        }
    }
    Ok(())
}
