//! Command-line parsing for the `mf` market forecaster.
//!
//! Argument parsing and command dispatch stay separate from the resolution and
//! forecasting code; `app` maps these structs onto library types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::domain::{ForecastMethod, MAX_HORIZON, SmoothingMode};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mf", version, about = "Market volume forecaster over a taxonomy snapshot")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve one node, forecast its series, and print the merged timeline.
    Analyze(AnalyzeArgs),
    /// List the taxonomy with path keys; optionally check dataset references.
    Tree(TreeArgs),
    /// Write a seeded synthetic snapshot to try the tool with.
    Demo(DemoArgs),
}

/// Snapshot file locations. Each may come from the environment (or `.env`).
#[derive(Debug, Parser, Clone)]
pub struct SnapshotArgs {
    /// Taxonomy JSON (array of nodes).
    #[arg(long, env = "MF_TAXONOMY", value_name = "JSON")]
    pub taxonomy: PathBuf,

    /// Dataset JSON (array of entries).
    #[arg(long, env = "MF_DATASETS", value_name = "JSON")]
    pub datasets: PathBuf,

    /// Manual override JSON (period label -> value).
    #[arg(long, env = "MF_OVERRIDES", value_name = "JSON")]
    pub overrides: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub snapshots: SnapshotArgs,

    /// Taxonomy node id.
    #[arg(long, conflicts_with = "path", required_unless_present = "path")]
    pub node: Option<i64>,

    /// Node name path from the top, e.g. `CV/India`.
    #[arg(long)]
    pub path: Option<String>,

    /// Series label inside the dataset (default: first in insertion order).
    #[arg(long)]
    pub series: Option<String>,

    /// Number of future periods to forecast.
    #[arg(long, default_value_t = 5, value_parser = parse_horizon)]
    pub horizon: usize,

    /// Active forecast methods.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = ForecastMethod::ALL
    )]
    pub methods: Vec<ForecastMethod>,

    /// How the smoothing ("ai") method extends past the first period.
    #[arg(long, value_enum, default_value_t = SmoothingMode::ConstantSmoothing)]
    pub smoothing: SmoothingMode,

    /// Exponential smoothing factor.
    #[arg(long, default_value_t = 0.5)]
    pub alpha: f64,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Exit with code 3 when the selection has no data.
    #[arg(long)]
    pub strict: bool,

    /// Export the merged timeline to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Export the full analysis to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct TreeArgs {
    #[arg(long, env = "MF_TAXONOMY", value_name = "JSON")]
    pub taxonomy: PathBuf,

    /// Dataset JSON; when given, stale references are reported.
    #[arg(long, env = "MF_DATASETS", value_name = "JSON")]
    pub datasets: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct DemoArgs {
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First historical year.
    #[arg(long, default_value_t = 2015)]
    pub start_year: i32,

    /// Years of history per series.
    #[arg(long, default_value_t = 10)]
    pub years: usize,

    /// Log-noise std dev around the growth trend.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Output directory for taxonomy.json, datasets.json, overrides.json.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,
}

fn parse_horizon(s: &str) -> Result<usize, String> {
    let horizon: usize = s.parse().map_err(|e| format!("{e}"))?;
    if horizon > MAX_HORIZON {
        return Err(format!("horizon must be at most {MAX_HORIZON}"));
    }
    Ok(horizon)
}
