//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - loads snapshots and runs the analysis pipeline
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, DemoArgs, OutputFormat, TreeArgs};
use crate::data::{DemoConfig, generate_demo};
use crate::domain::{AnalysisConfig, SeriesSelection};
use crate::error::AppError;
use crate::taxonomy::TaxonomyTree;

pub mod cache;
pub mod pipeline;

use pipeline::{AnalysisContext, NodeSelector, Selection};

/// Entry point for the `mf` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = crate::cli::Cli::parse();
    match cli.command {
        Command::Analyze(args) => handle_analyze(args),
        Command::Tree(args) => handle_tree(args),
        Command::Demo(args) => handle_demo(args),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("MF_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let snapshots = crate::io::load_snapshots(
        &args.snapshots.taxonomy,
        &args.snapshots.datasets,
        args.snapshots.overrides.as_deref(),
    )?;
    let ctx = AnalysisContext::new(snapshots);
    ctx.tree().validate()?;

    let config = analysis_config_from_args(&args);
    let selection = selection_from_args(&args);

    let analysis = if args.strict {
        pipeline::try_analyze(&ctx, &selection, &config).map(Some)?
    } else {
        pipeline::analyze(&ctx, &selection, &config)?
    };
    let Some(analysis) = analysis else {
        println!("No data for this selection.");
        return Ok(());
    };

    match args.format {
        OutputFormat::Table => {
            println!("{}", crate::report::format_analysis(&analysis, ctx.tree(), &config));
        }
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(&analysis)
                .map_err(|e| AppError::new(2, format!("Failed to serialize analysis: {e}")))?;
            println!("{text}");
        }
    }

    if let Some(path) = &args.export_csv {
        crate::io::write_timeline_csv(path, &analysis.timeline)?;
    }
    if let Some(path) = &args.export_json {
        crate::io::write_analysis_json(path, &analysis)?;
    }

    Ok(())
}

fn handle_tree(args: TreeArgs) -> Result<(), AppError> {
    let tree = TaxonomyTree::from_nodes(crate::io::read_taxonomy(&args.taxonomy)?);
    tree.validate()?;

    let datasets = match &args.datasets {
        Some(path) => crate::io::read_datasets(path)?,
        None => Vec::new(),
    };
    let resolver = crate::taxonomy::PathKeyResolver::new(&tree);

    let listing = crate::report::format_tree(&tree, |id| {
        resolver
            .resolve(id)
            .ok()
            .and_then(|key| resolver.find_dataset(&key, &datasets))
            .is_some()
    });
    print!("{listing}");

    if args.datasets.is_some() {
        let stale = resolver.unresolved_references(&datasets);
        if stale.is_empty() {
            println!("\nAll {} dataset references resolve.", datasets.len());
        } else {
            println!("\nUnresolved dataset references ({}):", stale.len());
            for err in &stale {
                println!("- {err}");
            }
        }
    }

    Ok(())
}

fn handle_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = DemoConfig {
        seed: args.seed,
        start_year: args.start_year,
        years: args.years,
        noise: args.noise,
        ..DemoConfig::default()
    };
    let snapshots = generate_demo(&config)?;

    std::fs::create_dir_all(&args.out_dir).map_err(|e| {
        AppError::new(2, format!("Failed to create output dir '{}': {e}", args.out_dir.display()))
    })?;
    let dir: &Path = &args.out_dir;
    crate::io::write_taxonomy(&dir.join("taxonomy.json"), &snapshots.taxonomy)?;
    crate::io::write_datasets(&dir.join("datasets.json"), &snapshots.datasets)?;
    crate::io::write_overrides(&dir.join("overrides.json"), &snapshots.overrides)?;

    println!(
        "Wrote {} nodes, {} datasets, {} overrides to {}",
        snapshots.taxonomy.len(),
        snapshots.datasets.len(),
        snapshots.overrides.values.len(),
        dir.display()
    );
    Ok(())
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        horizon: args.horizon,
        methods: args.methods.iter().copied().collect(),
        smoothing: args.smoothing,
        alpha: args.alpha,
        ..AnalysisConfig::default()
    }
}

pub fn selection_from_args(args: &AnalyzeArgs) -> Selection {
    let node = match (&args.path, args.node) {
        (Some(path), _) => NodeSelector::from_name_path(path),
        (None, Some(id)) => NodeSelector::Id(id),
        (None, None) => NodeSelector::NamePath(Vec::new()),
    };
    Selection {
        node,
        series: SeriesSelection::from_label(args.series.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::{ForecastMethod, SmoothingMode};

    fn analyze_args(extra: &[&str]) -> AnalyzeArgs {
        let mut argv = vec!["mf", "analyze", "--taxonomy", "t.json", "--datasets", "d.json"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Analyze(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn config_from_args_keeps_default_weights() {
        let args = analyze_args(&["--node", "2", "--horizon", "3", "--methods", "score,manual", "--alpha", "0.3"]);
        let config = analysis_config_from_args(&args);
        assert_eq!(config.horizon, 3);
        assert_eq!(
            config.methods.iter().copied().collect::<Vec<_>>(),
            vec![ForecastMethod::Score, ForecastMethod::Manual]
        );
        assert_eq!(config.smoothing, SmoothingMode::ConstantSmoothing);
        assert!((config.alpha - 0.3).abs() < 1e-12);
        assert_eq!(config.score_weights, [0.5, 0.3, 0.2]);
    }

    #[test]
    fn selection_prefers_path_and_blank_series_is_first() {
        let args = analyze_args(&["--path", "CV / India", "--series", "  "]);
        let selection = selection_from_args(&args);
        assert_eq!(selection.node, NodeSelector::NamePath(vec!["CV".into(), "India".into()]));
        assert_eq!(selection.series, SeriesSelection::FirstInsertionOrder);

        let args = analyze_args(&["--node", "7", "--series", "Truck"]);
        let selection = selection_from_args(&args);
        assert_eq!(selection.node, NodeSelector::Id(7));
        assert_eq!(selection.series, SeriesSelection::ByExplicitLabel("Truck".into()));
    }
}
