//! Shared analysis pipeline used by the CLI and by library callers.
//!
//! Keeping this in one place avoids duplicating the core workflow at every call
//! site:
//! select node -> path key -> dataset -> historical series -> forecasts ->
//! merged timeline -> growth summary
//!
//! Every step is a pure function of the snapshots and the config, so the same
//! inputs always produce the same `Analysis` and selections can be evaluated in
//! parallel.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::domain::{
    AnalysisConfig, DatasetEntry, ForecastMethod, ForecastSeries, GrowthSummary, HistoricalSeries,
    ManualOverrides, MergedTimeline, SeriesSelection, TaxonomyNode,
};
use crate::error::ResolveError;
use crate::forecast::ForecastEngine;
use crate::report::summarize_growth;
use crate::series::extract;
use crate::taxonomy::{PathKey, PathKeyResolver, TaxonomyTree};
use crate::timeline::merge_active;

/// The three caller-provided snapshots.
#[derive(Debug, Clone, Default)]
pub struct Snapshots {
    pub taxonomy: Vec<TaxonomyNode>,
    pub datasets: Vec<DatasetEntry>,
    pub overrides: ManualOverrides,
}

/// Snapshots with the taxonomy indexed. Immutable once built.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    tree: TaxonomyTree,
    datasets: Vec<DatasetEntry>,
    overrides: ManualOverrides,
}

impl AnalysisContext {
    pub fn new(snapshots: Snapshots) -> Self {
        Self {
            tree: TaxonomyTree::from_nodes(snapshots.taxonomy),
            datasets: snapshots.datasets,
            overrides: snapshots.overrides,
        }
    }

    pub fn tree(&self) -> &TaxonomyTree {
        &self.tree
    }

    pub fn datasets(&self) -> &[DatasetEntry] {
        &self.datasets
    }

    pub fn overrides(&self) -> &ManualOverrides {
        &self.overrides
    }

    pub fn resolver(&self) -> PathKeyResolver<'_> {
        PathKeyResolver::new(&self.tree)
    }
}

/// How the caller addresses a taxonomy node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeSelector {
    Id(i64),
    /// Labels from the top down, e.g. category then region.
    NamePath(Vec<String>),
}

impl NodeSelector {
    /// Parse `"CV/India"` style paths. Blank segments are dropped.
    pub fn from_name_path(path: &str) -> Self {
        NodeSelector::NamePath(
            path.split('/')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Selection {
    pub node: NodeSelector,
    pub series: SeriesSelection,
}

/// Everything a chart needs for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub node_id: i64,
    pub path_key: PathKey,
    pub dataset_id: i64,
    pub series_label: Option<String>,
    pub historical: HistoricalSeries,
    pub forecasts: BTreeMap<ForecastMethod, ForecastSeries>,
    pub timeline: MergedTimeline,
    pub growth: GrowthSummary,
}

pub fn resolve_node(ctx: &AnalysisContext, node: &NodeSelector) -> Result<i64, ResolveError> {
    match node {
        NodeSelector::Id(id) if ctx.tree.contains(*id) => Ok(*id),
        NodeSelector::Id(id) => Err(ResolveError::NodeNotFound(*id)),
        NodeSelector::NamePath(labels) => ctx
            .tree
            .find_by_name_path(labels.as_slice())
            .map(|n| n.id)
            .ok_or_else(|| ResolveError::NoMatchingNode(labels.join("/"))),
    }
}

/// Run the full pipeline, surfacing every resolution failure as a typed error.
pub fn try_analyze(
    ctx: &AnalysisContext,
    selection: &Selection,
    config: &AnalysisConfig,
) -> Result<Analysis, ResolveError> {
    let node_id = resolve_node(ctx, &selection.node)?;
    let resolver = ctx.resolver();
    let path_key = resolver.resolve(node_id)?;
    let entry = resolver.require_dataset(&path_key, &ctx.datasets)?;
    let historical = extract(entry, &selection.series)?;

    Ok(analyze_series(node_id, path_key, entry.id, historical, ctx, config))
}

/// Forecast, merge and summarize an already extracted series.
pub fn analyze_series(
    node_id: i64,
    path_key: PathKey,
    dataset_id: i64,
    historical: HistoricalSeries,
    ctx: &AnalysisContext,
    config: &AnalysisConfig,
) -> Analysis {
    let engine = ForecastEngine::from_config(config);
    let forecasts = engine.forecast(
        &historical,
        config.horizon,
        &config.methods,
        Some(&ctx.overrides),
    );
    let timeline = merge_active(&historical, &forecasts, &config.methods);
    let growth = summarize_growth(&timeline);

    Analysis {
        node_id,
        path_key,
        dataset_id,
        series_label: historical.label.clone(),
        historical,
        forecasts,
        timeline,
        growth,
    }
}

/// Like `try_analyze`, but "no data for this selection" is `Ok(None)`.
///
/// Only an inconsistent taxonomy (a cycle) is returned as an error.
pub fn analyze(
    ctx: &AnalysisContext,
    selection: &Selection,
    config: &AnalysisConfig,
) -> Result<Option<Analysis>, ResolveError> {
    match try_analyze(ctx, selection, config) {
        Ok(analysis) => Ok(Some(analysis)),
        Err(err) if err.is_recoverable() => {
            tracing::info!(%err, "no data for selection");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Evaluate many selections in parallel. Results keep the input order.
pub fn analyze_batch(
    ctx: &AnalysisContext,
    selections: &[Selection],
    config: &AnalysisConfig,
) -> Vec<Result<Option<Analysis>, ResolveError>> {
    selections
        .par_iter()
        .map(|selection| analyze(ctx, selection, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Growth, Period};
    use crate::timeline::is_disjoint;
    use serde_json::json;

    fn scenario() -> AnalysisContext {
        let serde_json::Value::Object(data) = json!({"Truck": {"2023": 100, "2024": 120}}) else {
            unreachable!()
        };
        AnalysisContext::new(Snapshots {
            taxonomy: vec![
                TaxonomyNode::new(1, None, "Root"),
                TaxonomyNode::new(2, Some(1), "CV"),
                TaxonomyNode::new(3, Some(2), "2025"),
            ],
            datasets: vec![DatasetEntry {
                id: 10,
                stream: "1,2,3".to_string(),
                data,
            }],
            overrides: ManualOverrides::default(),
        })
    }

    fn linear_only(horizon: usize) -> AnalysisConfig {
        AnalysisConfig {
            horizon,
            methods: [ForecastMethod::Linear].into_iter().collect(),
            ..AnalysisConfig::default()
        }
    }

    fn truck_at(node: NodeSelector) -> Selection {
        Selection {
            node,
            series: SeriesSelection::ByExplicitLabel("Truck".into()),
        }
    }

    #[test]
    fn end_to_end_scenario() {
        let ctx = scenario();
        let a = try_analyze(&ctx, &truck_at(NodeSelector::Id(3)), &linear_only(2)).unwrap();

        assert_eq!(a.path_key.to_string(), "1,2,3");
        assert_eq!(a.dataset_id, 10);
        let hist: Vec<(Period, Option<f64>)> =
            a.historical.points.iter().map(|p| (p.period, p.value)).collect();
        assert_eq!(
            hist,
            vec![(Period::year(2023), Some(100.0)), (Period::year(2024), Some(120.0))]
        );

        let anchor = a.timeline.row(&Period::year(2024)).unwrap();
        assert_eq!(anchor.forecast(ForecastMethod::Linear), Some(120.0));

        let f2025 = a.timeline.row(&Period::year(2025)).unwrap().forecast(ForecastMethod::Linear).unwrap();
        let f2026 = a.timeline.row(&Period::year(2026)).unwrap().forecast(ForecastMethod::Linear).unwrap();
        assert!(f2025 > 120.0 && f2026 > f2025);
        assert!(((f2026 - f2025) - (f2025 - 120.0)).abs() < 1e-9);

        assert!((a.growth.historical.percent().unwrap() - 20.0).abs() < 1e-9);
        assert!(is_disjoint(&a.timeline));
    }

    #[test]
    fn name_path_selection_matches_id_selection() {
        let ctx = scenario();
        let config = AnalysisConfig::default();
        let by_id = try_analyze(&ctx, &truck_at(NodeSelector::Id(3)), &config).unwrap();
        let by_name = try_analyze(&ctx, &truck_at(NodeSelector::from_name_path("root / cv / 2025")), &config).unwrap();
        assert_eq!(by_id, by_name);
    }

    #[test]
    fn missing_data_is_none_not_error() {
        let ctx = scenario();
        let config = AnalysisConfig::default();

        // Unknown node.
        assert_eq!(analyze(&ctx, &truck_at(NodeSelector::Id(99)), &config), Ok(None));
        // Node exists but has no dataset.
        assert_eq!(analyze(&ctx, &truck_at(NodeSelector::Id(2)), &config), Ok(None));
        // Dataset exists but not the series.
        let bus = Selection {
            node: NodeSelector::Id(3),
            series: SeriesSelection::ByExplicitLabel("Bus".into()),
        };
        assert_eq!(analyze(&ctx, &bus, &config), Ok(None));
        assert!(matches!(
            try_analyze(&ctx, &bus, &config),
            Err(ResolveError::NoSeries { entry: 10, .. })
        ));
    }

    #[test]
    fn cycle_is_fatal() {
        let ctx = AnalysisContext::new(Snapshots {
            taxonomy: vec![
                TaxonomyNode::new(1, Some(2), "A"),
                TaxonomyNode::new(2, Some(1), "B"),
            ],
            ..Snapshots::default()
        });
        let err = analyze(&ctx, &truck_at(NodeSelector::Id(1)), &AnalysisConfig::default()).unwrap_err();
        assert!(matches!(err, ResolveError::CycleDetected { .. }));
    }

    #[test]
    fn all_methods_with_manual_overrides() {
        let mut ctx = scenario();
        ctx.overrides.values.insert(Period::year(2026), 200.0);
        let a = try_analyze(&ctx, &truck_at(NodeSelector::Id(3)), &AnalysisConfig { horizon: 2, ..AnalysisConfig::default() }).unwrap();

        assert_eq!(a.timeline.methods.len(), 4);
        let y2025 = a.timeline.row(&Period::year(2025)).unwrap();
        assert_eq!(y2025.forecast(ForecastMethod::Manual), None);
        assert!((y2025.forecast(ForecastMethod::Score).unwrap() - 90.0).abs() < 1e-9);
        assert!((y2025.forecast(ForecastMethod::Ai).unwrap() - 115.0).abs() < 1e-9);
        let y2026 = a.timeline.row(&Period::year(2026)).unwrap();
        assert_eq!(y2026.forecast(ForecastMethod::Manual), Some(200.0));

        // 120 -> 200 over two periods.
        let manual = a.growth.get("manual").unwrap().percent().unwrap();
        assert!((manual - ((200.0f64 / 120.0).sqrt() - 1.0) * 100.0).abs() < 1e-9);
        // 120 -> 90: a decline, still defined.
        assert!(a.growth.get("score").unwrap().percent().unwrap() < 0.0);
        assert!(is_disjoint(&a.timeline));
    }

    #[test]
    fn batch_matches_sequential_and_is_repeatable() {
        let ctx = scenario();
        let config = AnalysisConfig::default();
        let selections = vec![
            truck_at(NodeSelector::Id(3)),
            truck_at(NodeSelector::Id(99)),
            truck_at(NodeSelector::Id(3)),
        ];
        let batch = analyze_batch(&ctx, &selections, &config);
        assert_eq!(batch.len(), 3);
        assert!(batch[1].as_ref().unwrap().is_none());
        assert_eq!(batch[0], batch[2]);
        assert_eq!(batch[0], analyze(&ctx, &selections[0], &config));
    }

    #[test]
    fn out_of_range_period_label_is_skipped() {
        let serde_json::Value::Object(data) = json!({"Truck": {"2023": 100, "2147483647-12": 120}}) else {
            unreachable!()
        };
        let ctx = AnalysisContext::new(Snapshots {
            taxonomy: vec![TaxonomyNode::new(1, None, "Root")],
            datasets: vec![DatasetEntry { id: 1, stream: "1".into(), data }],
            overrides: ManualOverrides::default(),
        });
        let a = analyze(&ctx, &truck_at(NodeSelector::Id(1)), &AnalysisConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(a.historical.len(), 1);
        assert_eq!(a.timeline.boundary(), Some(Period::year(2023)));
        assert_eq!(a.timeline.rows.len(), 1 + 5);
    }

    #[test]
    fn empty_series_yields_empty_timeline_and_undefined_growth() {
        let serde_json::Value::Object(data) = json!({"Truck": {}}) else { unreachable!() };
        let ctx = AnalysisContext::new(Snapshots {
            taxonomy: vec![TaxonomyNode::new(1, None, "Root")],
            datasets: vec![DatasetEntry { id: 1, stream: "1".into(), data }],
            overrides: ManualOverrides::default(),
        });
        let a = try_analyze(&ctx, &truck_at(NodeSelector::Id(1)), &AnalysisConfig::default()).unwrap();
        assert!(a.timeline.is_empty());
        assert!(a.forecasts.is_empty());
        assert_eq!(a.growth.historical, Growth::Undefined);
    }
}
