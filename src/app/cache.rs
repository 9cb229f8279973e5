//! Caller-owned memoization of analyses.
//!
//! The pipeline is referentially transparent, so results can be reused as long
//! as the inputs that feed them are unchanged. The key combines the selection
//! parameters with a content hash of the resolved dataset entry (and the
//! override table when the manual method is active), so a refreshed snapshot
//! misses instead of serving stale output.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::app::pipeline::{AnalysisContext, Analysis, Selection, analyze, analyze_series, resolve_node};
use crate::domain::{AnalysisConfig, DatasetEntry, ForecastMethod, ManualOverrides, SeriesSelection, SmoothingMode};
use crate::error::ResolveError;
use crate::series::extract;
use crate::taxonomy::PathKey;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    path_key: PathKey,
    series: SeriesSelection,
    methods: Vec<ForecastMethod>,
    horizon: usize,
    smoothing: SmoothingMode,
    /// `alpha` and score weights as raw bits.
    params: [u64; 4],
    content: u64,
}

#[derive(Debug, Default)]
pub struct AnalysisCache {
    entries: HashMap<CacheKey, Analysis>,
    hits: u64,
    misses: u64,
}

impl AnalysisCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Same contract as `pipeline::analyze`, served from the cache when possible.
    ///
    /// "No data" outcomes are not cached: they are cheap to recompute and the
    /// missing dataset may appear in the next snapshot.
    pub fn analyze(
        &mut self,
        ctx: &AnalysisContext,
        selection: &Selection,
        config: &AnalysisConfig,
    ) -> Result<Option<Analysis>, ResolveError> {
        let resolved = resolve_node(ctx, &selection.node).and_then(|node_id| {
            let resolver = ctx.resolver();
            let path_key = resolver.resolve(node_id)?;
            let entry = resolver.require_dataset(&path_key, ctx.datasets())?;
            Ok((node_id, path_key, entry))
        });
        let (node_id, path_key, entry) = match resolved {
            Ok(r) => r,
            // Let the pipeline decide between "no data" and a fatal error.
            Err(_) => return analyze(ctx, selection, config),
        };

        let key = CacheKey {
            content: content_hash(entry, ctx.overrides(), config),
            path_key: path_key.clone(),
            series: selection.series.clone(),
            methods: config.methods.iter().copied().collect(),
            horizon: config.horizon,
            smoothing: config.smoothing,
            params: [
                config.alpha.to_bits(),
                config.score_weights[0].to_bits(),
                config.score_weights[1].to_bits(),
                config.score_weights[2].to_bits(),
            ],
        };

        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            return Ok(Some(hit.clone()));
        }
        self.misses += 1;

        let historical = match extract(entry, &selection.series) {
            Ok(h) => h,
            Err(err) => {
                tracing::info!(%err, "no data for selection");
                return Ok(None);
            }
        };
        let analysis = analyze_series(node_id, path_key, entry.id, historical, ctx, config);
        self.entries.insert(key, analysis.clone());
        Ok(Some(analysis))
    }
}

fn content_hash(entry: &DatasetEntry, overrides: &ManualOverrides, config: &AnalysisConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    entry.id.hash(&mut hasher);
    entry.stream.hash(&mut hasher);
    serde_json::to_string(&entry.data)
        .unwrap_or_default()
        .hash(&mut hasher);

    if config.methods.contains(&ForecastMethod::Manual) {
        for (period, value) in &overrides.values {
            period.hash(&mut hasher);
            value.to_bits().hash(&mut hasher);
        }
    }
    hasher.finish()
}
