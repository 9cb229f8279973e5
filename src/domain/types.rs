//! Shared domain types.
//!
//! These are plain data: snapshots handed in by the caller, and the series,
//! timelines and growth summaries handed back. Everything is serializable so the
//! same values can be exported to JSON/CSV or cached.

use std::collections::{BTreeMap, BTreeSet};

use clap::ValueEnum;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::period::Period;

/// One record of the self-referencing category tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyNode {
    pub id: i64,
    #[serde(default)]
    pub parent_id: Option<i64>,
    pub name: String,
}

impl TaxonomyNode {
    pub fn new(id: i64, parent_id: Option<i64>, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id,
            name: name.into(),
        }
    }
}

/// A pre-flattened dataset addressed by its taxonomy path (`stream`).
///
/// `data` is either `label -> period -> value` or, for company/market-share
/// payloads, wrapped one level deeper. Values may be numbers, numeric strings
/// (with thousands separators) or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetEntry {
    pub id: i64,
    pub stream: String,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// A single `(period, value)` observation. `None` means explicitly missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub period: Period,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(period: Period, value: Option<f64>) -> Self {
        Self { period, value }
    }
}

/// Period-ascending observations with no duplicate periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub label: Option<String>,
    pub points: Vec<SeriesPoint>,
}

impl HistoricalSeries {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// The boundary between history and forecast.
    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    /// Present values in time order (missing observations skipped).
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().filter_map(|p| p.value).collect()
    }
}

/// The forward-looking strategies a graph can enable.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ForecastMethod {
    /// Least-squares trend over the history.
    Linear,
    /// Recency-weighted flat level.
    Score,
    /// Exponential smoothing.
    Ai,
    /// Caller-curated override table ("race").
    Manual,
}

impl ForecastMethod {
    pub const ALL: [ForecastMethod; 4] = [
        ForecastMethod::Linear,
        ForecastMethod::Score,
        ForecastMethod::Ai,
        ForecastMethod::Manual,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ForecastMethod::Linear => "linear",
            ForecastMethod::Score => "score",
            ForecastMethod::Ai => "ai",
            ForecastMethod::Manual => "manual",
        }
    }

    /// Column name in a merged timeline row.
    pub fn field_name(self) -> &'static str {
        match self {
            ForecastMethod::Linear => "forecast_linear",
            ForecastMethod::Score => "forecast_score",
            ForecastMethod::Ai => "forecast_ai",
            ForecastMethod::Manual => "forecast_manual",
        }
    }
}

pub type MethodSet = BTreeSet<ForecastMethod>;

/// Which first-level payload label to read when extracting a series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[allow(clippy::enum_variant_names)]
pub enum SeriesSelection {
    /// Take whatever label comes first in the payload. Downstream chart
    /// selection relies on this when no label is configured.
    #[default]
    FirstInsertionOrder,
    /// Case-insensitive, whitespace-trimmed label match.
    ByExplicitLabel(String),
}

impl SeriesSelection {
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(l) if !l.trim().is_empty() => SeriesSelection::ByExplicitLabel(l.to_string()),
            _ => SeriesSelection::FirstInsertionOrder,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            SeriesSelection::FirstInsertionOrder => None,
            SeriesSelection::ByExplicitLabel(l) => Some(l),
        }
    }
}

/// How the "ai" method projects past the last actual.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[allow(clippy::enum_variant_names)]
pub enum SmoothingMode {
    /// Every future period recomputes from the same last actual, so the
    /// forecast is flat. This is the established dashboard behavior.
    #[default]
    #[value(name = "constant")]
    #[serde(rename = "constant")]
    ConstantSmoothing,
    /// Each forecast is fed back into the recurrence.
    #[value(name = "recursive")]
    #[serde(rename = "recursive")]
    RecursiveSmoothing,
}

/// Caller-supplied forecast values keyed by period. Absent periods are null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManualOverrides {
    pub values: BTreeMap<Period, f64>,
}

impl ManualOverrides {
    pub fn get(&self, period: &Period) -> Option<f64> {
        self.values.get(period).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One forecast method's output: the shared anchor plus future periods only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub method: ForecastMethod,
    /// Last historical period, carrying the last historical value.
    pub anchor: SeriesPoint,
    pub points: Vec<SeriesPoint>,
}

impl ForecastSeries {
    pub fn value_at(&self, period: &Period) -> Option<f64> {
        self.points
            .iter()
            .find(|p| p.period == *period)
            .and_then(|p| p.value)
    }
}

/// One chart row.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub period: Period,
    pub historical: Option<f64>,
    /// One entry per active method.
    pub forecasts: BTreeMap<ForecastMethod, Option<f64>>,
}

impl MergedRow {
    pub fn forecast(&self, method: ForecastMethod) -> Option<f64> {
        self.forecasts.get(&method).copied().flatten()
    }
}

impl Serialize for MergedRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2 + self.forecasts.len()))?;
        map.serialize_entry("period", &self.period)?;
        map.serialize_entry("historical", &self.historical)?;
        for (method, value) in &self.forecasts {
            map.serialize_entry(method.field_name(), value)?;
        }
        map.end()
    }
}

/// Historical and forecast values on one ordered, chart-ready timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MergedTimeline {
    pub methods: Vec<ForecastMethod>,
    pub rows: Vec<MergedRow>,
    /// Index of the anchor row (last historical period), if any.
    pub anchor_index: Option<usize>,
}

impl MergedTimeline {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn boundary(&self) -> Option<Period> {
        self.anchor_index
            .and_then(|i| self.rows.get(i))
            .map(|r| r.period)
    }

    pub fn row(&self, period: &Period) -> Option<&MergedRow> {
        self.rows.iter().find(|r| r.period == *period)
    }
}

/// A growth rate in percent, or "not computable".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Growth {
    Percent(f64),
    Undefined,
}

impl Growth {
    pub fn percent(self) -> Option<f64> {
        match self {
            Growth::Percent(p) => Some(p),
            Growth::Undefined => None,
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Growth::Undefined)
    }
}

impl Serialize for Growth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Growth::Percent(p) => serializer.serialize_f64(*p),
            Growth::Undefined => serializer.serialize_str("undefined"),
        }
    }
}

/// CAGR per segment: the historical span and each active forecast method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub historical: Growth,
    #[serde(flatten)]
    pub forecasts: BTreeMap<ForecastMethod, Growth>,
}

impl GrowthSummary {
    /// Look up by method name (`historical`, `linear`, `score`, `ai`, `manual`).
    pub fn get(&self, name: &str) -> Option<Growth> {
        if name.eq_ignore_ascii_case("historical") {
            return Some(self.historical);
        }
        self.forecasts
            .iter()
            .find(|(m, _)| m.name().eq_ignore_ascii_case(name))
            .map(|(_, g)| *g)
    }
}

/// Upper bound on forecast periods per method.
pub const MAX_HORIZON: usize = 1200;

/// Scalar knobs for one analysis run.
///
/// Derived from CLI flags (plus defaults) by the binary; library callers build
/// it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Number of future periods to forecast.
    pub horizon: usize,
    pub methods: MethodSet,
    pub smoothing: SmoothingMode,
    /// Exponential smoothing factor.
    pub alpha: f64,
    /// Recency weights, most recent first.
    pub score_weights: [f64; 3],
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            horizon: 5,
            methods: ForecastMethod::ALL.into_iter().collect(),
            smoothing: SmoothingMode::default(),
            alpha: 0.5,
            score_weights: [0.5, 0.3, 0.2],
        }
    }
}
