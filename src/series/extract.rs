//! Series extraction from dataset payloads.
//!
//! This module turns a heterogeneous `DatasetEntry.data` payload into a clean,
//! period-ascending `HistoricalSeries`.
//!
//! Behavior worth knowing about:
//! - Two payload shapes are accepted: `label -> period -> value`, and the
//!   company/market-share shape wrapped one level deeper. The shape is decided
//!   per top-level label, and everything is normalized to the first shape
//!   before a label is chosen.
//! - With `SeriesSelection::FirstInsertionOrder` the first label in payload
//!   order wins.
//! - Numeric coercion never fails: strings are stripped to digits and `.`, and
//!   anything unparsable becomes `0`. JSON `null` stays missing.

use serde_json::{Map, Value};

use crate::domain::{DatasetEntry, HistoricalSeries, Period, SeriesPoint, SeriesSelection};
use crate::error::ResolveError;
use crate::taxonomy::labels_match;

/// Coerce a raw payload value to a number.
///
/// `"1,234.5"` -> `1234.5`, `"n/a"` -> `0.0`, `null` -> `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => None,
        Value::Number(n) => Some(n.as_f64().unwrap_or(0.0)),
        Value::String(s) => Some(parse_lenient(s)),
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => Some(0.0),
    }
}

fn parse_lenient(s: &str) -> f64 {
    let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// A label is wrapped when it maps to an object of objects.
fn is_wrapped(periods: &Map<String, Value>) -> bool {
    periods.values().any(Value::is_object)
}

/// Normalize both payload shapes to `label -> period mapping`, keeping payload
/// order. The shape is decided per label: wrapped labels have their inner
/// labels lifted in place, flat labels pass through. The first occurrence of a
/// label wins.
pub fn normalize_payload(data: &Map<String, Value>) -> Vec<(&str, &Map<String, Value>)> {
    let mut out: Vec<(&str, &Map<String, Value>)> = Vec::new();

    for (label, value) in data {
        let Value::Object(inner) = value else {
            tracing::debug!(label = %label, "payload label is not an object; ignored");
            continue;
        };
        if !is_wrapped(inner) {
            push_series(&mut out, label, inner);
            continue;
        }
        for (inner_label, inner_value) in inner {
            match inner_value {
                Value::Object(periods) => push_series(&mut out, inner_label, periods),
                _ => tracing::debug!(outer = %label, label = %inner_label, "scalar beside wrapped series; ignored"),
            }
        }
    }
    out
}

fn push_series<'a>(
    out: &mut Vec<(&'a str, &'a Map<String, Value>)>,
    label: &'a str,
    periods: &'a Map<String, Value>,
) {
    if out.iter().any(|(seen, _)| labels_match(seen, label)) {
        tracing::debug!(label = %label, "duplicate series label; keeping first");
    } else {
        out.push((label, periods));
    }
}

/// Labels available in an entry, in selection order.
pub fn series_labels(entry: &DatasetEntry) -> Vec<String> {
    normalize_payload(&entry.data)
        .into_iter()
        .map(|(label, _)| label.to_string())
        .collect()
}

/// Extract one series from a dataset entry.
///
/// Returns `ResolveError::NoSeries` when the payload has no matching label;
/// callers render that as "no data".
pub fn extract(
    entry: &DatasetEntry,
    selection: &SeriesSelection,
) -> Result<HistoricalSeries, ResolveError> {
    let series = normalize_payload(&entry.data);

    let chosen = match selection {
        SeriesSelection::FirstInsertionOrder => series.first(),
        SeriesSelection::ByExplicitLabel(wanted) => {
            series.iter().find(|(label, _)| labels_match(label, wanted))
        }
    };

    let Some((label, periods)) = chosen else {
        return Err(ResolveError::NoSeries {
            entry: entry.id,
            label: selection.label().map(str::to_string),
        });
    };

    Ok(HistoricalSeries {
        label: Some((*label).to_string()),
        points: collect_points(periods),
    })
}

/// Parse period keys, coerce values, sort by calendar period, drop duplicates.
fn collect_points(periods: &Map<String, Value>) -> Vec<SeriesPoint> {
    let mut points: Vec<SeriesPoint> = Vec::with_capacity(periods.len());

    for (raw_period, raw_value) in periods {
        let period: Period = match raw_period.parse() {
            Ok(p) => p,
            Err(err) => {
                tracing::debug!(%err, "skipping unparsable period label");
                continue;
            }
        };
        if points.iter().any(|p| p.period == period) {
            tracing::debug!(period = %period, label = %raw_period, "duplicate period; keeping first");
            continue;
        }
        points.push(SeriesPoint::new(period, coerce_number(raw_value)));
    }

    // Stable sort keeps payload order for equal keys (there are none after dedup).
    points.sort_by_key(|p| p.period);
    points
}
