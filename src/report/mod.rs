//! Reporting utilities: growth summaries and formatted terminal output.

pub mod format;

pub use format::*;

use std::collections::BTreeMap;

use crate::domain::{ForecastMethod, Growth, GrowthSummary, MergedTimeline};
use crate::math::cagr;

/// Compound growth over the historical span and each forecast segment.
///
/// - historical: first to last non-null historical value
/// - forecast: anchor value to the method's last non-null forecast
///
/// `periods` is the row distance between the two points.
pub fn summarize_growth(timeline: &MergedTimeline) -> GrowthSummary {
    let historical = {
        let present: Vec<(usize, f64)> = timeline
            .rows
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.historical.map(|v| (i, v)))
            .collect();
        match (present.first(), present.last()) {
            (Some(&(i0, first)), Some(&(i1, last))) => cagr(Some(first), Some(last), i1 - i0),
            _ => cagr(None, None, 0),
        }
    };

    let forecasts: BTreeMap<ForecastMethod, _> = timeline
        .methods
        .iter()
        .map(|&m| (m, forecast_growth(timeline, m)))
        .collect();

    GrowthSummary {
        historical,
        forecasts,
    }
}

fn forecast_growth(timeline: &MergedTimeline, method: ForecastMethod) -> Growth {
    let Some(anchor) = timeline.anchor_index else {
        return cagr(None, None, 0);
    };
    let first = timeline.rows[anchor].forecast(method);
    let last = timeline
        .rows
        .iter()
        .enumerate()
        .skip(anchor + 1)
        .rev()
        .find_map(|(i, r)| r.forecast(method).map(|v| (i, v)));

    match last {
        Some((i, v)) => cagr(first, Some(v), i - anchor),
        None => cagr(first, None, 0),
    }
}
