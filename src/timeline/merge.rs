//! Merge historical and forecast series into one chart-ready timeline.
//!
//! Row layout:
//! - one row per historical period, forecast columns null
//! - the last historical row (the anchor) repeats the historical value in every
//!   active forecast column, so chart lines connect
//! - one row per future period, historical null

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{
    ForecastMethod, ForecastSeries, HistoricalSeries, MergedRow, MergedTimeline, MethodSet, Period,
};

/// Merge with the active methods taken from `forecasts`.
pub fn merge(
    historical: &HistoricalSeries,
    forecasts: &BTreeMap<ForecastMethod, ForecastSeries>,
) -> MergedTimeline {
    let active: MethodSet = forecasts.keys().copied().collect();
    merge_active(historical, forecasts, &active)
}

/// Merge with an explicit active set. Active methods without a series get null
/// columns; series for inactive methods are ignored.
pub fn merge_active(
    historical: &HistoricalSeries,
    forecasts: &BTreeMap<ForecastMethod, ForecastSeries>,
    active: &MethodSet,
) -> MergedTimeline {
    let methods: Vec<ForecastMethod> = active.iter().copied().collect();
    let Some(boundary) = historical.last().map(|p| p.period) else {
        return MergedTimeline {
            methods,
            rows: Vec::new(),
            anchor_index: None,
        };
    };

    let empty_columns = || -> BTreeMap<ForecastMethod, Option<f64>> {
        methods.iter().map(|&m| (m, None)).collect()
    };

    let mut rows: Vec<MergedRow> = historical
        .points
        .iter()
        .map(|p| MergedRow {
            period: p.period,
            historical: p.value,
            forecasts: empty_columns(),
        })
        .collect();

    let anchor_index = rows.len() - 1;
    let anchor = &mut rows[anchor_index];
    let anchor_value = anchor.historical;
    for value in anchor.forecasts.values_mut() {
        *value = anchor_value;
    }

    let future: BTreeSet<Period> = forecasts
        .iter()
        .filter(|(m, _)| active.contains(*m))
        .flat_map(|(m, s)| {
            s.points.iter().filter_map(move |p| {
                if p.period > boundary {
                    Some(p.period)
                } else {
                    tracing::debug!(method = m.name(), period = %p.period, "forecast point not after boundary; ignored");
                    None
                }
            })
        })
        .collect();

    for period in future {
        let columns = methods
            .iter()
            .map(|&m| (m, forecasts.get(&m).and_then(|s| s.value_at(&period))))
            .collect();
        rows.push(MergedRow {
            period,
            historical: None,
            forecasts: columns,
        });
    }

    MergedTimeline {
        methods,
        rows,
        anchor_index: Some(anchor_index),
    }
}

/// For every row, `historical` and the forecast columns are never both
/// non-null, except on the anchor row where every forecast column equals
/// `historical`.
pub fn is_disjoint(timeline: &MergedTimeline) -> bool {
    timeline.rows.iter().enumerate().all(|(i, row)| {
        if Some(i) == timeline.anchor_index {
            row.forecasts.values().all(|v| *v == row.historical)
        } else if row.historical.is_some() {
            row.forecasts.values().all(Option::is_none)
        } else {
            true
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SeriesPoint;

    fn history(points: &[(i32, Option<f64>)]) -> HistoricalSeries {
        HistoricalSeries {
            label: None,
            points: points
                .iter()
                .map(|&(y, v)| SeriesPoint::new(Period::year(y), v))
                .collect(),
        }
    }

    fn series(method: ForecastMethod, anchor: (i32, f64), points: &[(i32, Option<f64>)]) -> ForecastSeries {
        ForecastSeries {
            method,
            anchor: SeriesPoint::new(Period::year(anchor.0), Some(anchor.1)),
            points: points
                .iter()
                .map(|&(y, v)| SeriesPoint::new(Period::year(y), v))
                .collect(),
        }
    }

    #[test]
    fn anchor_row_connects_history_and_forecasts() {
        let h = history(&[(2023, Some(100.0)), (2024, Some(120.0))]);
        let mut f = BTreeMap::new();
        f.insert(ForecastMethod::Linear, series(ForecastMethod::Linear, (2024, 120.0), &[(2025, Some(140.0)), (2026, Some(160.0))]));
        f.insert(ForecastMethod::Manual, series(ForecastMethod::Manual, (2024, 120.0), &[(2025, None), (2026, Some(150.0))]));

        let t = merge(&h, &f);
        assert_eq!(t.rows.len(), 4);
        assert_eq!(t.boundary(), Some(Period::year(2024)));
        assert_eq!(t.methods, vec![ForecastMethod::Linear, ForecastMethod::Manual]);

        let first = &t.rows[0];
        assert_eq!(first.historical, Some(100.0));
        assert_eq!(first.forecast(ForecastMethod::Linear), None);

        let anchor = t.row(&Period::year(2024)).unwrap();
        assert_eq!(anchor.forecast(ForecastMethod::Linear), Some(120.0));
        assert_eq!(anchor.forecast(ForecastMethod::Manual), Some(120.0));

        let y2025 = t.row(&Period::year(2025)).unwrap();
        assert_eq!(y2025.historical, None);
        assert_eq!(y2025.forecast(ForecastMethod::Linear), Some(140.0));
        assert_eq!(y2025.forecast(ForecastMethod::Manual), None);

        assert!(is_disjoint(&t));
    }

    #[test]
    fn active_method_without_series_is_null_column() {
        let h = history(&[(2024, Some(5.0))]);
        let mut f = BTreeMap::new();
        f.insert(ForecastMethod::Linear, series(ForecastMethod::Linear, (2024, 5.0), &[(2025, Some(5.0))]));
        let active: MethodSet = [ForecastMethod::Linear, ForecastMethod::Ai].into_iter().collect();

        let t = merge_active(&h, &f, &active);
        let future = &t.rows[1];
        assert_eq!(future.forecasts.len(), 2);
        assert_eq!(future.forecast(ForecastMethod::Ai), None);
        // The anchor still carries every active column.
        assert_eq!(t.rows[0].forecast(ForecastMethod::Ai), Some(5.0));
        assert!(is_disjoint(&t));
    }

    #[test]
    fn points_at_or_before_boundary_are_ignored() {
        let h = history(&[(2023, Some(1.0)), (2024, Some(2.0))]);
        let mut f = BTreeMap::new();
        f.insert(ForecastMethod::Score, series(ForecastMethod::Score, (2024, 2.0), &[(2023, Some(9.0)), (2025, Some(3.0))]));
        let t = merge(&h, &f);
        assert_eq!(t.rows.len(), 3);
        assert_eq!(t.rows[0].forecast(ForecastMethod::Score), None);
        assert!(is_disjoint(&t));
    }

    #[test]
    fn null_boundary_value_keeps_anchor_null() {
        let h = history(&[(2023, Some(1.0)), (2024, None)]);
        let mut f = BTreeMap::new();
        f.insert(ForecastMethod::Linear, series(ForecastMethod::Linear, (2024, 1.0), &[(2025, Some(1.0))]));
        let t = merge(&h, &f);
        assert_eq!(t.rows[1].forecast(ForecastMethod::Linear), None);
        assert!(is_disjoint(&t));
    }

    #[test]
    fn empty_history_is_empty_timeline() {
        let t = merge(&HistoricalSeries::default(), &BTreeMap::new());
        assert!(t.is_empty());
        assert_eq!(t.boundary(), None);
    }

    #[test]
    fn detects_overlap() {
        let h = history(&[(2023, Some(1.0)), (2024, Some(2.0))]);
        let mut f = BTreeMap::new();
        f.insert(ForecastMethod::Linear, series(ForecastMethod::Linear, (2024, 2.0), &[(2025, Some(3.0))]));
        let mut t = merge(&h, &f);
        t.rows[0].forecasts.insert(ForecastMethod::Linear, Some(1.0));
        assert!(!is_disjoint(&t));
    }
}
