//! Forecast method implementations.
//!
//! Each method is a small, pure function over the historical values (present
//! values only, time-ordered) so the engine can stay generic. None of them fail:
//! short or empty history degrades to a flat, zero or null forecast.

use crate::domain::{ManualOverrides, Period, SmoothingMode};
use crate::math::fit_index_trend;

/// Least-squares trend over indices `0..N-1`, extrapolated to `N..N+horizon-1`.
///
/// With fewer than two points the slope is 0: a flat continuation of the single
/// value, or 0 with no history at all.
pub fn linear(values: &[f64], horizon: usize) -> Vec<f64> {
    let n = values.len();
    let (intercept, slope) = match fit_index_trend(values) {
        Some(fit) => fit,
        None if n >= 2 => {
            tracing::debug!(n, "trend fit failed; continuing flat");
            (values[n - 1], 0.0)
        }
        None => (values.first().copied().unwrap_or(0.0), 0.0),
    };

    (0..horizon)
        .map(|f| intercept + slope * (n + f) as f64)
        .collect()
}

/// Weighted level of the most recent values, repeated for every future period.
///
/// `weights[0]` applies to the latest value. With fewer values than weights the
/// missing (oldest) terms contribute nothing; the weights are not renormalized.
pub fn score(values: &[f64], weights: &[f64], horizon: usize) -> Vec<f64> {
    let level: f64 = values
        .iter()
        .rev()
        .zip(weights)
        .map(|(v, w)| v * w)
        .sum();
    vec![level; horizon]
}

/// Smoothed level after running `f = alpha * actual + (1 - alpha) * f` over the
/// history, seeded at the first value.
pub fn smoothed_level(values: &[f64], alpha: f64) -> Option<f64> {
    let (&first, _) = values.split_first()?;
    Some(
        values
            .iter()
            .fold(first, |f, &actual| alpha * actual + (1.0 - alpha) * f),
    )
}

/// Exponential smoothing projection.
///
/// - `ConstantSmoothing`: every future period recomputes from the same last
///   actual and smoothed level, so the forecast is flat.
/// - `RecursiveSmoothing`: each forecast becomes the "actual" of the next step,
///   and the previous forecast becomes the level.
pub fn smoothing(values: &[f64], alpha: f64, mode: SmoothingMode, horizon: usize) -> Vec<f64> {
    let (Some(level), Some(&last)) = (smoothed_level(values, alpha), values.last()) else {
        return vec![0.0; horizon];
    };

    let step = |actual: f64, level: f64| alpha * actual + (1.0 - alpha) * level;

    match mode {
        SmoothingMode::ConstantSmoothing => vec![step(last, level); horizon],
        SmoothingMode::RecursiveSmoothing => {
            let mut out = Vec::with_capacity(horizon);
            let mut prev = level;
            let mut cur = step(last, level);
            for _ in 0..horizon {
                out.push(cur);
                let next = step(cur, prev);
                prev = cur;
                cur = next;
            }
            out
        }
    }
}

/// Look up each future period in the override table. Absent periods are null.
pub fn manual(overrides: Option<&ManualOverrides>, periods: &[Period]) -> Vec<Option<f64>> {
    periods
        .iter()
        .map(|p| overrides.and_then(|o| o.get(p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn linear_extends_the_fitted_trend() {
        assert!(close(&linear(&[100.0, 120.0], 2), &[140.0, 160.0]));
        assert!(close(&linear(&[1.0, 2.0, 3.0, 4.0], 1), &[5.0]));
    }

    #[test]
    fn linear_single_point_is_flat() {
        assert!(close(&linear(&[42.0], 4), &[42.0, 42.0, 42.0, 42.0]));
        assert!(close(&linear(&[], 2), &[0.0, 0.0]));
        assert!(linear(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn score_weights_most_recent_highest() {
        let w = [0.5, 0.3, 0.2];
        // 0.5*30 + 0.3*20 + 0.2*10
        assert!(close(&score(&[5.0, 10.0, 20.0, 30.0], &w, 2), &[23.0, 23.0]));
        // zero-padded from the oldest end
        assert!(close(&score(&[20.0, 30.0], &w, 1), &[21.0]));
        assert!(close(&score(&[30.0], &w, 1), &[15.0]));
        assert!(close(&score(&[], &w, 2), &[0.0, 0.0]));
    }

    #[test]
    fn constant_smoothing_is_flat() {
        // level: 100 -> 110; forecast: 0.5*120 + 0.5*110
        let out = smoothing(&[100.0, 120.0], 0.5, SmoothingMode::ConstantSmoothing, 3);
        assert!(close(&out, &[115.0, 115.0, 115.0]));
    }

    #[test]
    fn recursive_smoothing_feeds_forecasts_back() {
        let out = smoothing(&[100.0, 120.0], 0.5, SmoothingMode::RecursiveSmoothing, 3);
        assert!(close(&out, &[115.0, 112.5, 113.75]));
        assert!((out[0] - smoothing(&[100.0, 120.0], 0.5, SmoothingMode::ConstantSmoothing, 1)[0]).abs() < 1e-12);
    }

    #[test]
    fn smoothing_without_history_is_zero() {
        assert!(close(&smoothing(&[], 0.5, SmoothingMode::ConstantSmoothing, 2), &[0.0, 0.0]));
        assert_eq!(smoothed_level(&[], 0.5), None);
        assert_eq!(smoothed_level(&[7.0], 0.5), Some(7.0));
    }

    #[test]
    fn manual_absent_periods_are_null() {
        let mut overrides = ManualOverrides::default();
        overrides.values.insert(Period::year(2025), 150.0);
        let periods = [Period::year(2025), Period::year(2026)];
        assert_eq!(manual(Some(&overrides), &periods), vec![Some(150.0), None]);
        assert_eq!(manual(None, &periods), vec![None, None]);
    }
}
