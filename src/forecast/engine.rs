//! Forecast orchestration.
//!
//! Given a historical series, the engine:
//! - derives the future periods from the last historical period
//! - runs each requested method over the present historical values
//! - anchors every forecast at the last historical row for chart continuity

use std::collections::BTreeMap;

use crate::domain::{
    AnalysisConfig, ForecastMethod, ForecastSeries, HistoricalSeries, MAX_HORIZON, ManualOverrides,
    MethodSet, Period, SeriesPoint, SmoothingMode,
};
use crate::forecast::methods;

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEngine {
    pub alpha: f64,
    pub score_weights: [f64; 3],
    pub smoothing: SmoothingMode,
}

impl Default for ForecastEngine {
    fn default() -> Self {
        Self::from_config(&AnalysisConfig::default())
    }
}

impl ForecastEngine {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            alpha: config.alpha,
            score_weights: config.score_weights,
            smoothing: config.smoothing,
        }
    }

    /// Run every requested method. Empty history yields no forecasts: there is
    /// no boundary period to anchor them to.
    pub fn forecast(
        &self,
        history: &HistoricalSeries,
        horizon: usize,
        methods: &MethodSet,
        overrides: Option<&ManualOverrides>,
    ) -> BTreeMap<ForecastMethod, ForecastSeries> {
        methods
            .iter()
            .filter_map(|&m| {
                self.forecast_one(m, history, horizon, overrides)
                    .map(|s| (m, s))
            })
            .collect()
    }

    pub fn forecast_one(
        &self,
        method: ForecastMethod,
        history: &HistoricalSeries,
        horizon: usize,
        overrides: Option<&ManualOverrides>,
    ) -> Option<ForecastSeries> {
        let anchor = *history.last()?;
        if horizon > MAX_HORIZON {
            tracing::warn!(horizon, max = MAX_HORIZON, "forecast horizon clamped");
        }
        let periods = anchor.period.successors(horizon.min(MAX_HORIZON));
        let horizon = periods.len();
        let values = history.values();

        let projected: Vec<Option<f64>> = match method {
            ForecastMethod::Linear => lift(methods::linear(&values, horizon)),
            ForecastMethod::Score => lift(methods::score(&values, &self.score_weights, horizon)),
            ForecastMethod::Ai => {
                lift(methods::smoothing(&values, self.alpha, self.smoothing, horizon))
            }
            ForecastMethod::Manual => methods::manual(overrides, &periods),
        };

        Some(ForecastSeries {
            method,
            anchor,
            points: zip_points(&periods, projected),
        })
    }
}

fn lift(values: Vec<f64>) -> Vec<Option<f64>> {
    values.into_iter().map(Some).collect()
}

fn zip_points(periods: &[Period], values: Vec<Option<f64>>) -> Vec<SeriesPoint> {
    periods
        .iter()
        .zip(values)
        .map(|(&period, value)| SeriesPoint::new(period, value))
        .collect()
}
