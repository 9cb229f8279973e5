//! Synthetic market snapshot generation for `mf demo`.
//!
//! Produces a small taxonomy (root -> segments -> regions), one dataset per
//! region with yearly volumes on a compound growth trend, and a manual override
//! table for the years after the history.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde_json::{Map, Value};

use crate::app::pipeline::Snapshots;
use crate::domain::{DatasetEntry, ManualOverrides, Period, TaxonomyNode};
use crate::error::AppError;

const SEGMENTS: [(&str, &[&str]); 2] = [
    ("CV", &["Truck", "Bus"]),
    ("PV", &["Sedan", "SUV"]),
];

const REGIONS: [&str; 3] = ["India", "China", "Europe"];

const FIRST_YEAR: i32 = 1000;
const LAST_YEAR: i32 = 9999;

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub seed: u64,
    pub start_year: i32,
    pub years: usize,
    /// Std dev of the log-noise applied to each yearly value.
    pub noise: f64,
    /// Number of override years after the last historical year.
    pub override_years: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            start_year: 2015,
            years: 10,
            noise: 0.05,
            override_years: 3,
        }
    }
}

pub fn generate_demo(config: &DemoConfig) -> Result<Snapshots, AppError> {
    if config.years == 0 {
        return Err(AppError::new(2, "Demo history must span at least one year."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(2, "Demo noise must be a finite, non-negative number."));
    }
    let last_year = last_history_year(config)?;

    let mut rng = StdRng::seed_from_u64(demo_seed(config));
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut taxonomy = vec![TaxonomyNode::new(1, None, "Global")];
    let mut datasets = Vec::new();
    let mut next_id = 2;
    let mut next_entry = 1000;

    for (segment, series) in SEGMENTS {
        let segment_id = next_id;
        next_id += 1;
        taxonomy.push(TaxonomyNode::new(segment_id, Some(1), segment));

        for region in REGIONS {
            let region_id = next_id;
            next_id += 1;
            taxonomy.push(TaxonomyNode::new(region_id, Some(segment_id), region));

            let mut data = Map::new();
            for label in series {
                let base = rng.gen_range(500.0..5_000.0);
                let growth = rng.gen_range(-0.02..0.12);
                data.insert(label.to_string(), Value::Object(yearly_series(&mut rng, &normal, config, base, growth)));
            }

            // The first region of each segment uses the wrapped shape.
            let data = if region == REGIONS[0] {
                let mut wrapped = Map::new();
                wrapped.insert("Volume".to_string(), Value::Object(data));
                wrapped
            } else {
                data
            };

            datasets.push(DatasetEntry {
                id: next_entry,
                stream: format!("1,{segment_id},{region_id}"),
                data,
            });
            next_entry += 1;
        }
    }

    let mut overrides = ManualOverrides::default();
    let mut level: f64 = rng.gen_range(1_000.0..3_000.0);
    for year in Period::year(last_year).successors(config.override_years) {
        level *= 1.0 + rng.gen_range(0.0..0.08);
        overrides.values.insert(year, level.round());
    }

    Ok(Snapshots {
        taxonomy,
        datasets,
        overrides,
    })
}

/// Last historical year. Every generated label, overrides included, must be a
/// four-digit year.
fn last_history_year(config: &DemoConfig) -> Result<i32, AppError> {
    let out_of_range = || {
        AppError::new(
            2,
            format!(
                "Demo years must stay within {FIRST_YEAR}..={LAST_YEAR} (start {}, {} years, {} override years).",
                config.start_year, config.years, config.override_years
            ),
        )
    };
    let span = config
        .years
        .checked_add(config.override_years)
        .and_then(|n| i32::try_from(n).ok())
        .ok_or_else(out_of_range)?;
    let end = config.start_year.checked_add(span - 1).ok_or_else(out_of_range)?;
    if config.start_year < FIRST_YEAR || end > LAST_YEAR {
        return Err(out_of_range());
    }
    // `years >= 1`, so this stays within `start_year..=end`.
    Ok(end - config.override_years as i32)
}

fn yearly_series(
    rng: &mut StdRng,
    normal: &Normal<f64>,
    config: &DemoConfig,
    base: f64,
    growth: f64,
) -> Map<String, Value> {
    let mut out = Map::new();
    for t in 0..config.years {
        let trend = base * (1.0 + growth).powi(t as i32);
        let value = (trend * normal.sample(rng).exp()).round();
        let label = (config.start_year + t as i32).to_string();

        // Mix numeric and formatted string cells like real exports do.
        let cell = if rng.gen_bool(0.3) {
            Value::String(with_thousands(value as i64))
        } else {
            Value::from(value)
        };
        out.insert(label, cell);
    }
    out
}

fn with_thousands(v: i64) -> String {
    let digits = v.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if v < 0 {
        out.insert(0, '-');
    }
    out
}

fn demo_seed(config: &DemoConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    config.seed.hash(&mut hasher);
    config.start_year.hash(&mut hasher);
    config.years.hash(&mut hasher);
    config.noise.to_bits().hash(&mut hasher);
    config.override_years.hash(&mut hasher);
    hasher.finish()
}
