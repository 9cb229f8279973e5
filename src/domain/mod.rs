//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - input snapshot records (`TaxonomyNode`, `DatasetEntry`, `ManualOverrides`)
//! - calendar periods (`Period`)
//! - series and timeline outputs (`HistoricalSeries`, `ForecastSeries`, `MergedTimeline`)
//! - growth outputs (`Growth`, `GrowthSummary`) and run configuration (`AnalysisConfig`)

pub mod period;
pub mod types;

pub use period::*;
pub use types::*;
