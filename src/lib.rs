//! `mkt-forecast` library crate.
//!
//! Resolves a node in a market taxonomy to its dataset, extracts a historical
//! series, projects it with several forecasting methods, and merges everything
//! into one chart-ready timeline with growth summaries.
//!
//! The binary (`mf`) is a thin wrapper around this library so that the core
//! stays testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod math;
pub mod report;
pub mod series;
pub mod taxonomy;
pub mod timeline;
