//! Forecasting: method implementations and the engine that anchors them.
//!
//! Responsibilities:
//!
//! - derive future periods from the last historical period
//! - run linear / score / ai / manual methods
//! - degrade to flat, zero or null instead of failing on short history

pub mod engine;
pub mod methods;

pub use engine::*;
