//! Synthetic data for trying the tool without real snapshots.

pub mod sample;

pub use sample::*;
