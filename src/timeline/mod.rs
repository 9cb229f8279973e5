//! Chart timeline assembly.

pub mod merge;

pub use merge::*;
