//! Input/output helpers for the binary.
//!
//! - snapshot JSON read/write (`snapshot`)
//! - timeline CSV + analysis JSON exports (`export`)

pub mod export;
pub mod snapshot;

pub use export::*;
pub use snapshot::*;
