//! Historical series extraction.

pub mod extract;

pub use extract::*;
