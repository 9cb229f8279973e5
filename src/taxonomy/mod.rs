//! Taxonomy snapshot: tree queries and path-key resolution.

pub mod path;
pub mod tree;

pub use path::*;
pub use tree::*;
