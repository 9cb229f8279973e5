//! Mathematical utilities: least squares and growth rates.

pub mod growth;
pub mod ols;

pub use growth::*;
pub use ols::*;
