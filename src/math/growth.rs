//! Compound growth rate.

use crate::domain::Growth;

/// `((last / first)^(1 / periods) - 1) * 100`.
///
/// `Growth::Undefined` when `first` is missing or non-positive, `last` is
/// missing, `periods < 1`, or the result is not finite. Never coerced to zero.
pub fn cagr(first: Option<f64>, last: Option<f64>, periods: usize) -> Growth {
    let (Some(first), Some(last)) = (first, last) else {
        return Growth::Undefined;
    };
    if !(first.is_finite() && first > 0.0) || !last.is_finite() || periods < 1 {
        return Growth::Undefined;
    }

    let rate = ((last / first).powf(1.0 / periods as f64) - 1.0) * 100.0;
    if rate.is_finite() {
        Growth::Percent(rate)
    } else {
        Growth::Undefined
    }
}
