//! Least squares solver.
//!
//! The linear forecast fits `value ~ intercept + slope * index` over the
//! historical points. The design matrix is tall (one row per period, two
//! columns); nalgebra's `QR::solve` only handles square systems, so this goes
//! through the SVD.

use nalgebra::{DMatrix, DVector};

/// Tolerances tried in order when solving through the SVD.
const SVD_TOLERANCES: [f64; 3] = [1e-10, 1e-8, 1e-6];

/// Least squares solution of `x * beta = y`.
///
/// `None` when no tolerance yields a finite solution (constant or degenerate
/// designs).
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    SVD_TOLERANCES
        .iter()
        .filter_map(|&eps| svd.solve(y, eps).ok())
        .find(|beta| beta.iter().all(|v| v.is_finite()))
}

/// Ordinary least squares of `values[i]` against `i`.
///
/// Returns `(intercept, slope)`, or `None` with fewer than two points.
pub fn fit_index_trend(values: &[f64]) -> Option<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(n, 2);
    for i in 0..n {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = i as f64;
    }
    let y = DVector::from_column_slice(values);

    let beta = solve_least_squares(&design, &y)?;
    Some((beta[0], beta[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_line_is_recovered() {
        // 50 + 7i on i = 0..4
        let x = DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let y = DVector::from_row_slice(&[50.0, 57.0, 64.0, 71.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 50.0).abs() < 1e-9);
        assert!((beta[1] - 7.0).abs() < 1e-9);
    }

    #[test]
    fn index_trend_matches_closed_form() {
        // Noisy points around 10 + 2i: closed-form slope = cov(i, y) / var(i).
        let values = [10.0, 12.5, 13.5, 16.0];
        let (intercept, slope) = fit_index_trend(&values).unwrap();
        assert!((slope - 1.9).abs() < 1e-9);
        assert!((intercept - 10.15).abs() < 1e-9);
    }

    #[test]
    fn index_trend_needs_two_points() {
        assert!(fit_index_trend(&[]).is_none());
        assert!(fit_index_trend(&[5.0]).is_none());
    }
}
