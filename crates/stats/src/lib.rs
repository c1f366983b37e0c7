//! Numeric helpers shared by the hindcast engines.
//!
//! Degenerate inputs (empty slices, no finite values) never panic: they
//! return `None` so callers can propagate a missing value.

use std::cmp::Ordering;

/// Arithmetic mean of a slice. Returns `None` if empty.
pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    let sum: f64 = data.iter().sum();
    Some(sum / data.len() as f64)
}

/// Copy of `data` without NaN/infinite values, sorted ascending.
pub fn sorted_finite(data: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = data.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    sorted
}

/// Linear-interpolation quantile (R type 7, the pandas/numpy default).
///
/// **Expects pre-sorted input** (caller's responsibility). `p` is clamped to
/// `[0, 1]`. Returns `None` if `sorted` is empty.
pub fn quantile_linear(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let p = p.clamp(0.0, 1.0);
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    Some(sorted[lo] + (h - h.floor()) * (sorted[hi] - sorted[lo]))
}

/// Mean absolute error between two parallel slices.
///
/// Returns `None` if the slices are empty or differ in length.
pub fn mean_absolute_error(truth: &[f64], predicted: &[f64]) -> Option<f64> {
    if truth.is_empty() || truth.len() != predicted.len() {
        return None;
    }
    let sum: f64 = truth
        .iter()
        .zip(predicted.iter())
        .map(|(t, p)| (t - p).abs())
        .sum();
    Some(sum / truth.len() as f64)
}

/// Area under a piecewise-linear curve by the trapezoidal rule.
///
/// `x` must be monotonic (either direction); the sign follows its direction.
/// Returns 0.0 for fewer than two points.
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    x.windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[0] + ys[1]) / 2.0)
        .sum()
}
