//! Small sample statistics used by the initial-guess heuristics.

/// Arithmetic mean. Returns 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by n, not n-1), matching the
/// convention the guess heuristics were tuned against.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Maximum of a slice, ignoring NaN. Returns 0.0 for an empty slice.
pub fn max(values: &[f64]) -> f64 {
    let m = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    if m.is_finite() { m } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_std() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((mean(&v) - 2.5).abs() < 1e-12);
        // Population std of [1,2,3,4] = sqrt(1.25)
        assert!((std_dev(&v) - 1.25_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn std_of_constant_is_zero() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn max_ignores_nan() {
        assert_eq!(max(&[1.0, f64::NAN, 3.0]), 3.0);
        assert_eq!(max(&[-3.0, -1.0]), -1.0);
    }
}
