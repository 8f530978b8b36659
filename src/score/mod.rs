//! Goodness-of-fit scoring.
//!
//! R² is the coefficient of determination computed against the rows actually
//! used for fitting (so a domain-filtered exponential fit is scored on the
//! filtered rows). The confidence half-width condenses the parameter
//! covariance into a single ±band at the 95% level.

use nalgebra::DMatrix;

use crate::error::{FitError, FitErrorKind};

/// Two-sided 95% normal quantile.
pub const CONFIDENCE_Z: f64 = 1.96;

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Fails with [`FitErrorKind::UndefinedScore`] when the observed values have
/// zero variance, where the ratio is meaningless. Callers map that error to
/// an absent score; it never aborts a fit.
pub fn r_squared(ys: &[f64], y_hat: &[f64]) -> Result<f64, FitError> {
    debug_assert_eq!(ys.len(), y_hat.len());
    if ys.is_empty() {
        return Err(undefined("R² is undefined for an empty sample."));
    }

    let mean = ys.iter().sum::<f64>() / ys.len() as f64;
    let ss_tot: f64 = ys.iter().map(|y| (y - mean) * (y - mean)).sum();
    let ss_res: f64 = ys
        .iter()
        .zip(y_hat.iter())
        .map(|(y, f)| (y - f) * (y - f))
        .sum();

    if !(ss_tot.is_finite() && ss_res.is_finite()) || ss_tot <= 0.0 {
        return Err(undefined(
            "R² is undefined: observed values have zero variance.",
        ));
    }

    Ok(1.0 - ss_res / ss_tot)
}

/// Scalar 95% half-width: `1.96 * mean(sqrt(diag(cov)))`.
///
/// Diagonal entries that are negative or non-finite (a degenerate covariance)
/// are skipped; if none survive, there is no band.
pub fn confidence_half_width(covariance: &DMatrix<f64>) -> Option<f64> {
    let sigmas: Vec<f64> = covariance
        .diagonal()
        .iter()
        .map(|v| v.sqrt())
        .filter(|v| v.is_finite())
        .collect();
    if sigmas.is_empty() {
        return None;
    }

    let width = CONFIDENCE_Z * sigmas.iter().sum::<f64>() / sigmas.len() as f64;
    width.is_finite().then_some(width)
}

fn undefined(message: &str) -> FitError {
    FitError::new(FitErrorKind::UndefinedScore, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dmatrix;

    #[test]
    fn perfect_fit_scores_one() {
        let y = [1.0, 2.0, 3.0, 4.0];
        let r2 = r_squared(&y, &y).unwrap();
        assert!((r2 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn mean_predictor_scores_zero() {
        let y = [1.0, 2.0, 3.0];
        let yhat = [2.0, 2.0, 2.0];
        let r2 = r_squared(&y, &yhat).unwrap();
        assert!(r2.abs() < 1e-12);
    }

    #[test]
    fn constant_observations_are_undefined() {
        let err = r_squared(&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0]).unwrap_err();
        assert_eq!(err.kind(), FitErrorKind::UndefinedScore);
    }

    #[test]
    fn half_width_averages_parameter_sigmas() {
        let cov = dmatrix![0.04, 0.0; 0.0, 0.16];
        // sqrt diag = [0.2, 0.4], mean = 0.3
        let w = confidence_half_width(&cov).unwrap();
        assert!((w - 1.96 * 0.3).abs() < 1e-12);
    }

    #[test]
    fn degenerate_diagonal_entries_are_skipped() {
        let cov = dmatrix![0.04, 0.0; 0.0, -1.0];
        let w = confidence_half_width(&cov).unwrap();
        assert!((w - 1.96 * 0.2).abs() < 1e-12);

        let all_bad = dmatrix![-1.0, 0.0; 0.0, f64::NAN];
        assert!(confidence_half_width(&all_bad).is_none());
    }
}
