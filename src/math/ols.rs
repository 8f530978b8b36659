//! Direct least-squares solves for models that are linear in their parameters.
//!
//! Linear and polynomial fits do not need the iterative optimizer: the design
//! matrix is fixed, so a single SVD solve gives the unique minimizer of
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! Implementation choices:
//! - SVD rather than QR, so tall (rows > columns) systems are handled and
//!   near-collinear columns degrade gracefully instead of panicking.
//! - The parameter covariance is the textbook `σ² (XᵀX)⁻¹` with
//!   `σ² = SS_res / (n - p)`; it is absent when `n == p` (zero residual
//!   degrees of freedom) or when `XᵀX` is singular.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Output of [`polyfit`]: coefficients in ascending order (`c0 + c1 x + ...`)
/// plus the optional parameter covariance in the same ordering.
#[derive(Debug, Clone)]
pub struct PolyFit {
    pub coefficients: Vec<f64>,
    pub covariance: Option<DMatrix<f64>>,
    pub ss_res: f64,
}

/// Fit a polynomial of the given degree by ordinary least squares.
///
/// Requires `xs.len() == ys.len() >= degree + 1`. Returns `None` when the
/// system cannot be solved (e.g. all x values identical for degree >= 1).
pub fn polyfit(xs: &[f64], ys: &[f64], degree: usize) -> Option<PolyFit> {
    let n = xs.len();
    let p = degree + 1;
    if n < p || ys.len() != n {
        return None;
    }

    let mut design = DMatrix::<f64>::zeros(n, p);
    let obs = DVector::from_column_slice(ys);
    for (i, &x) in xs.iter().enumerate() {
        let mut pow = 1.0;
        for j in 0..p {
            design[(i, j)] = pow;
            pow *= x;
        }
    }

    let beta = solve_least_squares(&design, &obs)?;

    let residual = &obs - &design * &beta;
    let ss_res = residual.dot(&residual);

    let covariance = if n > p {
        let sigma2 = ss_res / (n - p) as f64;
        (design.transpose() * &design)
            .try_inverse()
            .map(|inv| inv * sigma2)
            .filter(|m| m.iter().all(|v| v.is_finite()))
    } else {
        None
    };

    Some(PolyFit {
        coefficients: beta.iter().copied().collect(),
        covariance,
        ss_res,
    })
}

/// Evaluate a polynomial with ascending coefficients at `x`.
pub fn polyval(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, &c| acc * x + c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn polyfit_recovers_exact_quadratic() {
        let xs = [-2.0, -1.0, 0.0, 1.0, 2.0];
        let ys: Vec<f64> = xs.iter().map(|&x| 1.0 - 2.0 * x + 3.0 * x * x).collect();

        let fit = polyfit(&xs, &ys, 2).unwrap();
        assert!((fit.coefficients[0] - 1.0).abs() < 1e-9);
        assert!((fit.coefficients[1] + 2.0).abs() < 1e-9);
        assert!((fit.coefficients[2] - 3.0).abs() < 1e-9);
        assert!(fit.ss_res < 1e-18);
        // n > p, so covariance should be present (near-zero for exact data).
        assert!(fit.covariance.is_some());
    }

    #[test]
    fn polyfit_rejects_underdetermined() {
        assert!(polyfit(&[0.0, 1.0], &[1.0, 2.0], 2).is_none());
    }

    #[test]
    fn polyval_matches_horner_expansion() {
        let c = [1.0, -2.0, 3.0];
        let x = 1.5;
        assert!((polyval(&c, x) - (1.0 - 2.0 * x + 3.0 * x * x)).abs() < 1e-12);
    }
}
