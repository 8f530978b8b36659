//! Levenberg-Marquardt solver for nonlinear least squares.
//!
//! Given observations `(x_i, y_i)` and a model `f(x, params)`, minimize
//! `Σ (y_i - f(x_i, params))²` starting from a caller-supplied guess.
//!
//! The scheme is the classic damped Gauss-Newton iteration:
//!
//! - build a forward-difference Jacobian around the current parameters
//! - solve `(JᵀJ + λ·diag(JᵀJ)) δ = Jᵀr` for the step
//! - accept the step (and shrink λ) only when it lowers the SSE, otherwise
//!   raise λ and retry with the same Jacobian
//!
//! Everything is deterministic: no randomized restarts, no RNG. Each full
//! residual pass counts against the caller's evaluation budget, which mirrors
//! how `maxfev`-style caps behave.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use crate::error::{FitError, FitErrorKind};

/// Tuning knobs for the solver.
#[derive(Debug, Clone)]
pub struct LmOptions {
    /// Hard cap on model-evaluation passes (one per residual computation,
    /// one per Jacobian column).
    pub max_evaluations: usize,
    /// Relative SSE improvement below which we declare convergence.
    pub tolerance: f64,
    /// Initial damping factor.
    pub lambda_init: f64,
    /// Multiplier applied to lambda after a rejected step.
    pub lambda_up: f64,
    /// Multiplier applied to lambda after an accepted step.
    pub lambda_down: f64,
}

impl LmOptions {
    pub fn with_budget(max_evaluations: usize) -> Self {
        Self {
            max_evaluations,
            tolerance: 1e-10,
            lambda_init: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
        }
    }
}

/// Converged solver output.
#[derive(Debug, Clone)]
pub struct LmFit {
    /// Best-fit parameters.
    pub params: Vec<f64>,
    /// `σ² (JᵀJ)⁻¹` at the solution; `None` when there are no residual
    /// degrees of freedom or the normal matrix is singular.
    pub covariance: Option<DMatrix<f64>>,
    /// Sum of squared residuals at the solution.
    pub sse: f64,
    /// Accepted iterations.
    pub iterations: usize,
    /// Model-evaluation passes consumed.
    pub evaluations: usize,
}

/// Minimize `Σ (y_i - f(x_i, p))²` over `p`, starting from `p0`.
pub fn levenberg_marquardt<F>(
    f: &F,
    xs: &[f64],
    ys: &[f64],
    p0: &[f64],
    opts: &LmOptions,
) -> Result<LmFit, FitError>
where
    F: Fn(f64, &[f64]) -> f64 + Sync,
{
    let n = xs.len();
    let p = p0.len();
    debug_assert_eq!(n, ys.len());
    if n == 0 || p == 0 {
        return Err(FitError::new(
            FitErrorKind::Convergence,
            "Nothing to optimize: empty sample or empty parameter vector.",
        ));
    }

    let mut params = p0.to_vec();
    let mut evaluations = 0usize;
    let mut iterations = 0usize;

    let mut residual = residuals(f, xs, ys, &params);
    evaluations += 1;
    let mut sse = residual.norm_squared();
    if !sse.is_finite() {
        return Err(FitError::new(
            FitErrorKind::Convergence,
            "Model is not finite at the starting parameters.",
        ));
    }

    let mut lambda = opts.lambda_init;
    let mut jacobian = DMatrix::<f64>::zeros(n, p);

    loop {
        if evaluations + p > opts.max_evaluations {
            return Err(budget_error(opts.max_evaluations));
        }
        fill_jacobian(f, xs, &params, &residual, ys, &mut jacobian);
        evaluations += p;

        let jt = jacobian.transpose();
        let normal = &jt * &jacobian;
        let gradient = &jt * &residual;

        // Converged when the gradient has essentially vanished.
        if gradient.amax() < 1e-14 {
            break;
        }

        let mut accepted = false;
        while evaluations < opts.max_evaluations {
            let delta = match solve_damped(&normal, &gradient, lambda) {
                Some(d) => d,
                None => {
                    // Singular even with damping applied: raise lambda and
                    // try again until it stops helping.
                    lambda *= opts.lambda_up;
                    if lambda > 1e12 {
                        return Err(FitError::new(
                            FitErrorKind::Convergence,
                            "Normal equations are singular; the model may be \
                             over-parameterized for this data.",
                        ));
                    }
                    continue;
                }
            };

            // J is d(residual)/dp, so the descent step is -delta.
            let trial: Vec<f64> = params
                .iter()
                .zip(delta.iter())
                .map(|(&pi, &di)| pi - di)
                .collect();
            let trial_residual = residuals(f, xs, ys, &trial);
            evaluations += 1;
            let trial_sse = trial_residual.norm_squared();

            if trial_sse.is_finite() && trial_sse < sse {
                let improvement = sse - trial_sse;
                params = trial;
                residual = trial_residual;
                sse = trial_sse;
                lambda = (lambda * opts.lambda_down).max(1e-12);
                iterations += 1;
                accepted = true;

                if improvement <= opts.tolerance * (sse + opts.tolerance) {
                    return Ok(finish(
                        f, xs, ys, params, sse, iterations, evaluations,
                    ));
                }
                break;
            }

            lambda *= opts.lambda_up;
            if lambda > 1e12 {
                // The step search has stalled; treat the current point as
                // the solution rather than burning the rest of the budget.
                return Ok(finish(f, xs, ys, params, sse, iterations, evaluations));
            }
        }

        if !accepted {
            return Err(budget_error(opts.max_evaluations));
        }
    }

    Ok(finish(f, xs, ys, params, sse, iterations, evaluations))
}

fn budget_error(budget: usize) -> FitError {
    FitError::new(
        FitErrorKind::Convergence,
        format!("Fit did not converge within {budget} model evaluations."),
    )
}

/// Residual vector `y - f(x, p)`, evaluated in parallel.
fn residuals<F>(f: &F, xs: &[f64], ys: &[f64], params: &[f64]) -> DVector<f64>
where
    F: Fn(f64, &[f64]) -> f64 + Sync,
{
    let r: Vec<f64> = xs
        .par_iter()
        .zip(ys.par_iter())
        .map(|(&x, &y)| y - f(x, params))
        .collect();
    DVector::from_vec(r)
}

/// Forward-difference Jacobian of the residual vector.
///
/// `d r_i / d p_j = ((y_i - f_h) - (y_i - f)) / h = (f - f_h) / h`, so the
/// constant `y_i` cancels and only the perturbed model value is needed.
fn fill_jacobian<F>(
    f: &F,
    xs: &[f64],
    params: &[f64],
    residual: &DVector<f64>,
    ys: &[f64],
    jacobian: &mut DMatrix<f64>,
) where
    F: Fn(f64, &[f64]) -> f64 + Sync,
{
    // sqrt(machine epsilon) step, scaled by parameter magnitude.
    const BASE_STEP: f64 = 1.49e-8;

    let mut perturbed = params.to_vec();
    for j in 0..params.len() {
        let h = BASE_STEP * params[j].abs().max(1.0);
        perturbed[j] = params[j] + h;

        let col: Vec<f64> = xs
            .par_iter()
            .enumerate()
            .map(|(i, &x)| ((ys[i] - f(x, &perturbed)) - residual[i]) / h)
            .collect();
        for (i, c) in col.into_iter().enumerate() {
            jacobian[(i, j)] = c;
        }

        perturbed[j] = params[j];
    }
}

fn solve_damped(
    normal: &DMatrix<f64>,
    gradient: &DVector<f64>,
    lambda: f64,
) -> Option<DVector<f64>> {
    let p = normal.nrows();
    let mut damped = normal.clone();
    for j in 0..p {
        // Marquardt scaling: damp along the curvature diagonal, with a floor
        // so flat directions still get regularized.
        damped[(j, j)] += lambda * normal[(j, j)].abs().max(1e-12);
    }

    let delta = damped.lu().solve(gradient)?;
    if delta.iter().all(|v| v.is_finite()) {
        Some(delta)
    } else {
        None
    }
}

fn finish<F>(
    f: &F,
    xs: &[f64],
    ys: &[f64],
    params: Vec<f64>,
    sse: f64,
    iterations: usize,
    evaluations: usize,
) -> LmFit
where
    F: Fn(f64, &[f64]) -> f64 + Sync,
{
    let covariance = covariance_at(f, xs, ys, &params, sse);
    LmFit {
        params,
        covariance,
        sse,
        iterations,
        evaluations,
    }
}

/// Parameter covariance `σ² (JᵀJ)⁻¹` with `σ² = SSE / (n - p)`.
fn covariance_at<F>(
    f: &F,
    xs: &[f64],
    ys: &[f64],
    params: &[f64],
    sse: f64,
) -> Option<DMatrix<f64>>
where
    F: Fn(f64, &[f64]) -> f64 + Sync,
{
    let n = xs.len();
    let p = params.len();
    if n <= p {
        return None;
    }

    let residual = residuals(f, xs, ys, params);
    let mut jacobian = DMatrix::<f64>::zeros(n, p);
    fill_jacobian(f, xs, params, &residual, ys, &mut jacobian);

    let normal = jacobian.transpose() * &jacobian;
    let inv = normal.try_inverse()?;
    let sigma2 = sse / (n - p) as f64;
    let cov = inv * sigma2;
    if cov.iter().all(|v| v.is_finite()) {
        Some(cov)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gaussian(x: f64, p: &[f64]) -> f64 {
        let d = x - p[1];
        p[0] * (-(d * d) / (2.0 * p[2] * p[2])).exp()
    }

    #[test]
    fn recovers_gaussian_parameters_from_clean_data() {
        let truth = [2.0, 1.0, 0.5];
        let xs: Vec<f64> = (0..41).map(|i| -1.0 + i as f64 * 0.1).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| gaussian(x, &truth)).collect();

        let opts = LmOptions::with_budget(10_000);
        let fit =
            levenberg_marquardt(&gaussian, &xs, &ys, &[1.5, 0.5, 1.0], &opts).unwrap();

        for (got, want) in fit.params.iter().zip(truth.iter()) {
            assert!((got - want).abs() < 1e-5, "got {got}, want {want}");
        }
        assert!(fit.sse < 1e-10);
        assert!(fit.covariance.is_some());
    }

    #[test]
    fn recovers_exponential_parameters() {
        let f = |x: f64, p: &[f64]| p[0] * (p[1] * x).exp();
        let xs: Vec<f64> = (0..20).map(|i| i as f64 * 0.2).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| f(x, &[3.0, 0.7])).collect();

        let opts = LmOptions::with_budget(10_000);
        let fit = levenberg_marquardt(&f, &xs, &ys, &[1.0, 0.1], &opts).unwrap();

        assert!((fit.params[0] - 3.0).abs() < 1e-5);
        assert!((fit.params[1] - 0.7).abs() < 1e-5);
    }

    #[test]
    fn exhausted_budget_reports_convergence_error() {
        let f = |x: f64, p: &[f64]| gaussian(x, p);
        let xs: Vec<f64> = (0..20).map(|i| i as f64 * 0.1).collect();
        let ys: Vec<f64> = xs.iter().map(|&x| (x * 10.0).sin()).collect();

        let opts = LmOptions::with_budget(4);
        let err = levenberg_marquardt(&f, &xs, &ys, &[1.0, 0.5, 0.5], &opts).unwrap_err();
        assert_eq!(err.kind(), FitErrorKind::Convergence);
    }

    #[test]
    fn no_degrees_of_freedom_means_no_covariance() {
        let f = |x: f64, p: &[f64]| p[0] * x + p[1];
        let xs = [0.0, 1.0];
        let ys = [1.0, 3.0];
        let opts = LmOptions::with_budget(10_000);
        let fit = levenberg_marquardt(&f, &xs, &ys, &[1.0, 0.0], &opts).unwrap();
        assert!(fit.covariance.is_none());
        assert!((fit.params[0] - 2.0).abs() < 1e-6);
        assert!((fit.params[1] - 1.0).abs() < 1e-6);
    }
}
