//! Built-in model definitions and their initial-guess heuristics.
//!
//! The catalog is a closed set. Linear and the two polynomials are linear in
//! their parameters and are solved directly (`math::polyfit`); the peak-shaped
//! models go through the iterative optimizer with the guesses below:
//!
//! | model       | guess                                              |
//! |-------------|----------------------------------------------------|
//! | exponential | `a0 = max(y)`, `b0 = 0.1`                          |
//! | gaussian    | `a0 = max(y)`, `mu0 = mean(x)`, `sigma0 = std(x)`  |
//! | lorentzian  | `a0 = max(y)`, `x0_0 = mean(x)`, `gamma0 = 1`      |
//! | voigt       | gaussian guess plus `gamma0 = 1`                   |
//!
//! A zero `std(x)` falls back to `1.0` so the optimizer never starts on a
//! singular width.

use std::f64::consts::PI;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitErrorKind};
use crate::math::{faddeeva_re, mean, std_dev};
use crate::math::stats::max as nan_max;

/// Minimum usable rows after a domain filter (mirrors the overall minimum
/// sample size the engine enforces).
pub const MIN_DOMAIN_POINTS: usize = 3;

/// One of the fixed built-in model forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CatalogModel {
    Linear,
    Polynomial2,
    Polynomial3,
    Exponential,
    Gaussian,
    Lorentzian,
    Voigt,
}

impl CatalogModel {
    /// Human-readable label for results and terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            CatalogModel::Linear => "Linear",
            CatalogModel::Polynomial2 => "Polynomial (deg 2)",
            CatalogModel::Polynomial3 => "Polynomial (deg 3)",
            CatalogModel::Exponential => "Exponential",
            CatalogModel::Gaussian => "Gaussian",
            CatalogModel::Lorentzian => "Lorentzian",
            CatalogModel::Voigt => "Voigt",
        }
    }

    /// Parameter names in declaration order.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            CatalogModel::Linear => &["slope", "intercept"],
            CatalogModel::Polynomial2 => &["c0", "c1", "c2"],
            CatalogModel::Polynomial3 => &["c0", "c1", "c2", "c3"],
            CatalogModel::Exponential => &["a", "b"],
            CatalogModel::Gaussian => &["a", "mu", "sigma"],
            CatalogModel::Lorentzian => &["a", "x0", "gamma"],
            CatalogModel::Voigt => &["a", "mu", "sigma", "gamma"],
        }
    }

    pub fn param_count(self) -> usize {
        self.param_names().len()
    }

    /// Polynomial degree for the models that are linear in their parameters.
    ///
    /// `Some(_)` means the model bypasses the iterative optimizer in favor of
    /// a direct least-squares solve.
    pub fn polynomial_degree(self) -> Option<usize> {
        match self {
            CatalogModel::Linear => Some(1),
            CatalogModel::Polynomial2 => Some(2),
            CatalogModel::Polynomial3 => Some(3),
            _ => None,
        }
    }

    /// Evaluate the model at `x`.
    ///
    /// For linear/polynomial models the parameter order here matches
    /// [`CatalogModel::param_names`]: slope before intercept for Linear,
    /// ascending coefficients for the polynomials.
    pub fn eval(self, x: f64, params: &[f64]) -> f64 {
        match self {
            CatalogModel::Linear => params[0] * x + params[1],
            CatalogModel::Polynomial2 | CatalogModel::Polynomial3 => {
                crate::math::polyval(params, x)
            }
            CatalogModel::Exponential => params[0] * (params[1] * x).exp(),
            CatalogModel::Gaussian => {
                let (a, mu, sigma) = (params[0], params[1], params[2]);
                let d = x - mu;
                a * (-(d * d) / (2.0 * sigma * sigma)).exp()
            }
            CatalogModel::Lorentzian => {
                let (a, x0, gamma) = (params[0], params[1], params[2]);
                let d = x - x0;
                a * gamma * gamma / (d * d + gamma * gamma)
            }
            CatalogModel::Voigt => {
                let (a, mu, sigma, gamma) = (params[0], params[1], params[2], params[3]);
                // The profile is symmetric in the signs of sigma and gamma;
                // taking absolute values keeps us in the Faddeeva routine's
                // valid half-plane while the optimizer explores.
                let sigma = sigma.abs().max(1e-300);
                let gamma = gamma.abs();
                let scale = sigma * std::f64::consts::SQRT_2;
                let re = (x - mu) / scale;
                let im = gamma / scale;
                a * faddeeva_re(re, im) / (sigma * (2.0 * PI).sqrt())
            }
        }
    }

    /// Starting parameter vector for the iterative optimizer.
    ///
    /// Only meaningful for the nonlinear models; linear/polynomial fits never
    /// consult it.
    pub fn initial_guess(self, xs: &[f64], ys: &[f64]) -> Vec<f64> {
        let a0 = nan_max(ys);
        match self {
            CatalogModel::Linear | CatalogModel::Polynomial2 | CatalogModel::Polynomial3 => {
                vec![1.0; self.param_count()]
            }
            CatalogModel::Exponential => vec![a0, 0.1],
            CatalogModel::Gaussian => vec![a0, mean(xs), nonzero_or(std_dev(xs), 1.0)],
            CatalogModel::Lorentzian => vec![a0, mean(xs), 1.0],
            CatalogModel::Voigt => vec![a0, mean(xs), nonzero_or(std_dev(xs), 1.0), 1.0],
        }
    }

    /// Apply the model's validity constraint, returning the rows usable for
    /// fitting.
    ///
    /// Only the exponential model constrains its domain: it requires strictly
    /// positive y. Everything else passes the sample through unchanged.
    pub fn filter_domain(
        self,
        xs: &[f64],
        ys: &[f64],
    ) -> Result<(Vec<f64>, Vec<f64>), FitError> {
        match self {
            CatalogModel::Exponential => {
                let (fx, fy): (Vec<f64>, Vec<f64>) = xs
                    .iter()
                    .zip(ys.iter())
                    .filter(|&(_, &y)| y > 0.0)
                    .map(|(&x, &y)| (x, y))
                    .unzip();
                if fx.len() < MIN_DOMAIN_POINTS {
                    return Err(FitError::new(
                        FitErrorKind::InvalidDomain,
                        format!(
                            "Exponential requires positive y values ({} of {} rows usable).",
                            fx.len(),
                            xs.len()
                        ),
                    ));
                }
                Ok((fx, fy))
            }
            _ => Ok((xs.to_vec(), ys.to_vec())),
        }
    }

    /// Evaluation budget for the iterative optimizer. Voigt gets a larger
    /// cap since each evaluation is cheap but convergence is slower.
    pub fn max_evaluations(self) -> usize {
        match self {
            CatalogModel::Voigt => 20_000,
            _ => 10_000,
        }
    }

    pub const ALL: [CatalogModel; 7] = [
        CatalogModel::Linear,
        CatalogModel::Polynomial2,
        CatalogModel::Polynomial3,
        CatalogModel::Exponential,
        CatalogModel::Gaussian,
        CatalogModel::Lorentzian,
        CatalogModel::Voigt,
    ];
}

fn nonzero_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() && value != 0.0 {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_eval_slope_intercept_order() {
        let y = CatalogModel::Linear.eval(2.0, &[3.0, 1.0]);
        assert!((y - 7.0).abs() < 1e-12);
    }

    #[test]
    fn gaussian_peak_at_mu() {
        let p = [2.0, 1.5, 0.7];
        let at_peak = CatalogModel::Gaussian.eval(1.5, &p);
        assert!((at_peak - 2.0).abs() < 1e-12);
        assert!(CatalogModel::Gaussian.eval(3.0, &p) < at_peak);
    }

    #[test]
    fn lorentzian_half_height_at_gamma() {
        let p = [2.0, 0.0, 0.5];
        let half = CatalogModel::Lorentzian.eval(0.5, &p);
        assert!((half - 1.0).abs() < 1e-12);
    }

    #[test]
    fn voigt_small_gamma_approaches_scaled_gaussian() {
        // As gamma -> 0, the profile tends to a * N(mu, sigma) density.
        let (a, mu, sigma) = (3.0, 0.5, 1.2);
        let x = 1.1;
        let got = CatalogModel::Voigt.eval(x, &[a, mu, sigma, 1e-8]);
        let d = x - mu;
        let want =
            a * (-(d * d) / (2.0 * sigma * sigma)).exp() / (sigma * (2.0 * PI).sqrt());
        assert!((got - want).abs() < 1e-3 * want, "got {got}, want {want}");
    }

    #[test]
    fn exponential_guess_uses_max_y() {
        let g = CatalogModel::Exponential.initial_guess(&[0.0, 1.0], &[2.0, 5.0]);
        assert_eq!(g, vec![5.0, 0.1]);
    }

    #[test]
    fn gaussian_guess_falls_back_on_degenerate_x() {
        let g = CatalogModel::Gaussian.initial_guess(&[2.0, 2.0, 2.0], &[1.0, 2.0, 3.0]);
        assert_eq!(g[2], 1.0);
    }

    #[test]
    fn exponential_domain_filter_rejects_all_negative() {
        let err = CatalogModel::Exponential
            .filter_domain(&[0.0, 1.0, 2.0], &[-1.0, -2.0, -3.0])
            .unwrap_err();
        assert_eq!(err.kind(), FitErrorKind::InvalidDomain);
    }

    #[test]
    fn exponential_domain_filter_keeps_positive_rows() {
        let (fx, fy) = CatalogModel::Exponential
            .filter_domain(&[0.0, 1.0, 2.0, 3.0], &[1.0, -1.0, 2.0, 3.0])
            .unwrap();
        assert_eq!(fx, vec![0.0, 2.0, 3.0]);
        assert_eq!(fy, vec![1.0, 2.0, 3.0]);
    }
}
