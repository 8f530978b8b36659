//! Fitting engine: range selection, model dispatch, result assembly.
//!
//! The engine is a small state machine:
//!
//! - [`FitEngine::select_range`] installs a cleaned sample (and discards any
//!   previous result — a result never describes anything but the current
//!   selection)
//! - [`FitEngine::fit`] runs one model against the current selection
//!
//! Dispatch is by exact model id. Linear and polynomial models solve directly
//! via least squares; everything else goes through the Levenberg-Marquardt
//! solver with the catalog's guess heuristics (or all-ones for custom
//! formulas). The returned curve is always sampled at the selected x values
//! in ascending order, including rows a domain filter excluded from the fit
//! itself.

use nalgebra::DMatrix;

use crate::domain::{FitRequest, FitResult, ModelId, RangeBounds, Sample};
use crate::error::{FitError, FitErrorKind};
use crate::expr::CompiledExpression;
use crate::models::CatalogModel;
use crate::optim::{levenberg_marquardt, LmOptions};
use crate::score::{confidence_half_width, r_squared};

/// Minimum rows a selection must contain before any fit is attempted.
pub const MIN_POINTS: usize = 3;

/// Evaluation budget for custom formula fits.
const CUSTOM_MAX_EVALUATIONS: usize = 20_000;

/// Stateful fitting session over one dataset.
#[derive(Debug, Default)]
pub struct FitEngine {
    sample: Option<Sample>,
    last: Option<FitResult>,
}

impl FitEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a selection: keep the rows of `(xs, ys)` that are finite and
    /// inside `bounds`. Any previous fit result is discarded.
    ///
    /// Returns the number of rows kept.
    pub fn select_range(&mut self, xs: &[f64], ys: &[f64], bounds: &RangeBounds) -> usize {
        let sample = Sample::from_columns(xs, ys, bounds);
        let kept = sample.len();
        self.sample = Some(sample);
        self.last = None;
        kept
    }

    pub fn sample(&self) -> Option<&Sample> {
        self.sample.as_ref()
    }

    pub fn last_result(&self) -> Option<&FitResult> {
        self.last.as_ref()
    }

    /// Fit one model against the current selection.
    pub fn fit(&mut self, request: &FitRequest) -> Result<&FitResult, FitError> {
        let sample = self.sample.as_ref().ok_or_else(|| {
            FitError::new(
                FitErrorKind::InsufficientData,
                "No data range selected; select a range before fitting.",
            )
        })?;
        let result = fit_sample(sample, request)?;
        Ok(self.last.insert(result))
    }
}

/// One-shot fit over full columns, without engine state.
pub fn fit_columns(xs: &[f64], ys: &[f64], request: &FitRequest) -> Result<FitResult, FitError> {
    let sample = Sample::from_columns(xs, ys, &RangeBounds::full());
    fit_sample(&sample, request)
}

/// Wire-level entry point: model named by string, as callers outside this
/// crate see it. The columns are assumed to be pre-filtered by the caller.
pub fn fit(
    xs: &[f64],
    ys: &[f64],
    model: &str,
    expression: Option<&str>,
    want_confidence_band: bool,
) -> Result<FitResult, FitError> {
    let request = FitRequest {
        model: ModelId::parse(model)?,
        expression: expression.map(str::to_string),
        confidence_band: want_confidence_band,
    };
    fit_columns(xs, ys, &request)
}

/// Pure fitting core: one sample, one request, one result.
pub fn fit_sample(sample: &Sample, request: &FitRequest) -> Result<FitResult, FitError> {
    let n = sample.len();
    if n < MIN_POINTS {
        return Err(FitError::new(
            FitErrorKind::InsufficientData,
            format!("Need at least {MIN_POINTS} points in the selected range (have {n})."),
        ));
    }

    let fitted = match request.model.catalog() {
        Some(model) => fit_catalog(model, sample)?,
        None => fit_custom(request.expression.as_deref().unwrap_or(""), sample)?,
    };

    // Score against the rows actually fitted; an undefined score voids R²
    // without failing the fit.
    let y_hat: Vec<f64> = fitted
        .scored_x
        .iter()
        .map(|&x| fitted.curve.eval(x, &fitted.values))
        .collect();
    let r2 = r_squared(&fitted.scored_y, &y_hat).ok();

    // The reported curve covers every selected x, ascending, even rows a
    // domain filter kept out of the fit.
    let mut curve_x = sample.x.clone();
    curve_x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let curve_y: Vec<f64> = curve_x
        .iter()
        .map(|&x| fitted.curve.eval(x, &fitted.values))
        .collect();

    let confidence_band = if request.confidence_band {
        fitted.covariance.as_ref().and_then(confidence_half_width)
    } else {
        None
    };

    Ok(FitResult {
        model: fitted.label,
        params: fitted
            .names
            .into_iter()
            .zip(fitted.values.iter().copied())
            .collect(),
        curve_x,
        curve_y,
        covariance: fitted.covariance.map(matrix_rows),
        r_squared: r2,
        confidence_band,
    })
}

/// How a fitted model is evaluated when sampling the curve.
enum FittedCurve {
    Catalog(CatalogModel),
    Custom(CompiledExpression),
}

impl FittedCurve {
    fn eval(&self, x: f64, params: &[f64]) -> f64 {
        match self {
            FittedCurve::Catalog(m) => m.eval(x, params),
            FittedCurve::Custom(e) => e.eval(x, params),
        }
    }
}

struct Fitted {
    curve: FittedCurve,
    label: String,
    names: Vec<String>,
    /// Parameter values in the same order the curve's `eval` expects.
    values: Vec<f64>,
    covariance: Option<DMatrix<f64>>,
    /// Rows R² is computed over (the domain-filtered subset, if any).
    scored_x: Vec<f64>,
    scored_y: Vec<f64>,
}

fn fit_catalog(model: CatalogModel, sample: &Sample) -> Result<Fitted, FitError> {
    if let Some(degree) = model.polynomial_degree() {
        return fit_polynomial(model, degree, sample);
    }

    // The domain filter may shrink the fitted rows (exponential drops
    // non-positive y); the filter itself rejects selections it leaves too
    // small.
    let (fx, fy) = model.filter_domain(&sample.x, &sample.y)?;

    // An underdetermined system must never reach the solver (Voigt has 4
    // parameters, so the overall 3-point minimum is not enough for it).
    if fx.len() < model.param_count() {
        return Err(FitError::new(
            FitErrorKind::InsufficientData,
            format!(
                "{} has {} parameters but the selection has only {} usable points.",
                model.display_name(),
                model.param_count(),
                fx.len()
            ),
        ));
    }

    let guess = model.initial_guess(&fx, &fy);
    let opts = LmOptions::with_budget(model.max_evaluations());
    let f = |x: f64, p: &[f64]| model.eval(x, p);
    let lm = levenberg_marquardt(&f, &fx, &fy, &guess, &opts)?;

    Ok(Fitted {
        curve: FittedCurve::Catalog(model),
        label: model.display_name().to_string(),
        names: model.param_names().iter().map(|s| s.to_string()).collect(),
        values: lm.params,
        covariance: lm.covariance,
        scored_x: fx,
        scored_y: fy,
    })
}

fn fit_polynomial(model: CatalogModel, degree: usize, sample: &Sample) -> Result<Fitted, FitError> {
    let n = sample.len();
    if n < degree + 1 {
        return Err(FitError::new(
            FitErrorKind::InsufficientData,
            format!(
                "{} needs at least {} points (have {n}).",
                model.display_name(),
                degree + 1
            ),
        ));
    }

    let pf = crate::math::polyfit(&sample.x, &sample.y, degree).ok_or_else(|| {
        FitError::new(
            FitErrorKind::Convergence,
            format!(
                "Least-squares solve failed for {}; the x values may be degenerate.",
                model.display_name()
            ),
        )
    })?;

    // `polyfit` returns ascending coefficients c0..cN. Linear reports (and
    // evaluates) slope before intercept; the polynomials keep ascending order.
    let values = if model == CatalogModel::Linear {
        vec![pf.coefficients[1], pf.coefficients[0]]
    } else {
        pf.coefficients.clone()
    };

    Ok(Fitted {
        curve: FittedCurve::Catalog(model),
        label: model.display_name().to_string(),
        names: model.param_names().iter().map(|s| s.to_string()).collect(),
        values,
        covariance: pf.covariance,
        scored_x: sample.x.clone(),
        scored_y: sample.y.clone(),
    })
}

fn fit_custom(expression: &str, sample: &Sample) -> Result<Fitted, FitError> {
    let expr = CompiledExpression::compile(expression)?;
    let k = expr.param_count();
    let n = sample.len();
    if n < k {
        return Err(FitError::new(
            FitErrorKind::InsufficientData,
            format!("Expression has {k} parameters but the selection has only {n} points."),
        ));
    }

    let guess = vec![1.0; k];
    let opts = LmOptions::with_budget(CUSTOM_MAX_EVALUATIONS);
    let f = |x: f64, p: &[f64]| expr.eval(x, p);
    let lm = levenberg_marquardt(&f, &sample.x, &sample.y, &guess, &opts)?;

    Ok(Fitted {
        label: expr.display_label(),
        names: expr.param_names(),
        curve: FittedCurve::Custom(expr),
        values: lm.params,
        covariance: lm.covariance,
        scored_x: sample.x.clone(),
        scored_y: sample.y.clone(),
    })
}

fn matrix_rows(m: DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}
