//! Shared "fit pipeline" logic.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! sample generation -> range selection -> fit
//!
//! The CLI front-end then focuses on presentation.

use crate::data::{generate, SyntheticConfig};
use crate::domain::{FitRequest, FitResult, RangeBounds};
use crate::engine::FitEngine;
use crate::error::FitError;

/// Everything one `dsfit fit` run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub synthetic: SyntheticConfig,
    pub bounds: RangeBounds,
    pub request: FitRequest,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Generated columns (before selection).
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    /// Rows inside the selection bounds.
    pub selected: usize,
    pub result: FitResult,
}

/// Execute the full pipeline and return the computed outputs.
pub fn run_fit(config: &RunConfig) -> Result<RunOutput, FitError> {
    let (xs, ys) = generate(&config.synthetic)?;

    let mut engine = FitEngine::new();
    let selected = engine.select_range(&xs, &ys, &config.bounds);
    let result = engine.fit(&config.request)?.clone();

    Ok(RunOutput {
        xs,
        ys,
        selected,
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelId;
    use crate::models::CatalogModel;

    fn config() -> RunConfig {
        RunConfig {
            synthetic: SyntheticConfig {
                model: CatalogModel::Gaussian,
                params: Vec::new(),
                count: 80,
                x_min: -5.0,
                x_max: 5.0,
                noise: 0.05,
                seed: 7,
            },
            bounds: RangeBounds::full(),
            request: FitRequest::catalog(ModelId::Gaussian).with_confidence_band(true),
        }
    }

    #[test]
    fn end_to_end_gaussian_run() {
        let run = run_fit(&config()).unwrap();
        assert_eq!(run.selected, 80);
        assert_eq!(run.result.model, "Gaussian");
        // Low noise: the fit should explain nearly all the variance.
        assert!(run.result.r_squared.unwrap() > 0.98);
        assert!(run.result.confidence_band.is_some());
    }

    #[test]
    fn selection_bounds_shrink_the_sample() {
        let mut cfg = config();
        cfg.bounds.x_min = 0.0;
        let run = run_fit(&cfg).unwrap();
        assert!(run.selected < 80);
        assert_eq!(run.xs.len(), 80);
        assert!(run.result.curve_x.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn custom_formula_runs_through_the_pipeline() {
        let mut cfg = config();
        cfg.synthetic.model = CatalogModel::Linear;
        cfg.request = FitRequest::custom("a*x + b");
        let run = run_fit(&cfg).unwrap();
        assert_eq!(run.result.model, "Custom: a*x + b");
        assert!((run.result.params[0].1 - 2.0).abs() < 0.1);
        assert!((run.result.params[1].1 - 1.0).abs() < 0.1);
    }
}
