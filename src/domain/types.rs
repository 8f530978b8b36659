//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can
//! be:
//!
//! - used in-memory during fitting
//! - exported to JSON
//! - reloaded later for plotting or comparisons

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{FitError, FitErrorKind};
use crate::models::CatalogModel;

/// Model selector as it appears on the wire (CLI flag, request field).
///
/// Matching is exact: an unrecognized name is an error, never a silent
/// fallback to some prefix-similar model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    Linear,
    Polynomial2,
    Polynomial3,
    Exponential,
    Gaussian,
    Lorentzian,
    Voigt,
    /// User-supplied formula; requires an expression string alongside.
    Custom,
}

impl ModelId {
    /// Canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelId::Linear => "linear",
            ModelId::Polynomial2 => "polynomial2",
            ModelId::Polynomial3 => "polynomial3",
            ModelId::Exponential => "exponential",
            ModelId::Gaussian => "gaussian",
            ModelId::Lorentzian => "lorentzian",
            ModelId::Voigt => "voigt",
            ModelId::Custom => "custom",
        }
    }

    /// Resolve a wire name. Exact match only.
    pub fn parse(name: &str) -> Result<Self, FitError> {
        for id in Self::ALL {
            if name == id.as_str() {
                return Ok(id);
            }
        }
        Err(FitError::new(
            FitErrorKind::UnknownModel,
            format!(
                "Unknown model '{name}' (expected one of: linear, polynomial2, \
                 polynomial3, exponential, gaussian, lorentzian, voigt, custom)."
            ),
        ))
    }

    /// The catalog entry backing this id, `None` for `Custom`.
    pub fn catalog(self) -> Option<CatalogModel> {
        Some(match self {
            ModelId::Linear => CatalogModel::Linear,
            ModelId::Polynomial2 => CatalogModel::Polynomial2,
            ModelId::Polynomial3 => CatalogModel::Polynomial3,
            ModelId::Exponential => CatalogModel::Exponential,
            ModelId::Gaussian => CatalogModel::Gaussian,
            ModelId::Lorentzian => CatalogModel::Lorentzian,
            ModelId::Voigt => CatalogModel::Voigt,
            ModelId::Custom => return None,
        })
    }

    pub const ALL: [ModelId; 8] = [
        ModelId::Linear,
        ModelId::Polynomial2,
        ModelId::Polynomial3,
        ModelId::Exponential,
        ModelId::Gaussian,
        ModelId::Lorentzian,
        ModelId::Voigt,
        ModelId::Custom,
    ];
}

/// Inclusive rectangular selection over the data plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RangeBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl RangeBounds {
    /// The whole plane: every finite point is inside.
    pub fn full() -> Self {
        Self {
            x_min: f64::NEG_INFINITY,
            x_max: f64::INFINITY,
            y_min: f64::NEG_INFINITY,
            y_max: f64::INFINITY,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// A cleaned two-column sample, ready for fitting.
///
/// Construction drops rows with a non-finite coordinate and rows outside the
/// selection bounds; row order is otherwise preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Sample {
    pub fn from_columns(xs: &[f64], ys: &[f64], bounds: &RangeBounds) -> Self {
        let (x, y) = xs
            .iter()
            .zip(ys.iter())
            .filter(|&(&x, &y)| x.is_finite() && y.is_finite() && bounds.contains(x, y))
            .map(|(&x, &y)| (x, y))
            .unzip();
        Self { x, y }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// One fit invocation as understood by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitRequest {
    pub model: ModelId,
    /// Formula text, consulted only when `model` is `Custom`.
    pub expression: Option<String>,
    /// Whether to derive the ±95% half-width from the covariance.
    pub confidence_band: bool,
}

impl FitRequest {
    pub fn catalog(model: ModelId) -> Self {
        Self {
            model,
            expression: None,
            confidence_band: false,
        }
    }

    pub fn custom(expression: impl Into<String>) -> Self {
        Self {
            model: ModelId::Custom,
            expression: Some(expression.into()),
            confidence_band: false,
        }
    }

    pub fn with_confidence_band(mut self, on: bool) -> Self {
        self.confidence_band = on;
        self
    }
}

/// Everything a successful fit produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitResult {
    /// Display label, e.g. `Gaussian` or `Custom: a*x**2 + b`.
    pub model: String,
    /// `(name, value)` pairs in the model's declaration order.
    pub params: Vec<(String, f64)>,
    /// Fitted curve sampled at the selected x values, ascending.
    pub curve_x: Vec<f64>,
    /// Model evaluated at `curve_x`.
    pub curve_y: Vec<f64>,
    /// Parameter covariance (row-major), when residual degrees of freedom
    /// exist and the normal matrix was invertible.
    pub covariance: Option<Vec<Vec<f64>>>,
    /// Coefficient of determination; `None` when undefined (zero variance).
    pub r_squared: Option<f64>,
    /// ±95% half-width derived from the covariance, when requested.
    pub confidence_band: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_parse_is_exact() {
        assert_eq!(ModelId::parse("gaussian").unwrap(), ModelId::Gaussian);
        for bad in ["gauss", "Gaussian", "polynomial", "linear2", ""] {
            let err = ModelId::parse(bad).unwrap_err();
            assert_eq!(err.kind(), FitErrorKind::UnknownModel, "name: {bad}");
        }
    }

    #[test]
    fn wire_names_round_trip() {
        for id in ModelId::ALL {
            assert_eq!(ModelId::parse(id.as_str()).unwrap(), id);
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let b = RangeBounds {
            x_min: 0.0,
            x_max: 1.0,
            y_min: -1.0,
            y_max: 1.0,
        };
        assert!(b.contains(0.0, -1.0));
        assert!(b.contains(1.0, 1.0));
        assert!(!b.contains(1.0 + 1e-12, 0.0));
    }

    #[test]
    fn sample_drops_non_finite_and_out_of_range_rows() {
        let xs = [0.0, 1.0, f64::NAN, 3.0, 4.0];
        let ys = [1.0, f64::INFINITY, 2.0, 3.0, 4.0];
        let b = RangeBounds {
            x_min: 0.0,
            x_max: 3.5,
            y_min: f64::NEG_INFINITY,
            y_max: f64::INFINITY,
        };
        let s = Sample::from_columns(&xs, &ys, &b);
        assert_eq!(s.x, vec![0.0, 3.0]);
        assert_eq!(s.y, vec![1.0, 3.0]);
    }
}
