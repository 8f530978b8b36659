//! Iterative nonlinear least-squares.
//!
//! The catalog's peak-shaped models and all custom formula models are
//! nonlinear in their parameters, so they go through the damped Gauss-Newton
//! (Levenberg-Marquardt) solver in [`lm`] instead of a direct solve.

pub mod lm;

pub use lm::*;
