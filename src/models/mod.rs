//! The built-in model catalog.
//!
//! Each catalog entry bundles everything the engine needs to fit it:
//! the curve function, parameter names, an initial-guess heuristic, and an
//! optional domain filter. Custom formula models live in [`crate::expr`].

pub mod catalog;

pub use catalog::*;
