//! Mathematical utilities: least squares, the Faddeeva function, and
//! small sample statistics.

pub mod faddeeva;
pub mod ols;
pub mod stats;

pub use faddeeva::*;
pub use ols::*;
pub use stats::*;
