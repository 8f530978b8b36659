//! Data acquisition: deterministic synthetic samples.

pub mod synthetic;

pub use synthetic::*;
