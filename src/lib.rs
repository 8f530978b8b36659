//! `dataspec-fit` library crate.
//!
//! The binary (`dsfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the engine is reusable from a GUI/table frontend without touching the CLI
//! - code stays easy to navigate as the project grows
//!
//! The heart of the crate is [`engine::FitEngine`]: given two numeric columns,
//! an axis-range window, and a model choice (catalog name or custom formula),
//! it estimates parameters by least squares and reports goodness of fit.

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod engine;
pub mod error;
pub mod expr;
pub mod math;
pub mod models;
pub mod optim;
pub mod plot;
pub mod report;
pub mod score;
