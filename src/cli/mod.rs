//! Command-line parsing for the curve fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/math code.

use clap::{Parser, Subcommand};

use crate::domain::ModelId;
use crate::models::CatalogModel;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "dsfit", version, about = "Curve fitting over two-column numeric data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a synthetic sample, fit a model against it, and print the result.
    Fit(FitArgs),
    /// List the built-in model catalog.
    Models,
}

/// Options for `dsfit fit`.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Model to fit.
    #[arg(short = 'm', long, value_enum, default_value_t = ModelId::Gaussian)]
    pub model: ModelId,

    /// Custom formula, e.g. 'a*x**2 + b*x + c' (required with --model custom).
    #[arg(long)]
    pub expr: Option<String>,

    /// Model used to generate the sample (defaults to the fitted model,
    /// or gaussian when fitting a custom formula).
    #[arg(long, value_enum)]
    pub data: Option<CatalogModel>,

    /// Number of sample points.
    #[arg(short = 'n', long, default_value_t = 100)]
    pub points: usize,

    /// Standard deviation of the additive Gaussian noise.
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    /// Random seed for sample generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Minimum x of the generated grid.
    #[arg(long, default_value_t = -5.0, allow_hyphen_values = true)]
    pub x_min: f64,

    /// Maximum x of the generated grid.
    #[arg(long, default_value_t = 5.0, allow_hyphen_values = true)]
    pub x_max: f64,

    /// Restrict the fitted selection to x >= FROM.
    #[arg(long, allow_hyphen_values = true)]
    pub from: Option<f64>,

    /// Restrict the fitted selection to x <= TO.
    #[arg(long, allow_hyphen_values = true)]
    pub to: Option<f64>,

    /// Report the ±95% confidence half-width alongside the parameters.
    #[arg(long)]
    pub ci: bool,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}
