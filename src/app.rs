//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - generates the synthetic sample
//! - runs the fitting engine
//! - prints the result and the optional plot

use clap::Parser;

use crate::cli::{Cli, Command, FitArgs};
use crate::data::SyntheticConfig;
use crate::domain::{FitRequest, ModelId, RangeBounds};
use crate::error::FitError;
use crate::models::CatalogModel;

pub mod pipeline;

/// Entry point for the `dsfit` binary.
pub fn run() -> Result<(), FitError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Models => {
            print_models();
            Ok(())
        }
    }
}

fn handle_fit(args: FitArgs) -> Result<(), FitError> {
    let data_model = args
        .data
        .or_else(|| args.model.catalog())
        .unwrap_or(CatalogModel::Gaussian);

    let synthetic = SyntheticConfig {
        model: data_model,
        params: Vec::new(),
        count: args.points,
        x_min: args.x_min,
        x_max: args.x_max,
        noise: args.noise,
        seed: args.seed,
    };

    let mut bounds = RangeBounds::full();
    if let Some(from) = args.from {
        bounds.x_min = from;
    }
    if let Some(to) = args.to {
        bounds.x_max = to;
    }

    let request = FitRequest {
        model: args.model,
        expression: args.expr.clone(),
        confidence_band: args.ci,
    };

    let run = pipeline::run_fit(&pipeline::RunConfig {
        synthetic,
        bounds,
        request,
    })?;

    println!("{}", crate::report::format_sample_header(run.selected, &run.xs));
    print!("{}", crate::report::format_fit_result(&run.result));

    if args.plot && !args.no_plot {
        let plot = crate::plot::render_ascii_plot(
            &run.xs,
            &run.ys,
            Some(&run.result),
            args.width,
            args.height,
        );
        println!("{plot}");
    }

    Ok(())
}

fn print_models() {
    for id in ModelId::ALL {
        match id.catalog() {
            Some(model) => {
                println!(
                    "{:<12} {:<20} params: {}",
                    id.as_str(),
                    model.display_name(),
                    model.param_names().join(", ")
                );
            }
            None => {
                println!("{:<12} {:<20} params: from the formula (use --expr)", id.as_str(), "Custom formula");
            }
        }
    }
}
