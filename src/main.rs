//! distplot - exploratory distribution plots for tabular data.
//!
//! Reads a CSV file or a PostgreSQL table and renders a scatter plot,
//! histogram, 2D density histogram or 3D scatter plot, optionally colored
//! by a label column with rare labels grouped together.

mod binning;
mod config;
mod dataset;
mod dispatch;
mod display;
mod error;
mod figure;
mod grouping;
mod loader;
mod palette;
mod plot;

use anyhow::Result;
use clap::Parser;
use config::{Args, Config, Output, Source};
use dataset::Dataset;
use error::FigureError;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Load the configured source; the database path connects first and fails hard
async fn load(source: &Source) -> Result<Dataset> {
    match source {
        Source::Csv(path) => loader::load_csv(path),
        Source::Table { name, db } => {
            let client = loader::connect(db).await?;
            loader::load_table(&client, name).await
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args(Args::parse())?;

    let data = load(&config.source).await?;
    loader::describe(&data);
    let data = dispatch::apply_filters(data, &config.filters)?;
    loader::filter_stats(&data)?;

    let figure = match dispatch::build_figure(&data, &config) {
        Ok(figure) => figure,
        Err(FigureError::InsufficientData { rows, required }) => {
            error!(rows, required, "not enough rows for a 2D histogram");
            return Ok(ExitCode::from(1));
        }
        Err(e) => return Err(e.into()),
    };

    match config.output {
        Output::File(ref path) => {
            plot::save_figure(&figure, path)?;
            info!(path = %path.display(), points = figure.point_count(), "figure saved");
        }
        Output::Interactive => display::show(&figure)?,
    }

    Ok(ExitCode::SUCCESS)
}
