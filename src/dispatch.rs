//! Row filtering and selection of the single plot mode.

use crate::config::{Config, PlotMode, RowFilters, CONTROLLER_COLUMN, NUM_RTUS_COLUMN};
use crate::dataset::Dataset;
use crate::error::{DatasetError, FigureError};
use crate::figure::{self, Figure, HistogramOptions, Labels};
use num_format::{Locale, ToFormattedString};
use tracing::info;

fn filter_logged(data: Dataset, column: &str, target: i64) -> Result<Dataset, DatasetError> {
    info!(
        column,
        target,
        size = %data.row_count().to_formatted_string(&Locale::en),
        "before filtering"
    );
    let filtered = data.filter_eq(column, target as f64)?;
    info!(
        column,
        size = %filtered.row_count().to_formatted_string(&Locale::en),
        "after filtering"
    );
    Ok(filtered)
}

/// Apply the equality filters: RTU count first, then controller id
pub fn apply_filters(data: Dataset, filters: &RowFilters) -> Result<Dataset, DatasetError> {
    let data = match filters.num_rtus {
        Some(n) => filter_logged(data, NUM_RTUS_COLUMN, n)?,
        None => data,
    };
    match filters.controller {
        Some(id) => filter_logged(data, CONTROLLER_COLUMN, id),
        None => Ok(data),
    }
}

/// Build the figure for the configured mode, including axis limits
pub fn build_figure(data: &Dataset, config: &Config) -> Result<Figure, FigureError> {
    let labels = config.labels.as_deref().map(|column| Labels {
        column,
        cutoff: config.miscellaneous_cutoff,
    });

    let mut figure = match &config.mode {
        PlotMode::Scatter { x, y } => figure::scatter(data, x, y, labels)?,
        PlotMode::Histogram { column } => {
            let options = HistogramOptions {
                bins: config.histogram_bins,
                scale_down: config.scale_down.then_some(config.miscellaneous_cutoff),
            };
            figure::histogram(data, column, labels, options)?
        }
        PlotMode::Hist2d { x, y } => figure::hist2d(data, x, y, config.histogram_bins)?,
        // No limits or legend for the point cloud
        PlotMode::Scatter3d { x, y, z } => return figure::scatter3d(data, x, y, z),
    };

    figure.apply_limits(&config.limits);
    Ok(figure)
}
