//! Backend-independent figures built from a dataset for each plot mode.

use crate::binning::{BinEdges, Grid2d};
use crate::config::PlotLimitArgs;
use crate::dataset::Dataset;
use crate::error::FigureError;
use crate::grouping::{self, LabelGroup};
use crate::palette::{NamedColor, DEFAULT_COLOR};
use serde::Serialize;
use tracing::info;

/// Fewest rows with both values present that a 2D histogram accepts
pub const HIST2D_MIN_ROWS: usize = 1000;

/// Most rows drawn by a 3D scatter plot
pub const SCATTER3D_MAX_ROWS: usize = 100_000;

/// Fraction of the data span added on each side of an automatic axis
const AXIS_MARGIN: f64 = 0.05;

/// Closed axis interval
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Span of the finite `values`, padded by a small margin
    pub fn padded<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let bounds = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });
        match bounds {
            None => Self::new(0.0, 1.0),
            Some((lo, hi)) if lo == hi => Self::new(lo - 0.5, hi + 0.5),
            Some((lo, hi)) => {
                let pad = (hi - lo) * AXIS_MARGIN;
                Self::new(lo - pad, hi + pad)
            }
        }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }
}

/// Named, colored set of 2D points
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointSeries {
    pub name: String,
    pub color: NamedColor,
    pub points: Vec<(f64, f64)>,
}

/// Named, colored bin counts sharing the figure's bin edges
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarSeries {
    pub name: String,
    pub color: NamedColor,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Plot {
    Scatter {
        series: Vec<PointSeries>,
    },
    Histogram {
        edges: Option<BinEdges>,
        series: Vec<BarSeries>,
    },
    Hist2d {
        grid: Grid2d,
    },
    Scatter3d {
        points: Vec<[f64; 3]>,
        z_range: AxisRange,
    },
}

/// Everything a backend needs to draw one plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Figure {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_range: AxisRange,
    pub y_range: AxisRange,
    pub legend: bool,
    pub plot: Plot,
}

impl Figure {
    /// Override automatic axis ranges with any configured limits
    pub fn apply_limits(&mut self, limits: &PlotLimitArgs) {
        if let Some(v) = limits.xmin {
            self.x_range.min = v;
        }
        if let Some(v) = limits.xmax {
            self.x_range.max = v;
        }
        if let Some(v) = limits.ymin {
            self.y_range.min = v;
        }
        if let Some(v) = limits.ymax {
            self.y_range.max = v;
        }
    }

    /// Number of data points carried by the figure
    pub fn point_count(&self) -> usize {
        match &self.plot {
            Plot::Scatter { series } => series.iter().map(|s| s.points.len()).sum(),
            Plot::Histogram { series, .. } => series
                .iter()
                .map(|s| s.counts.iter().sum::<u64>() as usize)
                .sum(),
            Plot::Hist2d { grid } => grid.counts.iter().sum::<u64>() as usize,
            Plot::Scatter3d { points, .. } => points.len(),
        }
    }
}

/// Optional label coloring
#[derive(Debug, Clone, Copy)]
pub struct Labels<'a> {
    pub column: &'a str,
    pub cutoff: f64,
}

fn groups_for(data: &Dataset, labels: Labels<'_>) -> Result<Vec<LabelGroup>, FigureError> {
    let keys = data.label_keys(labels.column)?;
    Ok(grouping::group_by_label(&keys, data.row_count(), labels.cutoff))
}

/// 2D scatter, one series per label group when labeled
pub fn scatter(data: &Dataset, x: &str, y: &str, labels: Option<Labels<'_>>) -> Result<Figure, FigureError> {
    let xs = data.numeric(x)?;
    let ys = data.numeric(y)?;
    let points_of = |rows: &mut dyn Iterator<Item = usize>| -> Vec<(f64, f64)> {
        rows.filter_map(|r| Some((xs[r]?, ys[r]?))).collect()
    };

    let series: Vec<PointSeries> = match labels {
        Some(labels) => groups_for(data, labels)?
            .into_iter()
            .map(|g| PointSeries {
                points: points_of(&mut g.rows.iter().copied()),
                name: g.name,
                color: g.color,
            })
            .collect(),
        None => vec![PointSeries {
            name: y.to_string(),
            color: DEFAULT_COLOR,
            points: points_of(&mut (0..data.row_count())),
        }],
    };

    let all = || series.iter().flat_map(|s| s.points.iter());
    Ok(Figure {
        title: None,
        x_label: Some(x.to_string()),
        y_label: Some(y.to_string()),
        x_range: AxisRange::padded(all().map(|p| p.0)),
        y_range: AxisRange::padded(all().map(|p| p.1)),
        legend: labels.is_some(),
        plot: Plot::Scatter { series },
    })
}

/// Histogram settings
#[derive(Debug, Clone, Copy)]
pub struct HistogramOptions {
    pub bins: usize,
    /// Clamp the y axis to `cutoff * rows`
    pub scale_down: Option<f64>,
}

/// 1D histogram; labeled data becomes grouped bars sharing one set of bins
pub fn histogram(
    data: &Dataset,
    column: &str,
    labels: Option<Labels<'_>>,
    options: HistogramOptions,
) -> Result<Figure, FigureError> {
    let values = data.numeric(column)?;
    let values_of = |rows: &[usize]| -> Vec<f64> { rows.iter().filter_map(|&r| values[r]).collect() };

    let groups: Vec<(String, NamedColor, Vec<f64>)> = match labels {
        Some(labels) => groups_for(data, labels)?
            .into_iter()
            .map(|g| {
                let v = values_of(&g.rows);
                (g.name, g.color, v)
            })
            .collect(),
        None => vec![(
            column.to_string(),
            DEFAULT_COLOR,
            values.iter().flatten().copied().collect(),
        )],
    };

    let edges = BinEdges::spanning(groups.iter().flat_map(|g| g.2.iter().copied()), options.bins);
    let series: Vec<BarSeries> = groups
        .into_iter()
        .map(|(name, color, v)| BarSeries {
            name,
            color,
            counts: edges.map(|e| e.counts(v.iter().copied())).unwrap_or_default(),
        })
        .collect();

    let x_range = edges
        .map(|e| AxisRange::new(e.start, e.end()))
        .unwrap_or_else(|| AxisRange::new(0.0, 1.0));
    let tallest = series.iter().flat_map(|s| s.counts.iter().copied()).max().unwrap_or(0);
    let mut y_range = AxisRange::new(0.0, (tallest as f64 * (1.0 + AXIS_MARGIN)).max(1.0));
    if let Some(cutoff) = options.scale_down {
        // Truncates tall bars; the counts themselves are untouched
        y_range.max = ((data.row_count() as f64 * cutoff).floor()).max(1.0);
    }

    Ok(Figure {
        title: None,
        x_label: Some(column.to_string()),
        y_label: None,
        x_range,
        y_range,
        legend: true,
        plot: Plot::Histogram { edges, series },
    })
}

/// Log-normalized 2D density histogram; needs [`HIST2D_MIN_ROWS`] complete rows
pub fn hist2d(data: &Dataset, x: &str, y: &str, bins: usize) -> Result<Figure, FigureError> {
    let complete = data.drop_nulls(&[x, y])?;
    let rows = complete.row_count();
    if rows < HIST2D_MIN_ROWS {
        return Err(FigureError::InsufficientData {
            rows,
            required: HIST2D_MIN_ROWS,
        });
    }

    let xs = complete.numeric(x)?;
    let ys = complete.numeric(y)?;
    let points: Vec<(f64, f64)> = xs.iter().zip(ys).filter_map(|(a, b)| Some(((*a)?, (*b)?))).collect();
    let grid = Grid2d::from_points(&points, bins).ok_or(FigureError::InsufficientData {
        rows: 0,
        required: HIST2D_MIN_ROWS,
    })?;

    Ok(Figure {
        title: Some(format!("N = {}", rows)),
        x_label: Some(x.to_string()),
        y_label: Some(y.to_string()),
        x_range: AxisRange::new(grid.x.start, grid.x.end()),
        y_range: AxisRange::new(grid.y.start, grid.y.end()),
        legend: false,
        plot: Plot::Hist2d { grid },
    })
}

/// 3D point cloud of the first [`SCATTER3D_MAX_ROWS`] complete rows
pub fn scatter3d(data: &Dataset, x: &str, y: &str, z: &str) -> Result<Figure, FigureError> {
    let complete = data.drop_nulls(&[x, y, z])?.head(SCATTER3D_MAX_ROWS);
    info!(rows = complete.row_count(), "scatter3d points");

    let (xs, ys, zs) = (complete.numeric(x)?, complete.numeric(y)?, complete.numeric(z)?);
    let points: Vec<[f64; 3]> = (0..complete.row_count())
        .filter_map(|r| Some([xs[r]?, ys[r]?, zs[r]?]))
        .collect();

    Ok(Figure {
        title: None,
        x_label: None,
        y_label: None,
        x_range: AxisRange::padded(points.iter().map(|p| p[0])),
        y_range: AxisRange::padded(points.iter().map(|p| p[1])),
        legend: false,
        plot: Plot::Scatter3d {
            z_range: AxisRange::padded(points.iter().map(|p| p[2])),
            points,
        },
    })
}
