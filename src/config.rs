//! Command-line arguments and the resolved, immutable run configuration.

use crate::error::ConfigError;
use clap::{ArgGroup, Args as ClapArgs, Parser};
use std::path::PathBuf;

/// Table read when `--table` is given without a name
pub const DEFAULT_TABLE: &str = "car_data_demo";

/// Column matched by `--filter-num-rtus`
pub const NUM_RTUS_COLUMN: &str = "num_rtus";

/// Column matched by `--filter-controller`
pub const CONTROLLER_COLUMN: &str = "controller_id";

/// Plot the distribution of metrics read from a CSV file or a PostgreSQL table
#[derive(Parser, Debug)]
#[command(name = "distplot")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("source").required(true).args(["csv", "table"])))]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["scatter", "histogram", "hist2d", "scatter3d"])
))]
pub struct Args {
    /// Read data from a CSV file (first line is the header)
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Read data from a database table
    #[arg(long, value_name = "NAME", num_args = 0..=1, default_missing_value = DEFAULT_TABLE)]
    pub table: Option<String>,

    /// Scatter plot of two columns
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    pub scatter: Option<Vec<String>>,

    /// Histogram of one column
    #[arg(long, value_name = "COL")]
    pub histogram: Option<String>,

    /// Log-scaled 2D density histogram of two columns
    #[arg(long, num_args = 2, value_names = ["X", "Y"])]
    pub hist2d: Option<Vec<String>>,

    /// 3D scatter plot of three columns
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"])]
    pub scatter3d: Option<Vec<String>>,

    /// Number of bins (per axis for hist2d)
    #[arg(long, default_value = "100", value_parser = clap::value_parser!(u32).range(1..))]
    pub histogram_bins: u32,

    /// Keep only rows whose num_rtus equals this value
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub filter_num_rtus: Option<i64>,

    /// Keep only rows whose controller_id equals this value
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub filter_controller: Option<i64>,

    /// Labels for labeled data (different colors on the plot)
    #[arg(long, value_name = "COL")]
    pub labels: Option<String>,

    /// Part of the data a label must have in order to be shown on its own
    #[arg(long, default_value = "0.001", value_name = "RATIO", allow_negative_numbers = true)]
    pub miscellaneous_cutoff: f64,

    /// Clamp the histogram y axis to the miscellaneous cutoff (default)
    #[arg(long, overrides_with = "do_not_scale_down")]
    pub scale_down: bool,

    /// Do not clamp the histogram y axis
    #[arg(long, overrides_with = "scale_down")]
    pub do_not_scale_down: bool,

    /// Write the figure to a file (.svg or .json) instead of displaying it
    #[arg(long, value_name = "PATH")]
    pub savefig: Option<PathBuf>,

    #[command(flatten)]
    pub limits: PlotLimitArgs,

    #[command(flatten)]
    pub db: DbArgs,
}

/// Axis range limits shared by the 2D plots
#[derive(ClapArgs, Debug, Clone, Copy, Default, PartialEq)]
#[command(next_help_heading = "Plot limits")]
pub struct PlotLimitArgs {
    /// Lower bound of the x axis
    #[arg(long, allow_negative_numbers = true)]
    pub xmin: Option<f64>,

    /// Upper bound of the x axis
    #[arg(long, allow_negative_numbers = true)]
    pub xmax: Option<f64>,

    /// Lower bound of the y axis
    #[arg(long, allow_negative_numbers = true)]
    pub ymin: Option<f64>,

    /// Upper bound of the y axis
    #[arg(long, allow_negative_numbers = true)]
    pub ymax: Option<f64>,
}

/// Database connection parameters
#[derive(ClapArgs, Debug, Clone, PartialEq)]
#[command(next_help_heading = "Database")]
pub struct DbArgs {
    /// Database host
    #[arg(long, default_value = "localhost")]
    pub db_host: String,

    /// Database port
    #[arg(long, default_value = "5432")]
    pub db_port: u16,

    /// Database user
    #[arg(long, default_value = "postgres")]
    pub db_user: String,

    /// Database name
    #[arg(long, default_value = "postgres")]
    pub db_name: String,

    /// Database password
    #[arg(long, env = "PGPASSWORD", hide_env_values = true)]
    pub db_password: Option<String>,
}

/// Where the data comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Csv(PathBuf),
    Table { name: String, db: DbArgs },
}

/// The selected plot and its columns
#[derive(Debug, Clone, PartialEq)]
pub enum PlotMode {
    Scatter { x: String, y: String },
    Histogram { column: String },
    Hist2d { x: String, y: String },
    Scatter3d { x: String, y: String, z: String },
}

/// Equality filters, applied RTU count first
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RowFilters {
    pub num_rtus: Option<i64>,
    pub controller: Option<i64>,
}

/// Where the finished figure goes
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    File(PathBuf),
    Interactive,
}

/// Resolved run configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub source: Source,
    pub mode: PlotMode,
    pub histogram_bins: usize,
    pub filters: RowFilters,
    pub labels: Option<String>,
    pub miscellaneous_cutoff: f64,
    pub scale_down: bool,
    pub limits: PlotLimitArgs,
    pub output: Output,
}

impl Config {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        if !args.miscellaneous_cutoff.is_finite() || args.miscellaneous_cutoff < 0.0 {
            return Err(ConfigError::InvalidCutoff(args.miscellaneous_cutoff));
        }

        // clap's "source" group guarantees exactly one of these
        let source = match (args.csv, args.table) {
            (Some(path), _) => Source::Csv(path),
            (None, table) => Source::Table {
                name: table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
                db: args.db,
            },
        };

        // clap's "mode" group and num_args guarantee exactly one, correctly sized
        let mode = if let Some(cols) = args.scatter {
            let [x, y]: [String; 2] = take_columns(cols);
            PlotMode::Scatter { x, y }
        } else if let Some(cols) = args.hist2d {
            let [x, y]: [String; 2] = take_columns(cols);
            PlotMode::Hist2d { x, y }
        } else if let Some(cols) = args.scatter3d {
            let [x, y, z]: [String; 3] = take_columns(cols);
            PlotMode::Scatter3d { x, y, z }
        } else {
            PlotMode::Histogram {
                column: args.histogram.unwrap_or_default(),
            }
        };

        let output = match args.savefig {
            Some(path) => Output::File(path),
            None => Output::Interactive,
        };

        Ok(Self {
            source,
            mode,
            histogram_bins: args.histogram_bins as usize,
            filters: RowFilters {
                num_rtus: args.filter_num_rtus,
                controller: args.filter_controller,
            },
            labels: args.labels,
            miscellaneous_cutoff: args.miscellaneous_cutoff,
            // Flags override each other; neither given means on
            scale_down: !args.do_not_scale_down,
            limits: args.limits,
            output,
        })
    }
}

fn take_columns<const N: usize>(cols: Vec<String>) -> [String; N] {
    let mut iter = cols.into_iter();
    std::array::from_fn(|_| iter.next().unwrap_or_default())
}
