//! Figure export: SVG through plotters, or the figure model as JSON.

use crate::error::FigureError;
use crate::figure::{BarSeries, Figure, Plot, PointSeries};
use crate::binning::{BinEdges, Grid2d};
use crate::palette::{self, NamedColor, DEFAULT_COLOR};
use anyhow::{Context, Result};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Resolution of saved figures
pub const FIGURE_DPI: f64 = 320.0;

/// Figure size in inches
const FIGURE_INCHES: (f64, f64) = (6.4, 4.8);

/// Width of the hist2d color bar panel in pixels
const COLORBAR_WIDTH: u32 = 300;

/// Steps drawn in the color bar gradient
const COLORBAR_STEPS: usize = 200;

const FONT: &str = "sans-serif";

/// Pixel size of a saved figure
pub fn figure_size() -> (u32, u32) {
    (
        (FIGURE_INCHES.0 * FIGURE_DPI).round() as u32,
        (FIGURE_INCHES.1 * FIGURE_DPI).round() as u32,
    )
}

fn rgb(color: NamedColor) -> RGBColor {
    RGBColor(color.rgb.0, color.rgb.1, color.rgb.2)
}

/// Write `figure` to `path`, choosing the format from the extension
pub fn save_figure<P: AsRef<Path>>(figure: &Figure, path: P) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "svg" => {
            let root = SVGBackend::new(path, figure_size()).into_drawing_area();
            draw_figure(figure, &root)
                .with_context(|| format!("Failed to draw figure: {}", path.display()))?;
            root.present()
                .with_context(|| format!("Failed to write figure: {}", path.display()))?;
        }
        "json" => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create figure file: {}", path.display()))?;
            serde_json::to_writer_pretty(BufWriter::new(file), figure)?;
        }
        _ => return Err(FigureError::UnsupportedFormat(path.to_path_buf()).into()),
    }
    Ok(())
}

/// Draw any figure onto a drawing area
pub fn draw_figure<DB: DrawingBackend>(figure: &Figure, root: &DrawingArea<DB, Shift>) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;
    match &figure.plot {
        Plot::Scatter { series } => draw_scatter(figure, series, root),
        Plot::Histogram { edges, series } => draw_histogram(figure, edges.as_ref(), series, root),
        Plot::Hist2d { grid } => draw_hist2d(figure, grid, root),
        Plot::Scatter3d { points, z_range } => {
            draw_scatter3d(figure, points, (z_range.min, z_range.max), root)
        }
    }
}

/// Cartesian chart with the figure's ranges, caption and axis titles
fn build_chart<'a, DB: DrawingBackend>(
    figure: &Figure,
    area: &'a DrawingArea<DB, Shift>,
) -> Result<ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>>
where
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(area);
    builder.margin(30).x_label_area_size(100).y_label_area_size(130);
    if let Some(ref title) = figure.title {
        builder.caption(title, (FONT, 56));
    }
    let mut chart = builder.build_cartesian_2d(
        figure.x_range.min..figure.x_range.max,
        figure.y_range.min..figure.y_range.max,
    )?;

    {
        let mut mesh = chart.configure_mesh();
        mesh.label_style((FONT, 30)).axis_desc_style((FONT, 36));
        if let Some(ref label) = figure.x_label {
            mesh.x_desc(label.as_str());
        }
        if let Some(ref label) = figure.y_label {
            mesh.y_desc(label.as_str());
        }
        mesh.draw()?;
    }
    Ok(chart)
}

fn draw_legend<'a, DB: DrawingBackend + 'a>(
    chart: &mut ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    chart
        .configure_series_labels()
        .label_font((FONT, 30))
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;
    Ok(())
}

fn draw_scatter<DB: DrawingBackend>(
    figure: &Figure,
    series: &[PointSeries],
    root: &DrawingArea<DB, Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let mut chart = build_chart(figure, root)?;
    let (x, y) = (figure.x_range, figure.y_range);
    let visible = |&&(px, py): &&(f64, f64)| {
        px >= x.min.min(x.max) && px <= x.max.max(x.min) && py >= y.min.min(y.max) && py <= y.max.max(y.min)
    };

    for s in series {
        let color = rgb(s.color);
        chart
            .draw_series(s.points.iter().filter(visible).map(|&p| Circle::new(p, 4, color.filled())))?
            .label(s.name.as_str())
            .legend(move |(lx, ly)| Circle::new((lx + 10, ly), 8, color.filled()));
    }

    if figure.legend {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn draw_histogram<DB: DrawingBackend>(
    figure: &Figure,
    edges: Option<&BinEdges>,
    series: &[BarSeries],
    root: &DrawingArea<DB, Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let mut chart = build_chart(figure, root)?;
    let Some(edges) = edges else {
        // Nothing to bin; axes only
        return Ok(());
    };

    let (x, y) = (figure.x_range, figure.y_range);
    let n = series.len().max(1) as f64;
    // Grouped bars share 80% of each bin, a lone series fills it
    let (pad, bar_w) = if series.len() > 1 {
        (edges.width * 0.1, edges.width * 0.8 / n)
    } else {
        (0.0, edges.width)
    };
    let base = 0f64.max(y.min);

    for (k, s) in series.iter().enumerate() {
        let color = rgb(s.color);
        let bars = s.counts.iter().enumerate().filter_map(|(i, &count)| {
            let x0 = (edges.edge(i) + pad + k as f64 * bar_w).max(x.min);
            let x1 = (edges.edge(i) + pad + (k + 1) as f64 * bar_w).min(x.max);
            let top = (count as f64).min(y.max);
            (count > 0 && x1 > x0 && top > base)
                .then(|| Rectangle::new([(x0, base), (x1, top)], color.filled()))
        });
        chart
            .draw_series(bars)?
            .label(s.name.as_str())
            .legend(move |(lx, ly)| Rectangle::new([(lx, ly - 8), (lx + 20, ly + 8)], color.filled()));
    }

    if figure.legend {
        draw_legend(&mut chart)?;
    }
    Ok(())
}

fn draw_hist2d<DB: DrawingBackend>(figure: &Figure, grid: &Grid2d, root: &DrawingArea<DB, Shift>) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let (width, _) = root.dim_in_pixel();
    let (heat_area, bar_area) = root.split_horizontally(width.saturating_sub(COLORBAR_WIDTH));

    let mut chart = build_chart(figure, &heat_area)?;
    let max = grid.max_count();
    let cells = grid.cells().map(|(i, j, count)| {
        let (r, g, b) = palette::density_color(palette::log_norm(count, max));
        Rectangle::new(
            [
                (grid.x.edge(i), grid.y.edge(j)),
                (grid.x.edge(i + 1), grid.y.edge(j + 1)),
            ],
            RGBColor(r, g, b).filled(),
        )
    });
    chart.draw_series(cells)?;

    // Color bar on a log scale from 1 to the densest cell
    let top = (max as f64).max(2.0);
    let mut bar = ChartBuilder::on(&bar_area)
        .margin_top(60)
        .margin_bottom(130)
        .margin_left(20)
        .margin_right(20)
        .x_label_area_size(0)
        .y_label_area_size(110)
        .build_cartesian_2d(0f64..1f64, (1f64..top).log_scale())?;
    bar.configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(0)
        .label_style((FONT, 26))
        .draw()?;

    let steps = (0..COLORBAR_STEPS).map(|k| {
        let lo = top.powf(k as f64 / COLORBAR_STEPS as f64);
        let hi = top.powf((k + 1) as f64 / COLORBAR_STEPS as f64);
        let (r, g, b) = palette::density_color((k as f64 + 0.5) / COLORBAR_STEPS as f64);
        Rectangle::new([(0.0, lo), (1.0, hi)], RGBColor(r, g, b).filled())
    });
    bar.draw_series(steps)?;
    Ok(())
}

fn draw_scatter3d<DB: DrawingBackend>(
    figure: &Figure,
    points: &[[f64; 3]],
    z_range: (f64, f64),
    root: &DrawingArea<DB, Shift>,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    // plotters' vertical axis is y, so the third column goes there
    let mut chart = ChartBuilder::on(root).margin(40).build_cartesian_3d(
        figure.x_range.min..figure.x_range.max,
        z_range.0..z_range.1,
        figure.y_range.min..figure.y_range.max,
    )?;
    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.35;
        pb.scale = 0.8;
        pb.into_matrix()
    });
    chart.configure_axes().label_style((FONT, 24)).draw()?;

    let color = rgb(DEFAULT_COLOR);
    chart.draw_series(
        points
            .iter()
            .map(|p| Circle::new((p[0], p[2], p[1]), 3, color.filled())),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::AxisRange;
    use crate::palette::MISC_COLOR;
    use tempfile::TempDir;

    fn histogram_figure() -> Figure {
        let edges = BinEdges::spanning([0.0, 10.0], 5);
        Figure {
            title: None,
            x_label: Some("speed".into()),
            y_label: None,
            x_range: AxisRange::new(0.0, 10.0),
            y_range: AxisRange::new(0.0, 3.0),
            legend: true,
            plot: Plot::Histogram {
                edges,
                series: vec![
                    BarSeries { name: "a (7)".into(), color: DEFAULT_COLOR, counts: vec![1, 5, 0, 0, 1] },
                    BarSeries { name: "miscellaneous (2)".into(), color: MISC_COLOR, counts: vec![0, 0, 2, 0, 0] },
                ],
            },
        }
    }

    #[test]
    fn test_figure_size_is_high_resolution() {
        assert_eq!(figure_size(), (2048, 1536));
    }

    #[test]
    fn test_save_histogram_svg() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hist.svg");
        save_figure(&histogram_figure(), &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("miscellaneous (2)"));
    }

    #[test]
    fn test_save_labeled_scatter_svg_with_legend() {
        let figure = Figure {
            title: None,
            x_label: Some("delta".into()),
            y_label: Some("load".into()),
            x_range: AxisRange::new(-5.0, 5.0),
            y_range: AxisRange::new(-2.5, 2.5),
            legend: true,
            plot: Plot::Scatter {
                series: vec![
                    PointSeries { name: "east (2)".into(), color: DEFAULT_COLOR, points: vec![(-4.0, -1.0), (1.0, 2.0)] },
                    PointSeries { name: "miscellaneous (1)".into(), color: MISC_COLOR, points: vec![(3.0, -2.0)] },
                ],
            },
        };
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("scatter.svg");
        save_figure(&figure, &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("east (2)"));
        assert!(svg.contains("miscellaneous (1)"));
    }

    #[test]
    fn test_save_json() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hist.json");
        save_figure(&histogram_figure(), &path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["plot"]["kind"], "histogram");
        assert_eq!(value["plot"]["series"][1]["color"], "cyan");
    }

    #[test]
    fn test_unsupported_extension() {
        let tmp = TempDir::new().unwrap();
        let err = save_figure(&histogram_figure(), tmp.path().join("hist.bmp")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FigureError>(),
            Some(FigureError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_save_hist2d_and_scatter3d_svg() {
        let tmp = TempDir::new().unwrap();
        let points: Vec<(f64, f64)> = (0..2000).map(|i| ((i % 37) as f64, (i % 11) as f64)).collect();
        let grid = Grid2d::from_points(&points, 20).unwrap();
        let hist2d = Figure {
            title: Some("N = 2000".into()),
            x_label: Some("x".into()),
            y_label: Some("y".into()),
            x_range: AxisRange::new(grid.x.start, grid.x.end()),
            y_range: AxisRange::new(grid.y.start, grid.y.end()),
            legend: false,
            plot: Plot::Hist2d { grid },
        };
        let path = tmp.path().join("density.svg");
        save_figure(&hist2d, &path).unwrap();
        assert!(path.exists());

        let cloud = Figure {
            title: None,
            x_label: None,
            y_label: None,
            x_range: AxisRange::new(0.0, 1.0),
            y_range: AxisRange::new(0.0, 1.0),
            legend: false,
            plot: Plot::Scatter3d {
                points: vec![[0.1, 0.2, 0.3], [0.9, 0.8, 0.7]],
                z_range: AxisRange::new(0.0, 1.0),
            },
        };
        let path = tmp.path().join("cloud.svg");
        save_figure(&cloud, &path).unwrap();
        assert!(path.exists());
    }
}
