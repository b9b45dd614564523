//! Interactive figure display in the terminal using ratatui.

use crate::binning::BinEdges;
use crate::figure::{AxisRange, BarSeries, Figure, Plot};
use crate::palette::{self, NamedColor, DEFAULT_COLOR};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    prelude::CrosstermBackend,
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph},
    Frame, Terminal,
};
use std::io;

/// Intensity levels a density grid is quantized into
const DENSITY_LEVELS: usize = 6;

/// Viewing angles for the 3D projection (radians)
const YAW: f64 = 0.6;
const PITCH: f64 = 0.35;

/// Bounds of the projected 3D scene
const PROJECTED_BOUNDS: [f64; 2] = [-1.6, 1.6];

fn to_color(color: NamedColor) -> Color {
    Color::Rgb(color.rgb.0, color.rgb.1, color.rgb.2)
}

/// One drawable dataset in terminal coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSeries {
    pub name: Option<String>,
    pub color: Color,
    pub graph: GraphType,
    pub marker: Marker,
    pub points: Vec<(f64, f64)>,
}

/// A figure flattened into what the terminal chart can draw
#[derive(Debug, Clone, PartialEq)]
pub struct ChartView {
    pub title: String,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub show_axes: bool,
    pub legend: bool,
    pub series: Vec<ViewSeries>,
    /// Color bar entries `(lower bound label, color)` for density plots
    pub colorbar: Vec<(String, Color)>,
}

impl ChartView {
    pub fn from_figure(figure: &Figure) -> Self {
        let mut view = Self {
            title: figure.title.clone().unwrap_or_default(),
            x_label: figure.x_label.clone(),
            y_label: figure.y_label.clone(),
            x_bounds: [figure.x_range.min, figure.x_range.max],
            y_bounds: [figure.y_range.min, figure.y_range.max],
            show_axes: true,
            legend: figure.legend,
            series: Vec::new(),
            colorbar: Vec::new(),
        };

        match &figure.plot {
            Plot::Scatter { series } => {
                view.series = series
                    .iter()
                    .map(|s| ViewSeries {
                        name: Some(s.name.clone()),
                        color: to_color(s.color),
                        graph: GraphType::Scatter,
                        marker: Marker::Braille,
                        points: s.points.clone(),
                    })
                    .collect();
            }
            Plot::Histogram { edges, series } => {
                if let Some(edges) = edges {
                    view.series = histogram_bars(edges, series, figure.y_range);
                }
            }
            Plot::Hist2d { grid } => {
                let max = grid.max_count();
                let mut levels: Vec<Vec<(f64, f64)>> = vec![Vec::new(); DENSITY_LEVELS];
                for (i, j, count) in grid.cells() {
                    levels[density_level(count, max)].push((
                        grid.x.edge(i) + grid.x.width / 2.0,
                        grid.y.edge(j) + grid.y.width / 2.0,
                    ));
                }
                view.series = levels
                    .into_iter()
                    .enumerate()
                    .map(|(level, points)| ViewSeries {
                        name: None,
                        color: level_color(level),
                        graph: GraphType::Scatter,
                        marker: Marker::Block,
                        points,
                    })
                    .collect();
                view.colorbar = (0..DENSITY_LEVELS)
                    .rev()
                    .map(|level| {
                        let lower = (max as f64).powf(level as f64 / DENSITY_LEVELS as f64);
                        (format!(">= {:.0}", lower.max(1.0)), level_color(level))
                    })
                    .collect();
            }
            Plot::Scatter3d { points, z_range } => {
                view.show_axes = false;
                view.x_bounds = PROJECTED_BOUNDS;
                view.y_bounds = PROJECTED_BOUNDS;
                view.series = vec![ViewSeries {
                    name: None,
                    color: to_color(DEFAULT_COLOR),
                    graph: GraphType::Scatter,
                    marker: Marker::Braille,
                    points: points
                        .iter()
                        .map(|p| project(*p, &[figure.x_range, figure.y_range, *z_range]))
                        .collect(),
                }];
            }
        }
        view
    }
}

/// One bar per non-empty bin, offset within the bin per series
fn histogram_bars(edges: &BinEdges, series: &[BarSeries], y_range: AxisRange) -> Vec<ViewSeries> {
    let n = series.len().max(1) as f64;
    series
        .iter()
        .enumerate()
        .map(|(k, s)| ViewSeries {
            name: Some(s.name.clone()),
            color: to_color(s.color),
            graph: GraphType::Bar,
            marker: Marker::HalfBlock,
            points: s
                .counts
                .iter()
                .enumerate()
                .filter(|(_, c)| **c > 0)
                .map(|(i, &c)| {
                    let x = edges.edge(i) + edges.width * (k as f64 + 0.5) / n;
                    (x, (c as f64).min(y_range.max))
                })
                .collect(),
        })
        .collect()
}

fn density_level(count: u64, max: u64) -> usize {
    let t = palette::log_norm(count, max);
    ((t * DENSITY_LEVELS as f64) as usize).min(DENSITY_LEVELS - 1)
}

fn level_color(level: usize) -> Color {
    let (r, g, b) = palette::density_color((level as f64 + 0.5) / DENSITY_LEVELS as f64);
    Color::Rgb(r, g, b)
}

/// Rotate a normalized point by the fixed yaw/pitch and drop depth
fn project(p: [f64; 3], ranges: &[AxisRange; 3]) -> (f64, f64) {
    let norm = |v: f64, r: &AxisRange| {
        if r.span() > 0.0 {
            (v - r.min) / r.span() * 2.0 - 1.0
        } else {
            0.0
        }
    };
    let (x, y, z) = (norm(p[0], &ranges[0]), norm(p[1], &ranges[1]), norm(p[2], &ranges[2]));
    let u = x * YAW.cos() - y * YAW.sin();
    let depth = x * YAW.sin() + y * YAW.cos();
    let v = z * PITCH.cos() - depth * PITCH.sin();
    (u, v)
}

/// Compact tick label
fn format_tick(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(0.01..10_000.0).contains(&a) {
        format!("{:.1e}", v)
    } else {
        format!("{:.2}", v)
    }
}

fn axis_labels(bounds: [f64; 2]) -> Vec<Span<'static>> {
    let mid = (bounds[0] + bounds[1]) / 2.0;
    [bounds[0], mid, bounds[1]]
        .into_iter()
        .map(|v| Span::raw(format_tick(v)))
        .collect()
}

/// Render the chart, an optional color bar and the help bar
pub fn render(f: &mut Frame, view: &ChartView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(5), Constraint::Length(1)])
        .split(f.area());

    let (chart_area, bar_area): (Rect, Option<Rect>) = if view.colorbar.is_empty() {
        (rows[0], None)
    } else {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(16)])
            .split(rows[0]);
        (cols[0], Some(cols[1]))
    };

    let datasets: Vec<Dataset> = view
        .series
        .iter()
        .filter(|s| !s.points.is_empty())
        .map(|s| {
            let dataset = Dataset::default()
                .marker(s.marker)
                .graph_type(s.graph)
                .style(Style::default().fg(s.color))
                .data(&s.points);
            match s.name {
                Some(ref name) => dataset.name(name.as_str()),
                None => dataset,
            }
        })
        .collect();

    let mut x_axis = Axis::default().bounds(view.x_bounds);
    let mut y_axis = Axis::default().bounds(view.y_bounds);
    if view.show_axes {
        x_axis = x_axis
            .labels(axis_labels(view.x_bounds))
            .title(view.x_label.clone().unwrap_or_default())
            .style(Style::default().fg(Color::Gray));
        y_axis = y_axis
            .labels(axis_labels(view.y_bounds))
            .title(view.y_label.clone().unwrap_or_default())
            .style(Style::default().fg(Color::Gray));
    }

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .title(format!(" {} ", view.title))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .x_axis(x_axis)
        .y_axis(y_axis)
        .legend_position(view.legend.then_some(LegendPosition::TopRight))
        .hidden_legend_constraints((Constraint::Percentage(60), Constraint::Percentage(60)));
    f.render_widget(chart, chart_area);

    if let Some(area) = bar_area {
        let lines: Vec<Line> = view
            .colorbar
            .iter()
            .map(|(label, color)| {
                Line::from(vec![
                    Span::styled("██ ", Style::default().fg(*color)),
                    Span::raw(label.clone()),
                ])
            })
            .collect();
        let bar = Paragraph::new(lines).block(Block::default().title(" count ").borders(Borders::ALL));
        f.render_widget(bar, area);
    }

    let help = Paragraph::new(Line::from(vec![
        Span::styled(" q", Style::default().fg(Color::Yellow)),
        Span::raw(" quit"),
    ]));
    f.render_widget(help, rows[1]);
}

/// Draw until the user quits with `q` or `Esc`
fn run<B: Backend>(terminal: &mut Terminal<B>, view: &ChartView) -> Result<()> {
    loop {
        terminal.draw(|f| render(f, view))?;
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                return Ok(());
            }
        }
    }
}

/// Show `figure` full-screen, blocking until dismissed
pub fn show(figure: &Figure) -> Result<()> {
    let view = ChartView::from_figure(figure);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &view);

    // Restore terminal even if drawing failed
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binning::Grid2d;
    use crate::figure::PointSeries;
    use crate::palette::MISC_COLOR;
    use ratatui::backend::TestBackend;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn scatter_figure() -> Figure {
        Figure {
            title: None,
            x_label: Some("speed".into()),
            y_label: Some("load".into()),
            x_range: AxisRange::new(0.0, 10.0),
            y_range: AxisRange::new(0.0, 10.0),
            legend: true,
            plot: Plot::Scatter {
                series: vec![
                    PointSeries { name: "a (2)".into(), color: DEFAULT_COLOR, points: vec![(1.0, 1.0), (9.0, 9.0)] },
                    PointSeries { name: "miscellaneous (1)".into(), color: MISC_COLOR, points: vec![(5.0, 5.0)] },
                ],
            },
        }
    }

    #[test]
    fn test_scatter_view_keeps_series() {
        let view = ChartView::from_figure(&scatter_figure());
        assert_eq!(view.series.len(), 2);
        assert_eq!(view.series[1].color, Color::Rgb(0, 255, 255));
        assert!(view.legend && view.show_axes);
    }

    #[test]
    fn test_render_scatter_to_buffer() {
        let view = ChartView::from_figure(&scatter_figure());
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &view)).unwrap();
        let text = buffer_text(&terminal);
        assert!(text.contains("speed"));
        assert!(text.contains("quit"));
    }

    #[test]
    fn test_histogram_bars_clamped_to_axis() {
        let edges = BinEdges::spanning([0.0, 4.0], 2).unwrap();
        let series = vec![BarSeries { name: "x".into(), color: DEFAULT_COLOR, counts: vec![50, 0] }];
        let bars = histogram_bars(&edges, &series, AxisRange::new(0.0, 10.0));
        assert_eq!(bars[0].points, vec![(1.0, 10.0)]);
        assert_eq!(bars[0].graph, GraphType::Bar);
    }

    #[test]
    fn test_hist2d_view_has_colorbar() {
        let points: Vec<(f64, f64)> = (0..1500).map(|i| ((i % 50) as f64, (i % 7) as f64)).collect();
        let grid = Grid2d::from_points(&points, 10).unwrap();
        let cells = grid.cells().count();
        let figure = Figure {
            title: Some("N = 1500".into()),
            x_label: Some("x".into()),
            y_label: Some("y".into()),
            x_range: AxisRange::new(grid.x.start, grid.x.end()),
            y_range: AxisRange::new(grid.y.start, grid.y.end()),
            legend: false,
            plot: Plot::Hist2d { grid },
        };
        let view = ChartView::from_figure(&figure);
        assert_eq!(view.colorbar.len(), DENSITY_LEVELS);
        assert_eq!(view.series.iter().map(|s| s.points.len()).sum::<usize>(), cells);

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &view)).unwrap();
        assert!(buffer_text(&terminal).contains("N = 1500"));
    }

    #[test]
    fn test_projection_stays_in_bounds() {
        let ranges = [AxisRange::new(0.0, 1.0); 3];
        for p in [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [0.0, 1.0, 0.5], [1.0, 0.0, 1.0]] {
            let (u, v) = project(p, &ranges);
            assert!(u.abs() <= PROJECTED_BOUNDS[1] && v.abs() <= PROJECTED_BOUNDS[1]);
        }
    }

    #[test]
    fn test_density_level_range() {
        assert_eq!(density_level(1, 1000), 0);
        assert_eq!(density_level(1000, 1000), DENSITY_LEVELS - 1);
    }

    #[test]
    fn test_format_tick() {
        assert_eq!(format_tick(0.0), "0.00");
        assert_eq!(format_tick(12.5), "12.50");
        assert_eq!(format_tick(123456.0), "1.2e5");
    }
}
