//! Chart rendering
//!
//! - `ChartRenderer`: the seam the pipeline draws through
//! - `PlottersRenderer`: bitmap output via plotters (grid composite or one frame per range)
//! - `animation`: frame assembly into a looping GIF and frame cleanup
//!
//! Axis ticks are restricted to integers; unused grid cells stay blank.

pub mod animation;
pub mod axis;

use crate::aggregate::YearRange;
use crate::config::PoolConfig;
use crate::encode::{marker_radius_px, ChartSpec};
use crate::error::{PoolError, Result};
use crate::palettes::{palette_registry, PaletteDefinition};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

pub use animation::{cleanup_frames, FrameAssembler, GifAssembler};
pub use axis::{axis_range, integer_ticks, IntegerAxis};

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Share of a panel's width reserved for the color bar
const COLORBAR_FRACTION: f64 = 0.16;

/// Number of bands in the color bar gradient
const COLORBAR_STEPS: u32 = 64;

const TITLE_PT: f64 = 12.0;
const AXIS_DESC_PT: f64 = 10.0;
const TICK_PT: f64 = 8.0;

/// Marker opacity for player labels
const LABEL_ALPHA: f64 = 0.7;

/// Fixed-column grid sized to fit exactly `n` panels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub cols: usize,
    pub rows: usize,
}

impl GridLayout {
    pub fn new(n_panels: usize, cols: usize) -> Self {
        let cols = cols.max(1);
        Self {
            cols,
            rows: n_panels.div_ceil(cols),
        }
    }

    /// Total cells, used or not
    pub fn cells(&self) -> usize {
        self.cols * self.rows
    }

    /// (row, col) of the i-th panel in row-major order
    pub fn position(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }
}

/// Result of drawing a grid composite
#[derive(Debug, Clone)]
pub struct GridOutcome {
    pub path: PathBuf,
    /// Ranges whose panel failed and was left blank
    pub failed: Vec<YearRange>,
}

/// Draws charts to image files
pub trait ChartRenderer {
    /// Draw every chart into one composite image
    fn render_grid(&self, charts: &[ChartSpec], path: &Path) -> Result<GridOutcome>;

    /// Draw one chart into its own image
    fn render_frame(&self, chart: &ChartSpec, path: &Path) -> Result<()>;
}

/// Pixel-level styling derived from the configuration for one resolution
#[derive(Debug, Clone)]
struct PanelStyle {
    dpi: u32,
    point_alpha: f64,
    label_pt: f64,
    max_ticks: usize,
}

impl PanelStyle {
    fn px(&self, pt: f64) -> f64 {
        pt * self.dpi as f64 / 72.0
    }
}

/// Renders charts with plotters' bitmap backend
#[derive(Debug, Clone)]
pub struct PlottersRenderer {
    grid_cols: usize,
    panel_size: (u32, u32),
    frame_size: (u32, u32),
    grid_style: PanelStyle,
    frame_style: PanelStyle,
}

impl PlottersRenderer {
    pub fn new(config: &PoolConfig) -> Self {
        let style = |dpi| PanelStyle {
            dpi,
            point_alpha: config.point_alpha,
            label_pt: config.label_font_pt,
            max_ticks: config.max_ticks,
        };
        Self {
            grid_cols: config.grid_cols,
            panel_size: config.panel_pixels(),
            frame_size: config.frame_pixels(),
            grid_style: style(config.grid_dpi),
            frame_style: style(config.frame_dpi),
        }
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render_grid(&self, charts: &[ChartSpec], path: &Path) -> Result<GridOutcome> {
        ensure_parent_dir(path)?;

        let layout = GridLayout::new(charts.len(), self.grid_cols);
        let (panel_w, panel_h) = self.panel_size;
        let canvas = (
            panel_w * layout.cols as u32,
            panel_h * layout.rows.max(1) as u32,
        );
        debug!(
            "Grid {}×{} ({} unused), canvas {}×{} px",
            layout.cols,
            layout.rows,
            layout.cells() - charts.len(),
            canvas.0,
            canvas.1
        );

        let composite_error = |e: &dyn std::fmt::Display| PoolError::Render {
            label: "grid".to_string(),
            message: e.to_string(),
        };

        let root = BitMapBackend::new(path, canvas).into_drawing_area();
        root.fill(&WHITE).map_err(|e| composite_error(&e))?;

        let cells = root.split_evenly((layout.rows.max(1), layout.cols));
        let mut failed = Vec::new();

        for (chart, cell) in charts.iter().zip(cells.iter()) {
            if let Err(e) = guarded_draw(&chart.range, || draw_chart(cell, chart, &self.grid_style))
            {
                error!("{}", e);
                failed.push(chart.range.clone());
                if let Err(e) = cell.fill(&WHITE) {
                    warn!("Could not blank failed panel {}: {}", chart.range, e);
                }
            }
        }

        root.present().map_err(|e| composite_error(&e))?;

        Ok(GridOutcome {
            path: path.to_path_buf(),
            failed,
        })
    }

    fn render_frame(&self, chart: &ChartSpec, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;
        guarded_draw(&chart.range, || {
            let root = BitMapBackend::new(path, self.frame_size).into_drawing_area();
            root.fill(&WHITE)?;
            draw_chart(&root, chart, &self.frame_style)?;
            root.present()?;
            Ok(())
        })
    }
}

/// Run a drawing closure, converting errors and panics into a render error for `range`
fn guarded_draw<F>(range: &YearRange, draw: F) -> Result<()>
where
    F: FnOnce() -> DrawResult<()>,
{
    let render_error = |message: String| PoolError::Render {
        label: range.to_string(),
        message,
    };

    match panic::catch_unwind(AssertUnwindSafe(draw)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(render_error(e.to_string())),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic while drawing".to_string());
            Err(render_error(message))
        }
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Draw one scatter panel plus its color bar into `area`
fn draw_chart<DB>(area: &DrawingArea<DB, Shift>, chart: &ChartSpec, style: &PanelStyle) -> DrawResult<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let (width, _) = area.dim_in_pixel();
    let bar_width = (width as f64 * COLORBAR_FRACTION) as u32;
    let (plot_area, bar_area) = area.split_horizontally(width.saturating_sub(bar_width));

    let x_axis = IntegerAxis::fit(chart.points.iter().map(|p| p.x), style.max_ticks);
    let y_axis = IntegerAxis::fit(chart.points.iter().map(|p| p.y), style.max_ticks);

    let tick_px = style.px(TICK_PT);
    let mut cc = ChartBuilder::on(&plot_area)
        .caption(&chart.title, ("sans-serif", style.px(TITLE_PT)))
        .margin(style.px(6.0) as u32)
        .x_label_area_size(style.px(AXIS_DESC_PT + TICK_PT + 10.0) as u32)
        .y_label_area_size(style.px(AXIS_DESC_PT + TICK_PT + 18.0) as u32)
        .build_cartesian_2d(x_axis, y_axis)?;

    cc.configure_mesh()
        .x_desc("Deaths")
        .y_desc("Points")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.0}", v))
        .label_style(("sans-serif", tick_px))
        .axis_desc_style(("sans-serif", style.px(AXIS_DESC_PT)))
        .bold_line_style(BLACK.mix(0.12))
        .light_line_style(TRANSPARENT)
        .draw()?;

    cc.draw_series(chart.points.iter().map(|p| {
        let [r, g, b] = p.color;
        let radius = marker_radius_px(p.size, style.dpi).round().max(1.0) as u32;
        Circle::new(
            (p.x, p.y),
            radius,
            RGBColor(r, g, b).mix(style.point_alpha).filled(),
        )
    }))?;

    let label_style = ("sans-serif", style.px(style.label_pt))
        .into_font()
        .color(&BLACK.mix(LABEL_ALPHA))
        .pos(Pos::new(HPos::Right, VPos::Bottom));
    cc.draw_series(
        chart
            .points
            .iter()
            .map(|p| Text::new(p.label.clone(), (p.x, p.y), label_style.clone())),
    )?;

    draw_colorbar(&bar_area, chart, style)?;
    Ok(())
}

/// Pixel placement of the color bar strip inside its area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColorbarGeometry {
    x0: i32,
    x1: i32,
    top: i32,
    bottom: i32,
}

impl ColorbarGeometry {
    fn within((w, h): (u32, u32)) -> Self {
        let (w, h) = (w as i32, h as i32);
        let x0 = w / 8;
        Self {
            x0,
            x1: x0 + (w / 6).max(4),
            top: h / 8,
            bottom: h - h / 6,
        }
    }

    fn span(&self) -> i32 {
        (self.bottom - self.top).max(1)
    }

    /// Pixel row for a position t ∈ [0, 1] along the bar, 0 at the bottom
    fn y_at(&self, t: f64) -> i32 {
        self.bottom - (t * self.span() as f64).round() as i32
    }
}

/// Vertical gradient strip labelled with the raw average rank bounds
fn draw_colorbar<DB>(area: &DrawingArea<DB, Shift>, chart: &ChartSpec, style: &PanelStyle) -> DrawResult<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let palette = palette_registry()
        .get(&chart.palette)
        .ok_or_else(|| format!("unknown palette '{}'", chart.palette))?;

    let bar = draw_colorbar_gradient(area, palette)?;

    let tick_font = ("sans-serif", style.px(TICK_PT))
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    for (t, value) in colorbar_ticks(chart.rank_bounds) {
        let y = bar.y_at(t);
        area.draw(&PathElement::new(vec![(bar.x1, y), (bar.x1 + 4, y)], BLACK))?;
        area.draw(&Text::new(format!("{:.1}", value), (bar.x1 + 6, y), tick_font.clone()))?;
    }

    let (w, _) = area.dim_in_pixel();
    let title_font = ("sans-serif", style.px(AXIS_DESC_PT))
        .into_font()
        .transform(FontTransform::Rotate270)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(
        "Avg. Rank",
        (w as i32 - style.px(AXIS_DESC_PT) as i32, (bar.top + bar.bottom) / 2),
        title_font,
    ))?;
    Ok(())
}

/// Palette gradient with an outline; the top of the bar is the worst (highest) rank
fn draw_colorbar_gradient<DB>(
    area: &DrawingArea<DB, Shift>,
    palette: &PaletteDefinition,
) -> DrawResult<ColorbarGeometry>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let bar = ColorbarGeometry::within(area.dim_in_pixel());
    for step in 0..COLORBAR_STEPS {
        let t0 = step as f64 / COLORBAR_STEPS as f64;
        let t1 = (step + 1) as f64 / COLORBAR_STEPS as f64;
        let [r, g, b] = palette.interpolate((t0 + t1) / 2.0);
        area.draw(&Rectangle::new(
            [(bar.x0, bar.y_at(t1)), (bar.x1, bar.y_at(t0))],
            RGBColor(r, g, b).filled(),
        ))?;
    }
    area.draw(&Rectangle::new(
        [(bar.x0, bar.top), (bar.x1, bar.bottom)],
        BLACK.stroke_width(1),
    ))?;
    Ok(bar)
}

/// (position along the bar in [0, 1], rank value) pairs for the color bar labels
fn colorbar_ticks(bounds: Option<(f64, f64)>) -> Vec<(f64, f64)> {
    match bounds {
        Some((lo, hi)) if hi > lo => vec![(0.0, lo), (0.5, (lo + hi) / 2.0), (1.0, hi)],
        Some((lo, _)) => vec![(0.5, lo)],
        None => Vec::new(),
    }
}
