//! Standings pipeline shared by both entry points
//!
//! 1. Load and validate the dataset (fatal on failure)
//! 2. Aggregate and encode one chart per cumulative year range
//! 3. Render, either as one grid composite or as frames assembled into a GIF
//!
//! Everything after loading is failure-isolated: a chart, the assembly step, or
//! a frame deletion can fail without stopping the run. Those failures are
//! collected in the returned [`RunReport`].

use crate::aggregate::{cumulative_ranges, summarize, YearRange};
use crate::config::{PoolConfig, RenderMode};
use crate::dataset::Dataset;
use crate::encode::ChartSpec;
use crate::error::{PoolError, Result};
use crate::render::{cleanup_frames, ChartRenderer, FrameAssembler, GifAssembler, PlottersRenderer};
use std::io;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// What a run produced and what went wrong along the way
#[derive(Debug, Default)]
pub struct RunReport {
    pub mode: RenderMode,
    /// Every cumulative range derived from the data, in year order
    pub ranges: Vec<YearRange>,
    /// Grid image or GIF, when one was written
    pub output: Option<PathBuf>,
    pub frames_written: usize,
    pub failed_ranges: Vec<YearRange>,
    pub assembly_error: Option<String>,
    pub cleanup_errors: Vec<(PathBuf, io::Error)>,
}

impl RunReport {
    fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// True when every range rendered and every follow-up step succeeded
    pub fn is_clean(&self) -> bool {
        self.output.is_some()
            && self.failed_ranges.is_empty()
            && self.assembly_error.is_none()
            && self.cleanup_errors.is_empty()
    }

    /// Console summary for the entry points
    pub fn print_summary(&self) {
        match &self.output {
            Some(path) => println!("✓ Visualization saved as {}", path.display()),
            None => println!("✗ No visualization was saved"),
        }
        if self.mode == RenderMode::Sequence {
            println!("  Frames rendered: {}/{}", self.frames_written, self.ranges.len());
        }
        if !self.failed_ranges.is_empty() {
            let labels: Vec<String> = self.failed_ranges.iter().map(|r| r.to_string()).collect();
            println!("  Failed year ranges: {}", labels.join(", "));
        }
        if let Some(e) = &self.assembly_error {
            println!("  Animation not created: {}", e);
        }
        for (path, e) in &self.cleanup_errors {
            println!("  Could not remove {}: {}", path.display(), e);
        }
        if self.is_clean() {
            println!("✓ All {} year range(s) rendered", self.ranges.len());
        } else if self.output.is_some() {
            println!("⚠ Completed with errors (see above)");
        }
    }
}

/// Load the configured input and render it with the bitmap renderer and GIF assembler
pub fn run(config: &PoolConfig) -> Result<RunReport> {
    config.validate()?;
    let dataset = Dataset::load(&config.input_path)?;
    run_with(&dataset, config, &PlottersRenderer::new(config), &GifAssembler)
}

/// Render an already-loaded dataset through the given renderer and assembler
pub fn run_with<R, A>(
    dataset: &Dataset,
    config: &PoolConfig,
    renderer: &R,
    assembler: &A,
) -> Result<RunReport>
where
    R: ChartRenderer,
    A: FrameAssembler,
{
    let mut report = RunReport::new(config.mode);
    report.ranges = cumulative_ranges(&dataset.years()?);
    info!(
        "Rendering {} cumulative range(s) in {} mode",
        report.ranges.len(),
        config.mode
    );

    if report.ranges.is_empty() {
        warn!("No years in the dataset, nothing to render");
        return Ok(report);
    }

    let mut charts = Vec::with_capacity(report.ranges.len());
    for range in &report.ranges {
        match build_chart(dataset, range, config) {
            Ok(chart) => charts.push(chart),
            Err(e) => {
                error!("{}", as_render_error(range, e));
                report.failed_ranges.push(range.clone());
            }
        }
    }

    match config.mode {
        RenderMode::Grid => render_grid(&charts, config, renderer, &mut report),
        RenderMode::Sequence => render_sequence(&charts, config, renderer, assembler, &mut report),
    }
    Ok(report)
}

fn build_chart(dataset: &Dataset, range: &YearRange, config: &PoolConfig) -> Result<ChartSpec> {
    let summaries = summarize(dataset, range)?;
    ChartSpec::build(range.clone(), &summaries, config)
}

/// Attach the year range to errors that do not already carry one
fn as_render_error(range: &YearRange, e: PoolError) -> PoolError {
    match e {
        PoolError::Render { .. } => e,
        other => PoolError::Render {
            label: range.to_string(),
            message: other.to_string(),
        },
    }
}

fn render_grid<R: ChartRenderer>(
    charts: &[ChartSpec],
    config: &PoolConfig,
    renderer: &R,
    report: &mut RunReport,
) {
    match renderer.render_grid(charts, &config.grid_output) {
        Ok(outcome) => {
            info!("Saved grid to {}", outcome.path.display());
            report.failed_ranges.extend(outcome.failed);
            report.output = Some(outcome.path);
        }
        Err(e) => {
            error!("Failed to save grid {}: {}", config.grid_output.display(), e);
            report
                .failed_ranges
                .extend(charts.iter().map(|c| c.range.clone()));
        }
    }
}

fn render_sequence<R: ChartRenderer, A: FrameAssembler>(
    charts: &[ChartSpec],
    config: &PoolConfig,
    renderer: &R,
    assembler: &A,
    report: &mut RunReport,
) {
    let mut frames = Vec::with_capacity(charts.len());
    for chart in charts {
        let path = config.frame_path(chart.range.last());
        match renderer.render_frame(chart, &path) {
            Ok(()) => {
                info!("Rendered frame {} ({})", path.display(), chart.range);
                frames.push(path);
            }
            Err(e) => {
                error!("{}", as_render_error(&chart.range, e));
                report.failed_ranges.push(chart.range.clone());
            }
        }
    }
    report.frames_written = frames.len();

    if frames.is_empty() {
        let message = "no frames to assemble".to_string();
        error!("Skipping animation: {}", message);
        report.assembly_error = Some(message);
        return;
    }

    match assembler.assemble(&frames, &config.animation_output, config.frame_delay_ms) {
        Ok(()) => {
            report.output = Some(config.animation_output.clone());
            report.cleanup_errors = cleanup_frames(&frames);
        }
        Err(e) => {
            error!("{} (frames kept in {})", e, config.frame_dir.display());
            report.assembly_error = Some(e.to_string());
        }
    }
}
