//! Pipeline configuration
//!
//! Every path and rendering constant lives in `PoolConfig`, which is passed
//! explicitly into the pipeline. Defaults are the constants below; an optional
//! `death_pool.json` in the working directory overrides any subset of fields.

use crate::encode::SizeScale;
use crate::error::{PoolError, Result};
use crate::palettes::palette_registry;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Config file looked up in the working directory by the binaries
pub const CONFIG_FILE: &str = "death_pool.json";

pub const DEFAULT_INPUT_PATH: &str = "data/death_pool_stats.csv";
pub const DEFAULT_GRID_OUTPUT: &str = "images/death_pool_standings.png";
pub const DEFAULT_ANIMATION_OUTPUT: &str = "images/death_pool_standings.gif";
pub const DEFAULT_FRAME_DIR: &str = "images";

/// Panels per grid row
pub const DEFAULT_GRID_COLS: usize = 4;

/// Grid export resolution
pub const DEFAULT_GRID_DPI: u32 = 300;

/// Size of one grid panel in inches (width, height)
pub const DEFAULT_PANEL_INCHES: (f64, f64) = (4.0, 3.0);

pub const DEFAULT_FRAME_DPI: u32 = 100;
pub const DEFAULT_FRAME_INCHES: (f64, f64) = (8.0, 6.0);

/// Display time of each animation frame
pub const DEFAULT_FRAME_DELAY_MS: u32 = 2500;

pub const DEFAULT_PALETTE: &str = "coolwarm";
pub const DEFAULT_POINT_ALPHA: f64 = 0.7;

/// Player label size in points
pub const DEFAULT_LABEL_FONT_PT: f64 = 8.0;

/// Upper bound on ticks per axis
pub const DEFAULT_MAX_TICKS: usize = 8;

/// Open the saved grid in the desktop viewer when one is available
pub const DEFAULT_SHOW_GRID: bool = true;

/// Which output the pipeline produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// All year ranges as panels of one composite image
    #[default]
    Grid,
    /// One frame per year range, assembled into a looping GIF
    Sequence,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::Grid => write!(f, "grid"),
            RenderMode::Sequence => write!(f, "sequence"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PoolConfig {
    /// CSV with Player, Year, Deaths, Points, Wins, Rank columns
    pub input_path: PathBuf,

    /// Output mode: "grid" or "sequence"
    pub mode: RenderMode,

    /// Composite PNG written in grid mode
    pub grid_output: PathBuf,

    /// Animated GIF written in sequence mode
    pub animation_output: PathBuf,

    /// Directory for the temporary per-frame PNGs
    pub frame_dir: PathBuf,

    /// Fixed column count of the grid; rows are derived from the range count
    pub grid_cols: usize,

    /// Grid resolution in dots per inch
    pub grid_dpi: u32,

    /// Grid panel size in inches (width, height)
    pub panel_inches: (f64, f64),

    /// Frame resolution in dots per inch
    pub frame_dpi: u32,

    /// Frame size in inches (width, height)
    pub frame_inches: (f64, f64),

    /// Per-frame display duration in milliseconds
    pub frame_delay_ms: u32,

    /// Wins → marker area transform
    pub size_scale: SizeScale,

    /// Continuous palette used for the average rank color scale
    pub palette: String,

    /// Marker opacity in [0, 1]
    pub point_alpha: f64,

    /// Player label font size in points
    pub label_font_pt: f64,

    /// Maximum number of integer ticks per axis
    pub max_ticks: usize,

    /// Open the grid image in the platform viewer after saving
    pub show_grid: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT_PATH),
            mode: RenderMode::default(),
            grid_output: PathBuf::from(DEFAULT_GRID_OUTPUT),
            animation_output: PathBuf::from(DEFAULT_ANIMATION_OUTPUT),
            frame_dir: PathBuf::from(DEFAULT_FRAME_DIR),
            grid_cols: DEFAULT_GRID_COLS,
            grid_dpi: DEFAULT_GRID_DPI,
            panel_inches: DEFAULT_PANEL_INCHES,
            frame_dpi: DEFAULT_FRAME_DPI,
            frame_inches: DEFAULT_FRAME_INCHES,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
            size_scale: SizeScale::default(),
            palette: DEFAULT_PALETTE.to_string(),
            point_alpha: DEFAULT_POINT_ALPHA,
            label_font_pt: DEFAULT_LABEL_FONT_PT,
            max_ticks: DEFAULT_MAX_TICKS,
            show_grid: DEFAULT_SHOW_GRID,
        }
    }
}

impl PoolConfig {
    /// Parse a JSON config; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PoolConfig = serde_json::from_str(json)
            .map_err(|e| PoolError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load the config file if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No {} found, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = std::fs::read_to_string(path).map_err(|e| {
            PoolError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_json(&json)?;
        info!("Loaded configuration from {}", path.display());
        debug!("{:?}", config);
        Ok(config)
    }

    /// Same config with a different output mode
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Reject values the renderer cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.grid_cols == 0 {
            return Err(PoolError::Config("grid_cols must be at least 1".into()));
        }
        for (name, dpi) in [("grid_dpi", self.grid_dpi), ("frame_dpi", self.frame_dpi)] {
            if !(10..=1200).contains(&dpi) {
                return Err(PoolError::Config(format!(
                    "{} {} out of valid range [10-1200]",
                    name, dpi
                )));
            }
        }
        for (name, (w, h)) in [
            ("panel_inches", self.panel_inches),
            ("frame_inches", self.frame_inches),
        ] {
            if !(w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()) {
                return Err(PoolError::Config(format!(
                    "{} must be positive, got ({}, {})",
                    name, w, h
                )));
            }
        }
        if self.frame_delay_ms == 0 {
            return Err(PoolError::Config("frame_delay_ms must be positive".into()));
        }
        if !(0.0..=1.0).contains(&self.point_alpha) {
            return Err(PoolError::Config(format!(
                "point_alpha {} out of range [0, 1]",
                self.point_alpha
            )));
        }
        if !(self.label_font_pt > 0.0) {
            return Err(PoolError::Config("label_font_pt must be positive".into()));
        }
        if self.max_ticks < 2 {
            return Err(PoolError::Config("max_ticks must be at least 2".into()));
        }
        self.size_scale.validate()?;
        if palette_registry().get(&self.palette).is_none() {
            return Err(PoolError::Config(format!(
                "Unknown palette '{}'. Available: [{}]",
                self.palette,
                palette_registry().describe().join(", ")
            )));
        }
        Ok(())
    }

    /// Pixel size of one grid panel
    pub fn panel_pixels(&self) -> (u32, u32) {
        to_pixels(self.panel_inches, self.grid_dpi)
    }

    /// Pixel size of one animation frame
    pub fn frame_pixels(&self) -> (u32, u32) {
        to_pixels(self.frame_inches, self.frame_dpi)
    }

    /// Path of the temporary frame for a range ending in `last_year`
    pub fn frame_path(&self, last_year: i64) -> PathBuf {
        self.frame_dir.join(format!("frame_{}.png", last_year))
    }
}

fn to_pixels((w, h): (f64, f64), dpi: u32) -> (u32, u32) {
    (
        (w * dpi as f64).round() as u32,
        (h * dpi as f64).round() as u32,
    )
}
