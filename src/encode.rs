//! Visual encoding of player summaries
//!
//! - Position: (total deaths, total points)
//! - Color: average rank, min-max normalized across the players of one range,
//!   then mapped through a continuous palette (low rank = best = first color)
//! - Size: marker area in points² from total wins, through a bounded `SizeScale`

use crate::aggregate::{PlayerSummary, YearRange};
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::palettes::palette_registry;
use serde::Deserialize;

/// Exponential transform: ceiling on 2^wins
pub const DEFAULT_WINS_CAP: f64 = 500.0;
/// Exponential transform: area multiplier
pub const DEFAULT_SIZE_SCALE: f64 = 100.0;

/// Linear transform: area at zero wins
pub const DEFAULT_BASE_SIZE: f64 = 100.0;
/// Linear transform: area at `DEFAULT_WINS_AT_MAX` wins and above
pub const DEFAULT_MAX_SIZE: f64 = 500.0;
pub const DEFAULT_WINS_AT_MAX: i64 = 2;

/// Color value assigned to every point when a range has no rank spread
pub const NEUTRAL_COLOR_VALUE: f64 = 0.5;

/// Largest exponent evaluated before the cap takes over
const MAX_EXPONENT: i64 = 1023;

/// Wins → marker area (points²)
///
/// Both transforms are monotonic non-decreasing, bounded above by `max_size()`,
/// and strictly positive at zero wins. Negative wins count as zero.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum SizeScale {
    /// `min(2^wins, cap) * scale`
    Exponential {
        #[serde(default = "default_wins_cap")]
        cap: f64,
        #[serde(default = "default_size_scale")]
        scale: f64,
    },
    /// wins ∈ [0, wins_at_max] mapped linearly onto [base, max], clamped at max
    Linear {
        #[serde(default = "default_base_size")]
        base: f64,
        #[serde(default = "default_max_size")]
        max: f64,
        #[serde(default = "default_wins_at_max")]
        wins_at_max: i64,
    },
}

fn default_wins_cap() -> f64 {
    DEFAULT_WINS_CAP
}

fn default_size_scale() -> f64 {
    DEFAULT_SIZE_SCALE
}

fn default_base_size() -> f64 {
    DEFAULT_BASE_SIZE
}

fn default_max_size() -> f64 {
    DEFAULT_MAX_SIZE
}

fn default_wins_at_max() -> i64 {
    DEFAULT_WINS_AT_MAX
}

impl Default for SizeScale {
    fn default() -> Self {
        SizeScale::Exponential {
            cap: DEFAULT_WINS_CAP,
            scale: DEFAULT_SIZE_SCALE,
        }
    }
}

impl SizeScale {
    pub fn linear_default() -> Self {
        SizeScale::Linear {
            base: DEFAULT_BASE_SIZE,
            max: DEFAULT_MAX_SIZE,
            wins_at_max: DEFAULT_WINS_AT_MAX,
        }
    }

    /// Marker area for a win total
    pub fn size(&self, wins: i64) -> f64 {
        let wins = wins.max(0);
        match *self {
            SizeScale::Exponential { cap, scale } => {
                let growth = 2f64.powi(wins.min(MAX_EXPONENT) as i32);
                growth.min(cap) * scale
            }
            SizeScale::Linear {
                base,
                max,
                wins_at_max,
            } => {
                let t = wins.min(wins_at_max) as f64 / wins_at_max as f64;
                base + t * (max - base)
            }
        }
    }

    /// Upper bound of `size`
    pub fn max_size(&self) -> f64 {
        match *self {
            SizeScale::Exponential { cap, scale } => cap * scale,
            SizeScale::Linear { max, .. } => max,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            SizeScale::Exponential { cap, scale } => {
                if !(cap >= 1.0 && cap.is_finite()) {
                    return Err(PoolError::Config(format!(
                        "size_scale.cap must be at least 1, got {}",
                        cap
                    )));
                }
                if !(scale > 0.0 && scale.is_finite()) {
                    return Err(PoolError::Config(format!(
                        "size_scale.scale must be positive, got {}",
                        scale
                    )));
                }
            }
            SizeScale::Linear {
                base,
                max,
                wins_at_max,
            } => {
                if !(base > 0.0 && base.is_finite()) {
                    return Err(PoolError::Config(format!(
                        "size_scale.base must be positive, got {}",
                        base
                    )));
                }
                if !(max >= base && max.is_finite()) {
                    return Err(PoolError::Config(format!(
                        "size_scale.max ({}) must be at least base ({})",
                        max, base
                    )));
                }
                if wins_at_max < 1 {
                    return Err(PoolError::Config(format!(
                        "size_scale.wins_at_max must be at least 1, got {}",
                        wins_at_max
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Min and max average rank across a range's players
pub fn rank_bounds(summaries: &[PlayerSummary]) -> Option<(f64, f64)> {
    summaries
        .iter()
        .map(|s| s.average_rank)
        .filter(|r| r.is_finite())
        .fold(None, |acc, r| match acc {
            None => Some((r, r)),
            Some((lo, hi)) => Some((lo.min(r), hi.max(r))),
        })
}

/// Min-max normalize one average rank into [0, 1]
///
/// A degenerate range (all players share one rank) maps to the midpoint.
pub fn normalize_rank(rank: f64, bounds: (f64, f64)) -> f64 {
    let (lo, hi) = bounds;
    if hi > lo {
        ((rank - lo) / (hi - lo)).clamp(0.0, 1.0)
    } else {
        NEUTRAL_COLOR_VALUE
    }
}

/// Marker radius in pixels for an area in points² (matplotlib `s` convention)
pub fn marker_radius_px(area_pt2: f64, dpi: u32) -> f64 {
    area_pt2.max(0.0).sqrt() / 2.0 * dpi as f64 / 72.0
}

/// One encoded player marker
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPoint {
    pub label: String,
    pub x: f64,
    pub y: f64,
    /// Normalized color value in [0, 1]
    pub color_value: f64,
    pub color: [u8; 3],
    /// Marker area in points²
    pub size: f64,
}

/// Everything needed to draw one year range
#[derive(Debug, Clone)]
pub struct ChartSpec {
    pub range: YearRange,
    pub title: String,
    pub points: Vec<EncodedPoint>,
    /// Raw average rank bounds, for the color bar labels
    pub rank_bounds: Option<(f64, f64)>,
    /// Palette the point colors came from, for the color bar gradient
    pub palette: String,
}

impl ChartSpec {
    pub fn build(range: YearRange, summaries: &[PlayerSummary], config: &PoolConfig) -> Result<Self> {
        let palette = palette_registry()
            .get(&config.palette)
            .ok_or_else(|| PoolError::Config(format!("Unknown palette '{}'", config.palette)))?;

        let bounds = rank_bounds(summaries);
        let points = summaries
            .iter()
            .map(|s| {
                let color_value = bounds
                    .map(|b| normalize_rank(s.average_rank, b))
                    .unwrap_or(NEUTRAL_COLOR_VALUE);
                EncodedPoint {
                    label: s.player.clone(),
                    x: s.total_deaths,
                    y: s.total_points,
                    color_value,
                    color: palette.interpolate(color_value),
                    size: config.size_scale.size(s.total_wins),
                }
            })
            .collect();

        Ok(Self {
            title: chart_title(&range),
            range,
            points,
            rank_bounds: bounds,
            palette: palette.name.clone(),
        })
    }
}

pub fn chart_title(range: &YearRange) -> String {
    format!("Death Pool Standings ({})", range.last())
}
