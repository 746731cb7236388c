//! Death pool standings
//!
//! Loads yearly death pool results, aggregates them over cumulative year
//! ranges, and renders Deaths vs Points scatter plots as a grid image or an
//! animated GIF.
//!
//! Module organization:
//! - `dataset`: CSV loading and validation
//! - `aggregate`: cumulative year ranges and per-player summaries
//! - `encode`: position, color and size encoding per chart
//! - `render`: plotters rendering and GIF assembly
//! - `pipeline`: orchestration shared by both binaries
//! - `display`: opening the saved grid in the platform viewer

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod display;
pub mod encode;
pub mod error;
pub mod logging;
pub mod palettes;
pub mod pipeline;
pub mod render;

pub use config::{PoolConfig, RenderMode};
pub use error::{PoolError, Result};
pub use pipeline::{run, RunReport};
