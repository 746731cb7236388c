//! Opening the saved grid in the platform image viewer
//!
//! Best effort: skipped on headless hosts, and a viewer that fails to launch
//! is logged and otherwise ignored.

use crate::config::{PoolConfig, RenderMode};
use crate::pipeline::RunReport;
use std::path::Path;
use tracing::{debug, info, warn};

/// True when a graphical session is reachable
pub fn display_available() -> bool {
    display_available_with(|key| std::env::var(key).ok())
}

fn display_available_with(lookup: impl Fn(&str) -> Option<String>) -> bool {
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        return true;
    }
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|key| lookup(key).is_some_and(|v| !v.is_empty()))
}

/// The image to show for a finished run, if any
fn viewable_output<'a>(report: &'a RunReport, config: &PoolConfig, display: bool) -> Option<&'a Path> {
    if !config.show_grid || report.mode != RenderMode::Grid || !display {
        return None;
    }
    report.output.as_deref()
}

/// Open the grid image after a grid run; returns whether a viewer was launched
pub fn show_grid(report: &RunReport, config: &PoolConfig) -> bool {
    let Some(path) = viewable_output(report, config, display_available()) else {
        debug!("Not opening a viewer");
        return false;
    };

    match opener::open(path) {
        Ok(()) => {
            info!("Opened {} in the default viewer", path.display());
            true
        }
        Err(e) => {
            warn!("Could not open {}: {}", path.display(), e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn grid_report() -> RunReport {
        RunReport {
            mode: RenderMode::Grid,
            output: Some(PathBuf::from("images/death_pool_standings.png")),
            ..Default::default()
        }
    }

    #[test]
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn test_display_detection_on_x11_and_wayland() {
        assert!(!display_available_with(|_| None));
        assert!(!display_available_with(|_| Some(String::new())));
        assert!(display_available_with(|key| (key == "DISPLAY").then(|| ":0".into())));
        assert!(display_available_with(|key| {
            (key == "WAYLAND_DISPLAY").then(|| "wayland-0".into())
        }));
    }

    #[test]
    fn test_grid_output_is_viewable() {
        let report = grid_report();
        let config = PoolConfig::default();
        assert_eq!(
            viewable_output(&report, &config, true),
            Some(Path::new("images/death_pool_standings.png"))
        );
    }

    #[test]
    fn test_nothing_shown_when_headless_or_disabled() {
        let report = grid_report();
        let config = PoolConfig::default();
        assert!(viewable_output(&report, &config, false).is_none());

        let quiet = PoolConfig {
            show_grid: false,
            ..PoolConfig::default()
        };
        assert!(viewable_output(&report, &quiet, true).is_none());
        assert!(!show_grid(&report, &quiet));
    }

    #[test]
    fn test_animation_and_failed_runs_not_shown() {
        let config = PoolConfig::default();
        let animation = RunReport {
            mode: RenderMode::Sequence,
            output: Some(PathBuf::from("images/death_pool_standings.gif")),
            ..Default::default()
        };
        assert!(viewable_output(&animation, &config, true).is_none());

        let nothing_saved = RunReport {
            mode: RenderMode::Grid,
            ..Default::default()
        };
        assert!(viewable_output(&nothing_saved, &config, true).is_none());
    }
}
