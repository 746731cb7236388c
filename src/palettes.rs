//! Palette registry for continuous color scales
//!
//! Loads palettes from palettes.json (embedded at compile time) and provides
//! access by name. Only continuous palettes are defined:
//! - `sequential`: Gradient from low to high values
//! - `diverging`: Gradient with a neutral midpoint

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, error, warn};

/// Embedded palettes.json content
const PALETTES_JSON: &str = include_str!("../palettes.json");

/// Fallback color for empty or malformed palettes
const GRAY: [u8; 3] = [128, 128, 128];

/// Palette type as defined in palettes.json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaletteType {
    Sequential,
    Diverging,
}

impl fmt::Display for PaletteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaletteType::Sequential => write!(f, "sequential"),
            PaletteType::Diverging => write!(f, "diverging"),
        }
    }
}

/// A single palette definition from palettes.json
#[derive(Debug, Clone, Deserialize)]
pub struct PaletteDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub palette_type: PaletteType,
    pub colors: Vec<String>,
}

impl PaletteDefinition {
    /// Get a color by index, clamped to the last color
    pub fn get_color(&self, index: usize) -> [u8; 3] {
        match self.colors.get(index.min(self.colors.len().saturating_sub(1))) {
            Some(hex) => parse_hex_color(hex).unwrap_or(GRAY),
            None => GRAY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Interpolate a color from the palette at position t ∈ [0, 1]
    ///
    /// t=0 returns the first color, t=1 returns the last color.
    /// Values in between are linearly interpolated; NaN maps to the midpoint.
    pub fn interpolate(&self, t: f64) -> [u8; 3] {
        if self.colors.is_empty() {
            return GRAY;
        }

        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) };
        let n = self.colors.len();

        if n == 1 {
            return self.get_color(0);
        }

        let pos = t * (n - 1) as f64;
        let idx_low = pos.floor() as usize;
        let idx_high = (idx_low + 1).min(n - 1);
        let frac = pos - idx_low as f64;

        let low = self.get_color(idx_low);
        let high = self.get_color(idx_high);

        [
            lerp(low[0], high[0], frac),
            lerp(low[1], high[1], frac),
            lerp(low[2], high[2], frac),
        ]
    }
}

fn lerp(a: u8, b: u8, t: f64) -> u8 {
    (a as f64 * (1.0 - t) + b as f64 * t).round() as u8
}

/// Registry of all available palettes
#[derive(Debug, Clone, Default)]
pub struct PaletteRegistry {
    /// Palettes by lowercase name for case-insensitive lookup
    palettes: HashMap<String, PaletteDefinition>,
    /// Names in file order, original casing
    names: Vec<String>,
}

impl PaletteRegistry {
    /// Load palettes from JSON string
    pub fn from_json(json: &str) -> Result<Self, String> {
        let definitions: Vec<PaletteDefinition> = serde_json::from_str(json)
            .map_err(|e| format!("Failed to parse palettes JSON: {}", e))?;

        let mut registry = Self::default();
        for def in definitions {
            if def.is_empty() {
                warn!("Skipping palette '{}' with no colors", def.name);
                continue;
            }
            registry.names.push(def.name.clone());
            registry.palettes.insert(def.name.to_lowercase(), def);
        }

        debug!("PaletteRegistry: loaded {} palettes", registry.palettes.len());
        Ok(registry)
    }

    /// Get a palette by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&PaletteDefinition> {
        self.palettes.get(&name.to_lowercase())
    }

    /// All palette names in definition order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// "name (type)" for each palette, in definition order
    pub fn describe(&self) -> Vec<String> {
        self.names
            .iter()
            .filter_map(|name| self.get(name))
            .map(|def| format!("{} ({})", def.name, def.palette_type))
            .collect()
    }
}

static REGISTRY: OnceLock<PaletteRegistry> = OnceLock::new();

/// Global palette registry, parsed on first access
pub fn palette_registry() -> &'static PaletteRegistry {
    REGISTRY.get_or_init(|| {
        PaletteRegistry::from_json(PALETTES_JSON).unwrap_or_else(|e| {
            error!("Failed to load palettes.json: {}", e);
            PaletteRegistry::default()
        })
    })
}

/// Parse a hex color string to RGB array
///
/// Supports `#RRGGBB`, `#RRGGBBAA` (alpha ignored), with or without `#`.
fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let hex = hex.trim_start_matches('#');

    if hex.len() != 6 && hex.len() != 8 {
        warn!("Invalid hex color length '{}': {}", hex, hex.len());
        return None;
    }

    let r = u8::from_str_radix(hex.get(0..2)?, 16).ok()?;
    let g = u8::from_str_radix(hex.get(2..4)?, 16).ok()?;
    let b = u8::from_str_radix(hex.get(4..6)?, 16).ok()?;

    Some([r, g, b])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF0000"), Some([255, 0, 0]));
        assert_eq!(parse_hex_color("3B4CC0"), Some([59, 76, 192]));
        assert_eq!(parse_hex_color("#440154FF"), Some([68, 1, 84]));

        assert_eq!(parse_hex_color("#FFF"), None);
        assert_eq!(parse_hex_color("GGGGGG"), None);
    }

    #[test]
    fn test_registry_loads() {
        let registry = palette_registry();
        let coolwarm = registry.get("coolwarm").unwrap();
        assert_eq!(coolwarm.palette_type, PaletteType::Diverging);
        assert!(registry.get("VIRIDIS").is_some());
        assert!(registry.get("no-such-palette").is_none());
        assert!(registry.names().contains(&"coolwarm".to_string()));
        assert!(registry
            .describe()
            .contains(&"Viridis (sequential)".to_string()));
    }

    #[test]
    fn test_interpolate_endpoints_and_midpoint() {
        let coolwarm = palette_registry().get("coolwarm").unwrap();
        assert_eq!(coolwarm.interpolate(0.0), [59, 76, 192]);
        assert_eq!(coolwarm.interpolate(1.0), [180, 4, 38]);
        // 7 stops: the midpoint lands exactly on the neutral gray
        assert_eq!(coolwarm.interpolate(0.5), [221, 221, 221]);
        assert_eq!(coolwarm.interpolate(f64::NAN), [221, 221, 221]);
    }

    #[test]
    fn test_interpolate_clamps() {
        let def = PaletteDefinition {
            name: "bw".into(),
            palette_type: PaletteType::Sequential,
            colors: vec!["#000000".into(), "#FFFFFF".into()],
        };
        assert_eq!(def.interpolate(-1.0), [0, 0, 0]);
        assert_eq!(def.interpolate(2.0), [255, 255, 255]);
        assert_eq!(def.interpolate(0.5), [128, 128, 128]);
    }

    #[test]
    fn test_empty_palettes_skipped() {
        let registry =
            PaletteRegistry::from_json(r#"[{"name": "Empty", "type": "sequential", "colors": []}]"#)
                .unwrap();
        assert!(registry.get("empty").is_none());
        assert!(PaletteRegistry::from_json("{").is_err());
    }
}
