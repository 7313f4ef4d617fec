//! Diagram settings.
//!
//! Values are taken from, in decreasing priority:
//! 1. `EDDY_*` environment variables
//! 2. a TOML file (`./eddy.toml` when loading from the default location)
//! 3. built-in defaults

use crate::{ANCHOR_SNAP_RADIUS, GRID_SIZE, PASTE_OFFSET_X, PASTE_OFFSET_Y};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = "eddy.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    /// Spacing of the snapping grid.
    pub grid_size: f32,

    pub snap_to_grid: bool,

    /// Distance from a node centre under which a dragged anchor snaps to it.
    pub anchor_snap_radius: f32,

    /// Translation applied to each consecutive paste.
    pub paste_offset_x: f32,
    pub paste_offset_y: f32,

    /// Keep insertion modes active after an item has been inserted.
    pub sticky_insert: bool,
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            snap_to_grid: true,
            anchor_snap_radius: ANCHOR_SNAP_RADIUS,
            paste_offset_x: PASTE_OFFSET_X,
            paste_offset_y: PASTE_OFFSET_Y,
            sticky_insert: false,
        }
    }
}

impl DiagramConfig {
    /// Loads `./eddy.toml` when present, the defaults otherwise.
    pub fn load() -> Result<Self, ConfigError> {
        if Path::new(CONFIG_FILE).exists() {
            return Self::from_file(CONFIG_FILE);
        }
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let mut config: DiagramConfig = toml::from_str(content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Applies `EDDY_*` overrides read through `lookup`. Unparsable values are ignored.
    pub fn apply_overrides_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(size) = lookup("EDDY_GRID_SIZE").and_then(|value| value.parse().ok()) {
            self.grid_size = size;
        }
        if let Some(snap) = lookup("EDDY_SNAP_TO_GRID").and_then(|value| parse_flag(&value)) {
            self.snap_to_grid = snap;
        }
        if let Some(x) = lookup("EDDY_PASTE_OFFSET_X").and_then(|value| value.parse().ok()) {
            self.paste_offset_x = x;
        }
        if let Some(y) = lookup("EDDY_PASTE_OFFSET_Y").and_then(|value| value.parse().ok()) {
            self.paste_offset_y = y;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.grid_size > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "grid_size must be positive, got {}",
                self.grid_size
            )));
        }
        if self.anchor_snap_radius < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "anchor_snap_radius must not be negative, got {}",
                self.anchor_snap_radius
            )));
        }
        Ok(())
    }

    pub fn default_config_string() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = DiagramConfig::default();
        assert_eq!(config.grid_size, 10.0);
        assert!(config.snap_to_grid);
        assert_eq!((config.paste_offset_x, config.paste_offset_y), (20.0, 10.0));
        assert!(!config.sticky_insert);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let mut config: DiagramConfig = toml::from_str("grid_size = 20.0\nsticky_insert = true\n").unwrap();
        config.apply_overrides_with(|_| None);
        assert_eq!(config.grid_size, 20.0);
        assert!(config.sticky_insert);
        assert_eq!(config.anchor_snap_radius, ANCHOR_SNAP_RADIUS);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("EDDY_GRID_SIZE", "25"),
            ("EDDY_SNAP_TO_GRID", "off"),
            ("EDDY_PASTE_OFFSET_X", "not-a-number"),
            ("EDDY_PASTE_OFFSET_Y", "40"),
        ]);
        let mut config = DiagramConfig::default();
        config.apply_overrides_with(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.grid_size, 25.0);
        assert!(!config.snap_to_grid);
        assert_eq!(config.paste_offset_x, PASTE_OFFSET_X);
        assert_eq!(config.paste_offset_y, 40.0);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let config = DiagramConfig {
            grid_size: 0.0,
            ..DiagramConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_string_round_trips() {
        let parsed: DiagramConfig = toml::from_str(&DiagramConfig::default_config_string()).unwrap();
        assert_eq!(parsed, DiagramConfig::default());
    }
}
