//! Canvas configuration
//!
//! Read by the canvas every frame, so edits made between frames take effect
//! on the next `begin()`.

use crate::{InsetError, Result};
use egui::{Color32, Key, PointerButton, Vec2};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Behavior and appearance of a nested canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    /// Open a full-canvas, undecorated inner window around caller drawing
    pub extra_window_wrapper: bool,
    /// Requested size in outer pixels; zero axes fill the available space
    pub size: Vec2,
    /// Background of the embedding region
    pub background: Color32,
    /// Zoom with the mouse wheel
    pub zoom_enabled: bool,
    /// Lower zoom bound
    pub zoom_min: f32,
    /// Upper zoom bound
    pub zoom_max: f32,
    /// Wheel notches per unit of zoom
    pub zoom_divisions: f32,
    /// Frames to approach the target zoom; 0 snaps immediately
    pub zoom_smoothness: f32,
    /// Zoom restored by the reset key
    pub default_zoom: f32,
    /// Key restoring `default_zoom`
    pub reset_zoom_key: Key,
    /// Button that pans while dragged
    pub pan_button: PointerButton,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            extra_window_wrapper: false,
            size: Vec2::ZERO,
            background: Color32::WHITE,
            zoom_enabled: true,
            zoom_min: 0.3,
            zoom_max: 2.0,
            zoom_divisions: 10.0,
            zoom_smoothness: 5.0,
            default_zoom: 1.0,
            reset_zoom_key: Key::R,
            pan_button: PointerButton::Middle,
        }
    }
}

impl CanvasConfig {
    /// Parse and validate a TOML document. Missing keys keep their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Check the zoom parameters are usable.
    pub fn validate(&self) -> Result<()> {
        if !(self.zoom_min.is_finite() && self.zoom_max.is_finite()) || self.zoom_min <= 0.0 {
            return Err(InsetError::InvalidConfig(format!(
                "zoom bounds must be positive and finite, got [{}, {}]",
                self.zoom_min, self.zoom_max
            )));
        }
        if self.zoom_min > self.zoom_max {
            return Err(InsetError::InvalidConfig(format!(
                "zoom_min {} exceeds zoom_max {}",
                self.zoom_min, self.zoom_max
            )));
        }
        if !(self.zoom_divisions > 0.0 && self.zoom_divisions.is_finite()) {
            return Err(InsetError::InvalidConfig(format!(
                "zoom_divisions must be positive, got {}",
                self.zoom_divisions
            )));
        }
        if !(self.zoom_smoothness >= 0.0 && self.zoom_smoothness.is_finite()) {
            return Err(InsetError::InvalidConfig(format!(
                "zoom_smoothness must be zero or positive, got {}",
                self.zoom_smoothness
            )));
        }
        if !(self.zoom_min..=self.zoom_max).contains(&self.default_zoom) {
            return Err(InsetError::InvalidConfig(format!(
                "default_zoom {} outside [{}, {}]",
                self.default_zoom, self.zoom_min, self.zoom_max
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = CanvasConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reset_zoom_key, Key::R);
        assert_eq!(config.pan_button, PointerButton::Middle);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = CanvasConfig::from_toml_str(
            r#"
            zoom_smoothness = 0.0
            zoom_max = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(config.zoom_smoothness, 0.0);
        assert_eq!(config.zoom_max, 4.0);
        assert_eq!(config.zoom_min, 0.3);
        assert!(config.zoom_enabled);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let err = CanvasConfig::from_toml_str("zoom_min = 3.0\nzoom_max = 1.0").unwrap_err();
        assert!(matches!(err, InsetError::InvalidConfig(_)));
        assert!(err.to_string().contains("exceeds"));
    }

    #[test]
    fn test_negative_smoothness_rejected() {
        let config = CanvasConfig {
            zoom_smoothness: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = CanvasConfig::from_toml_str("zoom_max = [").unwrap_err();
        assert!(matches!(err, InsetError::ConfigParse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("canvas.toml");
        fs::write(&path, "extra_window_wrapper = true\ndefault_zoom = 1.5").unwrap();

        let config = CanvasConfig::load(&path).unwrap();
        assert!(config.extra_window_wrapper);
        assert_eq!(config.default_zoom, 1.5);
    }
}
