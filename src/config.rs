//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the face-config.toml file.
//! It provides a centralized way to configure hand styling, digit animation timing and
//! the demo host's surface, and replaces what would otherwise be global style constants:
//! a [`StyleConfig`] value is passed explicitly into style derivation, so several presets
//! can coexist in one process.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::canvas::Color;
use crate::error::FaceError;
use crate::tween::Easing;

/// Default config file name, resolved against the working directory.
pub const CONFIG_FILE: &str = "face-config.toml";

/// Face configuration loaded from face-config.toml
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct FaceConfig {
    /// Hand, tick and digit styling
    #[serde(default)]
    pub style: StyleConfig,
    /// Digit tween timing
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Surface used by the demo host
    #[serde(default)]
    pub surface: SurfaceConfig,
}

/// Stroke widths, palette and layer switches for the face.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StyleConfig {
    pub hour_stroke_width: f32,
    pub minute_stroke_width: f32,
    /// Also used for tick marks and the center circle
    pub second_stroke_width: f32,
    pub shadow_radius: f32,
    pub center_circle_radius: f32,
    /// Hour/minute/tick color in interactive mode
    pub hand_color: Color,
    /// Second hand color in interactive mode
    pub highlight_color: Color,
    pub shadow_color: Color,
    /// Single stroke color for every hand in ambient mode
    pub ambient_color: Color,
    /// Fill of the hand markers and complication discs
    pub lump_color: Color,
    pub background_color: Color,
    pub hour_digit_color: Color,
    /// Minute and second digits
    pub minor_digit_color: Color,
    /// Hour and minute hand alpha while muted
    pub muted_hand_alpha: u8,
    pub muted_second_alpha: u8,
    /// Draw stroked hands from the center under each marker, plus a center circle
    pub hand_strokes: bool,
    /// Draw the twelve hour ticks around the rim
    pub draw_ticks: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            hour_stroke_width: 5.0,
            minute_stroke_width: 3.0,
            second_stroke_width: 2.0,
            shadow_radius: 6.0,
            center_circle_radius: 4.0,
            hand_color: Color::WHITE,
            highlight_color: Color::BLUE,
            shadow_color: Color::BLACK,
            ambient_color: Color::WHITE,
            lump_color: Color(0xFFC5_3C91),
            background_color: Color::BLACK,
            hour_digit_color: Color::WHITE,
            minor_digit_color: Color(0xFFCC_CCCC),
            muted_hand_alpha: 100,
            muted_second_alpha: 80,
            hand_strokes: false,
            draw_ticks: false,
        }
    }
}

/// Digit tween timing.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Duration of one digit morph in milliseconds
    pub digit_tween_ms: u32,
    pub easing: Easing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            digit_tween_ms: 300,
            easing: Easing::AccelerateDecelerate,
        }
    }
}

/// Surface the demo host renders into.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub width: u32,
    pub height: u32,
    /// Native resolution of the procedural artwork before scaling
    pub asset_resolution: u32,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 96,
            height: 96,
            asset_resolution: 64,
        }
    }
}

impl FaceConfig {
    /// Load configuration from face-config.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_path(&path) {
            Ok(config) => {
                info!("Loaded face configuration from {}", path.as_ref().display());
                config
            }
            Err(FaceError::Io(_)) => {
                info!("No config file found, using default face configuration");
                Self::default()
            }
            Err(e) => {
                warn!("Invalid config file {}: {}", path.as_ref().display(), e);
                warn!("Using default face configuration");
                Self::default()
            }
        }
    }

    /// Load and validate, reporting every failure to the caller.
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, FaceError> {
        let contents = fs::read_to_string(path)?;
        let config: FaceConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save current configuration as pretty TOML
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), FaceError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        info!("Configuration saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Reject values the face cannot render with.
    pub fn validate(&self) -> Result<(), FaceError> {
        let style = &self.style;
        for (name, width) in [
            ("hour_stroke_width", style.hour_stroke_width),
            ("minute_stroke_width", style.minute_stroke_width),
            ("second_stroke_width", style.second_stroke_width),
        ] {
            if !(width.is_finite() && width > 0.0) {
                return Err(FaceError::Config(format!(
                    "{name} must be positive, got {width}"
                )));
            }
        }
        if !(style.shadow_radius.is_finite() && style.shadow_radius >= 0.0) {
            return Err(FaceError::Config(format!(
                "shadow_radius must not be negative, got {}",
                style.shadow_radius
            )));
        }
        if self.animation.digit_tween_ms == 0 {
            return Err(FaceError::Config(
                "digit_tween_ms must be at least 1".to_string(),
            ));
        }
        if self.surface.width == 0 || self.surface.height == 0 {
            return Err(FaceError::InvalidSurface(
                self.surface.width,
                self.surface.height,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = FaceConfig::default();
        assert_eq!(config.style.hour_stroke_width, 5.0);
        assert_eq!(config.style.minute_stroke_width, 3.0);
        assert_eq!(config.style.second_stroke_width, 2.0);
        assert_eq!(config.style.shadow_radius, 6.0);
        assert_eq!(config.style.lump_color, Color(0xFFC53C91));
        assert_eq!(config.animation.digit_tween_ms, 300);
        assert!(!config.style.hand_strokes && !config.style.draw_ticks);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = FaceConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("\"#FFC53C91\""));
        let parsed: FaceConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let parsed: FaceConfig = toml::from_str(
            r##"
[style]
highlight_color = "#FF00FF00"
draw_ticks = true

[animation]
easing = "linear"
"##,
        )
        .unwrap();
        assert_eq!(parsed.style.highlight_color, Color(0xFF00FF00));
        assert!(parsed.style.draw_ticks);
        assert_eq!(parsed.style.hour_stroke_width, 5.0);
        assert_eq!(parsed.animation.easing, Easing::Linear);
        assert_eq!(parsed.animation.digit_tween_ms, 300);
        assert_eq!(parsed.surface, SurfaceConfig::default());
    }

    #[test]
    fn test_signed_color_is_rejected() {
        let parsed = toml::from_str::<FaceConfig>(
            r##"
[style]
hand_color = "#+FFFFFFF"
"##,
        );
        assert!(parsed.is_err());
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = FaceConfig::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config, FaceConfig::default());
    }

    #[test]
    fn test_invalid_values_fall_back_to_default() {
        let file = NamedTempFile::new().unwrap();
        fs::write(file.path(), "[style]\nhour_stroke_width = -1.0\n").unwrap();
        assert!(matches!(
            FaceConfig::try_load_from_path(file.path()),
            Err(FaceError::Config(_))
        ));
        assert_eq!(FaceConfig::load_from_path(file.path()), FaceConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let file = NamedTempFile::new().unwrap();
        let mut config = FaceConfig::default();
        config.style.muted_hand_alpha = 64;
        config.surface.width = 200;
        config.save_to_path(file.path()).unwrap();
        let loaded = FaceConfig::try_load_from_path(file.path()).unwrap();
        assert_eq!(loaded, config);
    }
}
