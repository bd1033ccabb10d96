//! Configuration loading for the visualization.
//!
//! All settings are loaded from an optional TOML file; every section and
//! field falls back to its default, and CLI flags override the file.

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::animation::SmoothingMode;

/// Complete visualization configuration.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VizConfig {
    /// Window settings
    #[serde(default)]
    pub window: WindowConfig,
    /// Orbit camera settings
    #[serde(default)]
    pub camera: CameraConfig,
    /// Procedural animation settings
    #[serde(default)]
    pub animation: AnimationConfig,
    /// Click/drag disambiguation
    #[serde(default)]
    pub pointer: PointerConfig,
    /// Hover message bubble
    #[serde(default)]
    pub hover: HoverConfig,
    /// Status board refresh
    #[serde(default)]
    pub status: StatusConfig,
}

impl VizConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("window.width", self.window.width)?;
        positive("window.height", self.window.height)?;

        let camera = &self.camera;
        let fov = camera.fov_degrees;
        if !(fov.is_finite() && fov > 0.0 && fov < 180.0) {
            return Err(ConfigError::invalid(
                "camera.fov_degrees",
                "must be between 0 and 180",
            ));
        }
        if camera.eye.iter().chain(&camera.target).any(|c| !c.is_finite()) {
            return Err(ConfigError::invalid(
                "camera.eye",
                "eye and target must be finite",
            ));
        }
        positive("camera.min_distance", camera.min_distance)?;
        positive("camera.max_distance", camera.max_distance)?;
        if camera.min_distance > camera.max_distance {
            return Err(ConfigError::invalid(
                "camera.min_distance",
                "must not exceed camera.max_distance",
            ));
        }
        non_negative("camera.min_polar", camera.min_polar)?;
        non_negative("camera.max_polar", camera.max_polar)?;
        if camera.min_polar > camera.max_polar {
            return Err(ConfigError::invalid(
                "camera.min_polar",
                "must not exceed camera.max_polar",
            ));
        }
        if !(camera.damping.is_finite() && camera.damping > 0.0 && camera.damping <= 1.0) {
            return Err(ConfigError::invalid("camera.damping", "must be in (0, 1]"));
        }
        non_negative("camera.orbit_speed", camera.orbit_speed)?;
        non_negative("camera.zoom_speed", camera.zoom_speed)?;

        positive("animation.reference_hz", self.animation.reference_hz)?;
        non_negative("pointer.click_threshold_px", self.pointer.click_threshold_px)?;
        positive("hover.reroll_secs", self.hover.reroll_secs)?;
        if !self.hover.bubble_offset_px.is_finite() {
            return Err(ConfigError::invalid(
                "hover.bubble_offset_px",
                "must be finite",
            ));
        }
        positive("status.refresh_secs", self.status.refresh_secs)?;
        Ok(())
    }

    /// Applies command line overrides on top of file values.
    pub fn apply_overrides(&mut self, seed: Option<u64>, fixed_step: bool) {
        if seed.is_some() {
            self.animation.seed = seed;
        }
        if fixed_step {
            self.animation.smoothing = SmoothingMode::FixedStep;
        }
    }

    /// Serializes the configuration as pretty TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be a positive number"))
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::invalid(field, "must be zero or a positive number"))
    }
}

/// Window configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Agent Office".to_string(),
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Orbit camera configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    pub fov_degrees: f32,
    /// Initial eye position
    pub eye: [f32; 3],
    /// Point the camera orbits around
    pub target: [f32; 3],
    /// Closest zoom distance
    pub min_distance: f32,
    /// Farthest zoom distance
    pub max_distance: f32,
    /// Smallest polar angle (radians from straight down the Y axis)
    pub min_polar: f32,
    /// Largest polar angle
    pub max_polar: f32,
    /// Fraction of the remaining orbit applied per reference frame
    pub damping: f32,
    /// Radians of orbit per dragged pixel
    pub orbit_speed: f32,
    /// Fractional distance change per scroll line
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: 45.0,
            eye: [14.0, 12.0, 14.0],
            target: [0.0, 0.0, 0.0],
            min_distance: 8.0,
            max_distance: 30.0,
            min_polar: 0.3,
            max_polar: std::f32::consts::PI / 2.1,
            damping: 0.05,
            orbit_speed: 0.005,
            zoom_speed: 0.1,
        }
    }
}

/// Animation configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// How blend factors react to frame time
    pub smoothing: SmoothingMode,
    /// Frame rate the per-frame blend factors were tuned at
    pub reference_hz: f32,
    /// Fixed RNG seed; entropy is used when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            smoothing: SmoothingMode::FrameRateIndependent,
            reference_hz: 60.0,
            seed: None,
        }
    }
}

/// Pointer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointerConfig {
    /// Press/release distance below which a gesture counts as a click
    pub click_threshold_px: f32,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            click_threshold_px: 5.0,
        }
    }
}

/// Hover bubble configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HoverConfig {
    /// Seconds between message rerolls while hover persists
    pub reroll_secs: f32,
    /// Pixels the bubble floats above the pointer
    pub bubble_offset_px: f32,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            reroll_secs: 3.0,
            bubble_offset_px: 80.0,
        }
    }
}

/// Status board configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Seconds between counter refreshes
    pub refresh_secs: f32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self { refresh_secs: 2.0 }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: &'static str) -> Self {
        ConfigError::Invalid { field, reason }
    }
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r#"# Agent office visualization configuration

[window]
title = "Agent Office"
width = 1280.0
height = 720.0

[camera]
fov_degrees = 45.0
eye = [14.0, 12.0, 14.0]
target = [0.0, 0.0, 0.0]
min_distance = 8.0
max_distance = 30.0
min_polar = 0.3
max_polar = 1.4959966
damping = 0.05
orbit_speed = 0.005
zoom_speed = 0.1

[animation]
# "frame_rate_independent" or "fixed_step"
smoothing = "frame_rate_independent"
reference_hz = 60.0
# seed = 42

[pointer]
click_threshold_px = 5.0

[hover]
reroll_secs = 3.0
bubble_offset_px = 80.0

[status]
refresh_secs = 2.0
"#
    .to_string()
}
