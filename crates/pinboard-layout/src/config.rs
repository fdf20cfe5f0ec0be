#![forbid(unsafe_code)]

//! Tunable layout parameters as data.
//!
//! Captures every constant the layout stack uses as a single
//! [`LayoutConfig`] that can be loaded from JSON (or TOML with the
//! `toml-config` feature) at startup.
//!
//! ```toml
//! # pinboard-layout.toml
//! [grid]
//! step = 10
//!
//! [align]
//! horizontal_gap = 32
//! vertical_gap = 12
//! ```
//!
//! ```rust,ignore
//! let config = LayoutConfig::from_toml_file("pinboard-layout.toml")?;
//! let config = LayoutConfig::from_json_str(json)?;
//! ```
//!
//! # Defaults
//!
//! `LayoutConfig::default()` reproduces the board's built-in behavior:
//! an 8px grid, a 1px size floor, and the auto-align margins and gaps in
//! [`AlignConfig::default`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::align::AlignConfig;

/// Top-level configuration for one board's layout stack.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Grid policy parameters.
    pub grid: GridConfig,
    /// Floors applied to every stored size.
    pub geometry: GeometryConfig,
    /// Auto-align margins, gaps, and size floors.
    pub align: AlignConfig,
    /// Placement of newly added widgets.
    pub spawn: SpawnConfig,
}

impl LayoutConfig {
    /// Load from a JSON string.
    pub fn from_json_str(s: &str) -> Result<Self, LayoutConfigError> {
        serde_json::from_str(s).map_err(LayoutConfigError::Json)
    }

    /// Load from a JSON file on disk.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, LayoutConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(LayoutConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Load from a TOML string.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, LayoutConfigError> {
        toml::from_str(s).map_err(LayoutConfigError::Toml)
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "toml-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, LayoutConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(LayoutConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    /// Load from JSON and reject configurations that fail [`validate`](Self::validate).
    pub fn from_json_str_validated(s: &str) -> Result<Self, LayoutConfigError> {
        Self::from_json_str(s)?.into_validated()
    }

    /// Consume the config, returning it only if it validates clean.
    pub fn into_validated(self) -> Result<Self, LayoutConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(LayoutConfigError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the config
    /// is valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if !(self.grid.step.is_finite() && self.grid.step > 0.0) {
            errors.push(format!("grid.step must be > 0, got {}", self.grid.step));
        }

        if !(self.geometry.min_size.is_finite() && self.geometry.min_size > 0.0) {
            errors.push(format!(
                "geometry.min_size must be > 0, got {}",
                self.geometry.min_size
            ));
        }

        let align = &self.align;
        for (name, value) in [
            ("align.left_margin", align.left_margin),
            ("align.top_margin", align.top_margin),
            ("align.horizontal_gap", align.horizontal_gap),
            ("align.vertical_gap", align.vertical_gap),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be >= 0, got {value}"));
            }
        }
        for (name, value) in [
            ("align.min_width", align.min_width),
            ("align.min_height", align.min_height),
            ("align.default_width", align.default_width),
            ("align.default_height", align.default_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("{name} must be > 0, got {value}"));
            }
        }

        let spawn = &self.spawn;
        for (name, value) in [
            ("spawn.origin", spawn.origin),
            ("spawn.cascade_step", spawn.cascade_step),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                errors.push(format!("{name} must be >= 0, got {value}"));
            }
        }
        for (name, value) in [
            ("spawn.default_width", spawn.default_width),
            ("spawn.default_height", spawn.default_height),
        ] {
            if !(value.is_finite() && value > 0.0) {
                errors.push(format!("{name} must be > 0, got {value}"));
            }
        }

        errors
    }

    /// Serialize as a single JSON line for startup logs.
    #[must_use]
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Grid placement policy parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Snap step in pixels. Default: 8.
    pub step: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { step: 8.0 }
    }
}

/// Size floors shared by both placement policies.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Minimum width and height of any stored item. Default: 1.
    pub min_size: f64,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self { min_size: 1.0 }
    }
}

/// Where newly added widgets land.
///
/// The n-th widget on a board (0-based count of existing items) is placed
/// at `origin + n * cascade_step` on both axes so new widgets never stack
/// exactly on top of each other.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Offset of the first widget from the board origin. Default: 20.
    pub origin: f64,
    /// Per-widget diagonal offset. Default: 20.
    pub cascade_step: f64,
    /// Width of a new widget. Default: 240.
    pub default_width: f64,
    /// Height of a new widget. Default: 180.
    pub default_height: f64,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            origin: 20.0,
            cascade_step: 20.0,
            default_width: 240.0,
            default_height: 180.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur when loading a layout configuration.
#[derive(Debug)]
pub enum LayoutConfigError {
    /// I/O error reading a file.
    Io(std::io::Error),
    /// JSON parse error.
    Json(serde_json::Error),
    /// TOML parse error.
    #[cfg(feature = "toml-config")]
    Toml(toml::de::Error),
    /// Validation errors.
    Validation(Vec<String>),
}

impl std::fmt::Display for LayoutConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            #[cfg(feature = "toml-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            Self::Validation(errors) => {
                write!(f, "validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for LayoutConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            #[cfg(feature = "toml-config")]
            Self::Toml(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
