// SPDX-License-Identifier: GPL-3.0-only

//! User configuration loaded from a JSON file.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::app_settings;
use crate::drag::{ClampPolicy, DragConfig};
use crate::scaling::{ScalePolicy, Scaler};

/// Settings for scaling and the floating keyboard. Every field has a default,
/// so an empty JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distance from the screen bottom, in dp, that flags "near bottom" while dragging.
    pub dock_threshold_dp: f32,
    /// Display density used to convert dp to pixels.
    pub density: f32,
    /// Floating keyboard width as a fraction of the screen width.
    pub floating_width_ratio: f32,
    pub clamp_policy: ClampPolicy,
    pub scale_policy: ScalePolicy,
    /// How far from x = 0 a row may start and still count as fill-width.
    pub fill_width_tolerance_px: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dock_threshold_dp: app_settings::DOCK_THRESHOLD_DP,
            density: 1.0,
            floating_width_ratio: app_settings::FLOATING_WIDTH_RATIO,
            clamp_policy: ClampPolicy::default(),
            scale_policy: ScalePolicy::default(),
            fill_width_tolerance_px: app_settings::FILL_WIDTH_TOLERANCE_PX,
        }
    }
}

impl Config {
    /// Loads the config at `path`, or the defaults if the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            file_path: path.display().to_string(),
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            line_number: source.line(),
            source,
            file_path: Some(path.display().to_string()),
        })?;
        config.validate()?;

        tracing::info!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Parses a config from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json).map_err(|source| ConfigError::Json {
            line_number: source.line(),
            source,
            file_path: None,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.density > 0.0) {
            return Err(ConfigError::Invalid {
                field: "density",
                message: format!("must be positive, got {}", self.density),
            });
        }
        if !(self.floating_width_ratio > 0.0 && self.floating_width_ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "floating_width_ratio",
                message: format!("must be in (0, 1], got {}", self.floating_width_ratio),
            });
        }
        if self.dock_threshold_dp < 0.0 {
            return Err(ConfigError::Invalid {
                field: "dock_threshold_dp",
                message: format!("must not be negative, got {}", self.dock_threshold_dp),
            });
        }
        if self.fill_width_tolerance_px < 0 {
            return Err(ConfigError::Invalid {
                field: "fill_width_tolerance_px",
                message: format!("must not be negative, got {}", self.fill_width_tolerance_px),
            });
        }
        Ok(())
    }

    /// Dock threshold converted to pixels.
    pub fn dock_threshold_px(&self) -> f32 {
        self.dock_threshold_dp * self.density
    }

    /// Drag machine settings derived from this config.
    pub fn drag_config(&self) -> DragConfig {
        DragConfig {
            dock_threshold_px: self.dock_threshold_px(),
            clamp_policy: self.clamp_policy,
        }
    }

    /// Scaler configured with this config's policy and tolerance.
    pub fn scaler(&self) -> Scaler {
        Scaler::new()
            .with_policy(self.scale_policy)
            .with_tolerance(self.fill_width_tolerance_px)
    }
}

/// Error type for loading a config.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read
    Io {
        source: std::io::Error,
        file_path: String,
    },
    /// Config is not valid JSON or has fields of the wrong type
    Json {
        source: serde_json::Error,
        file_path: Option<String>,
        line_number: usize,
    },
    /// A field is out of range
    Invalid {
        field: &'static str,
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { source, file_path } => {
                write!(f, "I/O error reading config '{}': {}", file_path, source)
            }
            ConfigError::Json {
                source,
                file_path,
                line_number,
            } => {
                write!(f, "Invalid config JSON")?;
                if let Some(path) = file_path {
                    write!(f, " in '{}'", path)?;
                }
                write!(f, " at line {}: {}", line_number, source)
            }
            ConfigError::Invalid { field, message } => {
                write!(f, "Invalid config value for '{}': {}", field, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Json { source, .. } => Some(source),
            ConfigError::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Test 1: An empty object yields the defaults
    #[test]
    fn test_empty_object_uses_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.dock_threshold_dp, 50.0);
        assert_eq!(config.floating_width_ratio, 0.8);
        assert_eq!(config.clamp_policy, ClampPolicy::HalfOffscreen);
        assert_eq!(config.scale_policy, ScalePolicy::DistributeToFill);
    }

    /// Test 2: Dock threshold is converted with the density
    #[test]
    fn test_dock_threshold_scales_with_density() {
        let config = Config::from_json_str(r#"{ "density": 2.5 }"#).unwrap();
        assert_eq!(config.dock_threshold_px(), 125.0);
        assert_eq!(config.drag_config().dock_threshold_px, 125.0);
    }

    /// Test 3: Config loads from a JSON file
    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "clamp_policy": "fully_onscreen", "scale_policy": "naive" }}"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.clamp_policy, ClampPolicy::FullyOnscreen);
        assert_eq!(config.scaler().policy, ScalePolicy::Naive);
    }

    /// Test 4: A missing file falls back to defaults
    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    /// Test 5: Out-of-range values and broken JSON are rejected
    #[test]
    fn test_invalid_values_rejected() {
        let err = Config::from_json_str(r#"{ "floating_width_ratio": 1.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "floating_width_ratio", .. }));

        let err = Config::from_json_str(r#"{ "density": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("density"));

        let err = Config::from_json_str(r#"{ "density": }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json { file_path: None, .. }));
    }
}
