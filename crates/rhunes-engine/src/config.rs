//! Engine configuration.
//!
//! [`EngineConfig`] carries the window-level settings the engine loop needs:
//! surface size, target frame rate and clear color. It deserializes from
//! JSON with every field optional, so a config file only lists what it
//! overrides.
//!
//! ```
//! use rhunes_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "width": 800, "height": 400 }"#).unwrap();
//! assert_eq!(config.width, 800);
//! assert_eq!(config.target_fps, 30);
//! ```

use std::time::Duration;

use rhunes_core::math::{Color, Vec2};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors produced while loading an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("failed to parse engine config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the engine cannot run with.
    #[error("invalid engine config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ---------------------------------------------------------------------------
// EngineConfig
// ---------------------------------------------------------------------------

/// Settings for one engine run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine name, used in logs.
    pub name: String,
    /// Window title handed to the windowing backend.
    pub title: String,
    /// Surface width in pixels. Must be positive.
    pub width: u32,
    /// Surface height in pixels. Must be positive.
    pub height: u32,
    /// Frame rate cap. Must be positive unless `headless` is set.
    pub target_fps: u32,
    /// Headless mode: the frame clock never sleeps.
    pub headless: bool,
    /// Color the surface is cleared with before every render pass.
    pub background: Color,
}

impl Default for EngineConfig {
    /// 640x480 at 30 fps, cleared to a light grey.
    fn default() -> Self {
        Self {
            name: "engine".to_owned(),
            title: "Rhunes Engine".to_owned(),
            width: 640,
            height: 480,
            target_fps: 30,
            headless: false,
            background: Color::rgb(250, 250, 250),
        }
    }
}

impl EngineConfig {
    /// A headless config with the given surface size.
    pub fn headless(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            headless: true,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON config. Missing fields take their default.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the engine loop relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 {
            return Err(ConfigError::Invalid {
                field: "width",
                reason: "must be positive".to_owned(),
            });
        }
        if self.height == 0 {
            return Err(ConfigError::Invalid {
                field: "height",
                reason: "must be positive".to_owned(),
            });
        }
        if self.target_fps == 0 && !self.headless {
            return Err(ConfigError::Invalid {
                field: "target_fps",
                reason: "must be positive when not headless".to_owned(),
            });
        }
        Ok(())
    }

    /// Surface size as a vector.
    pub fn surface_size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    /// Minimum duration of one frame, or `None` when uncapped.
    pub fn frame_duration(&self) -> Option<Duration> {
        if self.headless || self.target_fps == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(1.0 / f64::from(self.target_fps)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = EngineConfig::default();
        assert_eq!(config.name, "engine");
        assert_eq!(config.title, "Rhunes Engine");
        assert_eq!((config.width, config.height), (640, 480));
        assert_eq!(config.target_fps, 30);
        assert!(!config.headless);
        assert_eq!(config.background, Color::rgb(250, 250, 250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config =
            EngineConfig::from_json_str(r#"{ "name": "main", "headless": true }"#).unwrap();
        assert_eq!(config.name, "main");
        assert!(config.headless);
        assert_eq!(config.width, 640);
        assert!(config.frame_duration().is_none());
    }

    #[test]
    fn zero_width_is_rejected() {
        let err = EngineConfig::from_json_str(r#"{ "width": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "width", .. }));
    }

    #[test]
    fn zero_fps_needs_headless() {
        let err = EngineConfig::from_json_str(r#"{ "target_fps": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "target_fps", .. }));
        let config =
            EngineConfig::from_json_str(r#"{ "target_fps": 0, "headless": true }"#).unwrap();
        assert_eq!(config.target_fps, 0);
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = EngineConfig::from_json_str("{ width: }").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("failed to parse engine config"));
    }

    #[test]
    fn frame_duration_follows_target_fps() {
        let config = EngineConfig {
            target_fps: 50,
            ..EngineConfig::default()
        };
        assert_eq!(config.frame_duration(), Some(Duration::from_millis(20)));
    }
}
