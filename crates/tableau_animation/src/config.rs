//! Animation configuration
//!
//! `FlipConfig` carries the engine-wide settings. It can be built in code
//! with presets and setters, or loaded from a TOML table:
//!
//! ```toml
//! transition_ms = 250
//! exit_opacity = 0.0
//! rotation_property = "tapped"
//! clone_exit_content = true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Engine-wide animation settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlipConfig {
    /// Transition length handed to entities when they start playing
    pub transition_ms: u64,
    /// Final opacity of exit placeholders
    pub exit_opacity: f32,
    /// Animating property whose quarter-turn changes mark a rotated box
    pub rotation_property: String,
    /// Clone content of entities that ask for it, so exits can show it
    pub clone_exit_content: bool,
}

impl Default for FlipConfig {
    fn default() -> Self {
        Self {
            transition_ms: 300,
            exit_opacity: 0.0,
            rotation_property: "rotated".to_string(),
            clone_exit_content: true,
        }
    }
}

impl FlipConfig {
    /// Quick transitions for dense tables
    pub fn snappy() -> Self {
        Self {
            transition_ms: 180,
            ..Self::default()
        }
    }

    /// Slow, smooth transitions
    pub fn gentle() -> Self {
        Self {
            transition_ms: 450,
            ..Self::default()
        }
    }

    pub fn with_transition_ms(mut self, transition_ms: u64) -> Self {
        self.transition_ms = transition_ms;
        self
    }

    pub fn with_exit_opacity(mut self, exit_opacity: f32) -> Self {
        self.exit_opacity = exit_opacity;
        self
    }

    pub fn with_rotation_property(mut self, property: impl Into<String>) -> Self {
        self.rotation_property = property.into();
        self
    }

    pub fn with_clone_exit_content(mut self, clone: bool) -> Self {
        self.clone_exit_content = clone;
        self
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }

    /// Parse from a TOML string. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: FlipConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&source)?;
        tracing::debug!(path = %path.display(), ?config, "loaded animation config");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.exit_opacity) {
            return Err(ConfigError::Invalid(format!(
                "exit_opacity must be within 0..=1, got {}",
                self.exit_opacity
            )));
        }
        if self.rotation_property.is_empty() {
            return Err(ConfigError::Invalid(
                "rotation_property must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert!(FlipConfig::snappy().transition_ms < FlipConfig::default().transition_ms);
        assert!(FlipConfig::gentle().transition_ms > FlipConfig::default().transition_ms);
        assert_eq!(FlipConfig::default().transition(), Duration::from_millis(300));
    }

    #[test]
    fn test_builders() {
        let config = FlipConfig::default()
            .with_transition_ms(120)
            .with_exit_opacity(0.25)
            .with_rotation_property("tapped")
            .with_clone_exit_content(false);
        assert_eq!(config.transition_ms, 120);
        assert_eq!(config.exit_opacity, 0.25);
        assert_eq!(config.rotation_property, "tapped");
        assert!(!config.clone_exit_content);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = FlipConfig::from_toml_str("transition_ms = 250\n").unwrap();
        assert_eq!(config.transition_ms, 250);
        assert_eq!(config.rotation_property, "rotated");
        assert_eq!(config.exit_opacity, 0.0);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            FlipConfig::from_toml_str("transition_ms = \"slow\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            FlipConfig::from_toml_str("exit_opacity = 2.0"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = FlipConfig::load("/definitely/not/here/tableau.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
