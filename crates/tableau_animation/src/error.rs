//! Error types for tableau_animation

use std::path::PathBuf;

use tableau_layout::LayoutError;
use thiserror::Error;

use crate::orchestrator::CyclePhase;

/// Errors that can occur while driving an animation cycle
#[derive(Error, Debug)]
pub enum AnimationError {
    /// `animate()` was called without a matching `prepare()`
    #[error("animate() requires a prepared cycle, orchestrator is {phase:?}")]
    NotPrepared { phase: CyclePhase },

    /// Collection bookkeeping failed
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors raised while loading a `FlipConfig`
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration is not valid TOML for `FlipConfig`
    #[error("invalid animation config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its allowed range
    #[error("invalid animation config: {0}")]
    Invalid(String),
}

/// Result type for tableau_animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
