//! Session settings read from an optional TOML file.

use std::{fs, io, path::Path};

use moodscroll_core::{EmotionLabel, Viewport};
use serde::Deserialize;
use thiserror::Error;

/// Reasons a session file cannot be used.
#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {path}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid session setting: {0}")]
    Invalid(&'static str),
}

/// Tunables for one headless run. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub(crate) struct SessionConfig {
    /// Frames to simulate.
    pub(crate) frames: u64,
    /// Columns the camera scrolls per frame.
    pub(crate) scroll_speed: f32,
    /// Frames between emotion captures.
    pub(crate) capture_interval: u64,
    /// Accumulated columns between mood-driven spawns.
    pub(crate) spawn_every: u64,
    /// Seed for patrol directions.
    pub(crate) seed: u64,
    pub(crate) viewport_columns: u32,
    pub(crate) viewport_rows: u32,
    /// Moods the scripted camera reports, cycled per face.
    pub(crate) moods: Vec<EmotionLabel>,
    /// Whether the scripted camera is attached.
    pub(crate) camera: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frames: 600,
            scroll_speed: 0.1,
            capture_interval: 30,
            spawn_every: 5,
            seed: 0x6d6f_6f64,
            viewport_columns: Viewport::DEFAULT.columns(),
            viewport_rows: Viewport::DEFAULT.rows(),
            moods: vec![EmotionLabel::Neutral],
            camera: true,
        }
    }
}

impl SessionConfig {
    /// Reads and validates a session file.
    pub(crate) fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Self = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.scroll_speed.is_finite() || self.scroll_speed < 0.0 {
            return Err(ConfigError::Invalid("scroll_speed must be a non-negative number"));
        }
        if self.viewport_columns == 0 || self.viewport_rows == 0 {
            return Err(ConfigError::Invalid("viewport must have at least one tile"));
        }
        Ok(())
    }

    pub(crate) fn viewport(&self) -> Viewport {
        Viewport::new(self.viewport_columns, self.viewport_rows)
    }
}
