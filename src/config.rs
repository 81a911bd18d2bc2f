//! Tuning parameters for the seek coordinator.
//!
//! The web backend stores these next to the other player settings, so the
//! JSON form uses the same camelCase keys.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::SeekError;

/// Immutable per-session seek tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SeekConfig {
    /// How far to rewind a requested target to land at or before a keyframe.
    pub snap_backward_seconds: f64,
    /// Minimum spacing between a completed seek and the next issued one.
    pub settle_milliseconds: u64,
    /// Targets below this are never snapped.
    pub min_snap_time_seconds: f64,
    /// Master switch; a disabled coordinator forwards writes untouched.
    pub enabled: bool,
}

impl Default for SeekConfig {
    fn default() -> Self {
        SeekConfig {
            snap_backward_seconds: 0.4,
            settle_milliseconds: 100,
            min_snap_time_seconds: 1.0,
            enabled: true,
        }
    }
}

impl SeekConfig {
    /// Parse a config from its JSON settings form. Missing keys take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SeekError> {
        let config: SeekConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self, SeekError> {
        let content = std::fs::read_to_string(path).map_err(|source| SeekError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        log::info!("Loaded seek config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SeekError> {
        if !self.snap_backward_seconds.is_finite() || self.snap_backward_seconds < 0.0 {
            return Err(SeekError::InvalidConfig(format!(
                "snapBackwardSeconds must be a non-negative number, got {}",
                self.snap_backward_seconds
            )));
        }
        if !self.min_snap_time_seconds.is_finite() || self.min_snap_time_seconds < 0.0 {
            return Err(SeekError::InvalidConfig(format!(
                "minSnapTimeSeconds must be a non-negative number, got {}",
                self.min_snap_time_seconds
            )));
        }
        Ok(())
    }

    /// Backward keyframe snap. Targets under `min_snap_time_seconds` pass through.
    pub fn snap(&self, secs: f64) -> f64 {
        if secs < self.min_snap_time_seconds {
            secs
        } else {
            (secs - self.snap_backward_seconds).max(0.0)
        }
    }

    /// Clamp `requested` into `[0, duration]`, then snap.
    ///
    /// `duration` must be finite and non-negative.
    pub fn correct(&self, requested: f64, duration: f64) -> f64 {
        self.snap(requested.clamp(0.0, duration))
    }
}
