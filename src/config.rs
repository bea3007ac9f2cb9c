//! Engine configuration
//!
//! Loaded from a JS object at `initEngine` (or from JSON in native callers);
//! every field is optional and falls back to its default.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::PitchSystem;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Consecutive local-splice insertions on one line before an immediate flush
    pub fast_path_threshold: u32,
    /// Debounce delay for the reparse timer, in milliseconds
    pub debounce_ms: u32,
    /// Maximum number of undrained outbound events
    pub event_queue_capacity: usize,
    /// Treat a breath mark as a beat separator
    pub breath_ends_beat: bool,
    pub default_pitch_system: PitchSystem,
    /// Maximum number of undo batches kept
    pub undo_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            fast_path_threshold: 3,
            debounce_ms: 120,
            event_queue_capacity: 256,
            breath_ends_beat: false,
            default_pitch_system: PitchSystem::Number,
            undo_limit: 100,
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fast_path_threshold == 0 {
            return Err(EngineError::InvalidConfig(
                "fast_path_threshold must be at least 1".to_string(),
            ));
        }
        if self.event_queue_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "event_queue_capacity must be at least 1".to_string(),
            ));
        }
        if self.undo_limit == 0 {
            return Err(EngineError::InvalidConfig("undo_limit must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn beat_config(&self) -> BeatConfig {
        BeatConfig {
            breath_ends_beat: self.breath_ends_beat,
        }
    }
}

/// Grammar-relevant subset of the configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeatConfig {
    pub breath_ends_beat: bool,
}
