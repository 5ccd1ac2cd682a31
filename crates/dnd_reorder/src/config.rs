use serde::{Deserialize, Serialize};

const DEFAULT_SNAP_THRESHOLD: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("snap threshold must be within (0, 1), got {0}")]
    InvalidSnapThreshold(f32),
    #[error("failed to parse reorder config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Tuning for a [`crate::ReorderController`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReorderConfig {
    /// Fraction of an item height the dragged entry has to travel past a slot
    /// boundary before the prospective index advances to the next slot.
    ///
    /// `0.5` rounds half-up to the nearest slot.
    pub snap_threshold: f32,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self {
            snap_threshold: DEFAULT_SNAP_THRESHOLD,
        }
    }
}

impl ReorderConfig {
    pub fn snap_threshold(mut self, threshold: f32) -> Self {
        self.snap_threshold = threshold;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        let t = self.snap_threshold;
        if !t.is_finite() || t <= 0.0 || t >= 1.0 {
            tracing::warn!(threshold = t, "rejecting reorder config");
            return Err(ConfigError::InvalidSnapThreshold(t));
        }
        Ok(self)
    }
}
