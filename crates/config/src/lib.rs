//! Shared configuration for Polyedit
//!
//! This crate provides the single source of truth for the tunables of the
//! mesh editing core: per-entity hit-test thresholds, history depth and
//! merge defaults. Hosts either use the defaults or load a JSON document.

use serde::{Deserialize, Serialize};

#[cfg(feature = "bevy")]
use bevy::prelude::Resource;

/// Default vertex pick radius in screen units
pub const DEFAULT_VERTEX_THRESHOLD: f32 = 10.0;

/// Default edge pick distance in screen units
pub const DEFAULT_EDGE_THRESHOLD: f32 = 6.0;

/// Default line pick distance in screen units
pub const DEFAULT_LINE_THRESHOLD: f32 = 5.0;

/// Default number of records kept per history stack
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// Default distance under which two vertices are merged
pub const DEFAULT_MERGE_THRESHOLD: f32 = 0.001;

/// Errors raised while loading or saving configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Screen-space pick distances for each selectable entity kind
///
/// Faces have no threshold: the cursor has to be inside the projected
/// polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTestConfig {
    /// Maximum cursor distance to a projected vertex
    pub vertex_threshold: f32,
    /// Maximum cursor distance to a projected edge segment
    pub edge_threshold: f32,
    /// Maximum cursor distance to a projected line segment
    pub line_threshold: f32,
}

impl Default for HitTestConfig {
    fn default() -> Self {
        Self {
            vertex_threshold: DEFAULT_VERTEX_THRESHOLD,
            edge_threshold: DEFAULT_EDGE_THRESHOLD,
            line_threshold: DEFAULT_LINE_THRESHOLD,
        }
    }
}

impl HitTestConfig {
    /// Scale all thresholds, e.g. for a HiDPI display
    pub fn scaled(&self, scale: f32) -> Self {
        Self {
            vertex_threshold: self.vertex_threshold * scale,
            edge_threshold: self.edge_threshold * scale,
            line_threshold: self.line_threshold * scale,
        }
    }
}

/// History stack settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Records kept per stack before the oldest is dropped
    pub max_depth: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_HISTORY_DEPTH,
        }
    }
}

/// Vertex merge defaults
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Distance threshold used by "merge by distance"
    pub threshold: f32,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MERGE_THRESHOLD,
        }
    }
}

/// Complete editor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "bevy", derive(Resource))]
#[serde(default)]
pub struct EditorConfig {
    pub hit_test: HitTestConfig,
    pub history: HistoryConfig,
    pub merge: MergeConfig,
}

impl EditorConfig {
    /// Parse a configuration from JSON, filling missing fields with defaults
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration as pretty JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the editor cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let thresholds = [
            ("hit_test.vertex_threshold", self.hit_test.vertex_threshold),
            ("hit_test.edge_threshold", self.hit_test.edge_threshold),
            ("hit_test.line_threshold", self.hit_test.line_threshold),
            ("merge.threshold", self.merge.threshold),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "{name} must be a finite non-negative number, got {value}"
                )));
            }
        }
        if self.history.max_depth == 0 {
            return Err(ConfigError::InvalidValue(
                "history.max_depth must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.hit_test.vertex_threshold, DEFAULT_VERTEX_THRESHOLD);
        assert_eq!(config.hit_test.line_threshold, DEFAULT_LINE_THRESHOLD);
        assert_eq!(config.history.max_depth, DEFAULT_HISTORY_DEPTH);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r#"{ "hit_test": { "vertex_threshold": 12.0 } }"#)
            .unwrap();
        assert_eq!(config.hit_test.vertex_threshold, 12.0);
        assert_eq!(config.hit_test.edge_threshold, DEFAULT_EDGE_THRESHOLD);
        assert_eq!(config.merge.threshold, DEFAULT_MERGE_THRESHOLD);
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = EditorConfig::default();
        config.history.max_depth = 7;
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_rejects_zero_depth() {
        let result = EditorConfig::from_json(r#"{ "history": { "max_depth": 0 } }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let result = EditorConfig::from_json(r#"{ "merge": { "threshold": -1.0 } }"#);
        assert!(matches!(result, Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_scaled_thresholds() {
        let scaled = HitTestConfig::default().scaled(2.0);
        assert_eq!(scaled.vertex_threshold, DEFAULT_VERTEX_THRESHOLD * 2.0);
        assert_eq!(scaled.edge_threshold, DEFAULT_EDGE_THRESHOLD * 2.0);
    }
}
