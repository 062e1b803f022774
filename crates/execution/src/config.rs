//! Configuration for the control core.

use clef_blacklist::BlacklistConfig;
use clef_progress::MovementCheckerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A value is out of range
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Configuration for the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Finished nodes unwound per tick before the rest waits a tick
    pub max_cascade_per_tick: usize,
    /// Longest root-to-leaf chain allowed
    pub max_chain_depth: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_cascade_per_tick: 8,
            max_chain_depth: 32,
        }
    }
}

impl ExecutorConfig {
    /// Set the cascade bound.
    pub fn with_max_cascade(mut self, max: usize) -> Self {
        self.max_cascade_per_tick = max;
        self
    }

    /// Set the depth bound.
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_chain_depth = max;
        self
    }
}

/// Everything tunable in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClefConfig {
    /// Executor bounds
    pub executor: ExecutorConfig,
    /// Blacklist tuning
    pub blacklist: BlacklistConfig,
    /// Movement stall detection
    pub movement: MovementCheckerConfig,
}

impl ClefConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: ClefConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject values the core cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.executor.max_cascade_per_tick == 0 {
            return Err(ConfigError::Invalid(
                "executor.max_cascade_per_tick must be at least 1".to_string(),
            ));
        }
        if self.executor.max_chain_depth == 0 {
            return Err(ConfigError::Invalid(
                "executor.max_chain_depth must be at least 1".to_string(),
            ));
        }
        if !(self.blacklist.distance_epsilon >= 0.0) {
            return Err(ConfigError::Invalid(
                "blacklist.distance_epsilon must be non-negative".to_string(),
            ));
        }
        let movement = &self.movement;
        if !(movement.distance_window_secs > 0.0) || !(movement.mining_window_secs > 0.0) {
            return Err(ConfigError::Invalid(
                "movement windows must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Pretty JSON rendering.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClefConfig::default();
        assert_eq!(config.executor.max_cascade_per_tick, 8);
        assert_eq!(config.executor.max_chain_depth, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_document() {
        let config = ClefConfig::from_json(r#"{"executor": {"max_cascade_per_tick": 2}}"#).unwrap();
        assert_eq!(config.executor.max_cascade_per_tick, 2);
        assert_eq!(config.executor.max_chain_depth, 32);
        assert_eq!(config.blacklist, BlacklistConfig::default());
    }

    #[test]
    fn test_zero_cascade_rejected() {
        let err = ClefConfig::from_json(r#"{"executor": {"max_cascade_per_tick": 0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_negative_epsilon_rejected() {
        let err = ClefConfig::from_json(r#"{"blacklist": {"distance_epsilon": -1.0}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_malformed_json() {
        let err = ClefConfig::from_json("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_from_path_round_trip() {
        let config = ClefConfig {
            executor: ExecutorConfig::default().with_max_cascade(3).with_max_depth(4),
            ..Default::default()
        };
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(config.to_json().unwrap().as_bytes()).unwrap();

        let loaded = ClefConfig::from_path(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let err = ClefConfig::from_path("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
