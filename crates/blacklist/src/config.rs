//! Blacklist tuning.

use serde::{Deserialize, Serialize};

/// Configuration for [`crate::ObjectBlacklist`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlacklistConfig {
    /// How much closer (in squared distance) the agent must get before the
    /// failure count is reset
    pub distance_epsilon: f64,
    /// Failures tolerated by [`crate::ObjectBlacklist::record_failure`]
    pub default_failures_allowed: u32,
}

impl Default for BlacklistConfig {
    fn default() -> Self {
        Self {
            distance_epsilon: 0.1,
            default_failures_allowed: 3,
        }
    }
}

impl BlacklistConfig {
    /// Set the distance epsilon.
    pub fn with_distance_epsilon(mut self, epsilon: f64) -> Self {
        self.distance_epsilon = epsilon;
        self
    }

    /// Set the default failures allowed.
    pub fn with_default_failures_allowed(mut self, allowed: u32) -> Self {
        self.default_failures_allowed = allowed;
        self
    }
}
