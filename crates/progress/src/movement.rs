//! Combined travel and mining progress.

use crate::{DistanceProgressChecker, LinearProgressChecker, ProgressChecker, ProgressCheckerRetry};
use clef_core::{SharedClock, Vec3};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning for [`MovementProgressChecker`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementCheckerConfig {
    /// Window for judging travel, in seconds
    pub distance_window_secs: f64,
    /// Minimum displacement per travel window
    pub distance_min_delta: f64,
    /// Window for judging block breaking, in seconds
    pub mining_window_secs: f64,
    /// Minimum breaking progress (0..1) per mining window
    pub mining_min_delta: f64,
    /// Consecutive travel stalls tolerated before failing
    pub retries: u32,
}

impl Default for MovementCheckerConfig {
    fn default() -> Self {
        Self {
            distance_window_secs: 6.0,
            distance_min_delta: 0.1,
            mining_window_secs: 0.5,
            mining_min_delta: 0.001,
            retries: 1,
        }
    }
}

impl MovementCheckerConfig {
    /// Travel window as a duration.
    pub fn distance_window(&self) -> Duration {
        Duration::from_secs_f64(self.distance_window_secs.max(0.0))
    }

    /// Mining window as a duration.
    pub fn mining_window(&self) -> Duration {
        Duration::from_secs_f64(self.mining_window_secs.max(0.0))
    }
}

/// Judges an agent that alternates between walking and breaking blocks.
///
/// While a block is being broken the mining checker is fed and the travel
/// checker held in reset; while walking it is the other way round. Either one
/// failing fails the whole checker.
#[derive(Debug, Clone)]
pub struct MovementProgressChecker {
    distance: ProgressCheckerRetry<DistanceProgressChecker, Vec3>,
    mining: LinearProgressChecker,
}

impl MovementProgressChecker {
    /// Build from configuration.
    pub fn new(clock: SharedClock, config: &MovementCheckerConfig) -> Self {
        let distance = DistanceProgressChecker::displacement(
            clock.clone(),
            config.distance_window(),
            config.distance_min_delta,
        );
        Self {
            distance: ProgressCheckerRetry::new(distance, config.retries),
            mining: LinearProgressChecker::new(
                clock,
                config.mining_window(),
                config.mining_min_delta,
            ),
        }
    }

    /// Feed one tick of observations; returns whether progress is acceptable.
    ///
    /// `mining` is the breaking progress of the block being broken this tick,
    /// or `None` when the agent is not breaking anything.
    pub fn check(&mut self, position: Vec3, mining: Option<f64>) -> bool {
        match mining {
            Some(breaking) => {
                self.distance.reset();
                self.mining.set_progress(breaking);
            }
            None => {
                self.mining.reset();
                self.distance.set_progress(position);
            }
        }
        !self.failed()
    }

    /// Whether either travel or mining has stalled.
    pub fn failed(&self) -> bool {
        self.distance.failed() || self.mining.failed()
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.distance.reset();
        self.mining.reset();
    }
}
