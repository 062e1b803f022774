//! Spatial progress.

use crate::{LinearProgressChecker, ProgressChecker, Verdict};
use clef_core::{SharedClock, Vec3};
use std::time::Duration;

/// How positions are turned into a scalar objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistanceMode {
    /// Total displacement from the first recorded position.
    Displacement,
    /// Negated distance to a target, so closing the gap counts as progress.
    Approach(Vec3),
}

/// Feeds 3-D positions into a [`LinearProgressChecker`].
#[derive(Debug, Clone)]
pub struct DistanceProgressChecker {
    inner: LinearProgressChecker,
    mode: DistanceMode,
    origin: Option<Vec3>,
}

impl DistanceProgressChecker {
    /// Create a checker with the given window and minimum gain per window.
    pub fn new(clock: SharedClock, window: Duration, min_delta: f64, mode: DistanceMode) -> Self {
        Self {
            inner: LinearProgressChecker::new(clock, window, min_delta),
            mode,
            origin: None,
        }
    }

    /// Checker measuring displacement from the first sample.
    pub fn displacement(clock: SharedClock, window: Duration, min_delta: f64) -> Self {
        Self::new(clock, window, min_delta, DistanceMode::Displacement)
    }

    /// Checker measuring how fast the gap to `target` closes.
    pub fn approach(clock: SharedClock, window: Duration, min_delta: f64, target: Vec3) -> Self {
        Self::new(clock, window, min_delta, DistanceMode::Approach(target))
    }

    /// Current mode.
    pub fn mode(&self) -> DistanceMode {
        self.mode
    }

    /// Switch mode. History is cleared because the scalars are not comparable.
    pub fn set_mode(&mut self, mode: DistanceMode) {
        if self.mode != mode {
            self.mode = mode;
            self.reset();
        }
    }

    fn scalar(&mut self, position: Vec3) -> f64 {
        match self.mode {
            DistanceMode::Displacement => {
                let origin = *self.origin.get_or_insert(position);
                origin.distance(&position)
            }
            DistanceMode::Approach(target) => -position.distance(&target),
        }
    }
}

impl ProgressChecker<Vec3> for DistanceProgressChecker {
    fn set_progress(&mut self, position: Vec3) -> Verdict {
        let value = self.scalar(position);
        self.inner.set_progress(value)
    }

    fn failed(&self) -> bool {
        self.inner.failed()
    }

    fn reset(&mut self) {
        self.origin = None;
        self.inner.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clef_core::ManualClock;

    const WINDOW: Duration = Duration::from_secs(1);

    #[test]
    fn test_displacement_progress() {
        let clock = ManualClock::new();
        let mut checker = DistanceProgressChecker::displacement(clock.shared(), WINDOW, 0.5);

        assert_eq!(checker.set_progress(Vec3::new(0.0, 64.0, 0.0)), Verdict::Warmup);
        clock.advance(WINDOW);
        assert_eq!(checker.set_progress(Vec3::new(1.0, 64.0, 0.0)), Verdict::Advanced);
        clock.advance(WINDOW);
        // Still one block from the origin: no new displacement.
        assert_eq!(checker.set_progress(Vec3::new(0.0, 64.0, 1.0)), Verdict::Stalled);
        assert!(checker.failed());
    }

    #[test]
    fn test_approach_progress() {
        let clock = ManualClock::new();
        let target = Vec3::new(10.0, 0.0, 0.0);
        let mut checker = DistanceProgressChecker::approach(clock.shared(), WINDOW, 1.0, target);

        checker.set_progress(Vec3::ZERO);
        clock.advance(WINDOW);
        assert_eq!(checker.set_progress(Vec3::new(2.0, 0.0, 0.0)), Verdict::Advanced);

        // Walking away is not progress.
        clock.advance(WINDOW);
        assert_eq!(checker.set_progress(Vec3::new(1.0, 0.0, 0.0)), Verdict::Stalled);
    }

    #[test]
    fn test_reset_forgets_origin() {
        let clock = ManualClock::new();
        let mut checker = DistanceProgressChecker::displacement(clock.shared(), WINDOW, 0.5);
        checker.set_progress(Vec3::ZERO);
        clock.advance(WINDOW);
        checker.set_progress(Vec3::ZERO);
        assert!(checker.failed());

        checker.reset();
        assert!(!checker.failed());
        assert_eq!(checker.set_progress(Vec3::new(5.0, 0.0, 0.0)), Verdict::Warmup);
        clock.advance(WINDOW);
        assert_eq!(checker.set_progress(Vec3::new(6.0, 0.0, 0.0)), Verdict::Advanced);
    }

    #[test]
    fn test_set_mode_resets() {
        let clock = ManualClock::new();
        let mut checker = DistanceProgressChecker::displacement(clock.shared(), WINDOW, 0.5);
        checker.set_progress(Vec3::ZERO);
        checker.set_mode(DistanceMode::Approach(Vec3::new(3.0, 0.0, 0.0)));
        assert_eq!(checker.set_progress(Vec3::ZERO), Verdict::Warmup);
    }
}
