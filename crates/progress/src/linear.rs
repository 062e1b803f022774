//! Scalar progress over a fixed window.

use crate::{ProgressChecker, Verdict};
use clef_core::{SharedClock, Timer};
use std::time::Duration;
use tracing::debug;

/// Fails when a scalar objective improves by less than `min_delta` per window.
///
/// The first sample only records a baseline. Samples inside a window are
/// ignored for judging purposes; the baseline moves only when a window closes
/// with enough improvement.
#[derive(Debug, Clone)]
pub struct LinearProgressChecker {
    timer: Timer,
    min_delta: f64,
    baseline: Option<f64>,
    failed: bool,
}

impl LinearProgressChecker {
    /// Create a checker judging every `window` against `min_delta`.
    pub fn new(clock: SharedClock, window: Duration, min_delta: f64) -> Self {
        Self {
            timer: Timer::new(clock, window),
            min_delta,
            baseline: None,
            failed: false,
        }
    }

    /// Baseline of the current window, if a sample was seen.
    pub fn baseline(&self) -> Option<f64> {
        self.baseline
    }

    /// Minimum improvement required per window.
    pub fn min_delta(&self) -> f64 {
        self.min_delta
    }

    /// Window length.
    pub fn window(&self) -> Duration {
        self.timer.interval()
    }
}

impl ProgressChecker<f64> for LinearProgressChecker {
    fn set_progress(&mut self, progress: f64) -> Verdict {
        if self.failed {
            return Verdict::Stalled;
        }

        let Some(baseline) = self.baseline else {
            self.baseline = Some(progress);
            self.timer.reset();
            return Verdict::Warmup;
        };

        if !self.timer.elapsed() {
            return Verdict::Waiting;
        }

        let delta = progress - baseline;
        if delta < self.min_delta {
            debug!(
                baseline,
                progress,
                min_delta = self.min_delta,
                "progress stalled"
            );
            self.failed = true;
            Verdict::Stalled
        } else {
            self.baseline = Some(progress);
            self.timer.reset();
            Verdict::Advanced
        }
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn reset(&mut self) {
        self.baseline = None;
        self.failed = false;
        self.timer.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clef_core::ManualClock;

    fn checker(clock: &ManualClock) -> LinearProgressChecker {
        LinearProgressChecker::new(clock.shared(), Duration::from_secs(2), 1.0)
    }

    #[test]
    fn test_first_sample_never_fails() {
        let clock = ManualClock::new();
        let mut checker = checker(&clock);
        assert!(!checker.failed());

        clock.advance(Duration::from_secs(100));
        assert_eq!(checker.set_progress(0.0), Verdict::Warmup);
        assert!(!checker.failed());
        assert!(checker.verify().is_ok());
    }

    #[test]
    fn test_samples_inside_window_do_not_rebaseline() {
        let clock = ManualClock::new();
        let mut checker = checker(&clock);
        checker.set_progress(0.0);

        clock.advance(Duration::from_millis(500));
        assert_eq!(checker.set_progress(0.6), Verdict::Waiting);
        clock.advance(Duration::from_millis(500));
        assert_eq!(checker.set_progress(0.9), Verdict::Waiting);
        assert_eq!(checker.baseline(), Some(0.0));

        // Total improvement 1.2 over the window is enough.
        clock.advance(Duration::from_secs(1));
        assert_eq!(checker.set_progress(1.2), Verdict::Advanced);
        assert_eq!(checker.baseline(), Some(1.2));
        assert!(!checker.failed());
    }

    #[test]
    fn test_improvement_below_threshold_fails() {
        let clock = ManualClock::new();
        let mut checker = checker(&clock);
        checker.set_progress(10.0);

        clock.advance(Duration::from_secs(2));
        assert_eq!(checker.set_progress(10.5), Verdict::Stalled);
        assert!(checker.failed());
        assert_eq!(checker.verify(), Err(clef_core::Fault::TransientStall));
    }

    #[test]
    fn test_improvement_at_threshold_passes() {
        let clock = ManualClock::new();
        let mut checker = checker(&clock);
        checker.set_progress(10.0);

        clock.advance(Duration::from_secs(2));
        assert_eq!(checker.set_progress(11.0), Verdict::Advanced);
        assert!(!checker.failed());
    }

    #[test]
    fn test_failed_is_sticky_until_reset() {
        let clock = ManualClock::new();
        let mut checker = checker(&clock);
        checker.set_progress(0.0);
        clock.advance(Duration::from_secs(2));
        checker.set_progress(0.0);
        assert!(checker.failed());

        // Big improvement does not clear it.
        clock.advance(Duration::from_secs(2));
        assert_eq!(checker.set_progress(100.0), Verdict::Stalled);
        assert!(checker.failed());

        checker.reset();
        assert!(!checker.failed());
        assert_eq!(checker.baseline(), None);
        assert_eq!(checker.set_progress(100.0), Verdict::Warmup);
    }
}
