//! Game time and window timers.
//!
//! Everything time-based in the core measures against a [`Clock`] rather than
//! reading the system time directly, so stalls can be judged in game time and
//! tests can step time by hand.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// A clock shared between the components that measure against it.
pub type SharedClock = Arc<dyn Clock>;

/// Wall-clock time since construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    /// Wrap into a shared handle.
    pub fn shared() -> SharedClock {
        Arc::new(Self::new())
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a driver can hold one handle and
/// advance it once per tick while checkers hold others.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

fn saturating_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

impl ManualClock {
    /// Create a clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward, saturating at `u64::MAX` nanoseconds.
    pub fn advance(&self, by: Duration) {
        let by = saturating_nanos(by);
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| Some(now.saturating_add(by)));
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, to: Duration) {
        self.nanos.fetch_max(saturating_nanos(to), Ordering::SeqCst);
    }

    /// A shared handle to this clock.
    pub fn shared(&self) -> SharedClock {
        Arc::new(self.clone())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Measures a fixed window against a clock.
#[derive(Clone)]
pub struct Timer {
    clock: SharedClock,
    interval: Duration,
    started: Duration,
    forced: bool,
}

impl Timer {
    /// Create a timer whose window starts now.
    pub fn new(clock: SharedClock, interval: Duration) -> Self {
        let started = clock.now();
        Self {
            clock,
            interval,
            started,
            forced: false,
        }
    }

    /// Length of the window.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time since the window started.
    pub fn duration(&self) -> Duration {
        self.clock.now().saturating_sub(self.started)
    }

    /// Whether the full window has passed.
    pub fn elapsed(&self) -> bool {
        self.forced || self.duration() >= self.interval
    }

    /// Restart the window at the current time.
    pub fn reset(&mut self) {
        self.started = self.clock.now();
        self.forced = false;
    }

    /// Make the timer read as elapsed immediately.
    pub fn force_elapsed(&mut self) {
        self.started = self.clock.now().saturating_sub(self.interval);
        self.forced = true;
    }
}

impl std::fmt::Debug for Timer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timer")
            .field("interval", &self.interval)
            .field("started", &self.started)
            .finish()
    }
}
