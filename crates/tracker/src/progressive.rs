//! Trackers whose update spans several ticks.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use tracing::{debug, trace, warn};

/// An incremental scan that is too expensive to finish in one tick.
pub trait ProgressiveState<W> {
    /// What readers see once a scan completes.
    type Snapshot;

    /// Start a fresh scan.
    fn begin(&mut self, world: &W);

    /// Do one tick's worth of work; returns the completion fraction in [0, 1].
    fn step(&mut self, world: &W) -> f32;

    /// Hand over the finished result. Called once the fraction reaches 1.
    fn finish(&mut self) -> Self::Snapshot;
}

/// A tracker that spreads its update across ticks.
///
/// Each dirty read advances the in-flight scan by one step, which counts as
/// that tick's update. Readers always see the last committed snapshot; a
/// partially computed scan is never visible.
pub struct ProgressiveTracker<W, S>
where
    S: ProgressiveState<W>,
{
    name: &'static str,
    scan: RefCell<S>,
    committed: RefCell<Option<S::Snapshot>>,
    in_flight: Cell<bool>,
    progress: Cell<f32>,
    dirty: Cell<bool>,
    enabled: Cell<bool>,
    _world: PhantomData<fn(&W)>,
}

impl<W, S> ProgressiveTracker<W, S>
where
    S: ProgressiveState<W>,
{
    /// Wrap `scan`. Nothing is committed until the first scan completes.
    pub fn new(name: &'static str, scan: S) -> Self {
        Self {
            name,
            scan: RefCell::new(scan),
            committed: RefCell::new(None),
            in_flight: Cell::new(false),
            progress: Cell::new(0.0),
            dirty: Cell::new(true),
            enabled: Cell::new(true),
            _world: PhantomData,
        }
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the next read advances the scan.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Mark stale.
    pub fn set_dirty(&self) {
        self.dirty.set(true);
    }

    /// Completion fraction of the scan in flight; 0 when idle.
    pub fn progress(&self) -> f32 {
        self.progress.get()
    }

    /// Whether a scan is partway done.
    pub fn is_scanning(&self) -> bool {
        self.in_flight.get()
    }

    /// Whether the tracker serves reads.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enable or disable. Disabling drops the committed snapshot and abandons
    /// any scan in flight.
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.replace(enabled) == enabled {
            return;
        }
        if !enabled {
            self.committed.borrow_mut().take();
            self.in_flight.set(false);
            self.progress.set(0.0);
        }
        self.dirty.set(true);
        debug!(tracker = self.name, enabled, "tracker toggled");
    }

    /// Read the last committed snapshot, advancing the scan first if dirty.
    ///
    /// Returns `None` while disabled or before the first scan completes.
    pub fn read<R>(&self, world: &W, f: impl FnOnce(&S::Snapshot) -> R) -> Option<R> {
        if !self.is_enabled() {
            return None;
        }
        if self.is_dirty() {
            self.advance(world);
        }
        self.committed.borrow().as_ref().map(f)
    }

    /// Advance the scan one step regardless of the dirty bit.
    pub fn force_update(&self, world: &W) {
        if self.is_enabled() {
            self.advance(world);
        }
    }

    fn advance(&self, world: &W) {
        let mut scan = self.scan.borrow_mut();
        if !self.in_flight.replace(true) {
            trace!(tracker = self.name, "scan started");
            scan.begin(world);
        }

        let raw = scan.step(world);
        let fraction = if raw.is_finite() {
            raw.clamp(0.0, 1.0)
        } else {
            warn!(tracker = self.name, progress = raw, "scan reported non-finite progress");
            0.0
        };
        if fraction >= 1.0 {
            let snapshot = scan.finish();
            *self.committed.borrow_mut() = Some(snapshot);
            self.in_flight.set(false);
            self.progress.set(0.0);
            debug!(tracker = self.name, "scan committed");
        } else {
            self.progress.set(fraction);
        }
        self.dirty.set(false);
    }
}

impl<W, S> std::fmt::Debug for ProgressiveTracker<W, S>
where
    S: ProgressiveState<W>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressiveTracker")
            .field("name", &self.name)
            .field("progress", &self.progress.get())
            .field("in_flight", &self.in_flight.get())
            .field("dirty", &self.dirty.get())
            .field("enabled", &self.enabled.get())
            .finish()
    }
}
