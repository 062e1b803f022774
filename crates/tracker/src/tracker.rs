//! Single-tick trackers.

use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Cached state recomputed from the world.
pub trait TrackedState<W> {
    /// Recompute from the current world.
    fn update(&mut self, world: &W);

    /// Drop whatever is cached.
    fn clear(&mut self);
}

/// A dirty-bit cache around a [`TrackedState`].
///
/// Reads go through [`Tracker::read`], which recomputes the state first when
/// it is dirty. Only the update step mutates the state; the dirty bit clears
/// right after an update and is set again by the manager at the next tick or
/// by [`Tracker::set_dirty`].
pub struct Tracker<W, S> {
    name: &'static str,
    state: RefCell<S>,
    dirty: Cell<bool>,
    enabled: Cell<bool>,
    _world: PhantomData<fn(&W)>,
}

impl<W, S> Tracker<W, S>
where
    S: TrackedState<W>,
{
    /// Wrap `state`. New trackers start dirty and enabled.
    pub fn new(name: &'static str, state: S) -> Self {
        Self {
            name,
            state: RefCell::new(state),
            dirty: Cell::new(true),
            enabled: Cell::new(true),
            _world: PhantomData,
        }
    }

    /// Name used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the next read recomputes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Mark the cache stale.
    pub fn set_dirty(&self) {
        self.dirty.set(true);
    }

    /// Whether the tracker serves reads.
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Enable or disable. Disabling drops the cached state so nothing stale
    /// is served once re-enabled.
    pub fn set_enabled(&self, enabled: bool) {
        if self.enabled.replace(enabled) == enabled {
            return;
        }
        if !enabled {
            self.state.borrow_mut().clear();
        }
        self.dirty.set(true);
        debug!(tracker = self.name, enabled, "tracker toggled");
    }

    /// Read the state, recomputing it first if dirty.
    ///
    /// Returns `None` while the tracker is disabled.
    pub fn read<R>(&self, world: &W, f: impl FnOnce(&S) -> R) -> Option<R> {
        if !self.is_enabled() {
            return None;
        }
        self.ensure_updated(world);
        Some(f(&self.state.borrow()))
    }

    /// Recompute now regardless of the dirty bit.
    pub fn force_update(&self, world: &W) {
        if self.is_enabled() {
            self.run_update(world);
        }
    }

    fn ensure_updated(&self, world: &W) {
        if self.is_dirty() {
            self.run_update(world);
        }
    }

    fn run_update(&self, world: &W) {
        trace!(tracker = self.name, "updating");
        self.state.borrow_mut().update(world);
        self.dirty.set(false);
    }
}

impl<W, S> std::fmt::Debug for Tracker<W, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("name", &self.name)
            .field("dirty", &self.dirty.get())
            .field("enabled", &self.enabled.get())
            .finish()
    }
}
