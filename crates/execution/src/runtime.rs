//! Tick driver tying trackers to the executor.

use crate::{ClefConfig, Executor, TaskNode, TickReport};
use clef_tracker::TrackerManager;
use tracing::{debug, info};

/// One agent's control loop state.
///
/// Every [`Runtime::step`] marks all trackers stale and then runs one
/// executor tick, so any tracker read during the tick sees the world as it
/// is now and is recomputed at most once.
pub struct Runtime<W: 'static> {
    executor: Executor<W>,
    trackers: TrackerManager<W>,
    config: ClefConfig,
}

impl<W: 'static> Runtime<W> {
    /// Create a runtime with the given trackers already registered.
    pub fn new(config: ClefConfig, trackers: TrackerManager<W>) -> Self {
        info!(
            trackers = trackers.len(),
            max_cascade = config.executor.max_cascade_per_tick,
            max_depth = config.executor.max_chain_depth,
            "runtime ready"
        );
        Self {
            executor: Executor::with_config(config.executor.clone()),
            trackers,
            config,
        }
    }

    /// Run one tick against `world`.
    pub fn step<I>(&mut self, world: &mut W, candidates: I) -> TickReport
    where
        I: IntoIterator<Item = Box<dyn TaskNode<W>>>,
    {
        self.trackers.mark_all_dirty();
        let report = self.executor.tick(world, &self.trackers, candidates);
        if let Some(fault) = &report.fault {
            debug!(tick = report.tick, %fault, "tick ended with fault");
        }
        report
    }

    /// Stop the running chain and leave the runtime idle.
    pub fn shutdown(&mut self, world: &mut W) -> usize {
        let stopped = self.executor.stop_all(world, &self.trackers);
        info!(stopped, ticks = self.executor.ticks(), "runtime shut down");
        stopped
    }

    /// The executor.
    pub fn executor(&self) -> &Executor<W> {
        &self.executor
    }

    /// Registered trackers.
    pub fn trackers(&self) -> &TrackerManager<W> {
        &self.trackers
    }

    /// Registered trackers, for registering more between ticks.
    pub fn trackers_mut(&mut self) -> &mut TrackerManager<W> {
        &mut self.trackers
    }

    /// Configuration the runtime was built with.
    pub fn config(&self) -> &ClefConfig {
        &self.config
    }
}
