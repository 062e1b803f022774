//! Ownership of every tracker.

use crate::{ProgressiveState, ProgressiveTracker, TrackedState, Tracker};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use tracing::debug;

/// Type-erased view used for bulk dirty marking.
trait ManagedTracker {
    fn name(&self) -> &'static str;
    fn mark_dirty(&self);
    fn as_any(&self) -> &dyn Any;
}

impl<W: 'static, S: TrackedState<W> + 'static> ManagedTracker for Tracker<W, S> {
    fn name(&self) -> &'static str {
        Tracker::name(self)
    }

    fn mark_dirty(&self) {
        self.set_dirty();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<W: 'static, S: ProgressiveState<W> + 'static> ManagedTracker for ProgressiveTracker<W, S> {
    fn name(&self) -> &'static str {
        ProgressiveTracker::name(self)
    }

    fn mark_dirty(&self) {
        self.set_dirty();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Owns all trackers for one world type.
///
/// Trackers are registered once, looked up by their state type, and borrowed
/// read-only by behaviors during a tick. [`TrackerManager::mark_all_dirty`]
/// is called exactly once at the start of each tick.
pub struct TrackerManager<W> {
    trackers: Vec<Box<dyn ManagedTracker>>,
    index: HashMap<TypeId, usize>,
    _world: PhantomData<fn(&W)>,
}

impl<W: 'static> TrackerManager<W> {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            trackers: Vec::new(),
            index: HashMap::new(),
            _world: PhantomData,
        }
    }

    /// Register a single-tick tracker, replacing one with the same state type.
    pub fn register<S>(&mut self, name: &'static str, state: S)
    where
        S: TrackedState<W> + 'static,
    {
        self.insert(TypeId::of::<Tracker<W, S>>(), Box::new(Tracker::new(name, state)));
    }

    /// Register a multi-tick tracker, replacing one with the same state type.
    pub fn register_progressive<S>(&mut self, name: &'static str, scan: S)
    where
        S: ProgressiveState<W> + 'static,
    {
        self.insert(
            TypeId::of::<ProgressiveTracker<W, S>>(),
            Box::new(ProgressiveTracker::new(name, scan)),
        );
    }

    fn insert(&mut self, key: TypeId, tracker: Box<dyn ManagedTracker>) {
        debug!(tracker = tracker.name(), "registering tracker");
        match self.index.get(&key) {
            Some(&slot) => self.trackers[slot] = tracker,
            None => {
                self.index.insert(key, self.trackers.len());
                self.trackers.push(tracker);
            }
        }
    }

    /// The tracker holding state `S`.
    pub fn get<S>(&self) -> Option<&Tracker<W, S>>
    where
        S: TrackedState<W> + 'static,
    {
        self.lookup(TypeId::of::<Tracker<W, S>>())?
            .as_any()
            .downcast_ref()
    }

    /// The progressive tracker scanning with `S`.
    pub fn get_progressive<S>(&self) -> Option<&ProgressiveTracker<W, S>>
    where
        S: ProgressiveState<W> + 'static,
    {
        self.lookup(TypeId::of::<ProgressiveTracker<W, S>>())?
            .as_any()
            .downcast_ref()
    }

    fn lookup(&self, key: TypeId) -> Option<&dyn ManagedTracker> {
        let slot = *self.index.get(&key)?;
        self.trackers.get(slot).map(|t| t.as_ref())
    }

    /// Read state `S`, updating it first if needed.
    ///
    /// `None` when no such tracker is registered or it is disabled.
    pub fn read<S, R>(&self, world: &W, f: impl FnOnce(&S) -> R) -> Option<R>
    where
        S: TrackedState<W> + 'static,
    {
        self.get::<S>()?.read(world, f)
    }

    /// Mark every tracker stale. Call once when a tick begins.
    pub fn mark_all_dirty(&self) {
        for tracker in &self.trackers {
            tracker.mark_dirty();
        }
    }

    /// Number of registered trackers.
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Names of the registered trackers, in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.trackers.iter().map(|t| t.name()).collect()
    }
}

impl<W: 'static> Default for TrackerManager<W> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> std::fmt::Debug for TrackerManager<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.trackers.iter().map(|t| t.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct World {
        food: u32,
        rows: Vec<u32>,
    }

    #[derive(Default)]
    struct Food {
        value: Option<u32>,
        updates: u32,
    }

    impl TrackedState<World> for Food {
        fn update(&mut self, world: &World) {
            self.value = Some(world.food);
            self.updates += 1;
        }

        fn clear(&mut self) {
            self.value = None;
        }
    }

    #[derive(Default)]
    struct RowScan {
        next: usize,
        total: u32,
    }

    impl ProgressiveState<World> for RowScan {
        type Snapshot = u32;

        fn begin(&mut self, _world: &World) {
            self.next = 0;
            self.total = 0;
        }

        fn step(&mut self, world: &World) -> f32 {
            if let Some(row) = world.rows.get(self.next) {
                self.total += row;
                self.next += 1;
            }
            if world.rows.is_empty() {
                1.0
            } else {
                self.next as f32 / world.rows.len() as f32
            }
        }

        fn finish(&mut self) -> u32 {
            self.total
        }
    }

    fn manager() -> TrackerManager<World> {
        let mut manager = TrackerManager::new();
        manager.register("food", Food::default());
        manager.register_progressive("rows", RowScan::default());
        manager
    }

    #[test]
    fn test_lookup_by_state_type() {
        let manager = manager();
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.names(), vec!["food", "rows"]);
        assert!(manager.get::<Food>().is_some());
        assert!(manager.get_progressive::<RowScan>().is_some());
    }

    #[test]
    fn test_dirty_cycle_per_tick() {
        let manager = manager();
        let mut world = World { food: 10, rows: vec![1, 2] };

        // Tick 1: two readers, one update.
        manager.mark_all_dirty();
        assert_eq!(manager.read::<Food, _>(&world, |f| f.value), Some(Some(10)));
        assert_eq!(manager.read::<Food, _>(&world, |f| f.value), Some(Some(10)));
        let food = manager.get::<Food>().unwrap();
        assert!(!food.is_dirty());

        // Between ticks nothing marks it dirty.
        world.food = 4;
        assert!(!food.is_dirty());
        assert_eq!(manager.read::<Food, _>(&world, |f| f.value), Some(Some(10)));

        // Tick 2.
        manager.mark_all_dirty();
        assert!(food.is_dirty());
        assert_eq!(manager.read::<Food, _>(&world, |f| (f.value, f.updates)), Some((Some(4), 2)));
    }

    #[test]
    fn test_progressive_advances_once_per_tick() {
        let manager = manager();
        let world = World { food: 0, rows: vec![3, 4] };
        let rows = manager.get_progressive::<RowScan>().unwrap();

        manager.mark_all_dirty();
        assert_eq!(rows.read(&world, |t| *t), None);
        assert_eq!(rows.read(&world, |t| *t), None);

        manager.mark_all_dirty();
        assert_eq!(rows.read(&world, |t| *t), Some(7));
    }

    #[test]
    fn test_register_replaces_same_type() {
        let mut manager = manager();
        manager.register("food-again", Food { value: None, updates: 100 });
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.get::<Food>().unwrap().name(), "food-again");
    }

    #[test]
    fn test_missing_tracker_reads_none() {
        let manager: TrackerManager<World> = TrackerManager::new();
        let world = World { food: 1, rows: vec![] };
        assert!(manager.is_empty());
        assert_eq!(manager.read::<Food, _>(&world, |f| f.value), None);
    }
}
