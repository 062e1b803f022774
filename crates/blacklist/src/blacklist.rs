//! Per-object failure counters with conditional reset.

use crate::BlacklistConfig;
use clef_core::{AgentView, BlockPos, Fault, Vec3};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::debug;

/// Conditions under which a failure was recorded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation<C> {
    /// Where the agent stood
    pub agent_position: Vec3,
    /// How capable the agent was, e.g. best tool quality
    pub tier: C,
}

impl<C> Observation<C> {
    /// Observe an agent through the world facade.
    pub fn of(agent: &impl AgentView, tier: C) -> Self {
        Self {
            agent_position: agent.position(),
            tier,
        }
    }
}

/// Failure record for one object.
#[derive(Debug, Clone, PartialEq)]
pub struct BlacklistEntry<C> {
    /// Failures since the last improvement
    pub failure_count: u32,
    /// Failures tolerated before the object counts as unreachable
    pub failures_allowed: u32,
    /// Smallest squared distance seen at failure time
    pub best_distance_sq: f64,
    /// Highest capability tier seen at failure time
    pub best_tier: C,
}

impl<C> BlacklistEntry<C> {
    /// Whether the object has failed more often than allowed.
    pub fn is_unreachable(&self) -> bool {
        self.failure_count > self.failures_allowed
    }
}

type Locator<T, K> = Box<dyn Fn(&T) -> (K, Vec3) + Send + Sync>;

/// Remembers repeated failures against addressable objects.
///
/// Objects are identified through a caller-supplied locator returning a stable
/// key and the object's position. `C` is any orderable capability tier.
pub struct ObjectBlacklist<T, K, C> {
    locate: Locator<T, K>,
    entries: HashMap<K, BlacklistEntry<C>>,
    config: BlacklistConfig,
}

/// Blacklist of block positions keyed by themselves.
pub type PositionBlacklist<C> = ObjectBlacklist<BlockPos, BlockPos, C>;

impl<T, K, C> ObjectBlacklist<T, K, C>
where
    K: Hash + Eq + Debug,
    C: Ord + Copy + Debug,
{
    /// Create a blacklist with default configuration.
    pub fn new(locate: impl Fn(&T) -> (K, Vec3) + Send + Sync + 'static) -> Self {
        Self::with_config(locate, BlacklistConfig::default())
    }

    /// Create a blacklist with explicit configuration.
    pub fn with_config(
        locate: impl Fn(&T) -> (K, Vec3) + Send + Sync + 'static,
        config: BlacklistConfig,
    ) -> Self {
        Self {
            locate: Box::new(locate),
            entries: HashMap::new(),
            config,
        }
    }

    /// Record a failure against `object`, returning its new failure count.
    ///
    /// If the agent is closer to the object than at any earlier failure (by
    /// more than the configured epsilon), or more capable than before, the
    /// count is reset to zero first. Both best values are tracked on their
    /// own; an improvement in either one resets the count.
    pub fn blacklist(&mut self, object: &T, observation: Observation<C>, failures_allowed: u32) -> u32 {
        let (key, position) = (self.locate)(object);
        let distance_sq = observation.agent_position.distance_sq(&position);
        let epsilon = self.config.distance_epsilon;

        let entry = self.entries.entry(key).or_insert_with_key(|key| {
            debug!(?key, distance_sq, "new blacklist entry");
            BlacklistEntry {
                failure_count: 0,
                failures_allowed,
                best_distance_sq: distance_sq,
                best_tier: observation.tier,
            }
        });

        let closer = distance_sq < entry.best_distance_sq - epsilon;
        let stronger = observation.tier > entry.best_tier;
        if closer {
            entry.best_distance_sq = distance_sq;
        }
        if stronger {
            entry.best_tier = observation.tier;
        }
        if closer || stronger {
            debug!(
                closer,
                stronger,
                previous = entry.failure_count,
                "conditions improved, resetting failure count"
            );
            entry.failure_count = 0;
        }

        let was_unreachable = entry.is_unreachable();
        entry.failures_allowed = failures_allowed;
        entry.failure_count += 1;
        if entry.is_unreachable() && !was_unreachable {
            debug!(
                failures = entry.failure_count,
                allowed = failures_allowed,
                "object blacklisted"
            );
        }

        entry.failure_count
    }

    /// Record a failure using the configured default allowance.
    pub fn record_failure(&mut self, object: &T, observation: Observation<C>) -> u32 {
        let allowed = self.config.default_failures_allowed;
        self.blacklist(object, observation, allowed)
    }

    /// Whether `object` has failed more often than allowed.
    ///
    /// Objects never recorded are reachable.
    pub fn unreachable(&self, object: &T) -> bool {
        self.entry(object).is_some_and(BlacklistEntry::is_unreachable)
    }

    /// `Err(Fault::Unreachable)` when [`Self::unreachable`] holds.
    pub fn ensure_reachable(&self, object: &T) -> Result<(), Fault> {
        let (key, _) = (self.locate)(object);
        match self.entries.get(&key) {
            Some(entry) if entry.is_unreachable() => Err(Fault::Unreachable {
                key: format!("{key:?}"),
                failures: entry.failure_count,
            }),
            _ => Ok(()),
        }
    }

    /// Failures recorded since the last improvement; zero when unknown.
    pub fn failure_count(&self, object: &T) -> u32 {
        self.entry(object).map_or(0, |entry| entry.failure_count)
    }

    /// The record for `object`, if any.
    pub fn entry(&self, object: &T) -> Option<&BlacklistEntry<C>> {
        let (key, _) = (self.locate)(object);
        self.entries.get(&key)
    }

    /// Forget `object` entirely.
    pub fn remove(&mut self, object: &T) -> Option<BlacklistEntry<C>> {
        let (key, _) = (self.locate)(object);
        self.entries.remove(&key)
    }

    /// Forget every object.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of objects with a record.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no object has a record.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Active configuration.
    pub fn config(&self) -> &BlacklistConfig {
        &self.config
    }
}

impl<C> ObjectBlacklist<BlockPos, BlockPos, C>
where
    C: Ord + Copy + Debug,
{
    /// Blacklist keyed by block position, measured to the block center.
    pub fn positional(config: BlacklistConfig) -> Self {
        Self::with_config(|pos: &BlockPos| (*pos, pos.center()), config)
    }
}

impl<T, K: Debug, C: Debug> Debug for ObjectBlacklist<T, K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectBlacklist")
            .field("entries", &self.entries)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A target identified by name, sitting at a fixed position.
    #[derive(Debug, Clone)]
    struct Target {
        name: &'static str,
        at: Vec3,
    }

    fn named() -> ObjectBlacklist<Target, &'static str, u8> {
        ObjectBlacklist::new(|t: &Target| (t.name, t.at))
    }

    fn seen_from(distance: f64, tier: u8) -> Observation<u8> {
        // Squared distance equals `distance` along the x axis.
        Observation {
            agent_position: Vec3::new(distance.sqrt(), 0.0, 0.0),
            tier,
        }
    }

    #[test]
    fn test_unknown_object_is_reachable() {
        let list = named();
        let target = Target { name: "chest", at: Vec3::ZERO };
        assert!(!list.unreachable(&target));
        assert_eq!(list.failure_count(&target), 0);
        assert!(list.ensure_reachable(&target).is_ok());
        assert!(list.is_empty());
    }

    #[test]
    fn test_stationary_failures_accumulate() {
        let mut list = named();
        let target = Target { name: "ore", at: Vec3::ZERO };

        let mut counts = Vec::new();
        let mut unreachable = Vec::new();
        for _ in 0..4 {
            counts.push(list.blacklist(&target, seen_from(100.0, 1), 3));
            unreachable.push(list.unreachable(&target));
        }
        assert_eq!(counts, vec![1, 2, 3, 4]);
        assert_eq!(unreachable, vec![false, false, false, true]);

        // Moving closer resets before counting.
        assert_eq!(list.blacklist(&target, seen_from(50.0, 1), 3), 1);
        assert!(!list.unreachable(&target));
        assert_eq!(list.entry(&target).unwrap().best_distance_sq.round(), 50.0);
    }

    #[test]
    fn test_higher_tier_resets() {
        let mut list = named();
        let target = Target { name: "obsidian", at: Vec3::ZERO };
        list.blacklist(&target, seen_from(9.0, 1), 1);
        list.blacklist(&target, seen_from(9.0, 1), 1);
        assert!(list.unreachable(&target));

        // Better tool, same spot.
        assert_eq!(list.blacklist(&target, seen_from(9.0, 2), 1), 1);
        assert!(!list.unreachable(&target));
        assert_eq!(list.entry(&target).unwrap().best_tier, 2);
    }

    #[test]
    fn test_axes_tracked_independently() {
        let mut list = named();
        let target = Target { name: "mob", at: Vec3::ZERO };
        list.blacklist(&target, seen_from(25.0, 3), 5);

        // Closer but weaker: distance improves, tier keeps its best.
        assert_eq!(list.blacklist(&target, seen_from(16.0, 1), 5), 1);
        let entry = list.entry(&target).unwrap();
        assert_eq!(entry.best_tier, 3);
        assert!((entry.best_distance_sq - 16.0).abs() < 1e-9);

        // Farther and weaker than both bests: just counts.
        assert_eq!(list.blacklist(&target, seen_from(25.0, 2), 5), 2);
    }

    #[test]
    fn test_small_approach_within_epsilon_does_not_reset() {
        let mut list = named();
        let target = Target { name: "door", at: Vec3::ZERO };
        list.blacklist(&target, seen_from(10.0, 0), 3);
        assert_eq!(list.blacklist(&target, seen_from(9.95, 0), 3), 2);
    }

    #[test]
    fn test_wider_epsilon_needs_a_bigger_approach() {
        let config = BlacklistConfig::default().with_distance_epsilon(1.0);
        let mut list = ObjectBlacklist::with_config(|t: &Target| (t.name, t.at), config);
        let target = Target { name: "lever", at: Vec3::ZERO };
        list.blacklist(&target, seen_from(10.0, 0), 3);

        assert_eq!(list.blacklist(&target, seen_from(9.5, 0), 3), 2);
        assert_eq!(list.blacklist(&target, seen_from(8.5, 0), 3), 1);
    }

    #[test]
    fn test_ensure_reachable_reports_fault() {
        let mut list = named();
        let target = Target { name: "bed", at: Vec3::ZERO };
        list.blacklist(&target, seen_from(4.0, 0), 0);

        let err = list.ensure_reachable(&target).unwrap_err();
        assert_eq!(
            err,
            Fault::Unreachable {
                key: "\"bed\"".to_string(),
                failures: 1,
            }
        );
    }

    #[test]
    fn test_record_failure_uses_default_allowance() {
        let config = BlacklistConfig::default().with_default_failures_allowed(1);
        let mut list: PositionBlacklist<u8> = ObjectBlacklist::positional(config);
        let pos = BlockPos::new(3, 60, -2);
        let obs = Observation {
            agent_position: Vec3::new(0.0, 60.0, 0.0),
            tier: 0,
        };

        list.record_failure(&pos, obs);
        assert!(!list.unreachable(&pos));
        list.record_failure(&pos, obs);
        assert!(list.unreachable(&pos));

        assert!(list.remove(&pos).is_some());
        assert!(!list.unreachable(&pos));
    }

    #[test]
    fn test_clear() {
        let mut list = named();
        list.blacklist(&Target { name: "a", at: Vec3::ZERO }, seen_from(1.0, 0), 1);
        list.blacklist(&Target { name: "b", at: Vec3::ZERO }, seen_from(1.0, 0), 1);
        assert_eq!(list.len(), 2);
        list.clear();
        assert!(list.is_empty());
    }
}
