//! A tiny flat mining world for the simulator.

use clef_blacklist::{BlacklistConfig, PositionBlacklist};
use clef_core::{AgentView, BlockPos, ManualClock, Vec3};
use clef_tracker::{ProgressiveState, TrackedState};
use std::collections::HashMap;
use std::time::Duration;

/// Simulated time per tick.
pub const TICK: Duration = Duration::from_millis(50);

/// Blocks walked per tick.
pub const WALK_SPEED: f64 = 0.2;

/// How far from a block center the agent can work on it.
pub const REACH: f64 = 1.5;

/// Ores carried before heading home.
pub const INVENTORY_SLOTS: usize = 2;

/// Where ore is dropped off.
pub const HOME: BlockPos = BlockPos::new(0, 0, 0);

/// Breaking damage per tick with a good enough pick.
const DIG_RATE: f64 = 0.25;

/// What a block is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Plain stone, anyone can break it
    Stone,
    /// Ore needing at least `tier` to break
    Ore { tier: u8 },
}

/// A solid block and how far it has been broken.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub kind: BlockKind,
    pub damage: f64,
}

impl Block {
    fn new(kind: BlockKind) -> Self {
        Self { kind, damage: 0.0 }
    }
}

/// Everything the behaviors act on.
pub struct SimWorld {
    pub clock: ManualClock,
    pub agent: Vec3,
    pub tier: u8,
    pub blocks: HashMap<BlockPos, Block>,
    pub inventory: Vec<BlockPos>,
    pub stored: Vec<BlockPos>,
    pub blacklist: PositionBlacklist<u8>,
    pub digging: Option<BlockPos>,
}

impl SimWorld {
    /// An empty world with the agent standing on `HOME`.
    pub fn new(clock: ManualClock, blacklist: BlacklistConfig) -> Self {
        Self {
            clock,
            agent: Vec3::new(0.5, 0.0, 0.5),
            tier: 0,
            blocks: HashMap::new(),
            inventory: Vec::new(),
            stored: Vec::new(),
            blacklist: PositionBlacklist::positional(blacklist),
            digging: None,
        }
    }

    /// The demo layout: three plain ores, one ore too hard for the starting
    /// pick, and a stone wall between home and the farthest ore.
    pub fn scenario(clock: ManualClock, blacklist: BlacklistConfig) -> Self {
        let mut world = Self::new(clock, blacklist);
        world.place(BlockPos::new(1, 0, 3), BlockKind::Ore { tier: 1 });
        world.place(BlockPos::new(-4, 0, -1), BlockKind::Ore { tier: 0 });
        world.place(BlockPos::new(0, 0, -7), BlockKind::Ore { tier: 0 });
        world.place(BlockPos::new(9, 0, 0), BlockKind::Ore { tier: 0 });
        for z in -2..=2 {
            world.place(BlockPos::new(6, 0, z), BlockKind::Stone);
        }
        world
    }

    pub fn place(&mut self, pos: BlockPos, kind: BlockKind) {
        self.blocks.insert(pos, Block::new(kind));
    }

    pub fn is_solid(&self, pos: &BlockPos) -> bool {
        self.blocks.contains_key(pos)
    }

    /// Breaking progress of the block at `pos` in [0, 1].
    pub fn damage(&self, pos: &BlockPos) -> f64 {
        self.blocks.get(pos).map_or(1.0, |block| block.damage)
    }

    /// Whether the agent is close enough to work on `pos`.
    pub fn within_reach(&self, pos: &BlockPos) -> bool {
        self.agent.distance(&pos.center()) <= REACH
    }

    /// Hit the block at `pos` once. Returns true when it broke.
    pub fn dig(&mut self, pos: BlockPos) -> bool {
        let Some(block) = self.blocks.get_mut(&pos) else {
            return false;
        };
        let required = match block.kind {
            BlockKind::Stone => 0,
            BlockKind::Ore { tier } => tier,
        };
        if self.tier < required {
            return false;
        }

        block.damage = (block.damage + DIG_RATE).min(1.0);
        if block.damage < 1.0 {
            return false;
        }
        let kind = block.kind;
        self.blocks.remove(&pos);
        if matches!(kind, BlockKind::Ore { .. }) {
            self.inventory.push(pos);
        }
        true
    }

    /// Take one step towards `goal`. Returns the solid block in the way, if any.
    pub fn step_towards(&mut self, goal: Vec3) -> Option<BlockPos> {
        let mut offset = goal - self.agent;
        offset.y = 0.0;
        let length = offset.length();
        if length <= f64::EPSILON {
            return None;
        }
        let stride = WALK_SPEED.min(length) / length;
        let next = self.agent + Vec3::new(offset.x * stride, 0.0, offset.z * stride);
        let cell = BlockPos::containing(&next);
        if self.is_solid(&cell) {
            return Some(cell);
        }
        self.agent = next;
        None
    }

    /// Ores not yet given up on.
    pub fn reachable_ores(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.blocks
            .iter()
            .filter(|(_, block)| matches!(block.kind, BlockKind::Ore { .. }))
            .map(|(pos, _)| *pos)
            .filter(move |pos| !self.blacklist.unreachable(pos))
    }

    /// Hand the inventory in.
    pub fn deposit(&mut self) -> usize {
        let count = self.inventory.len();
        self.stored.append(&mut self.inventory);
        count
    }

    /// Nothing left worth doing.
    pub fn is_done(&self) -> bool {
        self.inventory.is_empty() && self.reachable_ores().next().is_none()
    }
}

impl AgentView for SimWorld {
    fn position(&self) -> Vec3 {
        self.agent
    }

    fn is_on_ground(&self) -> bool {
        true
    }
}

/// Ores sorted nearest first, refreshed every tick.
#[derive(Debug, Default)]
pub struct OreIndex {
    pub by_distance: Vec<BlockPos>,
}

impl TrackedState<SimWorld> for OreIndex {
    fn update(&mut self, world: &SimWorld) {
        self.by_distance = world
            .blocks
            .iter()
            .filter(|(_, block)| matches!(block.kind, BlockKind::Ore { .. }))
            .map(|(pos, _)| *pos)
            .collect();
        let agent = world.agent;
        self.by_distance.sort_by(|a, b| {
            agent
                .distance_sq(&a.center())
                .total_cmp(&agent.distance_sq(&b.center()))
                .then_with(|| a.cmp(b))
        });
    }

    fn clear(&mut self) {
        self.by_distance.clear();
    }
}

/// Counts solid blocks a few at a time.
#[derive(Debug, Default)]
pub struct BlockSurvey {
    pending: Vec<BlockPos>,
    scanned: usize,
    ores: usize,
    stone: usize,
}

/// Result of a finished survey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurveyCounts {
    pub ores: usize,
    pub stone: usize,
}

impl BlockSurvey {
    const PER_STEP: usize = 3;
}

impl ProgressiveState<SimWorld> for BlockSurvey {
    type Snapshot = SurveyCounts;

    fn begin(&mut self, world: &SimWorld) {
        self.pending = world.blocks.keys().copied().collect();
        self.pending.sort();
        self.scanned = 0;
        self.ores = 0;
        self.stone = 0;
    }

    fn step(&mut self, world: &SimWorld) -> f32 {
        let end = (self.scanned + Self::PER_STEP).min(self.pending.len());
        for pos in &self.pending[self.scanned..end] {
            match world.blocks.get(pos).map(|block| block.kind) {
                Some(BlockKind::Ore { .. }) => self.ores += 1,
                Some(BlockKind::Stone) => self.stone += 1,
                None => {}
            }
        }
        self.scanned = end;
        if self.pending.is_empty() {
            1.0
        } else {
            self.scanned as f32 / self.pending.len() as f32
        }
    }

    fn finish(&mut self) -> SurveyCounts {
        SurveyCounts {
            ores: self.ores,
            stone: self.stone,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clef_tracker::TrackerManager;

    fn world() -> SimWorld {
        SimWorld::new(ManualClock::new(), BlacklistConfig::default())
    }

    #[test]
    fn test_dig_respects_tier() {
        let mut world = world();
        let hard = BlockPos::new(1, 0, 0);
        world.place(hard, BlockKind::Ore { tier: 1 });

        for _ in 0..10 {
            assert!(!world.dig(hard));
        }
        assert_eq!(world.damage(&hard), 0.0);

        world.tier = 1;
        let broke: Vec<bool> = (0..4).map(|_| world.dig(hard)).collect();
        assert_eq!(broke, vec![false, false, false, true]);
        assert!(!world.is_solid(&hard));
        assert_eq!(world.inventory, vec![hard]);
    }

    #[test]
    fn test_step_blocked_by_wall() {
        let mut world = world();
        world.agent = Vec3::new(0.5, 0.0, 0.5);
        world.place(BlockPos::new(1, 0, 0), BlockKind::Stone);

        // 0.5 -> 0.7 -> 0.9, then the wall at x = 1.
        assert_eq!(world.step_towards(Vec3::new(5.5, 0.0, 0.5)), None);
        assert_eq!(world.step_towards(Vec3::new(5.5, 0.0, 0.5)), None);
        assert_eq!(
            world.step_towards(Vec3::new(5.5, 0.0, 0.5)),
            Some(BlockPos::new(1, 0, 0))
        );
        assert!((world.agent.x - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_ore_index_sorted_nearest_first() {
        let mut world = world();
        world.place(BlockPos::new(8, 0, 0), BlockKind::Ore { tier: 0 });
        world.place(BlockPos::new(2, 0, 0), BlockKind::Ore { tier: 0 });
        world.place(BlockPos::new(4, 0, 0), BlockKind::Stone);

        let mut index = OreIndex::default();
        index.update(&world);
        assert_eq!(
            index.by_distance,
            vec![BlockPos::new(2, 0, 0), BlockPos::new(8, 0, 0)]
        );
    }

    #[test]
    fn test_survey_spans_ticks() {
        let world = SimWorld::scenario(ManualClock::new(), BlacklistConfig::default());
        let mut trackers = TrackerManager::new();
        trackers.register_progressive("survey", BlockSurvey::default());
        let survey = trackers.get_progressive::<BlockSurvey>().unwrap();

        // Nine blocks, three per step.
        for _ in 0..2 {
            trackers.mark_all_dirty();
            assert_eq!(survey.read(&world, |counts| *counts), None);
        }
        trackers.mark_all_dirty();
        assert_eq!(
            survey.read(&world, |counts| *counts),
            Some(SurveyCounts { ores: 4, stone: 5 })
        );
    }
}
