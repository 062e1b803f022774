//! Behaviors of the simulated miner.
//!
//! ```text
//! CollectOre → MineBlock → WalkTo → Break (obstacle)
//!                        → Break (ore)
//! ReturnHome → WalkTo
//! ```

use crate::world::{OreIndex, SimWorld, HOME, INVENTORY_SLOTS};
use clef_blacklist::Observation;
use clef_core::BlockPos;
use clef_execution::{same_node, NodeOutcome, TaskNode, TickContext};
use clef_progress::{MovementCheckerConfig, MovementProgressChecker};
use tracing::{debug, info, warn};

type Node = Box<dyn TaskNode<SimWorld>>;

/// Rank root tasks for this tick, most urgent first.
pub fn plan(world: &SimWorld, movement: &MovementCheckerConfig) -> Vec<Node> {
    let mut candidates: Vec<Node> = Vec::new();
    let has_work = world.reachable_ores().next().is_some();
    let full = world.inventory.len() >= INVENTORY_SLOTS;
    if full || (!has_work && !world.inventory.is_empty()) {
        candidates.push(Box::new(ReturnHome::new(movement.clone())));
    }
    if has_work {
        candidates.push(Box::new(CollectOre::new(movement.clone())));
    }
    candidates
}

/// Mine the nearest ore that has not been given up on.
pub struct CollectOre {
    movement: MovementCheckerConfig,
}

impl CollectOre {
    pub fn new(movement: MovementCheckerConfig) -> Self {
        Self { movement }
    }
}

impl PartialEq for CollectOre {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl TaskNode<SimWorld> for CollectOre {
    fn name(&self) -> String {
        "collect ore".to_string()
    }

    fn on_start(&mut self, _ctx: &mut TickContext<'_, SimWorld>) {}

    fn on_tick(&mut self, ctx: &mut TickContext<'_, SimWorld>) -> Option<Node> {
        let world = &*ctx.world;
        let target = ctx
            .read_tracker::<OreIndex, _>(|index| {
                index
                    .by_distance
                    .iter()
                    .copied()
                    .find(|pos| world.is_solid(pos) && !world.blacklist.unreachable(pos))
            })
            .flatten()?;
        Some(Box::new(MineBlock::new(target, self.movement.clone())))
    }

    fn on_stop(&mut self, _ctx: &mut TickContext<'_, SimWorld>, _interrupt: Option<&dyn TaskNode<SimWorld>>) {}

    fn is_finished(&self, ctx: &TickContext<'_, SimWorld>) -> bool {
        ctx.world.reachable_ores().next().is_none()
    }

    fn is_equal(&self, other: &dyn TaskNode<SimWorld>) -> bool {
        same_node(self, other)
    }

    fn on_child_done(
        &mut self,
        ctx: &mut TickContext<'_, SimWorld>,
        child: &dyn TaskNode<SimWorld>,
        outcome: NodeOutcome,
    ) {
        if outcome != NodeOutcome::Failed {
            return;
        }
        let Some(mine) = child.as_any().downcast_ref::<MineBlock>() else {
            return;
        };

        let observation = Observation::of(&*ctx.world, ctx.world.tier);
        let failures = ctx.world.blacklist.record_failure(&mine.target, observation);
        if ctx.world.blacklist.unreachable(&mine.target) {
            warn!(ore = %mine.target, failures, "giving up on ore");
        } else {
            info!(ore = %mine.target, failures, "mining failed, will retry");
        }
    }
}

/// Carry the inventory home and drop it off.
pub struct ReturnHome {
    movement: MovementCheckerConfig,
    failed: bool,
}

impl ReturnHome {
    pub fn new(movement: MovementCheckerConfig) -> Self {
        Self {
            movement,
            failed: false,
        }
    }
}

impl PartialEq for ReturnHome {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl TaskNode<SimWorld> for ReturnHome {
    fn name(&self) -> String {
        "return home".to_string()
    }

    fn on_start(&mut self, _ctx: &mut TickContext<'_, SimWorld>) {}

    fn on_tick(&mut self, ctx: &mut TickContext<'_, SimWorld>) -> Option<Node> {
        if !ctx.world.within_reach(&HOME) {
            return Some(Box::new(WalkTo::new(HOME, self.movement.clone())));
        }
        let count = ctx.world.deposit();
        if count > 0 {
            info!(count, stored = ctx.world.stored.len(), "deposited ore");
        }
        None
    }

    fn on_stop(&mut self, _ctx: &mut TickContext<'_, SimWorld>, _interrupt: Option<&dyn TaskNode<SimWorld>>) {}

    fn is_finished(&self, ctx: &TickContext<'_, SimWorld>) -> bool {
        ctx.world.inventory.is_empty()
    }

    fn is_failed(&self) -> bool {
        self.failed
    }

    fn is_equal(&self, other: &dyn TaskNode<SimWorld>) -> bool {
        same_node(self, other)
    }

    fn on_child_done(
        &mut self,
        _ctx: &mut TickContext<'_, SimWorld>,
        _child: &dyn TaskNode<SimWorld>,
        outcome: NodeOutcome,
    ) {
        self.failed = outcome == NodeOutcome::Failed;
    }
}

/// Get next to one block and break it.
pub struct MineBlock {
    target: BlockPos,
    movement: MovementCheckerConfig,
    checker: Option<MovementProgressChecker>,
    failed: bool,
}

impl MineBlock {
    pub fn new(target: BlockPos, movement: MovementCheckerConfig) -> Self {
        Self {
            target,
            movement,
            checker: None,
            failed: false,
        }
    }
}

impl PartialEq for MineBlock {
    fn eq(&self, other: &Self) -> bool {
        self.target == other.target
    }
}

impl TaskNode<SimWorld> for MineBlock {
    fn name(&self) -> String {
        format!("mine {}", self.target)
    }

    fn on_start(&mut self, ctx: &mut TickContext<'_, SimWorld>) {
        self.checker = Some(MovementProgressChecker::new(ctx.world.clock.shared(), &self.movement));
    }

    fn on_tick(&mut self, ctx: &mut TickContext<'_, SimWorld>) -> Option<Node> {
        if !ctx.world.within_reach(&self.target) {
            return Some(Box::new(WalkTo::new(self.target, self.movement.clone())));
        }

        let damage = ctx.world.damage(&self.target);
        if let Some(checker) = self.checker.as_mut() {
            if !checker.check(ctx.world.agent, Some(damage)) {
                debug!(block = %self.target, damage, "breaking stalled");
                self.failed = true;
                return None;
            }
        }
        Some(Box::new(Break::new(self.target)))
    }

    fn on_stop(&mut self, _ctx: &mut TickContext<'_, SimWorld>, _interrupt: Option<&dyn TaskNode<SimWorld>>) {}

    fn is_finished(&self, ctx: &TickContext<'_, SimWorld>) -> bool {
        !ctx.world.is_solid(&self.target)
    }

    fn is_failed(&self) -> bool {
        self.failed
    }

    fn is_equal(&self, other: &dyn TaskNode<SimWorld>) -> bool {
        same_node(self, other)
    }

    fn on_child_done(
        &mut self,
        _ctx: &mut TickContext<'_, SimWorld>,
        _child: &dyn TaskNode<SimWorld>,
        outcome: NodeOutcome,
    ) {
        if outcome == NodeOutcome::Failed {
            self.failed = true;
        }
    }
}

/// Walk in a straight line, digging through whatever is in the way.
pub struct WalkTo {
    goal: BlockPos,
    movement: MovementCheckerConfig,
    checker: Option<MovementProgressChecker>,
    failed: bool,
}

impl WalkTo {
    pub fn new(goal: BlockPos, movement: MovementCheckerConfig) -> Self {
        Self {
            goal,
            movement,
            checker: None,
            failed: false,
        }
    }
}

impl PartialEq for WalkTo {
    fn eq(&self, other: &Self) -> bool {
        self.goal == other.goal
    }
}

impl TaskNode<SimWorld> for WalkTo {
    fn name(&self) -> String {
        format!("walk to {}", self.goal)
    }

    fn on_start(&mut self, ctx: &mut TickContext<'_, SimWorld>) {
        self.checker = Some(MovementProgressChecker::new(ctx.world.clock.shared(), &self.movement));
    }

    fn on_tick(&mut self, ctx: &mut TickContext<'_, SimWorld>) -> Option<Node> {
        let obstacle = ctx.world.step_towards(self.goal.center());
        let mining = obstacle.map(|pos| ctx.world.damage(&pos));
        if let Some(checker) = self.checker.as_mut() {
            if !checker.check(ctx.world.agent, mining) {
                debug!(goal = %self.goal, "walking stalled");
                self.failed = true;
                return None;
            }
        }
        obstacle.map(|pos| Box::new(Break::new(pos)) as Node)
    }

    fn on_stop(&mut self, _ctx: &mut TickContext<'_, SimWorld>, _interrupt: Option<&dyn TaskNode<SimWorld>>) {}

    fn is_finished(&self, ctx: &TickContext<'_, SimWorld>) -> bool {
        ctx.world.within_reach(&self.goal)
    }

    fn is_failed(&self) -> bool {
        self.failed
    }

    fn is_equal(&self, other: &dyn TaskNode<SimWorld>) -> bool {
        same_node(self, other)
    }

    fn on_child_done(
        &mut self,
        _ctx: &mut TickContext<'_, SimWorld>,
        _child: &dyn TaskNode<SimWorld>,
        outcome: NodeOutcome,
    ) {
        if outcome == NodeOutcome::Failed {
            self.failed = true;
        }
    }
}

/// Hold the attack on one block until it breaks.
pub struct Break {
    pos: BlockPos,
}

impl Break {
    pub fn new(pos: BlockPos) -> Self {
        Self { pos }
    }
}

impl PartialEq for Break {
    fn eq(&self, other: &Self) -> bool {
        self.pos == other.pos
    }
}

impl TaskNode<SimWorld> for Break {
    fn name(&self) -> String {
        format!("break {}", self.pos)
    }

    fn on_start(&mut self, ctx: &mut TickContext<'_, SimWorld>) {
        ctx.world.digging = Some(self.pos);
    }

    fn on_tick(&mut self, ctx: &mut TickContext<'_, SimWorld>) -> Option<Node> {
        if ctx.world.dig(self.pos) {
            debug!(block = %self.pos, "block broken");
        }
        None
    }

    fn on_stop(&mut self, ctx: &mut TickContext<'_, SimWorld>, _interrupt: Option<&dyn TaskNode<SimWorld>>) {
        // Let go of the attack whatever the reason.
        ctx.world.digging = None;
    }

    fn is_finished(&self, ctx: &TickContext<'_, SimWorld>) -> bool {
        !ctx.world.is_solid(&self.pos)
    }

    fn is_equal(&self, other: &dyn TaskNode<SimWorld>) -> bool {
        same_node(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::BlockKind;
    use clef_blacklist::BlacklistConfig;
    use clef_core::{ManualClock, Vec3};

    fn world() -> SimWorld {
        SimWorld::new(ManualClock::new(), BlacklistConfig::default())
    }

    fn names(candidates: &[Node]) -> Vec<String> {
        candidates.iter().map(|node| node.name()).collect()
    }

    #[test]
    fn test_plan_prefers_home_when_full() {
        let movement = MovementCheckerConfig::default();
        let mut world = world();
        world.place(BlockPos::new(5, 0, 0), BlockKind::Ore { tier: 0 });

        assert_eq!(names(&plan(&world, &movement)), vec!["collect ore"]);

        world.inventory = vec![BlockPos::new(1, 0, 1), BlockPos::new(2, 0, 2)];
        assert_eq!(
            names(&plan(&world, &movement)),
            vec!["return home", "collect ore"]
        );
    }

    #[test]
    fn test_plan_empty_when_done() {
        let movement = MovementCheckerConfig::default();
        let world = world();
        assert!(plan(&world, &movement).is_empty());
        assert!(world.is_done());
    }

    #[test]
    fn test_node_identity() {
        let movement = MovementCheckerConfig::default();
        let a: Node = Box::new(MineBlock::new(BlockPos::new(1, 0, 0), movement.clone()));
        let b: Node = Box::new(MineBlock::new(BlockPos::new(1, 0, 0), movement.clone()));
        let c: Node = Box::new(WalkTo::new(BlockPos::new(1, 0, 0), movement.clone()));
        assert!(a.is_equal(b.as_ref()));
        assert!(!a.is_equal(c.as_ref()));
        assert!(!c.is_equal(a.as_ref()));
    }

    #[test]
    fn test_reach() {
        let mut world = world();
        world.agent = Vec3::new(2.1, 0.0, 0.5);
        assert!(world.within_reach(&BlockPos::new(3, 0, 0)));
        world.agent = Vec3::new(1.5, 0.0, 0.5);
        assert!(!world.within_reach(&BlockPos::new(3, 0, 0)));
    }
}
