//! Vetoes on interruption.

use crate::TaskNode;
use clef_core::AgentView;

/// Decides whether a running root may be replaced this tick.
///
/// Nodes opt in through [`TaskNode::yield_guard`]. A refusal keeps the whole
/// chain in place for the tick; the executor asks again on the next one.
pub trait YieldGuard<W> {
    /// Whether the node may be stopped in favour of `candidate`.
    fn should_yield(&self, world: &W, candidate: &dyn TaskNode<W>) -> bool;
}

/// Refuses interruption while the agent is off the ground.
///
/// For behaviors that cannot safely be abandoned mid-air, such as a jump or a
/// fall being broken by placing a block.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireGrounded;

impl<W: AgentView> YieldGuard<W> for RequireGrounded {
    fn should_yield(&self, world: &W, _candidate: &dyn TaskNode<W>) -> bool {
        world.is_on_ground()
    }
}
