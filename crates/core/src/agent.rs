//! Read-only view of the controlled agent.

use crate::Vec3;

/// The part of the world facade the core itself needs.
///
/// Concrete worlds expose much more (inventory, block and entity queries);
/// behaviors reach those through their own world type. The core only asks
/// where the agent is and whether it stands on solid ground.
pub trait AgentView {
    /// Current position of the agent.
    fn position(&self) -> Vec3;

    /// Whether the agent currently stands on solid ground.
    fn is_on_ground(&self) -> bool;
}
