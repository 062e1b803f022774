//! Clef core primitives.
//!
//! Shared vocabulary for the control core: identities, geometry, game time,
//! the agent facade and the fault taxonomy.

#![warn(missing_docs)]

// Core identities
mod id;

// World vocabulary
mod geometry;
mod agent;

// Game time
mod time;

// Failure signals
mod fault;

// Re-exports
pub use id::RunId;
pub use geometry::{BlockPos, Vec3};
pub use agent::AgentView;
pub use time::{Clock, ManualClock, SharedClock, SystemClock, Timer};
pub use fault::{Fault, InvariantViolation};
