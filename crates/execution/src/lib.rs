//! Execution layer - the hierarchical interruption and continuation engine.
//!
//! An [`Executor`] runs one chain of [`TaskNode`]s from a root to a leaf,
//! swapping the root when the planner offers something different, keeping
//! structurally equal nodes alive across ticks, and unwinding finished nodes
//! a bounded number of times per tick.

#![warn(missing_docs)]

pub mod node;
pub mod guard;
pub mod chain;
pub mod executor;
pub mod runtime;
pub mod config;

pub use node::{same_node, AsAny, NodeOutcome, TaskNode, TickContext};
pub use guard::{RequireGrounded, YieldGuard};
pub use chain::{ChainSnapshot, NodeSummary};
pub use executor::{Executor, TickReport};
pub use runtime::Runtime;
pub use config::{ClefConfig, ConfigError, ExecutorConfig};
