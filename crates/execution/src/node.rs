//! The task node contract.

use crate::YieldGuard;
use clef_tracker::{TrackedState, TrackerManager};
use std::any::Any;

/// Upcast to [`Any`] for structural comparison across node types.
///
/// Implemented for every `'static` type; nodes never implement it by hand.
pub trait AsAny {
    /// `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// How a node ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    /// The node reached its goal.
    Finished,
    /// The node gave up.
    Failed,
}

/// What a node sees while it runs.
pub struct TickContext<'a, W> {
    /// The shared world facade
    pub world: &'a mut W,
    /// Cached world queries, refreshed lazily once per tick
    pub trackers: &'a TrackerManager<W>,
    /// Number of the tick being executed
    pub tick: u64,
}

impl<'a, W: 'static> TickContext<'a, W> {
    /// Read tracker state `S` against the current world.
    pub fn read_tracker<S, R>(&self, f: impl FnOnce(&S) -> R) -> Option<R>
    where
        S: TrackedState<W> + 'static,
    {
        self.trackers.read(&*self.world, f)
    }
}

/// A unit of behavior run by the [`crate::Executor`].
///
/// Identity is structural: [`TaskNode::is_equal`] compares the parameters
/// that define what the node is trying to do, not the node's internal
/// progress. A node reporting finished or failed is terminal and is stopped
/// before it could be ticked again.
///
/// Nodes never let a fault escape. Anything that goes wrong inside a node is
/// turned into `is_failed() == true`, and the parent decides what that means.
pub trait TaskNode<W>: AsAny {
    /// Short human-readable description.
    fn name(&self) -> String;

    /// Called once before the first tick.
    fn on_start(&mut self, ctx: &mut TickContext<'_, W>);

    /// Do this tick's work. Returning a node asks the executor to run it as
    /// this node's child; returning `None` makes this node the leaf.
    fn on_tick(&mut self, ctx: &mut TickContext<'_, W>) -> Option<Box<dyn TaskNode<W>>>;

    /// Release anything held. `interrupt` is the node replacing this one, if
    /// the stop is an interruption rather than a completion or cancellation.
    fn on_stop(&mut self, ctx: &mut TickContext<'_, W>, interrupt: Option<&dyn TaskNode<W>>);

    /// Whether the node reached its goal.
    fn is_finished(&self, ctx: &TickContext<'_, W>) -> bool;

    /// Whether the node gave up.
    fn is_failed(&self) -> bool {
        false
    }

    /// Structural equality with another node.
    fn is_equal(&self, other: &dyn TaskNode<W>) -> bool;

    /// Veto on being interrupted. Nodes without a guard always yield.
    fn yield_guard(&self) -> Option<&dyn YieldGuard<W>> {
        None
    }

    /// Called on a parent after its child ended and was stopped, before the
    /// child is dropped.
    fn on_child_done(
        &mut self,
        _ctx: &mut TickContext<'_, W>,
        _child: &dyn TaskNode<W>,
        _outcome: NodeOutcome,
    ) {
    }
}

/// Value equality between `node` and `other` when both are the same type.
///
/// The usual body of [`TaskNode::is_equal`] for nodes implementing
/// `PartialEq` over their defining parameters.
pub fn same_node<W, T>(node: &T, other: &dyn TaskNode<W>) -> bool
where
    T: PartialEq + 'static,
{
    other
        .as_any()
        .downcast_ref::<T>()
        .is_some_and(|other| other == node)
}

impl<W> dyn TaskNode<W> {
    /// Terminal state, if any. Failure wins over completion.
    pub fn outcome(&self, ctx: &TickContext<'_, W>) -> Option<NodeOutcome> {
        if self.is_failed() {
            Some(NodeOutcome::Failed)
        } else if self.is_finished(ctx) {
            Some(NodeOutcome::Finished)
        } else {
            None
        }
    }
}
