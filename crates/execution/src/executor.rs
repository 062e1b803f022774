//! The executor - runs one chain of task nodes per tick.

use crate::chain::{ChainSlot, ChainSnapshot};
use crate::{ExecutorConfig, NodeOutcome, TaskNode, TickContext};
use clef_core::{Fault, InvariantViolation};
use clef_tracker::TrackerManager;
use tracing::{debug, debug_span, info, trace, warn};

/// What happened during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Nodes started this tick
    pub started: usize,
    /// Nodes stopped this tick
    pub stopped: usize,
    /// `on_tick` calls made this tick
    pub ticked: usize,
    /// Terminal nodes unwound this tick
    pub cascades: usize,
    /// Whether unwinding stopped at the cascade bound
    pub deferred: bool,
    /// Whether the root vetoed a different candidate
    pub yield_refused: bool,
    /// Set when the root itself ended this tick
    pub root_outcome: Option<NodeOutcome>,
    /// Name of the leaf after the tick
    pub leaf: Option<String>,
    /// Failure surfaced to the caller
    pub fault: Option<Fault>,
}

/// Runs the active chain.
///
/// Per tick:
/// ```text
/// Pick root → (Interrupt old chain) → Walk root to leaf → Unwind finished nodes
/// ```
pub struct Executor<W> {
    chain: Vec<ChainSlot<W>>,
    config: ExecutorConfig,
    ticks: u64,
}

impl<W: 'static> Executor<W> {
    /// Create an executor with default bounds.
    pub fn new() -> Self {
        Self::with_config(ExecutorConfig::default())
    }

    /// Create an executor with explicit bounds.
    pub fn with_config(config: ExecutorConfig) -> Self {
        Self {
            chain: Vec::new(),
            config,
            ticks: 0,
        }
    }

    /// Active bounds.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Whether a chain is running.
    pub fn is_active(&self) -> bool {
        !self.chain.is_empty()
    }

    /// Number of nodes in the chain.
    pub fn depth(&self) -> usize {
        self.chain.len()
    }

    /// Names of the running nodes from root to leaf.
    pub fn chain_names(&self) -> Vec<String> {
        self.chain.iter().map(|slot| slot.node.name()).collect()
    }

    /// Describe the running chain.
    pub fn snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            timestamp: chrono::Utc::now(),
            tick: self.ticks,
            nodes: self
                .chain
                .iter()
                .enumerate()
                .map(|(depth, slot)| slot.summary(depth))
                .collect(),
        }
    }

    /// Run one tick.
    ///
    /// `candidates` is the planner's ranking of root tasks for this tick;
    /// only the first one matters.
    pub fn tick<I>(&mut self, world: &mut W, trackers: &TrackerManager<W>, candidates: I) -> TickReport
    where
        I: IntoIterator<Item = Box<dyn TaskNode<W>>>,
    {
        self.ticks += 1;
        let _span = debug_span!("tick", tick = self.ticks).entered();

        let mut report = TickReport {
            tick: self.ticks,
            ..Default::default()
        };
        let mut ctx = TickContext {
            world,
            trackers,
            tick: self.ticks,
        };

        let top = candidates.into_iter().next();
        match top {
            None if self.chain.is_empty() => {
                warn!("no candidate to run");
                report.fault = Some(InvariantViolation::NoCandidates.into());
                return report;
            }
            None => {}
            Some(candidate) => self.choose_root(candidate, &mut ctx, &mut report),
        }

        self.walk(&mut ctx, &mut report);
        report.leaf = self.chain.last().map(|slot| slot.node.name());
        report
    }

    /// Stop every node in the chain, leaf first. Returns how many were stopped.
    pub fn stop_all(&mut self, world: &mut W, trackers: &TrackerManager<W>) -> usize {
        let mut ctx = TickContext {
            world,
            trackers,
            tick: self.ticks,
        };
        let mut report = TickReport::default();
        if !self.chain.is_empty() {
            info!(chain = ?self.chain_names(), "stopping chain");
        }
        self.stop_from(0, &mut ctx, None, &mut report);
        report.stopped
    }

    fn choose_root(
        &mut self,
        candidate: Box<dyn TaskNode<W>>,
        ctx: &mut TickContext<'_, W>,
        report: &mut TickReport,
    ) {
        let Some(root) = self.chain.first() else {
            self.start(candidate, ctx, report);
            return;
        };

        if root.node.is_equal(candidate.as_ref()) {
            trace!(root = %root.node.name(), "candidate matches running root");
            return;
        }

        let yields = root
            .node
            .yield_guard()
            .map_or(true, |guard| guard.should_yield(&*ctx.world, candidate.as_ref()));
        if !yields {
            debug!(
                root = %root.node.name(),
                candidate = %candidate.name(),
                "root refused to yield"
            );
            report.yield_refused = true;
            return;
        }

        info!(
            from = %root.node.name(),
            to = %candidate.name(),
            "interrupting chain"
        );
        self.stop_from(0, ctx, Some(candidate.as_ref()), report);
        self.start(candidate, ctx, report);
    }

    /// Walk from the root towards the leaf, ticking each node and unwinding
    /// terminal ones.
    fn walk(&mut self, ctx: &mut TickContext<'_, W>, report: &mut TickReport) {
        let mut i = 0;
        while i < self.chain.len() {
            if let Some(outcome) = self.chain[i].node.outcome(ctx) {
                if report.cascades >= self.config.max_cascade_per_tick {
                    let limit = self.config.max_cascade_per_tick;
                    warn!(limit, node = %self.chain[i].node.name(), "cascade limit reached, deferring to next tick");
                    report.deferred = true;
                    report.fault = Some(InvariantViolation::CascadeLimit { limit }.into());
                    return;
                }
                self.unwind(i, outcome, ctx, report);
                if i == 0 {
                    return;
                }
                i -= 1;
                continue;
            }

            report.ticked += 1;
            let Some(child) = self.chain[i].node.on_tick(ctx) else {
                if i + 1 < self.chain.len() {
                    debug!(parent = %self.chain[i].node.name(), "parent dropped its child");
                    self.stop_from(i + 1, ctx, None, report);
                }
                if self.chain[i].node.outcome(ctx).is_some() {
                    // Unwound at the top of the next iteration.
                    continue;
                }
                return;
            };

            // A node that ended during its own tick gets no child.
            if self.chain[i].node.outcome(ctx).is_some() {
                debug!(node = %self.chain[i].node.name(), child = %child.name(), "dropping child of ended node");
                continue;
            }

            if let Some(existing) = self.chain.get(i + 1) {
                if existing.node.is_equal(child.as_ref()) {
                    i += 1;
                    continue;
                }
            }

            if i + 1 >= self.config.max_chain_depth {
                let limit = self.config.max_chain_depth;
                warn!(limit, child = %child.name(), "chain depth limit reached");
                report.fault = Some(InvariantViolation::ChainTooDeep { limit }.into());
                return;
            }

            if i + 1 < self.chain.len() {
                self.stop_from(i + 1, ctx, Some(child.as_ref()), report);
            }
            self.start(child, ctx, report);
            i += 1;
        }
    }

    /// Stop a terminal node together with anything below it, tell its parent,
    /// and pop it.
    fn unwind(
        &mut self,
        index: usize,
        outcome: NodeOutcome,
        ctx: &mut TickContext<'_, W>,
        report: &mut TickReport,
    ) {
        report.cascades += 1;
        let name = self.chain[index].node.name();
        debug!(node = %name, ?outcome, depth = index, "node ended");

        if index + 1 < self.chain.len() {
            self.stop_from(index + 1, ctx, None, report);
        }
        self.chain[index].node.on_stop(ctx, None);
        report.stopped += 1;

        if index == 0 {
            match outcome {
                NodeOutcome::Finished => info!(root = %name, "root finished"),
                NodeOutcome::Failed => {
                    warn!(root = %name, "root failed");
                    report.fault = Some(Fault::NodeFailure { node: name });
                }
            }
            report.root_outcome = Some(outcome);
        } else {
            let (parents, rest) = self.chain.split_at_mut(index);
            let parent = &mut parents[index - 1];
            parent.node.on_child_done(ctx, rest[0].node.as_ref(), outcome);
        }

        self.chain.truncate(index);
    }

    /// Stop `chain[from..]` leaf first, then drop those slots.
    fn stop_from(
        &mut self,
        from: usize,
        ctx: &mut TickContext<'_, W>,
        interrupt: Option<&dyn TaskNode<W>>,
        report: &mut TickReport,
    ) {
        for slot in self.chain[from..].iter_mut().rev() {
            debug!(node = %slot.node.name(), run = %slot.run_id, "stopping");
            slot.node.on_stop(ctx, interrupt);
            report.stopped += 1;
        }
        self.chain.truncate(from);
    }

    fn start(&mut self, mut node: Box<dyn TaskNode<W>>, ctx: &mut TickContext<'_, W>, report: &mut TickReport) {
        let depth = self.chain.len();
        node.on_start(ctx);
        let slot = ChainSlot::new(node, ctx.tick);
        if depth == 0 {
            info!(root = %slot.node.name(), run = %slot.run_id, "starting root");
        } else {
            debug!(node = %slot.node.name(), run = %slot.run_id, depth, "starting child");
        }
        self.chain.push(slot);
        report.started += 1;
    }
}

impl<W: 'static> Default for Executor<W> {
    fn default() -> Self {
        Self::new()
    }
}
