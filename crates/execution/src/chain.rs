//! The active chain and its snapshots.
//!
//! The chain is an arena of slots addressed by index: slot `i + 1` is the
//! child of slot `i`, slot 0 is the root and the last slot is the leaf.
//! Parents never hold a reference to their child and children never point
//! back, so interruption simply walks the indices.

use crate::TaskNode;
use chrono::{DateTime, Utc};
use clef_core::RunId;
use serde::Serialize;

/// One running node.
pub(crate) struct ChainSlot<W> {
    pub(crate) run_id: RunId,
    pub(crate) node: Box<dyn TaskNode<W>>,
    pub(crate) started_tick: u64,
}

impl<W> ChainSlot<W> {
    pub(crate) fn new(node: Box<dyn TaskNode<W>>, started_tick: u64) -> Self {
        Self {
            run_id: RunId::new(),
            node,
            started_tick,
        }
    }

    pub(crate) fn summary(&self, depth: usize) -> NodeSummary {
        NodeSummary {
            depth,
            name: self.node.name(),
            run_id: self.run_id,
            started_tick: self.started_tick,
        }
    }
}

/// A running node as seen from outside the executor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeSummary {
    /// Position in the chain, 0 for the root
    pub depth: usize,
    /// Node name
    pub name: String,
    /// Run identifier of this instance
    pub run_id: RunId,
    /// Tick the node was started on
    pub started_tick: u64,
}

/// The chain at a point in time.
#[derive(Debug, Clone, Serialize)]
pub struct ChainSnapshot {
    /// When snapshot was taken
    pub timestamp: DateTime<Utc>,

    /// Last completed tick
    pub tick: u64,

    /// Nodes from root to leaf
    pub nodes: Vec<NodeSummary>,
}

impl ChainSnapshot {
    /// Whether nothing is running.
    pub fn is_idle(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The leaf, if any.
    pub fn leaf(&self) -> Option<&NodeSummary> {
        self.nodes.last()
    }
}

impl std::fmt::Display for ChainSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.nodes.is_empty() {
            return f.write_str("<idle>");
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            f.write_str(&node.name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(depth: usize, name: &str) -> NodeSummary {
        NodeSummary {
            depth,
            name: name.to_string(),
            run_id: RunId::new(),
            started_tick: 1,
        }
    }

    #[test]
    fn test_snapshot_display() {
        let snapshot = ChainSnapshot {
            timestamp: Utc::now(),
            tick: 3,
            nodes: vec![summary(0, "collect wood"), summary(1, "goto tree"), summary(2, "walk")],
        };
        assert_eq!(snapshot.to_string(), "collect wood -> goto tree -> walk");
        assert_eq!(snapshot.leaf().unwrap().name, "walk");
        assert!(!snapshot.is_idle());
    }

    #[test]
    fn test_idle_snapshot() {
        let snapshot = ChainSnapshot {
            timestamp: Utc::now(),
            tick: 0,
            nodes: Vec::new(),
        };
        assert!(snapshot.is_idle());
        assert_eq!(snapshot.to_string(), "<idle>");
    }
}
