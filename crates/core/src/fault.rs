//! Failure signals raised by the control core.
//!
//! None of these unwind through the executor. They are observed as flags on
//! nodes, checkers and blacklists and surfaced as values so a parent node or
//! the caller of a tick can decide what to do next.

/// A recoverable failure signal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// A progress checker saw no acceptable headway within its window.
    #[error("no forward progress within the allowed window")]
    TransientStall,

    /// An object exceeded its allowed failure count.
    #[error("object {key} is unreachable after {failures} failures")]
    Unreachable {
        /// Debug rendering of the blacklist key
        key: String,
        /// Failures recorded against the object
        failures: u32,
    },

    /// A node reported itself failed.
    #[error("node '{node}' failed")]
    NodeFailure {
        /// Name of the failed node
        node: String,
    },

    /// The executor skipped work to keep its own invariants.
    #[error("executor invariant: {0}")]
    InvariantViolation(#[from] InvariantViolation),
}

/// A defensive executor check that degraded a tick to a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    /// A decision was required but the planner offered nothing.
    #[error("no candidate task offered while the chain is empty")]
    NoCandidates,

    /// Completion cascades hit the per-tick bound; the rest waits a tick.
    #[error("completion cascade limit of {limit} reached")]
    CascadeLimit {
        /// Configured bound
        limit: usize,
    },

    /// A node asked for a child beyond the configured chain depth.
    #[error("chain depth limit of {limit} reached")]
    ChainTooDeep {
        /// Configured bound
        limit: usize,
    },
}

impl Fault {
    /// Whether this fault came from the executor rather than a node.
    pub fn is_invariant(&self) -> bool {
        matches!(self, Fault::InvariantViolation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_messages() {
        let fault = Fault::Unreachable {
            key: "[1, 2, 3]".to_string(),
            failures: 4,
        };
        assert_eq!(fault.to_string(), "object [1, 2, 3] is unreachable after 4 failures");

        let fault: Fault = InvariantViolation::CascadeLimit { limit: 8 }.into();
        assert!(fault.is_invariant());
        assert_eq!(
            fault.to_string(),
            "executor invariant: completion cascade limit of 8 reached"
        );
    }
}
