//! Lazily refreshed world-state caches.
//!
//! A tracker recomputes an expensive world query at most once per tick, no
//! matter how many behaviors read it. The [`TrackerManager`] owns every
//! tracker and marks them all dirty when a tick begins.

#![warn(missing_docs)]

pub mod tracker;
pub mod progressive;
pub mod manager;

pub use tracker::{TrackedState, Tracker};
pub use progressive::{ProgressiveState, ProgressiveTracker};
pub use manager::TrackerManager;
