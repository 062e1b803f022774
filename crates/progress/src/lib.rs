//! Stall detection.
//!
//! Checkers watch a scalar or spatial objective over a sliding time window
//! and report when it stops improving fast enough, so a behavior can give up
//! on an approach instead of looping forever.

#![warn(missing_docs)]

pub mod checker;
pub mod linear;
pub mod distance;
pub mod retry;
pub mod movement;

pub use checker::{ProgressChecker, Verdict};
pub use linear::LinearProgressChecker;
pub use distance::{DistanceMode, DistanceProgressChecker};
pub use retry::ProgressCheckerRetry;
pub use movement::{MovementCheckerConfig, MovementProgressChecker};
