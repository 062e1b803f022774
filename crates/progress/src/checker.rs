//! The progress checker contract.

use clef_core::Fault;

/// What a single sample told the checker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// First sample after construction or reset; recorded as the baseline.
    Warmup,
    /// The window has not elapsed yet; nothing was judged.
    Waiting,
    /// A window closed with enough improvement; the baseline moved.
    Advanced,
    /// A window closed without enough improvement, or the checker has
    /// already failed.
    Stalled,
}

/// Watches an objective and decides whether it is still improving.
///
/// `failed` is sticky: once set, only [`ProgressChecker::reset`] clears it.
/// A checker that has not seen a sample yet never reads as failed.
pub trait ProgressChecker<T> {
    /// Feed the current value of the objective.
    fn set_progress(&mut self, progress: T) -> Verdict;

    /// Whether the checker has given up on the objective.
    fn failed(&self) -> bool;

    /// Forget all history, including the failed flag.
    fn reset(&mut self);

    /// `Err(Fault::TransientStall)` once the checker has failed.
    fn verify(&self) -> Result<(), Fault> {
        if self.failed() {
            Err(Fault::TransientStall)
        } else {
            Ok(())
        }
    }
}
