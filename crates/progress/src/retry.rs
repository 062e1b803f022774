//! Absorbing transient stalls.

use crate::{ProgressChecker, Verdict};
use std::marker::PhantomData;
use tracing::{debug, warn};

/// Wraps a checker and tolerates some stalls before reporting failure.
///
/// Each stall of the inner checker counts one strike and resets the inner
/// checker; a window that closes with enough improvement clears the strikes.
/// The wrapper fails on the `max_retries`-th consecutive stall. A
/// `max_retries` of zero behaves like one.
#[derive(Debug, Clone)]
pub struct ProgressCheckerRetry<C, T> {
    inner: C,
    max_retries: u32,
    strikes: u32,
    failed: bool,
    _sample: PhantomData<fn(T)>,
}

impl<C, T> ProgressCheckerRetry<C, T>
where
    C: ProgressChecker<T>,
{
    /// Wrap `inner`, failing after `max_retries` consecutive stalls.
    pub fn new(inner: C, max_retries: u32) -> Self {
        Self {
            inner,
            max_retries: max_retries.max(1),
            strikes: 0,
            failed: false,
            _sample: PhantomData,
        }
    }

    /// Consecutive stalls seen so far.
    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    /// Stall count at which the wrapper fails.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// The wrapped checker.
    pub fn inner(&self) -> &C {
        &self.inner
    }
}

impl<C, T> ProgressChecker<T> for ProgressCheckerRetry<C, T>
where
    C: ProgressChecker<T>,
{
    fn set_progress(&mut self, progress: T) -> Verdict {
        if self.failed {
            return Verdict::Stalled;
        }

        match self.inner.set_progress(progress) {
            Verdict::Stalled => {
                self.strikes += 1;
                if self.strikes >= self.max_retries {
                    warn!(strikes = self.strikes, "progress retries exhausted");
                    self.failed = true;
                } else {
                    debug!(
                        strikes = self.strikes,
                        max = self.max_retries,
                        "absorbing stall"
                    );
                    self.inner.reset();
                }
                Verdict::Stalled
            }
            Verdict::Advanced => {
                self.strikes = 0;
                Verdict::Advanced
            }
            other => other,
        }
    }

    fn failed(&self) -> bool {
        self.failed
    }

    fn reset(&mut self) {
        self.strikes = 0;
        self.failed = false;
        self.inner.reset();
    }
}
