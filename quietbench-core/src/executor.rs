//! Timed Execution
//!
//! Runs the payload inside a timed region. Every result is routed through
//! [`black_box`] and the last one is fingerprinted into a slot owned by the
//! executor, so the optimizer cannot discard the work being measured.

use crate::measure::{Timer, to_millis};
use std::hash::Hash;
use std::hint::black_box;

/// Measurement of one timed region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timing {
    /// Wall time per payload call in milliseconds
    pub duration_ms: f64,
    /// Fingerprint of the last result
    pub fingerprint: u64,
}

/// Executes payloads inside a timed region.
///
/// Each harness invocation creates its own executor; the retained slot is
/// never shared across threads.
#[derive(Debug, Default)]
pub struct TimedExecutor {
    retained: u64,
    calls: u64,
}

impl TimedExecutor {
    /// Create an executor with an empty retained slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Time a single call of `payload`.
    #[inline]
    pub fn execute_once<T, F>(&mut self, payload: &mut F) -> Timing
    where
        F: FnMut() -> T,
        T: Hash,
    {
        let timer = Timer::start();
        let result = black_box(payload());
        let elapsed = timer.stop();

        self.retain(&result);
        self.calls += 1;
        Timing {
            duration_ms: to_millis(elapsed),
            fingerprint: self.retained,
        }
    }

    /// Time `n` back-to-back calls of `payload` and report the mean per call.
    ///
    /// A batch size of zero runs the payload once.
    #[inline]
    pub fn execute_many<T, F>(&mut self, payload: &mut F, n: u64) -> Timing
    where
        F: FnMut() -> T,
        T: Hash,
    {
        let n = n.max(1);

        let timer = Timer::start();
        let mut last = black_box(payload());
        for _ in 1..n {
            last = black_box(payload());
        }
        let elapsed = timer.stop();

        self.retain(&last);
        self.calls += n;
        Timing {
            duration_ms: to_millis(elapsed) / n as f64,
            fingerprint: self.retained,
        }
    }

    fn retain<T: Hash>(&mut self, result: &T) {
        self.retained = black_box(fxhash::hash64(result));
    }

    /// Fingerprint of the most recent result
    pub fn retained(&self) -> u64 {
        self.retained
    }

    /// Total payload calls made by this executor
    pub fn calls(&self) -> u64 {
        self.calls
    }
}
