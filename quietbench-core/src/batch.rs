//! Batch Size Estimation
//!
//! Fast payloads finish well below what the timer can resolve, so each trial
//! runs the payload N times back to back. Starting from N = 1, a short probe
//! series measures the fastest per-call time; if N calls of that length reach
//! the threshold the search is over, otherwise N is extrapolated upward.

use crate::error::{BenchError, Stage};
use crate::series::{InterferenceChecks, SeriesPlan};
use crate::trial::TrialRunner;
use std::hash::Hash;

/// Clean trials in each probe series
pub const PROBE_TRIAL_COUNT: usize = 3;

/// Chosen batch size and the search that led to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEstimate {
    /// Payload calls per trial
    pub batch_size: u64,
    /// Every batch size probed, in order
    pub tried: Vec<u64>,
}

/// Next batch size to probe, or `None` when `batch_size` already suffices.
///
/// `min_per_call_ms` is expected to be clamped to a positive floor.
pub fn next_batch_size(batch_size: u64, min_per_call_ms: f64, threshold_ms: f64) -> Option<u64> {
    if min_per_call_ms * batch_size as f64 >= threshold_ms {
        return None;
    }
    let extrapolated = (threshold_ms / min_per_call_ms).ceil() + 1.0;
    // Float-to-int casts saturate, so an absurd extrapolation stays finite.
    let extrapolated = extrapolated as u64;
    Some(extrapolated.max(batch_size.saturating_add(1)))
}

/// Find the batch size whose timed region reaches `threshold_ms`.
pub fn estimate_batch_size<T, F>(
    runner: &mut TrialRunner<'_>,
    payload: &mut F,
    threshold_ms: f64,
) -> Result<BatchEstimate, BenchError>
where
    F: FnMut() -> T,
    T: Hash,
{
    let floor = runner.settings.duration_floor_ms;
    let mut batch_size = 1u64;
    let mut tried = Vec::new();

    loop {
        tried.push(batch_size);
        let plan = SeriesPlan {
            target: PROBE_TRIAL_COUNT,
            batch_size,
            checks: InterferenceChecks::Enabled,
            stage: Stage::BatchEstimation,
        };
        let series = runner.run_series(payload, &plan)?;
        let min = series.min_duration().unwrap_or(floor).max(floor);

        match next_batch_size(batch_size, min, threshold_ms) {
            None => {
                narrate!(
                    runner.verbose,
                    batch_size,
                    min_per_call_ms = min,
                    "batch size settled"
                );
                return Ok(BatchEstimate { batch_size, tried });
            }
            Some(next) => {
                narrate!(
                    runner.verbose,
                    batch_size,
                    min_per_call_ms = min,
                    next,
                    "batch too short, extrapolating"
                );
                batch_size = next;
            }
        }
    }
}
