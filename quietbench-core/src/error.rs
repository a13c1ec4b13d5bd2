//! Benchmark failures

use crate::series::{FailureCounts, TrialSeries};
use crate::trial::TrialOutcome;
use quietbench_stats::StatsError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol stage that ran a trial series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Probe series while estimating the batch size
    BatchEstimation,
    /// The main measurement series
    Measurement,
    /// No-op series measuring harness overhead
    Overhead,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Stage::BatchEstimation => "batch size estimation",
            Stage::Measurement => "measurement",
            Stage::Overhead => "overhead estimation",
        })
    }
}

/// Errors that abort a benchmark invocation
#[derive(Debug, Error)]
pub enum BenchError {
    /// A failure budget was exhausted before enough clean trials were collected
    #[error(
        "could not obtain {target} clean trials during {stage} ({failures}); \
         {} clean trial(s) collected before giving up",
        .partial.len()
    )]
    CleanRunUnobtainable {
        /// Stage whose series gave up
        stage: Stage,
        /// Clean trials requested
        target: usize,
        /// Discarded trials per kind
        failures: FailureCounts,
        /// Clean trials gathered before the budget ran out
        partial: Vec<TrialOutcome>,
    },

    /// The measured region was too short to trust the timer
    #[error(
        "measured {measured_ms:.3}ms per trial at batch size {batch_size}, \
         below the required {required_ms:.3}ms"
    )]
    InsufficientExecutionTime {
        /// Median trial duration times the batch size
        measured_ms: f64,
        /// Required fraction of the minimum execution time
        required_ms: f64,
        /// Batch size in effect
        batch_size: u64,
        /// The completed series
        series: Box<TrialSeries>,
    },

    /// A statistic was asked for over no data
    #[error(transparent)]
    DegenerateInput(#[from] StatsError),
}

impl BenchError {
    /// Short machine-readable name of the failure
    pub fn kind(&self) -> &'static str {
        match self {
            BenchError::CleanRunUnobtainable { .. } => "clean_run_unobtainable",
            BenchError::InsufficientExecutionTime { .. } => "insufficient_execution_time",
            BenchError::DegenerateInput(_) => "degenerate_input",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_run_message_lists_counts() {
        let err = BenchError::CleanRunUnobtainable {
            stage: Stage::Measurement,
            target: 30,
            failures: FailureCounts {
                gc: 10,
                compilation: 2,
                class_loading: 0,
            },
            partial: Vec::new(),
        };
        let message = err.to_string();
        assert!(message.contains("30 clean trials during measurement"));
        assert!(message.contains("gc: 10"));
        assert!(message.contains("compilation: 2"));
        assert!(message.contains("class loading: 0"));
        assert_eq!(err.kind(), "clean_run_unobtainable");
    }

    #[test]
    fn test_stats_error_converts() {
        let err: BenchError = StatsError::Empty { statistic: "median" }.into();
        assert!(matches!(err, BenchError::DegenerateInput(_)));
        assert!(err.to_string().contains("median"));
    }
}
