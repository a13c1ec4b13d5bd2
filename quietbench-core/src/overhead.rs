//! Timing Overhead
//!
//! Measures the fixed per-call cost of the timed region itself by running a
//! no-op payload through the same executor at the same batch size.

use crate::error::{BenchError, Stage};
use crate::series::{InterferenceChecks, SeriesPlan};
use crate::trial::TrialRunner;
use crate::warmup::warm_up;
use serde::{Deserialize, Serialize};

/// Harness overhead per payload call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingOverhead {
    /// Median per-call time of the no-op payload, in milliseconds
    pub millis: f64,
    /// Overhead as a percentage of the benchmark's median
    pub percent_of_median: f64,
}

impl TimingOverhead {
    /// Express `millis` relative to the benchmark's median
    pub fn relative_to(millis: f64, median_ms: f64) -> Self {
        let percent_of_median = if median_ms > 0.0 {
            millis / median_ms * 100.0
        } else {
            0.0
        };
        Self {
            millis,
            percent_of_median,
        }
    }
}

/// Estimate the per-call overhead at `batch_size` with `trials` no-op trials.
pub fn estimate_overhead(
    runner: &mut TrialRunner<'_>,
    batch_size: u64,
    trials: usize,
    median_ms: f64,
) -> Result<TimingOverhead, BenchError> {
    let mut noop = || ();

    let settings = runner.settings;
    warm_up(
        &mut runner.executor,
        &mut noop,
        settings.warmup_iterations,
        settings.warmup_time,
        runner.verbose,
    );

    let plan = SeriesPlan {
        target: trials,
        batch_size,
        checks: InterferenceChecks::Skipped,
        stage: Stage::Overhead,
    };
    let series = runner.run_series(&mut noop, &plan)?;
    let millis = quietbench_stats::median(&series.durations())?;

    let overhead = TimingOverhead::relative_to(millis, median_ms);
    narrate!(
        runner.verbose,
        overhead_ms = overhead.millis,
        percent = overhead.percent_of_median,
        "timing overhead"
    );
    Ok(overhead)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolSettings;
    use crate::probe::ScriptedProbe;
    use crate::runtime::NativeRuntime;
    use std::time::Duration;

    #[test]
    fn test_relative_to_median() {
        let overhead = TimingOverhead::relative_to(0.5, 10.0);
        assert_eq!(overhead.percent_of_median, 5.0);
        assert_eq!(TimingOverhead::relative_to(0.5, 0.0).percent_of_median, 0.0);
    }

    #[test]
    fn test_noop_overhead_is_tiny() {
        let settings = ProtocolSettings {
            warmup_iterations: 10,
            warmup_time: Duration::ZERO,
            settle_pause: Duration::ZERO,
            ..ProtocolSettings::default()
        };
        let mut probe = ScriptedProbe::default();
        let mut runtime = NativeRuntime;
        let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);

        let overhead = estimate_overhead(&mut runner, 1000, 5, 1.0).unwrap();
        assert!(overhead.millis >= 0.0);
        assert!(overhead.millis < 0.01);
        assert!(overhead.percent_of_median < 1.0);
    }

    #[test]
    fn test_zero_trials_is_degenerate() {
        let settings = ProtocolSettings {
            warmup_iterations: 0,
            warmup_time: Duration::ZERO,
            settle_pause: Duration::ZERO,
            ..ProtocolSettings::default()
        };
        let mut probe = ScriptedProbe::default();
        let mut runtime = NativeRuntime;
        let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);

        let err = estimate_overhead(&mut runner, 1, 0, 1.0).unwrap_err();
        assert!(matches!(err, BenchError::DegenerateInput(_)));
    }
}
