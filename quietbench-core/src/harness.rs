//! Benchmark Orchestration
//!
//! Sequences one benchmark invocation:
//!
//! ```text
//! Idle → WarmingUp → EstimatingBatchSize → RunningSeries
//!      → FinalCollection → Aggregating → Done
//! ```
//!
//! `Failed` is the single error terminal, reached from batch estimation, the
//! main series or aggregation. Every call to [`Harness::run`] starts again at
//! `Idle`.

use crate::batch::estimate_batch_size;
use crate::config::BenchConfig;
use crate::error::{BenchError, Stage};
use crate::measure::{pin_to_cpu, to_millis};
use crate::overhead::{TimingOverhead, estimate_overhead};
use crate::probe::{RuntimeSignalProbe, SignalProbe};
use crate::runtime::{HostRuntime, NativeRuntime, force_collection};
use crate::series::{FailureCounts, InterferenceChecks, SeriesPlan, TrialSeries};
use crate::trial::{TrialRecord, TrialRunner};
use crate::warmup::warm_up;
use quietbench_stats::compute_robust_summary;
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use tracing::{debug, warn};

/// Orchestration state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not started
    Idle,
    /// Driving the payload to steady state
    WarmingUp,
    /// Searching for the batch size
    EstimatingBatchSize,
    /// Collecting the main series
    RunningSeries,
    /// Timing the closing forced collection
    FinalCollection,
    /// Computing statistics
    Aggregating,
    /// Finished with a result
    Done,
    /// Finished with an error
    Failed,
}

/// Outcome of a successful invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResult {
    /// Clean trials aggregated
    pub timed_run_count: usize,
    /// Trials discarded per interference kind
    pub failures: FailureCounts,
    /// Mean per-call time, ms
    pub mean: f64,
    /// Median per-call time, ms
    pub median: f64,
    /// Median absolute deviation, ms
    pub mad: f64,
    /// Sample standard deviation, ms
    pub std_dev: f64,
    /// Wall time of the final forced collection, ms
    pub final_collection_ms: f64,
    /// Harness overhead, when requested
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timing_overhead: Option<TimingOverhead>,
    /// Payload calls per trial
    pub batch_size: u64,
    /// Per-trial data in execution order
    pub trials: Vec<TrialRecord>,
}

/// Runs benchmarks against one probe, runtime and configuration.
pub struct Harness {
    config: BenchConfig,
    probe: Box<dyn SignalProbe>,
    runtime: Box<dyn HostRuntime>,
    phase: Phase,
    phase_history: Vec<Phase>,
}

impl Harness {
    /// Harness with the native runtime and no interference log
    pub fn new(config: BenchConfig) -> Self {
        Self::with_parts(
            config,
            Box::new(RuntimeSignalProbe::new(None)),
            Box::new(NativeRuntime),
        )
    }

    /// Harness with an explicit probe and runtime
    pub fn with_parts(
        config: BenchConfig,
        probe: Box<dyn SignalProbe>,
        runtime: Box<dyn HostRuntime>,
    ) -> Self {
        Self {
            config,
            probe,
            runtime,
            phase: Phase::Idle,
            phase_history: vec![Phase::Idle],
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Phases visited by the latest invocation
    pub fn phase_history(&self) -> &[Phase] {
        &self.phase_history
    }

    /// Measure `payload`.
    pub fn run<T, F>(&mut self, mut payload: F) -> Result<BenchmarkResult, BenchError>
    where
        F: FnMut() -> T,
        T: Hash,
    {
        self.phase = Phase::Idle;
        self.phase_history.clear();
        self.phase_history.push(Phase::Idle);

        let config = &self.config;
        let verbose = config.verbose;
        let history = &mut self.phase_history;
        let phase = &mut self.phase;
        let mut enter = |next: Phase| {
            debug!(?next, "phase");
            *phase = next;
            history.push(next);
        };

        if let Some(cpu) = config.protocol.pin_cpu {
            if let Err(e) = pin_to_cpu(cpu) {
                warn!(cpu, error = %e, "failed to pin measuring thread");
            }
        }

        let mut runner = TrialRunner::new(
            self.probe.as_mut(),
            self.runtime.as_mut(),
            &config.protocol,
            verbose,
        );

        enter(Phase::WarmingUp);
        warm_up(
            &mut runner.executor,
            &mut payload,
            config.protocol.warmup_iterations,
            config.protocol.warmup_time,
            verbose,
        );

        enter(Phase::EstimatingBatchSize);
        let threshold_ms = config.min_execution_ms();
        let estimate = match estimate_batch_size(&mut runner, &mut payload, threshold_ms) {
            Ok(estimate) => estimate,
            Err(e) => {
                enter(Phase::Failed);
                return Err(e);
            }
        };
        let batch_size = estimate.batch_size;

        enter(Phase::RunningSeries);
        let plan = SeriesPlan {
            target: config.target_trials,
            batch_size,
            checks: InterferenceChecks::Enabled,
            stage: Stage::Measurement,
        };
        let series = match runner
            .run_series(&mut payload, &plan)
            .and_then(|series| check_execution_time(series, batch_size, config))
        {
            Ok(series) => series,
            Err(e) => {
                enter(Phase::Failed);
                return Err(e);
            }
        };
        narrate!(
            verbose,
            trials = series.len(),
            failures = %series.failures,
            "series complete"
        );

        enter(Phase::FinalCollection);
        let collection = force_collection(&mut *runner.runtime, config.protocol.collection_attempts);
        let final_collection_ms = to_millis(collection.elapsed);

        enter(Phase::Aggregating);
        let summary = match compute_robust_summary(&series.durations()) {
            Ok(summary) => summary,
            Err(e) => {
                enter(Phase::Failed);
                return Err(e.into());
            }
        };

        let timing_overhead = if config.calc_timing_overhead {
            match estimate_overhead(&mut runner, batch_size, config.target_trials, summary.median) {
                Ok(overhead) => Some(overhead),
                Err(e) => {
                    enter(Phase::Failed);
                    return Err(e);
                }
            }
        } else {
            None
        };

        enter(Phase::Done);
        Ok(BenchmarkResult {
            timed_run_count: series.len(),
            failures: series.failures,
            mean: summary.mean,
            median: summary.median,
            mad: summary.mad,
            std_dev: summary.std_dev,
            final_collection_ms,
            timing_overhead,
            batch_size,
            trials: series.trials.iter().map(|t| t.record()).collect(),
        })
    }
}

/// Reject a series whose timed regions fell short of the minimum execution time.
fn check_execution_time(
    series: TrialSeries,
    batch_size: u64,
    config: &BenchConfig,
) -> Result<TrialSeries, BenchError> {
    if series.is_empty() {
        return Ok(series);
    }
    let median = quietbench_stats::median(&series.durations())?;
    let measured_ms = median * batch_size as f64;
    let required_ms = config.protocol.min_time_fraction * config.min_execution_ms();

    if measured_ms < required_ms {
        return Err(BenchError::InsufficientExecutionTime {
            measured_ms,
            required_ms,
            batch_size,
            series: Box::new(series),
        });
    }
    Ok(series)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolSettings;
    use crate::probe::{InterferenceKind, ScriptedProbe};
    use std::time::Duration;

    fn fast_config(target_trials: usize, min_ms: u64) -> BenchConfig {
        BenchConfig {
            target_trials,
            min_execution_time: Duration::from_millis(min_ms),
            protocol: ProtocolSettings {
                warmup_iterations: 0,
                warmup_time: Duration::ZERO,
                settle_pause: Duration::ZERO,
                collection_attempts: 1,
                ..ProtocolSettings::default()
            },
            ..BenchConfig::default()
        }
    }

    fn harness(config: BenchConfig, probe: ScriptedProbe) -> Harness {
        Harness::with_parts(config, Box::new(probe), Box::new(NativeRuntime))
    }

    #[test]
    fn test_successful_run_visits_every_phase() {
        let mut harness = harness(fast_config(5, 5), ScriptedProbe::default());
        let result = harness
            .run(|| std::thread::sleep(Duration::from_millis(2)))
            .unwrap();

        assert_eq!(result.timed_run_count, 5);
        assert_eq!(result.trials.len(), 5);
        assert!(result.median * result.batch_size as f64 >= 0.75 * 5.0);
        assert_eq!(harness.phase(), Phase::Done);
        assert_eq!(
            harness.phase_history(),
            &[
                Phase::Idle,
                Phase::WarmingUp,
                Phase::EstimatingBatchSize,
                Phase::RunningSeries,
                Phase::FinalCollection,
                Phase::Aggregating,
                Phase::Done,
            ]
        );
    }

    #[test]
    fn test_budget_exhaustion_fails_run() {
        // Batch estimation needs 3 clean trials, then the main series hits the
        // class-loading budget.
        let probe = ScriptedProbe::default()
            .then_clean(3)
            .then_clean(1)
            .then(InterferenceKind::ClassLoading, 5);
        let mut harness = harness(fast_config(10, 1), probe);

        let err = harness
            .run(|| std::thread::sleep(Duration::from_millis(2)))
            .unwrap_err();
        match err {
            BenchError::CleanRunUnobtainable {
                stage,
                failures,
                partial,
                ..
            } => {
                assert_eq!(stage, Stage::Measurement);
                assert_eq!(failures.class_loading, 5);
                assert_eq!(partial.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(harness.phase(), Phase::Failed);
        assert_eq!(
            harness.phase_history().last(),
            Some(&Phase::Failed)
        );
        assert!(harness.phase_history().contains(&Phase::RunningSeries));
    }

    #[test]
    fn test_rerun_starts_from_idle() {
        let mut harness = harness(fast_config(3, 1), ScriptedProbe::default());
        harness.run(|| 1u8).unwrap();
        harness.run(|| 2u8).unwrap();

        assert_eq!(harness.phase_history().first(), Some(&Phase::Idle));
        assert_eq!(
            harness
                .phase_history()
                .iter()
                .filter(|p| **p == Phase::Done)
                .count(),
            1
        );
    }

    #[test]
    fn test_insufficient_execution_time() {
        let series = TrialSeries {
            trials: vec![
                crate::trial::TrialOutcome {
                    duration_ms: 1.0,
                    fingerprint: 0,
                    interference: crate::probe::Interference::NONE,
                };
                3
            ],
            failures: FailureCounts::default(),
        };
        let config = fast_config(3, 10);

        let err = check_execution_time(series.clone(), 5, &config).unwrap_err();
        match err {
            BenchError::InsufficientExecutionTime {
                measured_ms,
                required_ms,
                batch_size,
                series,
            } => {
                assert_eq!(measured_ms, 5.0);
                assert_eq!(required_ms, 7.5);
                assert_eq!(batch_size, 5);
                assert_eq!(series.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        assert!(check_execution_time(series, 8, &config).is_ok());
    }

    #[test]
    fn test_zero_target_is_degenerate() {
        let mut harness = harness(fast_config(0, 1), ScriptedProbe::default());
        let err = harness.run(|| ()).unwrap_err();
        assert!(matches!(err, BenchError::DegenerateInput(_)));
        assert_eq!(harness.phase(), Phase::Failed);
    }
}
