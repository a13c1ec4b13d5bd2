//! Trial Series
//!
//! Repeats trials until the requested number of clean ones has been gathered,
//! or until one kind of interference has used up its failure budget. The same
//! operation serves the main measurement, the batch-size probe series and the
//! overhead series; only the [`SeriesPlan`] differs.

use crate::config::FailureBudgets;
use crate::error::{BenchError, Stage};
use crate::probe::{Interference, InterferenceKind};
use crate::trial::{TrialOutcome, TrialRunner};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use tracing::debug;

/// Whether trials are bracketed by collection and interference snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterferenceChecks {
    /// Full protocol
    Enabled,
    /// Bare timed regions only
    Skipped,
}

/// Parameters of one series
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesPlan {
    /// Clean trials to collect
    pub target: usize,
    /// Payload calls per trial
    pub batch_size: u64,
    /// Instrumentation level
    pub checks: InterferenceChecks,
    /// Stage reported on failure
    pub stage: Stage,
}

/// Trials discarded per interference kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FailureCounts {
    /// Discarded for garbage collection
    pub gc: u32,
    /// Discarded for compilation
    pub compilation: u32,
    /// Discarded for class loading
    pub class_loading: u32,
}

impl FailureCounts {
    /// Count a disturbed trial against every kind it saw
    pub fn record(&mut self, interference: &Interference) {
        if interference.gc {
            self.gc += 1;
        }
        if interference.compilation {
            self.compilation += 1;
        }
        if interference.class_loading {
            self.class_loading += 1;
        }
    }

    /// Count for one kind
    pub fn get(&self, kind: InterferenceKind) -> u32 {
        match kind {
            InterferenceKind::Gc => self.gc,
            InterferenceKind::Compilation => self.compilation,
            InterferenceKind::ClassLoading => self.class_loading,
        }
    }

    /// First kind whose count has reached its budget
    pub fn exhausted(&self, budgets: &FailureBudgets) -> Option<InterferenceKind> {
        InterferenceKind::ALL.into_iter().find(|&kind| {
            let budget = match kind {
                InterferenceKind::Gc => budgets.gc,
                InterferenceKind::Compilation => budgets.compilation,
                InterferenceKind::ClassLoading => budgets.class_loading,
            };
            self.get(kind) >= budget
        })
    }

    /// Discarded trials across all kinds (a trial may count more than once)
    pub fn total(&self) -> u32 {
        self.gc + self.compilation + self.class_loading
    }
}

impl std::fmt::Display for FailureCounts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "gc: {}, compilation: {}, class loading: {}",
            self.gc, self.compilation, self.class_loading
        )
    }
}

/// Clean trials of one series and the discards it took to get them
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrialSeries {
    /// Clean trials in execution order
    pub trials: Vec<TrialOutcome>,
    /// Discarded trials per kind
    pub failures: FailureCounts,
}

impl TrialSeries {
    /// Per-call durations in milliseconds
    pub fn durations(&self) -> Vec<f64> {
        self.trials.iter().map(|t| t.duration_ms).collect()
    }

    /// Fastest per-call duration, if any trial was kept
    pub fn min_duration(&self) -> Option<f64> {
        self.trials
            .iter()
            .map(|t| t.duration_ms)
            .min_by(f64::total_cmp)
    }

    /// Number of clean trials
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Whether no clean trial was kept
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

impl TrialRunner<'_> {
    /// Run trials until `plan.target` are clean or a failure budget runs out.
    pub fn run_series<T, F>(
        &mut self,
        payload: &mut F,
        plan: &SeriesPlan,
    ) -> Result<TrialSeries, BenchError>
    where
        F: FnMut() -> T,
        T: Hash,
    {
        let budgets = self.settings.budgets;
        let mut series = TrialSeries {
            trials: Vec::with_capacity(plan.target),
            failures: FailureCounts::default(),
        };

        debug!(
            stage = %plan.stage,
            target = plan.target,
            batch_size = plan.batch_size,
            "starting series"
        );

        while series.trials.len() < plan.target {
            let outcome = match plan.checks {
                InterferenceChecks::Enabled => self.run_trial(payload, plan.batch_size),
                InterferenceChecks::Skipped => self.run_unchecked(payload, plan.batch_size),
            };

            if outcome.is_clean() {
                series.trials.push(outcome);
                continue;
            }

            series.failures.record(&outcome.interference);
            narrate!(
                self.verbose,
                stage = %plan.stage,
                failures = %series.failures,
                "discarded disturbed trial"
            );

            if let Some(kind) = series.failures.exhausted(&budgets) {
                debug!(stage = %plan.stage, %kind, "failure budget exhausted");
                return Err(BenchError::CleanRunUnobtainable {
                    stage: plan.stage,
                    target: plan.target,
                    failures: series.failures,
                    partial: series.trials,
                });
            }
        }

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProtocolSettings;
    use crate::probe::ScriptedProbe;
    use crate::runtime::NativeRuntime;
    use std::time::Duration;

    fn settings() -> ProtocolSettings {
        ProtocolSettings {
            settle_pause: Duration::ZERO,
            collection_attempts: 1,
            ..ProtocolSettings::default()
        }
    }

    fn plan(target: usize) -> SeriesPlan {
        SeriesPlan {
            target,
            batch_size: 1,
            checks: InterferenceChecks::Enabled,
            stage: Stage::Measurement,
        }
    }

    #[test]
    fn test_collects_exactly_target_clean_trials() {
        let settings = settings();
        let mut probe = ScriptedProbe::default()
            .then_clean(2)
            .then(InterferenceKind::Gc, 3)
            .then_clean(2)
            .then(InterferenceKind::Compilation, 1);
        let mut runtime = NativeRuntime;
        let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);
        let mut payload = || 1u32;

        let series = runner.run_series(&mut payload, &plan(6)).unwrap();
        assert_eq!(series.len(), 6);
        assert!(series.trials.iter().all(TrialOutcome::is_clean));
        assert_eq!(series.failures.gc, 3);
        assert_eq!(series.failures.compilation, 1);
        assert_eq!(series.failures.class_loading, 0);
    }

    #[test]
    fn test_aborts_when_budget_reached() {
        let settings = settings();
        let mut probe = ScriptedProbe::default()
            .then_clean(1)
            .then(InterferenceKind::ClassLoading, 5);
        let mut runtime = NativeRuntime;
        let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);
        let mut payload = || 1u32;

        let err = runner.run_series(&mut payload, &plan(30)).unwrap_err();
        match err {
            BenchError::CleanRunUnobtainable {
                stage,
                target,
                failures,
                partial,
            } => {
                assert_eq!(stage, Stage::Measurement);
                assert_eq!(target, 30);
                assert_eq!(failures.class_loading, 5);
                assert_eq!(failures.gc, 0);
                assert_eq!(partial.len(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_one_below_budget_still_succeeds() {
        let settings = settings();
        let mut probe = ScriptedProbe::default().then(InterferenceKind::Gc, 9);
        let mut runtime = NativeRuntime;
        let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);
        let mut payload = || 1u32;

        let series = runner.run_series(&mut payload, &plan(3)).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.failures.gc, 9);
        assert!(series.failures.exhausted(&settings.budgets).is_none());
    }

    #[test]
    fn test_multi_kind_trial_counts_against_each_budget() {
        let mut counts = FailureCounts::default();
        counts.record(&Interference {
            gc: true,
            compilation: true,
            class_loading: false,
        });
        assert_eq!(counts.gc, 1);
        assert_eq!(counts.compilation, 1);
        assert_eq!(counts.total(), 2);

        let budgets = FailureBudgets {
            gc: 5,
            compilation: 1,
            class_loading: 5,
        };
        assert_eq!(counts.exhausted(&budgets), Some(InterferenceKind::Compilation));
    }

    #[test]
    fn test_skipped_checks_ignore_probe() {
        let settings = settings();
        let mut probe = ScriptedProbe::default().then(InterferenceKind::Gc, 20);
        let mut runtime = NativeRuntime;
        let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);
        let mut payload = || ();

        let series = runner
            .run_series(
                &mut payload,
                &SeriesPlan {
                    checks: InterferenceChecks::Skipped,
                    stage: Stage::Overhead,
                    ..plan(5)
                },
            )
            .unwrap();
        assert_eq!(series.len(), 5);
        assert_eq!(series.failures, FailureCounts::default());
    }

    #[test]
    fn test_zero_target_is_empty() {
        let settings = settings();
        let mut probe = ScriptedProbe::default();
        let mut runtime = NativeRuntime;
        let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);
        let mut payload = || ();

        let series = runner.run_series(&mut payload, &plan(0)).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.min_duration(), None);
    }
}
