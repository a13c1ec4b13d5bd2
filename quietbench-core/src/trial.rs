//! Trial Runner
//!
//! One trial is one timed measurement bracketed by interference snapshots:
//!
//! 1. forced collection
//! 2. settle pause
//! 3. snapshot
//! 4. timed region at the configured batch size
//! 5. settle pause
//! 6. snapshot, then classify
//!
//! A trial is clean when neither snapshot pair moved. Disturbed trials keep
//! their timing for diagnostics only; the series controller discards them.

use crate::config::ProtocolSettings;
use crate::executor::TimedExecutor;
use crate::measure::settle;
use crate::probe::{Interference, SignalProbe};
use crate::runtime::{HostRuntime, force_collection};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use tracing::trace;

/// Result of one trial
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialOutcome {
    /// Wall time per payload call in milliseconds
    pub duration_ms: f64,
    /// Fingerprint of the payload's last result
    pub fingerprint: u64,
    /// Interference seen while the trial ran
    pub interference: Interference,
}

impl TrialOutcome {
    /// Whether the trial saw no interference
    pub fn is_clean(&self) -> bool {
        self.interference.is_clean()
    }

    /// Timing part of the outcome, as reported
    pub fn record(&self) -> TrialRecord {
        TrialRecord {
            duration_ms: self.duration_ms,
            fingerprint: self.fingerprint,
        }
    }
}

/// Reported per-trial data
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    /// Wall time per payload call in milliseconds
    pub duration_ms: f64,
    /// Fingerprint of the payload's last result
    pub fingerprint: u64,
}

/// Runs trials against one probe and runtime
pub struct TrialRunner<'a> {
    pub(crate) probe: &'a mut dyn SignalProbe,
    pub(crate) runtime: &'a mut dyn HostRuntime,
    pub(crate) executor: TimedExecutor,
    pub(crate) settings: &'a ProtocolSettings,
    pub(crate) verbose: bool,
}

impl<'a> TrialRunner<'a> {
    /// Create a runner for one invocation
    pub fn new(
        probe: &'a mut dyn SignalProbe,
        runtime: &'a mut dyn HostRuntime,
        settings: &'a ProtocolSettings,
        verbose: bool,
    ) -> Self {
        Self {
            probe,
            runtime,
            executor: TimedExecutor::new(),
            settings,
            verbose,
        }
    }

    /// Run one fully instrumented trial at `batch_size`.
    pub fn run_trial<T, F>(&mut self, payload: &mut F, batch_size: u64) -> TrialOutcome
    where
        F: FnMut() -> T,
        T: Hash,
    {
        force_collection(&mut *self.runtime, self.settings.collection_attempts);
        settle(self.settings.settle_pause);

        let before = self.probe.snapshot();
        let timing = self.executor.execute_many(payload, batch_size);
        settle(self.settings.settle_pause);
        let after = self.probe.snapshot();

        let interference = Interference::between(&*self.probe, &before, &after);
        trace!(
            duration_ms = timing.duration_ms,
            batch_size,
            ?interference,
            "trial"
        );

        TrialOutcome {
            duration_ms: timing.duration_ms,
            fingerprint: timing.fingerprint,
            interference,
        }
    }

    /// Run one bare timed region: no collection, pauses or snapshots.
    pub fn run_unchecked<T, F>(&mut self, payload: &mut F, batch_size: u64) -> TrialOutcome
    where
        F: FnMut() -> T,
        T: Hash,
    {
        let timing = self.executor.execute_many(payload, batch_size);
        TrialOutcome {
            duration_ms: timing.duration_ms,
            fingerprint: timing.fingerprint,
            interference: Interference::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{InterferenceKind, ScriptedProbe};
    use crate::runtime::NativeRuntime;
    use std::time::Duration;

    fn fast_settings() -> ProtocolSettings {
        ProtocolSettings {
            settle_pause: Duration::ZERO,
            collection_attempts: 1,
            ..ProtocolSettings::default()
        }
    }

    #[test]
    fn test_trial_classifies_interference() {
        let settings = fast_settings();
        let mut probe = ScriptedProbe::default()
            .then(InterferenceKind::Compilation, 1)
            .then_clean(1);
        let mut runtime = NativeRuntime;
        let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);
        let mut payload = || 7u64;

        let disturbed = runner.run_trial(&mut payload, 1);
        assert!(!disturbed.is_clean());
        assert!(disturbed.interference.compilation);
        assert!(!disturbed.interference.gc);

        let clean = runner.run_trial(&mut payload, 1);
        assert!(clean.is_clean());
        assert_eq!(clean.fingerprint, fxhash::hash64(&7u64));
    }

    #[test]
    fn test_trial_takes_two_snapshots() {
        let settings = fast_settings();
        let mut probe = ScriptedProbe::default();
        let mut runtime = NativeRuntime;
        {
            let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);
            let mut payload = || ();
            runner.run_trial(&mut payload, 3);
            assert_eq!(runner.executor.calls(), 3);
        }
        assert_eq!(probe.snapshots_taken(), 2);
    }

    #[test]
    fn test_unchecked_trial_skips_snapshots() {
        let settings = fast_settings();
        let mut probe = ScriptedProbe::default().then(InterferenceKind::Gc, 5);
        let mut runtime = NativeRuntime;
        {
            let mut runner = TrialRunner::new(&mut probe, &mut runtime, &settings, false);
            let mut payload = || ();
            let outcome = runner.run_unchecked(&mut payload, 10);
            assert!(outcome.is_clean());
        }
        assert_eq!(probe.snapshots_taken(), 0);
        assert_eq!(probe.remaining(), 5);
    }
}
