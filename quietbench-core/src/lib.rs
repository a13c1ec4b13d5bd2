#![warn(missing_docs)]
//! quietbench Core - Measurement Protocol
//!
//! This crate measures one payload at a time:
//! - Warm-up to steady state, driven by iteration and time floors
//! - Forced collection and interference snapshots around every trial
//! - Adaptive batch sizing so fast payloads outlast timer resolution
//! - Per-kind failure budgets for disturbed trials
//! - Robust aggregation of the clean trials

/// Log at `info` when narrating, `debug` otherwise.
macro_rules! narrate {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            ::tracing::info!($($arg)+)
        } else {
            ::tracing::debug!($($arg)+)
        }
    };
}

mod allocator;
mod batch;
mod config;
mod error;
mod executor;
mod harness;
mod measure;
mod overhead;
mod probe;
mod runtime;
mod series;
mod trial;
mod warmup;

pub use allocator::{TrackingAllocator, heap_in_use};
pub use batch::{BatchEstimate, PROBE_TRIAL_COUNT, estimate_batch_size, next_batch_size};
pub use config::{BenchConfig, FailureBudgets, ProtocolSettings, ReportingMode};
pub use error::{BenchError, Stage};
pub use executor::{TimedExecutor, Timing};
pub use harness::{BenchmarkResult, Harness, Phase};
pub use measure::{Timer, from_millis, pin_to_cpu, settle, to_millis};
pub use overhead::{TimingOverhead, estimate_overhead};
pub use probe::{
    DEFAULT_CLASS_LOADING_PATTERN, DEFAULT_COMPILATION_PATTERN, DEFAULT_GC_PATTERN, Interference,
    InterferenceKind, InterferenceLog, InterferenceSnapshot, LogPatterns, RuntimeSignalProbe,
    ScriptedProbe, SignalProbe, discover_log_path,
};
pub use runtime::{CollectionReport, HostRuntime, NativeRuntime, force_collection};
pub use series::{FailureCounts, InterferenceChecks, SeriesPlan, TrialSeries};
pub use trial::{TrialOutcome, TrialRecord, TrialRunner};
pub use warmup::{WarmupReport, warm_up};

/// Benchmark definition registered via `quietbench::bench!`
#[derive(Debug, Clone)]
pub struct BenchmarkDef {
    /// Unique identifier
    pub id: &'static str,
    /// Group this benchmark belongs to
    pub group: &'static str,
    /// Measures the payload on the given harness
    pub runner_fn: fn(&mut Harness) -> Result<BenchmarkResult, BenchError>,
    /// Source file path
    pub file: &'static str,
    /// Source line number
    pub line: u32,
    /// Module path
    pub module_path: &'static str,
}

// Collect all registered benchmarks
inventory::collect!(BenchmarkDef);

/// Anchor to prevent LTO from stripping inventory entries
#[used]
#[doc(hidden)]
pub static REGISTRY_ANCHOR: fn() = || {
    for _ in inventory::iter::<BenchmarkDef> {}
};
