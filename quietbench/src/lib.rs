#![warn(missing_docs)]
//! # quietbench
//!
//! Adaptive, interference-aware microbenchmark harness for code running on a
//! managed, garbage-collected runtime.
//!
//! quietbench measures the wall-clock time of a short operation while the
//! host runtime is busy collecting, compiling and loading classes around it:
//! - **Warm-up**: drives the payload until both an iteration and a time floor are met
//! - **Interference detection**: every trial is bracketed by a forced collection
//!   and two snapshots of the runtime's interference log; disturbed trials are discarded
//! - **Failure budgets**: a benchmark that keeps getting disturbed fails loudly
//!   instead of reporting polluted numbers
//! - **Adaptive batching**: fast payloads are repeated until a trial outlasts timer resolution
//! - **Robust statistics**: median and median absolute deviation alongside mean and std-dev
//! - **Overhead estimation**: optional measurement of the harness's own per-call cost
//!
//! ## Quick Start
//!
//! ```ignore
//! quietbench::bench!(vec_push, group = "collections", {
//!     let mut v = Vec::new();
//!     for i in 0..1024 {
//!         v.push(i);
//!     }
//!     v.len()
//! });
//!
//! fn main() -> anyhow::Result<()> {
//!     quietbench::run()
//! }
//! ```
//!
//! ## Direct Use
//!
//! ```ignore
//! use quietbench::{BenchConfig, Harness};
//!
//! let mut harness = Harness::new(BenchConfig::quick());
//! let result = harness.run(|| (0..1000u64).sum::<u64>())?;
//! println!("median: {}", quietbench::format_duration(result.median));
//! ```

// Re-export core types
pub use quietbench_core::{
    BenchConfig, BenchError, BenchmarkDef, BenchmarkResult, CollectionReport, FailureBudgets,
    FailureCounts, Harness, HostRuntime, Interference, InterferenceKind, InterferenceLog,
    InterferenceSnapshot, LogPatterns, NativeRuntime, Phase, ProtocolSettings, ReportingMode,
    RuntimeSignalProbe, ScriptedProbe, SignalProbe, Stage, TimingOverhead, TrackingAllocator,
    TrialOutcome, TrialRecord, TrialSeries, discover_log_path, force_collection,
};

// Re-export stats
pub use quietbench_stats::{
    RobustSummary, StatsError, compute_robust_summary, mad, mean, median, sample_std_dev,
    sample_variance,
};

// Re-export report formatting
pub use quietbench_report::{
    OutputFormat, Report, format_duration, format_result_lines, generate_json_result,
};

/// Internal re-exports for macro use
#[doc(hidden)]
pub mod internal {
    pub use inventory;
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{BenchConfig, BenchError, BenchmarkResult, Harness, bench};
}

/// Register a benchmark.
///
/// The payload expression is evaluated once per call and its value is
/// fingerprinted, so it is never optimized away.
///
/// ```ignore
/// quietbench::bench!(string_concat, group = "strings", {
///     let mut s = String::new();
///     for word in ["quiet", "bench"] {
///         s.push_str(word);
///     }
///     s
/// });
///
/// // Group defaults to "default"
/// quietbench::bench!(noop, ());
/// ```
#[macro_export]
macro_rules! bench {
    ($name:ident, group = $group:literal, $payload:expr $(,)?) => {
        fn $name(
            harness: &mut $crate::Harness,
        ) -> ::core::result::Result<$crate::BenchmarkResult, $crate::BenchError> {
            harness.run(|| $payload)
        }

        $crate::internal::inventory::submit! {
            $crate::BenchmarkDef {
                id: stringify!($name),
                group: $group,
                runner_fn: $name,
                file: file!(),
                line: line!(),
                module_path: module_path!(),
            }
        }
    };
    ($name:ident, $payload:expr $(,)?) => {
        $crate::bench!($name, group = "default", $payload);
    };
}

/// Run the quietbench CLI harness.
///
/// Call this from your benchmark binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     quietbench::run()
/// }
/// ```
pub use quietbench_cli::run;
