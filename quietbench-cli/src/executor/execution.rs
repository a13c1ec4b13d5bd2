//! Benchmark Execution
//!
//! Each selected benchmark gets a fresh [`Harness`] and runs to completion
//! before the next one starts. A benchmark the protocol gives up on is
//! recorded as failed; a payload that panics is recorded as crashed. Neither
//! stops the run.
//!
//! ## Data Flow
//!
//! ```text
//! BenchmarkDef (from inventory)
//!        │
//!        ▼
//!   ExecutionConfig ──► Harness (probe + runtime + BenchConfig)
//!        │
//!        ▼
//!  BenchExecutionResult (result or failure, status, wall time)
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use quietbench_core::{
    BenchConfig, BenchError, BenchmarkDef, BenchmarkResult, Harness, InterferenceLog, LogPatterns,
    NativeRuntime, RuntimeSignalProbe, SignalProbe,
};
use quietbench_report::{BenchmarkStatus, FailureInfo};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;

/// Where interference signals come from
#[derive(Debug, Clone)]
pub enum ProbeSource {
    /// No log; GC detection disabled
    Disabled,
    /// Follow a host runtime log
    Log {
        /// Log file
        path: PathBuf,
        /// Line classification
        patterns: LogPatterns,
    },
}

impl ProbeSource {
    /// Log being followed, if any
    pub fn log_path(&self) -> Option<&Path> {
        match self {
            ProbeSource::Disabled => None,
            ProbeSource::Log { path, .. } => Some(path),
        }
    }

    fn build(&self) -> Box<dyn SignalProbe> {
        let log = match self {
            ProbeSource::Disabled => None,
            ProbeSource::Log { path, patterns } => {
                Some(InterferenceLog::with_patterns(path.clone(), patterns.clone()))
            }
        };
        Box::new(RuntimeSignalProbe::new(log))
    }
}

/// Configuration for benchmark execution
#[derive(Debug, Clone)]
pub struct ExecutionConfig {
    /// Harness configuration shared by every benchmark
    pub bench: BenchConfig,
    /// Interference source
    pub probe: ProbeSource,
    /// Draw a progress bar
    pub progress: bool,
}

/// Result from executing a single benchmark
#[derive(Debug)]
pub struct BenchExecutionResult {
    /// Benchmark identifier
    pub benchmark_id: String,
    /// Group
    pub group: String,
    /// Source file
    pub file: String,
    /// Source line
    pub line: u32,
    /// Outcome
    pub status: BenchmarkStatus,
    /// Measurements, when passed
    pub result: Option<BenchmarkResult>,
    /// Failure details, when failed or crashed
    pub failure: Option<FailureInfo>,
    /// Wall time of the whole invocation
    pub duration_ms: f64,
}

/// Execute benchmarks and produce results
pub struct Executor {
    config: ExecutionConfig,
    results: Vec<BenchExecutionResult>,
}

impl Executor {
    /// Create an executor for `config`
    pub fn new(config: ExecutionConfig) -> Self {
        Self {
            config,
            results: Vec::new(),
        }
    }

    /// Execute all provided benchmarks
    pub fn execute(&mut self, benchmarks: &[&BenchmarkDef]) -> Vec<BenchExecutionResult> {
        let pb = if self.config.progress {
            ProgressBar::new(benchmarks.len() as u64)
        } else {
            ProgressBar::hidden()
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        for bench in benchmarks {
            pb.set_message(bench.id.to_string());
            let result = self.execute_single(bench);
            self.results.push(result);
            pb.inc(1);
        }

        pb.finish_with_message("Complete");
        std::mem::take(&mut self.results)
    }

    /// Execute a single benchmark
    fn execute_single(&self, bench: &BenchmarkDef) -> BenchExecutionResult {
        let start = Instant::now();
        let mut harness = Harness::with_parts(
            self.config.bench.clone(),
            self.config.probe.build(),
            Box::new(NativeRuntime),
        );

        // Run with panic catching
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            (bench.runner_fn)(&mut harness)
        }));
        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

        let (status, result, failure) = match outcome {
            Ok(Ok(result)) => (BenchmarkStatus::Passed, Some(result), None),
            Ok(Err(e)) => {
                warn!(benchmark = bench.id, error = %e, "benchmark failed");
                (BenchmarkStatus::Failed, None, Some(failure_info(&e)))
            }
            Err(panic) => {
                let message = if let Some(s) = panic.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                warn!(benchmark = bench.id, %message, "benchmark panicked");

                let failure = FailureInfo {
                    kind: "panic".to_string(),
                    message,
                    failures: None,
                    clean_trials: 0,
                };
                (BenchmarkStatus::Crashed, None, Some(failure))
            }
        };

        BenchExecutionResult {
            benchmark_id: bench.id.to_string(),
            group: bench.group.to_string(),
            file: bench.file.to_string(),
            line: bench.line,
            status,
            result,
            failure,
            duration_ms,
        }
    }
}

/// Describe a protocol failure for the report
pub(crate) fn failure_info(error: &BenchError) -> FailureInfo {
    let (failures, clean_trials) = match error {
        BenchError::CleanRunUnobtainable {
            failures, partial, ..
        } => (Some(*failures), partial.len()),
        BenchError::InsufficientExecutionTime { series, .. } => {
            (Some(series.failures), series.len())
        }
        BenchError::DegenerateInput(_) => (None, 0),
    };

    FailureInfo {
        kind: error.kind().to_string(),
        message: error.to_string(),
        failures,
        clean_trials,
    }
}
