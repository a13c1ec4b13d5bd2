//! Report Data Structures

use chrono::{DateTime, Utc};
use quietbench_core::{BenchConfig, BenchmarkResult, FailureCounts};
use serde::{Deserialize, Serialize};

/// Complete benchmark report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Run metadata
    pub meta: ReportMeta,
    /// One entry per executed benchmark
    pub results: Vec<BenchmarkReportResult>,
    /// Totals
    pub summary: ReportSummary,
}

/// Report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Report layout version
    pub schema_version: u32,
    /// quietbench version
    pub version: String,
    /// Generation time
    pub timestamp: DateTime<Utc>,
    /// Commit of the working tree, if in a git checkout
    pub git_commit: Option<String>,
    /// Branch of the working tree
    pub git_branch: Option<String>,
    /// Host description
    pub system: SystemInfo,
    /// Effective configuration
    pub config: ReportConfig,
}

/// Execution configuration captured in report metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Harness configuration every benchmark ran with
    #[serde(flatten)]
    pub bench: BenchConfig,
    /// Interference log followed, or `None` when GC detection was disabled
    pub interference_log: Option<String>,
}

/// System information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system
    pub os: String,
    /// Architecture
    pub arch: String,
    /// CPU model
    pub cpu: String,
    /// Logical cores
    pub cpu_cores: u32,
    /// Total memory
    pub memory_gb: f64,
}

/// Individual benchmark result in the report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReportResult {
    /// Benchmark identifier
    pub id: String,
    /// Group the benchmark belongs to
    pub group: String,
    /// Outcome
    pub status: BenchmarkStatus,
    /// Source file of the definition
    pub file: String,
    /// Source line of the definition
    pub line: u32,
    /// Wall time of the whole invocation, ms
    pub duration_ms: f64,
    /// Measurements, for passed benchmarks
    pub result: Option<BenchmarkResult>,
    /// Failure details, for failed or crashed benchmarks
    pub failure: Option<FailureInfo>,
}

/// Benchmark execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BenchmarkStatus {
    /// Measured successfully
    Passed,
    /// The protocol gave up
    Failed,
    /// The payload panicked
    Crashed,
}

/// Failure information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureInfo {
    /// Machine-readable failure name
    pub kind: String,
    /// Human-readable description
    pub message: String,
    /// Discarded trials per kind, when the protocol ran out of budget
    pub failures: Option<FailureCounts>,
    /// Clean trials collected before the failure
    pub clean_trials: usize,
}

/// Report summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Benchmarks executed
    pub total_benchmarks: usize,
    /// Benchmarks measured
    pub passed: usize,
    /// Benchmarks the protocol gave up on
    pub failed: usize,
    /// Benchmarks whose payload panicked
    pub crashed: usize,
    /// Disturbed trials discarded across all benchmarks
    pub discarded_trials: u64,
    /// Wall time of the whole run
    pub total_duration_ms: f64,
}

impl Report {
    /// Whether any benchmark did not pass
    pub fn has_failures(&self) -> bool {
        self.summary.failed + self.summary.crashed > 0
    }
}
