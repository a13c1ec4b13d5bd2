#![warn(missing_docs)]
//! quietbench Report - Result Presentation
//!
//! Generates the two output formats:
//! - JSON (machine-readable, one record per benchmark)
//! - Human-readable terminal text with magnitude-scaled units

mod human;
mod json;
mod report;

pub use human::{format_duration, format_human_output, format_result_lines};
pub use json::{generate_json_report, generate_json_result};
pub use report::{
    BenchmarkReportResult, BenchmarkStatus, FailureInfo, Report, ReportConfig, ReportMeta,
    ReportSummary, SystemInfo,
};

use quietbench_core::ReportingMode;

/// Output format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON with full schema
    Json,
    /// Human-readable terminal output
    Human,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "structured" => Ok(OutputFormat::Json),
            "human" | "text" => Ok(OutputFormat::Human),
            other => Err(format!("Unknown output format: {}", other)),
        }
    }
}

impl From<ReportingMode> for OutputFormat {
    fn from(mode: ReportingMode) -> Self {
        match mode {
            ReportingMode::Human => OutputFormat::Human,
            ReportingMode::Structured => OutputFormat::Json,
        }
    }
}

impl From<OutputFormat> for ReportingMode {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Human => ReportingMode::Human,
            OutputFormat::Json => ReportingMode::Structured,
        }
    }
}

#[cfg(test)]
mod test_support {
    use crate::report::*;
    use quietbench_core::{
        BenchConfig, BenchError, BenchmarkResult, FailureCounts, ReportingMode, Stage,
        TrialRecord,
    };

    pub fn sample_report() -> Report {
        let failures = FailureCounts {
            gc: 2,
            compilation: 0,
            class_loading: 0,
        };
        let passed = BenchmarkResult {
            timed_run_count: 3,
            failures,
            mean: 100.25,
            median: 100.2,
            mad: 0.15,
            std_dev: 0.2,
            final_collection_ms: 0.75,
            timing_overhead: None,
            batch_size: 4,
            trials: [100.05, 100.2, 100.5]
                .into_iter()
                .map(|duration_ms| TrialRecord {
                    duration_ms,
                    fingerprint: 0xdead_beef,
                })
                .collect(),
        };
        let error = BenchError::CleanRunUnobtainable {
            stage: Stage::Measurement,
            target: 30,
            failures: FailureCounts {
                gc: 10,
                compilation: 1,
                class_loading: 0,
            },
            partial: Vec::new(),
        };

        Report {
            meta: ReportMeta {
                schema_version: 1,
                version: "0.1.0".to_string(),
                timestamp: chrono::Utc::now(),
                git_commit: None,
                git_branch: None,
                system: SystemInfo {
                    os: "linux".to_string(),
                    arch: "x86_64".to_string(),
                    cpu: "Test CPU".to_string(),
                    cpu_cores: 8,
                    memory_gb: 16.0,
                },
                config: ReportConfig {
                    bench: BenchConfig {
                        reporting_mode: ReportingMode::Structured,
                        ..BenchConfig::default()
                    },
                    interference_log: Some("gc.log".to_string()),
                },
            },
            results: vec![
                BenchmarkReportResult {
                    id: "sleep_100ms".to_string(),
                    group: "sleep".to_string(),
                    status: BenchmarkStatus::Passed,
                    file: "benches/sleep.rs".to_string(),
                    line: 12,
                    duration_ms: 3_250.0,
                    result: Some(passed),
                    failure: None,
                },
                BenchmarkReportResult {
                    id: "gc_heavy".to_string(),
                    group: "alloc".to_string(),
                    status: BenchmarkStatus::Failed,
                    file: "benches/alloc.rs".to_string(),
                    line: 30,
                    duration_ms: 1_500.0,
                    result: None,
                    failure: Some(FailureInfo {
                        kind: error.kind().to_string(),
                        message: error.to_string(),
                        failures: None,
                        clean_trials: 0,
                    }),
                },
            ],
            summary: ReportSummary {
                total_benchmarks: 2,
                passed: 1,
                failed: 1,
                crashed: 0,
                discarded_trials: 13,
                total_duration_ms: 5_000.0,
            },
        }
    }
}
