//! Report Building
//!
//! Assembles the final [`Report`] from per-benchmark execution results:
//! metadata, one entry per benchmark in execution order, and totals.

use super::execution::{BenchExecutionResult, ExecutionConfig};
use super::metadata::build_report_meta;
use quietbench_report::{BenchmarkReportResult, BenchmarkStatus, Report, ReportSummary};

/// Build a complete Report from execution results
pub fn build_report(
    results: Vec<BenchExecutionResult>,
    config: &ExecutionConfig,
    total_duration_ms: f64,
) -> Report {
    let mut summary = ReportSummary {
        total_benchmarks: results.len(),
        total_duration_ms,
        ..Default::default()
    };
    let mut benchmark_results = Vec::with_capacity(results.len());

    for result in results {
        match result.status {
            BenchmarkStatus::Passed => summary.passed += 1,
            BenchmarkStatus::Failed => summary.failed += 1,
            BenchmarkStatus::Crashed => summary.crashed += 1,
        }

        let discarded = result
            .result
            .as_ref()
            .map(|r| r.failures)
            .or_else(|| result.failure.as_ref().and_then(|f| f.failures))
            .map(|f| u64::from(f.total()))
            .unwrap_or(0);
        summary.discarded_trials += discarded;

        benchmark_results.push(BenchmarkReportResult {
            id: result.benchmark_id,
            group: result.group,
            status: result.status,
            file: result.file,
            line: result.line,
            duration_ms: result.duration_ms,
            result: result.result,
            failure: result.failure,
        });
    }

    Report {
        meta: build_report_meta(config),
        results: benchmark_results,
        summary,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::ProbeSource;
    use quietbench_core::{BenchConfig, FailureCounts};
    use quietbench_report::FailureInfo;

    fn failed(id: &str, gc: u32) -> BenchExecutionResult {
        BenchExecutionResult {
            benchmark_id: id.to_string(),
            group: "g".to_string(),
            file: "f.rs".to_string(),
            line: 1,
            status: BenchmarkStatus::Failed,
            result: None,
            failure: Some(FailureInfo {
                kind: "clean_run_unobtainable".to_string(),
                message: "budget".to_string(),
                failures: Some(FailureCounts {
                    gc,
                    compilation: 0,
                    class_loading: 0,
                }),
                clean_trials: 2,
            }),
            duration_ms: 10.0,
        }
    }

    #[test]
    fn test_summary_counts() {
        let config = ExecutionConfig {
            bench: BenchConfig::default(),
            probe: ProbeSource::Disabled,
            progress: false,
        };
        let report = build_report(vec![failed("a", 10), failed("b", 4)], &config, 42.0);

        assert_eq!(report.summary.total_benchmarks, 2);
        assert_eq!(report.summary.failed, 2);
        assert_eq!(report.summary.passed, 0);
        assert_eq!(report.summary.discarded_trials, 14);
        assert_eq!(report.summary.total_duration_ms, 42.0);
        assert!(report.has_failures());
        assert_eq!(report.results[1].id, "b");
        assert_eq!(report.results[1].duration_ms, 10.0);
        assert!(report.meta.config.interference_log.is_none());
    }
}
