//! Human-readable Output
//!
//! Terminal-friendly rendering of results:
//! - `median` and `MAD` lines with a unit chosen by magnitude
//! - an overhead line when the harness measured its own overhead
//! - grouped benchmark listing with status icons (✓/✗/💥) and a summary

use crate::report::{BenchmarkReportResult, BenchmarkStatus, Report};
use quietbench_core::BenchmarkResult;
use std::collections::BTreeMap;

/// Format a duration given in milliseconds with a unit chosen by magnitude.
///
/// ```
/// # use quietbench_report::format_duration;
/// assert_eq!(format_duration(0.000_25), "250.00 ns");
/// assert_eq!(format_duration(0.5), "500.00 µs");
/// assert_eq!(format_duration(12.346), "12.35 ms");
/// assert_eq!(format_duration(2_500.0), "2.50 s");
/// ```
pub fn format_duration(millis: f64) -> String {
    let magnitude = millis.abs();
    if magnitude < 1e-3 {
        format!("{:.2} ns", millis * 1e6)
    } else if magnitude < 1.0 {
        format!("{:.2} µs", millis * 1e3)
    } else if magnitude < 1_000.0 {
        format!("{:.2} ms", millis)
    } else {
        format!("{:.2} s", millis / 1e3)
    }
}

/// The `median`/`MAD` lines for one result, plus overhead when present
pub fn format_result_lines(result: &BenchmarkResult) -> Vec<String> {
    let mut lines = vec![
        format!("median: {}", format_duration(result.median)),
        format!("MAD: {}", format_duration(result.mad)),
    ];
    if let Some(overhead) = &result.timing_overhead {
        lines.push(format!(
            "timing overhead: {} ({:.2}% of median)",
            format_duration(overhead.millis),
            overhead.percent_of_median
        ));
    }
    lines
}

/// Format a report for human-readable terminal display
pub fn format_human_output(report: &Report) -> String {
    let mut output = String::new();

    output.push('\n');
    output.push_str("quietbench results\n");
    output.push_str(&"=".repeat(60));
    output.push_str("\n\n");

    let mut groups: BTreeMap<&str, Vec<&BenchmarkReportResult>> = BTreeMap::new();
    for result in &report.results {
        groups.entry(&result.group).or_default().push(result);
    }

    for (group, results) in groups {
        output.push_str(&format!("Group: {}\n", group));
        output.push_str(&"-".repeat(60));
        output.push('\n');

        for entry in results {
            let status_icon = match entry.status {
                BenchmarkStatus::Passed => "✓",
                BenchmarkStatus::Failed => "✗",
                BenchmarkStatus::Crashed => "💥",
            };
            output.push_str(&format!(
                "  {} {}  [{}]\n",
                status_icon,
                entry.id,
                format_duration(entry.duration_ms)
            ));

            if let Some(result) = &entry.result {
                for line in format_result_lines(result) {
                    output.push_str(&format!("      {}\n", line));
                }
                output.push_str(&format!(
                    "      mean: {}  std dev: {}  trials: {} x {} call(s)\n",
                    format_duration(result.mean),
                    format_duration(result.std_dev),
                    result.timed_run_count,
                    result.batch_size
                ));
                if result.failures.total() > 0 {
                    output.push_str(&format!(
                        "      discarded: {}\n",
                        result.failures
                    ));
                }
            }

            if let Some(failure) = &entry.failure {
                output.push_str(&format!("      error: {}\n", failure.message));
            }

            output.push('\n');
        }
    }

    output.push_str("Summary\n");
    output.push_str(&"-".repeat(60));
    output.push('\n');
    output.push_str(&format!(
        "  Total: {}  Passed: {}  Failed: {}  Crashed: {}\n",
        report.summary.total_benchmarks,
        report.summary.passed,
        report.summary.failed,
        report.summary.crashed
    ));
    output.push_str(&format!(
        "  Discarded trials: {}  Duration: {}\n",
        report.summary.discarded_trials,
        format_duration(report.summary.total_duration_ms)
    ));

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_report;
    use quietbench_core::TimingOverhead;

    #[test]
    fn test_format_duration_boundaries() {
        assert_eq!(format_duration(0.0), "0.00 ns");
        assert_eq!(format_duration(0.000_999), "999.00 ns");
        assert_eq!(format_duration(0.001), "1.00 µs");
        assert_eq!(format_duration(1.0), "1.00 ms");
        assert_eq!(format_duration(999.994), "999.99 ms");
        assert_eq!(format_duration(1_000.0), "1.00 s");
    }

    #[test]
    fn test_result_lines_without_overhead() {
        let report = sample_report();
        let result = report.results[0].result.as_ref().unwrap();

        let lines = format_result_lines(result);
        assert_eq!(lines, vec!["median: 100.20 ms", "MAD: 150.00 µs"]);
    }

    #[test]
    fn test_result_lines_with_overhead() {
        let report = sample_report();
        let mut result = report.results[0].result.clone().unwrap();
        result.timing_overhead = Some(TimingOverhead::relative_to(0.000_05, result.median));

        let lines = format_result_lines(&result);
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("timing overhead: 50.00 ns ("));
        assert!(lines[2].ends_with("% of median)"));
    }

    #[test]
    fn test_human_output_lists_groups_and_failures() {
        let output = format_human_output(&sample_report());
        assert!(output.contains("Group: sleep"));
        assert!(output.contains("✓ sleep_100ms  [3.25 s]"));
        assert!(output.contains("✗ gc_heavy  [1.50 s]"));
        assert!(output.contains("error: could not obtain"));
        assert!(output.contains("discarded: gc: 2, compilation: 0, class loading: 0"));
        assert!(output.contains("Total: 2  Passed: 1  Failed: 1  Crashed: 0"));
    }
}
