//! JSON Output

use crate::report::Report;
use quietbench_core::BenchmarkResult;

/// Generate a prettified JSON report.
pub fn generate_json_report(report: &Report) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Serialize a single result as a structured record.
pub fn generate_json_result(result: &BenchmarkResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_report;

    #[test]
    fn test_report_round_trips_field_names() {
        let json = generate_json_report(&sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let result = &value["results"][0]["result"];
        assert_eq!(result["timed_run_count"], 3);
        assert_eq!(result["failures"]["gc"], 2);
        assert_eq!(result["failures"]["class_loading"], 0);
        assert!(result["median"].is_f64());
        assert!(result["mad"].is_f64());
        assert!(result["std_dev"].is_f64());
        assert!(result["final_collection_ms"].is_f64());
        assert_eq!(result["trials"].as_array().map(Vec::len), Some(3));
        assert!(result["trials"][0]["fingerprint"].is_u64());

        assert_eq!(value["results"][0]["status"], "passed");
        assert_eq!(value["results"][0]["duration_ms"], 3_250.0);
        assert_eq!(value["meta"]["config"]["target_trials"], 30);
        assert_eq!(value["meta"]["config"]["reporting_mode"], "structured");
    }

    #[test]
    fn test_overhead_omitted_unless_measured() {
        let report = sample_report();
        let mut result = report.results[0].result.clone().unwrap();

        let json = generate_json_result(&result).unwrap();
        assert!(!json.contains("timing_overhead"));

        result.timing_overhead = Some(quietbench_core::TimingOverhead::relative_to(0.001, 0.1));
        let json = generate_json_result(&result).unwrap();
        assert!(json.contains("\"percent_of_median\""));
    }
}
