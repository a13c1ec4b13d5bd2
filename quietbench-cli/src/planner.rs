//! Benchmark Planner
//!
//! Builds execution plan by filtering and ordering benchmarks.
//!
//! Filtering options:
//! - Regex pattern matching on benchmark ID
//! - Group filtering
//!
//! Ordering: Benchmarks are sorted alphabetically by ID for deterministic execution.

use quietbench_core::BenchmarkDef;

/// Execution plan for benchmarks
pub struct ExecutionPlan {
    /// Ordered list of benchmarks to run
    pub benchmarks: Vec<&'static BenchmarkDef>,
}

/// Build execution plan from discovered benchmarks
pub fn build_plan(
    benchmarks: impl IntoIterator<Item = &'static BenchmarkDef>,
    filter: Option<&regex::Regex>,
    group: Option<&str>,
) -> ExecutionPlan {
    let mut selected: Vec<_> = benchmarks
        .into_iter()
        .filter(|b| filter.is_none_or(|re| re.is_match(b.id)))
        .filter(|b| group.is_none_or(|g| b.group == g))
        .collect();

    selected.sort_by_key(|b| b.id);

    ExecutionPlan {
        benchmarks: selected,
    }
}
