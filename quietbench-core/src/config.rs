//! Harness Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How results are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportingMode {
    /// Formatted, human-readable lines
    #[default]
    Human,
    /// Machine-readable record
    Structured,
}

/// Maximum trials discarded per interference kind before a series is abandoned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FailureBudgets {
    /// Trials disturbed by garbage collection
    pub gc: u32,
    /// Trials disturbed by compilation
    pub compilation: u32,
    /// Trials disturbed by class loading
    pub class_loading: u32,
}

impl Default for FailureBudgets {
    fn default() -> Self {
        Self {
            gc: 10,
            compilation: 10,
            class_loading: 5,
        }
    }
}

/// Tunables of the measurement protocol itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtocolSettings {
    /// Minimum warm-up invocations
    pub warmup_iterations: u32,
    /// Minimum warm-up wall time
    #[serde(with = "duration_ms")]
    pub warmup_time: Duration,
    /// Pause after forced collection and after each timed region
    #[serde(with = "duration_ms")]
    pub settle_pause: Duration,
    /// Collection requests per forced collection
    pub collection_attempts: u32,
    /// Per-kind discard budgets
    pub budgets: FailureBudgets,
    /// Fraction of the minimum execution time a series must reach
    pub min_time_fraction: f64,
    /// Smallest per-call duration used when extrapolating batch sizes, in ms
    pub duration_floor_ms: f64,
    /// Core to pin the measuring thread to
    pub pin_cpu: Option<usize>,
}

impl Default for ProtocolSettings {
    fn default() -> Self {
        Self {
            warmup_iterations: 10,
            warmup_time: Duration::from_secs(10),
            settle_pause: Duration::from_millis(300),
            collection_attempts: 10,
            budgets: FailureBudgets::default(),
            min_time_fraction: 0.75,
            duration_floor_ms: 1e-9,
            pin_cpu: None,
        }
    }
}

/// Configuration of one harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Clean trials required per benchmark
    pub target_trials: usize,
    /// Minimum wall time of one trial's timed region
    #[serde(with = "duration_ms")]
    pub min_execution_time: Duration,
    /// Output presentation
    pub reporting_mode: ReportingMode,
    /// Narrate protocol progress at info level
    pub verbose: bool,
    /// Measure and report the harness's own timing overhead
    pub calc_timing_overhead: bool,
    /// Protocol tunables
    pub protocol: ProtocolSettings,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            target_trials: 30,
            min_execution_time: Duration::from_millis(300),
            reporting_mode: ReportingMode::Human,
            verbose: false,
            calc_timing_overhead: false,
            protocol: ProtocolSettings::default(),
        }
    }
}

impl BenchConfig {
    /// Reduced trial count for fast feedback
    pub fn quick() -> Self {
        Self {
            target_trials: 7,
            ..Self::default()
        }
    }

    /// Minimum execution time in milliseconds
    pub fn min_execution_ms(&self) -> f64 {
        crate::measure::to_millis(self.min_execution_time)
    }
}

/// Serialize durations as fractional milliseconds
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(crate::measure::to_millis(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = f64::deserialize(deserializer)?;
        Ok(crate::measure::from_millis(millis))
    }
}
