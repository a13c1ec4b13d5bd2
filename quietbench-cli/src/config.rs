//! Configuration loading from quiet.toml
//!
//! quietbench configuration can be specified in a `quiet.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.

use quietbench_core::{BenchConfig, FailureBudgets, LogPatterns, ProtocolSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// quietbench configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuietConfig {
    /// Measurement protocol settings
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Per-kind discard budgets
    #[serde(default)]
    pub budgets: BudgetConfig,
    /// Interference log settings
    #[serde(default)]
    pub interference: InterferenceConfig,
    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,
}

/// Runner configuration for benchmark execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Clean trials per benchmark
    #[serde(default = "default_target_trials")]
    pub target_trials: usize,
    /// Clean trials per benchmark with `--quick`
    #[serde(default = "default_quick_trials")]
    pub quick_trials: usize,
    /// Minimum wall time of one trial (e.g., "300ms")
    #[serde(default = "default_min_execution_time")]
    pub min_execution_time: String,
    /// Minimum warm-up invocations
    #[serde(default = "default_warmup_iterations")]
    pub warmup_iterations: u32,
    /// Minimum warm-up duration (e.g., "10s")
    #[serde(default = "default_warmup_time")]
    pub warmup_time: String,
    /// Pause around each timed region (e.g., "300ms")
    #[serde(default = "default_settle_pause")]
    pub settle_pause: String,
    /// Collection requests per forced collection
    #[serde(default = "default_collection_attempts")]
    pub collection_attempts: u32,
    /// Fraction of the minimum execution time a series must reach
    #[serde(default = "default_min_time_fraction")]
    pub min_time_fraction: f64,
    /// Measure and report harness overhead
    #[serde(default)]
    pub timing_overhead: bool,
    /// Pin the measuring thread to this core
    #[serde(default)]
    pub pin_cpu: Option<usize>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            target_trials: default_target_trials(),
            quick_trials: default_quick_trials(),
            min_execution_time: default_min_execution_time(),
            warmup_iterations: default_warmup_iterations(),
            warmup_time: default_warmup_time(),
            settle_pause: default_settle_pause(),
            collection_attempts: default_collection_attempts(),
            min_time_fraction: default_min_time_fraction(),
            timing_overhead: false,
            pin_cpu: None,
        }
    }
}

fn default_target_trials() -> usize {
    30
}
fn default_quick_trials() -> usize {
    7
}
fn default_min_execution_time() -> String {
    "300ms".to_string()
}
fn default_warmup_iterations() -> u32 {
    10
}
fn default_warmup_time() -> String {
    "10s".to_string()
}
fn default_settle_pause() -> String {
    "300ms".to_string()
}
fn default_collection_attempts() -> u32 {
    10
}
fn default_min_time_fraction() -> f64 {
    0.75
}

/// Maximum discarded trials per interference kind
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Garbage collection
    #[serde(default = "default_gc_budget")]
    pub gc: u32,
    /// Compilation
    #[serde(default = "default_compilation_budget")]
    pub compilation: u32,
    /// Class loading
    #[serde(default = "default_class_loading_budget")]
    pub class_loading: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            gc: default_gc_budget(),
            compilation: default_compilation_budget(),
            class_loading: default_class_loading_budget(),
        }
    }
}

fn default_gc_budget() -> u32 {
    10
}
fn default_compilation_budget() -> u32 {
    10
}
fn default_class_loading_budget() -> u32 {
    5
}

/// Interference log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterferenceConfig {
    /// Path of the host runtime's interference log
    #[serde(default)]
    pub log: Option<String>,
    /// Regex for collection lines
    #[serde(default = "default_gc_pattern")]
    pub gc_pattern: String,
    /// Regex for compilation lines; empty disables compilation detection
    #[serde(default = "default_compilation_pattern")]
    pub compilation_pattern: String,
    /// Regex for class loading lines; empty disables class loading detection
    #[serde(default = "default_class_loading_pattern")]
    pub class_loading_pattern: String,
}

impl Default for InterferenceConfig {
    fn default() -> Self {
        Self {
            log: None,
            gc_pattern: default_gc_pattern(),
            compilation_pattern: default_compilation_pattern(),
            class_loading_pattern: default_class_loading_pattern(),
        }
    }
}

fn default_gc_pattern() -> String {
    quietbench_core::DEFAULT_GC_PATTERN.to_string()
}
fn default_compilation_pattern() -> String {
    quietbench_core::DEFAULT_COMPILATION_PATTERN.to_string()
}
fn default_class_loading_pattern() -> String {
    quietbench_core::DEFAULT_CLASS_LOADING_PATTERN.to_string()
}

impl InterferenceConfig {
    /// Compile the configured patterns
    pub fn patterns(&self) -> anyhow::Result<LogPatterns> {
        let optional = |p: &str| (!p.trim().is_empty()).then(|| p.to_string());
        let compilation = optional(&self.compilation_pattern);
        let class_loading = optional(&self.class_loading_pattern);
        Ok(LogPatterns::new(
            &self.gc_pattern,
            compilation.as_deref(),
            class_loading.as_deref(),
        )?)
    }
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Default output format: "human" or "json"
    #[serde(default = "default_format")]
    pub format: String,
    /// Write the report to this file instead of stdout
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            file: None,
        }
    }
}

fn default_format() -> String {
    "human".to_string()
}

impl QuietConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Try to discover and load configuration by walking up from current directory
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("quiet.toml");
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            error = %e,
                            "ignoring unreadable quiet.toml"
                        );
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Harness configuration described by this file
    pub fn bench_config(&self) -> anyhow::Result<BenchConfig> {
        let runner = &self.runner;
        let format: quietbench_report::OutputFormat =
            self.output.format.parse().map_err(anyhow::Error::msg)?;
        Ok(BenchConfig {
            target_trials: runner.target_trials,
            min_execution_time: Self::parse_duration(&runner.min_execution_time)?,
            reporting_mode: format.into(),
            verbose: false,
            calc_timing_overhead: runner.timing_overhead,
            protocol: ProtocolSettings {
                warmup_iterations: runner.warmup_iterations,
                warmup_time: Self::parse_duration(&runner.warmup_time)?,
                settle_pause: Self::parse_duration(&runner.settle_pause)?,
                collection_attempts: runner.collection_attempts,
                budgets: FailureBudgets {
                    gc: self.budgets.gc,
                    compilation: self.budgets.compilation,
                    class_loading: self.budgets.class_loading,
                },
                min_time_fraction: runner.min_time_fraction,
                pin_cpu: runner.pin_cpu,
                ..ProtocolSettings::default()
            },
        })
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# quietbench Configuration

[runner]
# Clean trials per benchmark
target_trials = 30
# Clean trials per benchmark with --quick
quick_trials = 7
# Minimum wall time of one trial's timed region
min_execution_time = "300ms"
# Warm-up runs until both floors are met
warmup_iterations = 10
warmup_time = "10s"
# Pause after forced collection and after each timed region
settle_pause = "300ms"
# Collection requests per forced collection
collection_attempts = 10
# A series must reach this fraction of min_execution_time
min_time_fraction = 0.75
# Measure and report the harness's own overhead
timing_overhead = false
# Pin the measuring thread to a core (uncomment to enable)
# pin_cpu = 2

[budgets]
# Discarded trials per interference kind before a benchmark fails
gc = 10
compilation = 10
class_loading = 5

[interference]
# Interference log written by the host runtime (uncomment to enable)
# log = "gc.log"
# Line patterns; an empty pattern disables that kind
gc_pattern = '\[gc[,\]]|\bGC\(\d+\)'
compilation_pattern = '\[jit[,\]]'
class_loading_pattern = '\[class,(?:load|unload)'

[output]
# Default output format: human, json
format = "human"
# Report file (uncomment to enable)
# file = "target/quietbench/report.json"
"#
        .to_string()
    }

    /// Parse duration string (e.g., "10s", "300ms", "2m")
    pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow::anyhow!("Empty duration string"));
        }

        // Find where the number ends and unit begins
        let (num_part, unit_part) = s
            .char_indices()
            .find(|(_, c)| c.is_alphabetic())
            .map(|(i, _)| s.split_at(i))
            .unwrap_or((s, "s"));

        let value: f64 = num_part
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid duration number: {}", num_part))?;
        if !value.is_finite() || value < 0.0 {
            return Err(anyhow::anyhow!("Invalid duration: {}", s));
        }

        let multiplier: u64 = match unit_part.to_lowercase().as_str() {
            "ns" => 1,
            "us" | "µs" => 1_000,
            "ms" => 1_000_000,
            "s" | "" => 1_000_000_000,
            "m" | "min" => 60_000_000_000,
            _ => return Err(anyhow::anyhow!("Unknown duration unit: {}", unit_part)),
        };

        Ok(Duration::from_nanos((value * multiplier as f64).round() as u64))
    }
}
