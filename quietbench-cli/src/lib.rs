#![warn(missing_docs)]
//! quietbench CLI Library
//!
//! This module provides the CLI infrastructure for benchmark binaries.
//! Use `quietbench::run()` (or `quietbench_cli::run()`) in your main function to get the full
//! quietbench CLI experience with your registered benchmarks.
//!
//! # Example
//!
//! ```ignore
//! quietbench::bench!(vec_push, group = "collections", {
//!     let mut v = Vec::with_capacity(1024);
//!     for i in 0..1024 {
//!         v.push(i);
//!     }
//!     v.len()
//! });
//!
//! fn main() -> anyhow::Result<()> {
//!     quietbench_cli::run()
//! }
//! ```

mod config;
mod executor;
mod planner;

pub use config::*;
pub use executor::{BenchExecutionResult, ExecutionConfig, Executor, ProbeSource, build_report};

use clap::{Parser, Subcommand};
use quietbench_core::{BenchConfig, BenchmarkDef, discover_log_path};
use quietbench_report::{OutputFormat, format_human_output, generate_json_report};
use regex::Regex;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Environment variable naming the interference log
pub const GC_LOG_ENV: &str = "QUIETBENCH_GC_LOG";
/// Environment variable holding the host runtime's startup flags
pub const HOST_ARGS_ENV: &str = "QUIETBENCH_HOST_ARGS";

/// quietbench CLI arguments
#[derive(Parser, Debug)]
#[command(name = "quietbench")]
#[command(author, version, about = "quietbench - interference-aware microbenchmarks")]
pub struct Cli {
    /// Optional subcommand; defaults to running benchmarks
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Filter benchmarks by regex pattern
    #[arg(default_value = ".*")]
    pub filter: String,

    /// Run benchmarks for this group only
    #[arg(long)]
    pub group: Option<String>,

    /// Output format: human, json (defaults to quiet.toml, then human)
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Use the reduced trial count for fast feedback
    #[arg(long)]
    pub quick: bool,

    /// Clean trials per benchmark
    #[arg(long, short = 'n')]
    pub trials: Option<usize>,

    /// Minimum wall time of one trial (e.g., "300ms")
    #[arg(long)]
    pub min_time: Option<String>,

    /// Minimum warm-up duration (e.g., "10s")
    #[arg(long)]
    pub warmup: Option<String>,

    /// Minimum warm-up invocations
    #[arg(long)]
    pub warmup_iterations: Option<u32>,

    /// Pause around each timed region (e.g., "300ms")
    #[arg(long)]
    pub settle: Option<String>,

    /// Measure and report the harness's own timing overhead
    #[arg(long)]
    pub overhead: bool,

    /// Interference log written by the host runtime
    #[arg(long)]
    pub gc_log: Option<PathBuf>,

    /// Pin the measuring thread to this core
    #[arg(long)]
    pub pin_cpu: Option<usize>,

    /// Narrate the protocol as it runs
    #[arg(short, long)]
    pub verbose: bool,

    /// Dry run - list benchmarks without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all discovered benchmarks
    List,
    /// Run benchmarks (default)
    Run,
    /// Write a default quiet.toml to the current directory
    Init,
}

/// Run the quietbench CLI with the given arguments.
/// This is the main entry point for benchmark binaries.
pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(cli)
}

/// Run the quietbench CLI with pre-parsed arguments.
pub fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    init_tracing(cli.verbose);

    // Discover quiet.toml configuration (CLI flags override)
    let config = QuietConfig::discover().unwrap_or_default();

    match cli.command {
        Some(Commands::List) => list_benchmarks(&cli),
        Some(Commands::Init) => init_config(Path::new("quiet.toml")),
        Some(Commands::Run) => run_benchmarks(&cli, &config),
        None if cli.dry_run => list_benchmarks(&cli),
        None => run_benchmarks(&cli, &config),
    }
}

/// Install the fmt subscriber. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "quietbench_core=debug,quietbench_cli=debug"
    } else {
        "quietbench_core=info,quietbench_cli=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A subscriber may already be installed by an embedding application.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Filter benchmarks based on CLI options using the planner module.
///
/// Returns benchmarks sorted alphabetically by ID for deterministic execution.
fn filter_benchmarks(
    cli: &Cli,
    benchmarks: &[&'static BenchmarkDef],
) -> anyhow::Result<Vec<&'static BenchmarkDef>> {
    let filter_re = Regex::new(&cli.filter)
        .map_err(|e| anyhow::anyhow!("Invalid filter pattern {:?}: {}", cli.filter, e))?;

    let plan = planner::build_plan(
        benchmarks.iter().copied(),
        Some(&filter_re),
        cli.group.as_deref(),
    );

    Ok(plan.benchmarks)
}

fn list_benchmarks(cli: &Cli) -> anyhow::Result<()> {
    println!("quietbench plan:");

    let all_benchmarks: Vec<_> = inventory::iter::<BenchmarkDef>.into_iter().collect();
    let benchmarks = filter_benchmarks(cli, &all_benchmarks)?;

    let mut groups: std::collections::BTreeMap<&str, Vec<&BenchmarkDef>> =
        std::collections::BTreeMap::new();
    for bench in &benchmarks {
        groups.entry(bench.group).or_default().push(bench);
    }

    for (group, benches) in &groups {
        println!("├── group: {}", group);
        for bench in benches {
            println!("│   ├── {} ({}:{})", bench.id, bench.file, bench.line);
        }
    }

    println!("{} benchmarks found.", benchmarks.len());
    Ok(())
}

fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        return Err(anyhow::anyhow!("{} already exists", path.display()));
    }
    std::fs::write(path, QuietConfig::default_toml())?;
    println!("Wrote {}", path.display());
    Ok(())
}

/// Build the harness configuration by layering: quiet.toml → CLI overrides.
pub fn build_bench_config(cli: &Cli, config: &QuietConfig) -> anyhow::Result<BenchConfig> {
    let mut bench = config.bench_config()?;

    bench.target_trials = match (cli.trials, cli.quick) {
        (Some(n), _) => n,
        (None, true) => config.runner.quick_trials,
        (None, false) => bench.target_trials,
    };
    if let Some(min_time) = &cli.min_time {
        bench.min_execution_time = QuietConfig::parse_duration(min_time)?;
    }
    if let Some(warmup) = &cli.warmup {
        bench.protocol.warmup_time = QuietConfig::parse_duration(warmup)?;
    }
    if let Some(iterations) = cli.warmup_iterations {
        bench.protocol.warmup_iterations = iterations;
    }
    if let Some(settle) = &cli.settle {
        bench.protocol.settle_pause = QuietConfig::parse_duration(settle)?;
    }
    if let Some(format) = &cli.format {
        let format: OutputFormat = format.parse().map_err(anyhow::Error::msg)?;
        bench.reporting_mode = format.into();
    }
    if cli.pin_cpu.is_some() {
        bench.protocol.pin_cpu = cli.pin_cpu;
    }
    bench.calc_timing_overhead |= cli.overhead;
    bench.verbose = cli.verbose;

    Ok(bench)
}

/// Pick the interference log: flag, then quiet.toml, then `QUIETBENCH_GC_LOG`,
/// then discovery over the host runtime's startup flags.
pub fn resolve_log_path(
    flag: Option<&Path>,
    configured: Option<&str>,
    env_log: Option<&str>,
    host_args: Option<&str>,
) -> Option<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(|| configured.map(PathBuf::from))
        .or_else(|| env_log.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
        .or_else(|| host_args.and_then(|args| discover_log_path(args.split_whitespace())))
}

fn resolve_probe_source(cli: &Cli, config: &QuietConfig) -> anyhow::Result<ProbeSource> {
    let env_log = std::env::var(GC_LOG_ENV).ok();
    let host_args = std::env::var(HOST_ARGS_ENV).ok();
    let path = resolve_log_path(
        cli.gc_log.as_deref(),
        config.interference.log.as_deref(),
        env_log.as_deref(),
        host_args.as_deref(),
    );

    Ok(match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "following interference log");
            ProbeSource::Log {
                path,
                patterns: config.interference.patterns()?,
            }
        }
        None => ProbeSource::Disabled,
    })
}

fn run_benchmarks(cli: &Cli, config: &QuietConfig) -> anyhow::Result<()> {
    let all_benchmarks: Vec<_> = inventory::iter::<BenchmarkDef>.into_iter().collect();
    let benchmarks = filter_benchmarks(cli, &all_benchmarks)?;

    if benchmarks.is_empty() {
        println!("No benchmarks found.");
        return Ok(());
    }

    let bench = build_bench_config(cli, config)?;
    let format = OutputFormat::from(bench.reporting_mode);
    let exec_config = ExecutionConfig {
        probe: resolve_probe_source(cli, config)?,
        progress: !cli.verbose,
        bench,
    };

    eprintln!(
        "Running {} benchmarks, {} clean trials each...\n",
        benchmarks.len(),
        exec_config.bench.target_trials
    );

    let start_time = Instant::now();
    let mut executor = Executor::new(exec_config.clone());
    let results = executor.execute(&benchmarks);

    let total_duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
    let report = build_report(results, &exec_config, total_duration_ms);

    let output = match format {
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Human => format_human_output(&report),
    };

    let output_path = cli
        .output
        .clone()
        .or_else(|| config.output.file.as_ref().map(PathBuf::from));
    if let Some(path) = output_path {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = std::fs::File::create(&path)?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    if report.has_failures() {
        eprintln!(
            "\n{} benchmark(s) failed, {} crashed",
            report.summary.failed, report.summary.crashed
        );
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("quietbench").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = parse(&[
            "--trials",
            "12",
            "--min-time",
            "50ms",
            "--settle",
            "0ms",
            "--overhead",
            "--format",
            "json",
        ]);
        let bench = build_bench_config(&cli, &QuietConfig::default()).unwrap();

        assert_eq!(bench.target_trials, 12);
        assert_eq!(bench.min_execution_time, Duration::from_millis(50));
        assert_eq!(bench.protocol.settle_pause, Duration::ZERO);
        assert!(bench.calc_timing_overhead);
        assert_eq!(bench.reporting_mode, quietbench_core::ReportingMode::Structured);
    }

    #[test]
    fn test_quick_uses_quick_trials() {
        let cli = parse(&["--quick"]);
        let bench = build_bench_config(&cli, &QuietConfig::default()).unwrap();
        assert_eq!(bench.target_trials, 7);

        // An explicit trial count wins over --quick
        let cli = parse(&["--quick", "--trials", "4"]);
        let bench = build_bench_config(&cli, &QuietConfig::default()).unwrap();
        assert_eq!(bench.target_trials, 4);
    }

    #[test]
    fn test_defaults_without_flags() {
        let cli = parse(&[]);
        let bench = build_bench_config(&cli, &QuietConfig::default()).unwrap();
        assert_eq!(bench, BenchConfig::default());
        assert_eq!(cli.filter, ".*");
    }

    #[test]
    fn test_invalid_duration_is_an_error() {
        let cli = parse(&["--min-time", "soon"]);
        assert!(build_bench_config(&cli, &QuietConfig::default()).is_err());
    }

    #[test]
    fn test_log_resolution_order() {
        let flag = Path::new("/flag/gc.log");
        let host = "-Xmx1g -Xlog:gc*:file=/host/gc.log";

        assert_eq!(
            resolve_log_path(Some(flag), Some("/cfg/gc.log"), Some("/env/gc.log"), Some(host)),
            Some(PathBuf::from("/flag/gc.log"))
        );
        assert_eq!(
            resolve_log_path(None, Some("/cfg/gc.log"), Some("/env/gc.log"), Some(host)),
            Some(PathBuf::from("/cfg/gc.log"))
        );
        assert_eq!(
            resolve_log_path(None, None, Some("/env/gc.log"), Some(host)),
            Some(PathBuf::from("/env/gc.log"))
        );
        assert_eq!(
            resolve_log_path(None, None, Some("  "), Some(host)),
            Some(PathBuf::from("/host/gc.log"))
        );
        assert_eq!(resolve_log_path(None, None, None, Some("-Xmx1g")), None);
        assert_eq!(resolve_log_path(None, None, None, None), None);
    }

    #[test]
    fn test_list_subcommand_parses() {
        let cli = parse(&["list"]);
        assert!(matches!(cli.command, Some(Commands::List)));
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let path = std::env::temp_dir().join(format!("quiet-{}.toml", std::process::id()));
        init_config(&path).unwrap();
        assert!(init_config(&path).is_err());

        let written = QuietConfig::load(&path).unwrap();
        assert_eq!(written.runner.target_trials, 30);
        let _ = std::fs::remove_file(&path);
    }
}
