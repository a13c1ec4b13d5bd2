//! Benchmark Executor
//!
//! Runs the selected benchmarks one after another and turns their outcomes
//! into a report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! BenchmarkDef (registered via bench!)
//!       │
//!       ▼
//! ┌─────────────┐
//! │  execution  │  One Harness invocation per benchmark, strictly sequential
//! └──────┬──────┘
//!        │
//!        ▼
//! ┌─────────────┐
//! │   report    │  Build Report with metadata and summary
//! └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`execution`] - Harness construction and sequential execution
//! - [`report`] - Report assembly
//! - [`metadata`] - System metadata collection

mod execution;
mod metadata;
mod report;

pub use execution::{BenchExecutionResult, ExecutionConfig, Executor, ProbeSource};
pub use report::build_report;
