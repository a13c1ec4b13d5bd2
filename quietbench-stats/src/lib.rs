#![warn(missing_docs)]
//! quietbench Statistical Engine
//!
//! Robust aggregation for benchmark trial durations:
//! - Mean, unbiased sample variance and standard deviation
//! - Median and median absolute deviation (MAD)
//! - A combined [`RobustSummary`] for one set of clean trials
//!
//! All functions are total over non-empty input and reject empty input with
//! [`StatsError`].

mod robust;
mod summary;

pub use robust::{StatsError, mad, mean, median, sample_std_dev, sample_variance};
pub use summary::{RobustSummary, compute_robust_summary};
