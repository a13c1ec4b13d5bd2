//! Summary Statistics
//!
//! Bundles the robust statistics of one set of clean trial durations.
//! Every figure is computed from the same, complete sample: trials that saw
//! interference never reach this point, so nothing is trimmed here.

use crate::robust::{StatsError, mad, mean, median, sample_std_dev};

/// Robust summary of a sample
#[derive(Debug, Clone, PartialEq)]
pub struct RobustSummary {
    /// Arithmetic mean
    pub mean: f64,
    /// Median
    pub median: f64,
    /// Median absolute deviation (unscaled)
    pub mad: f64,
    /// Sample standard deviation
    pub std_dev: f64,
}

/// Compute the robust summary of a non-empty sample
pub fn compute_robust_summary(samples: &[f64]) -> Result<RobustSummary, StatsError> {
    Ok(RobustSummary {
        mean: mean(samples)?,
        median: median(samples)?,
        mad: mad(samples)?,
        std_dev: sample_std_dev(samples)?,
    })
}
