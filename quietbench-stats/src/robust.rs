//! Robust Statistics
//!
//! Total functions over a non-empty sample. Every function rejects an empty
//! slice with [`StatsError::Empty`] rather than inventing a value.
//!
//! The median absolute deviation is reported unscaled: it is the median of
//! `|x - median(x)|`, not multiplied by the 1.4826 normal-consistency factor.

use thiserror::Error;

/// Errors from statistic computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    /// The input sample had no elements
    #[error("cannot compute the {statistic} of an empty sample")]
    Empty {
        /// Name of the statistic that was requested
        statistic: &'static str,
    },
}

fn ensure_non_empty(samples: &[f64], statistic: &'static str) -> Result<(), StatsError> {
    if samples.is_empty() {
        Err(StatsError::Empty { statistic })
    } else {
        Ok(())
    }
}

/// Arithmetic mean.
pub fn mean(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples, "mean")?;
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Unbiased sample variance, `Σ(x - mean)² / (n - 1)`.
///
/// A single observation has no spread, so `n = 1` yields `0.0`.
pub fn sample_variance(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples, "sample variance")?;
    if samples.len() == 1 {
        return Ok(0.0);
    }

    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    let squares = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>();
    Ok(squares / (samples.len() - 1) as f64)
}

/// Sample standard deviation (square root of [`sample_variance`]).
pub fn sample_std_dev(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples, "sample standard deviation")?;
    sample_variance(samples).map(f64::sqrt)
}

/// Median of the sample.
///
/// Odd lengths take the middle element; even lengths average the two central
/// elements. The input is not reordered.
///
/// # Examples
///
/// ```
/// # use quietbench_stats::median;
/// assert_eq!(median(&[10.0, 2.0, 6.0, 4.0]).unwrap(), 5.0);
/// assert_eq!(median(&[1.0, 3.0, 2.0]).unwrap(), 2.0);
/// ```
pub fn median(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples, "median")?;

    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);
    Ok(sorted_median(&sorted))
}

/// Median absolute deviation around the median.
///
/// # Examples
///
/// ```
/// # use quietbench_stats::mad;
/// // The outlier moves neither the median nor the MAD.
/// assert_eq!(mad(&[1.0, 2.0, 3.0, 11.0]).unwrap(), 1.0);
/// ```
pub fn mad(samples: &[f64]) -> Result<f64, StatsError> {
    ensure_non_empty(samples, "median absolute deviation")?;

    let center = median(samples)?;
    let mut deviations: Vec<f64> = samples.iter().map(|x| (x - center).abs()).collect();
    deviations.sort_by(f64::total_cmp);
    Ok(sorted_median(&deviations))
}

/// Median of an already sorted, non-empty slice.
fn sorted_median(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
