use serde::{Deserialize, Serialize};

use super::{percentile, SampleSeries};
use crate::error::AnalysisError;

/// Descriptive summary of one sample series.
///
/// Variance and standard deviation use the sample (N−1) denominator. The
/// 95% confidence interval is the normal approximation `mean ± 1.96·SE`;
/// the hypothesis tests in this crate use Student's t instead, and the two
/// conventions are intentionally not unified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStatistics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub min_value: f64,
    pub max_value: f64,
    pub sample_size: usize,

    pub p25: f64,
    pub p75: f64,
    pub p90: f64,
    pub p95: f64,
    pub p99: f64,

    /// `std_dev / mean`, 0 when the mean is 0.
    pub coefficient_of_variation: f64,
    /// `std_dev / sqrt(N)`.
    pub standard_error: f64,
    /// `(mean - 1.96·SE, mean + 1.96·SE)`.
    pub confidence_interval_95: (f64, f64),
    /// `p75 - p25`.
    pub interquartile_range: f64,
}

impl DescriptiveStatistics {
    /// Summarize a non-empty series.
    ///
    /// A single-observation series has variance, standard deviation, and
    /// standard error defined as 0 rather than NaN.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] if the series is empty.
    pub fn from_series(series: &SampleSeries) -> Result<Self, AnalysisError> {
        if series.is_empty() {
            return Err(AnalysisError::InvalidInput("sample is empty".to_string()));
        }

        let values = series.values();
        let n = values.len();

        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = if n < 2 {
            0.0
        } else {
            let sum_sq_diff: f64 = values
                .iter()
                .map(|v| {
                    let diff = v - mean;
                    diff * diff
                })
                .sum();
            sum_sq_diff / (n - 1) as f64
        };
        let std_dev = variance.sqrt();

        let sorted = series.sorted_values();
        let p25 = percentile(&sorted, 25.0);
        let p75 = percentile(&sorted, 75.0);

        let standard_error = std_dev / (n as f64).sqrt();
        let margin_of_error = 1.96 * standard_error;

        Ok(Self {
            mean,
            median: percentile(&sorted, 50.0),
            std_dev,
            variance,
            min_value: sorted[0],
            max_value: sorted[n - 1],
            sample_size: n,
            p25,
            p75,
            p90: percentile(&sorted, 90.0),
            p95: percentile(&sorted, 95.0),
            p99: percentile(&sorted, 99.0),
            coefficient_of_variation: if mean == 0.0 { 0.0 } else { std_dev / mean },
            standard_error,
            confidence_interval_95: (mean - margin_of_error, mean + margin_of_error),
            interquartile_range: p75 - p25,
        })
    }

    /// Validate raw observations and summarize them.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] if the slice is empty or
    /// contains a non-finite value.
    pub fn from_values(values: &[f64]) -> Result<Self, AnalysisError> {
        Self::from_series(&SampleSeries::new(values.to_vec())?)
    }
}
