use std::fmt;

use serde::{Deserialize, Serialize};

use super::{percentile, SampleSeries};
use crate::error::AnalysisError;

/// Default IQR multiplier: 1.5 flags typical outliers, 3.0 extreme ones.
pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;
/// Default z-score threshold.
pub const DEFAULT_ZSCORE_THRESHOLD: f64 = 3.0;

/// Outlier detection rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutlierMethod {
    Iqr,
    Zscore,
}

impl fmt::Display for OutlierMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutlierMethod::Iqr => write!(f, "iqr"),
            OutlierMethod::Zscore => write!(f, "zscore"),
        }
    }
}

/// Anomalies flagged within one sample series.
///
/// Indices refer to positions in the original (unsorted) series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlierReport {
    pub method: OutlierMethod,
    pub outliers_count: usize,
    pub outliers_percent: f64,
    pub outlier_indices: Vec<usize>,
    pub outlier_values: Vec<f64>,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Flags anomalous values using an IQR rule or a z-score rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutlierDetector {
    /// Multiplier `k` for the IQR bounds `[Q1 - k·IQR, Q3 + k·IQR]`.
    pub iqr_multiplier: f64,
    /// Threshold on `|z|` for the z-score rule.
    pub zscore_threshold: f64,
}

impl Default for OutlierDetector {
    fn default() -> Self {
        Self {
            iqr_multiplier: DEFAULT_IQR_MULTIPLIER,
            zscore_threshold: DEFAULT_ZSCORE_THRESHOLD,
        }
    }
}

impl OutlierDetector {
    pub fn new(iqr_multiplier: f64, zscore_threshold: f64) -> Self {
        Self {
            iqr_multiplier,
            zscore_threshold,
        }
    }

    /// Run the selected detection rule.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] if the series is empty.
    pub fn detect(
        &self,
        series: &SampleSeries,
        method: OutlierMethod,
    ) -> Result<OutlierReport, AnalysisError> {
        match method {
            OutlierMethod::Iqr => self.detect_iqr(series),
            OutlierMethod::Zscore => self.detect_zscore(series),
        }
    }

    /// IQR rule: values outside `[Q1 - k·IQR, Q3 + k·IQR]`.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] if the series is empty.
    pub fn detect_iqr(&self, series: &SampleSeries) -> Result<OutlierReport, AnalysisError> {
        if series.is_empty() {
            return Err(AnalysisError::InvalidInput("sample is empty".to_string()));
        }

        let sorted = series.sorted_values();
        let q1 = percentile(&sorted, 25.0);
        let q3 = percentile(&sorted, 75.0);
        let iqr = q3 - q1;

        let lower_bound = q1 - self.iqr_multiplier * iqr;
        let upper_bound = q3 + self.iqr_multiplier * iqr;

        Ok(collect_outside(
            series,
            OutlierMethod::Iqr,
            lower_bound,
            upper_bound,
        ))
    }

    /// Z-score rule: values with `|value - mean| / stdev` above the threshold.
    ///
    /// Uses the population standard deviation. A constant sample (stdev 0)
    /// yields zero outliers with both bounds collapsed to the mean.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] if the series is empty.
    pub fn detect_zscore(&self, series: &SampleSeries) -> Result<OutlierReport, AnalysisError> {
        if series.is_empty() {
            return Err(AnalysisError::InvalidInput("sample is empty".to_string()));
        }

        let values = series.values();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std_dev = (values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n).sqrt();

        if std_dev == 0.0 {
            return Ok(OutlierReport {
                method: OutlierMethod::Zscore,
                outliers_count: 0,
                outliers_percent: 0.0,
                outlier_indices: Vec::new(),
                outlier_values: Vec::new(),
                lower_bound: mean,
                upper_bound: mean,
            });
        }

        let lower_bound = mean - self.zscore_threshold * std_dev;
        let upper_bound = mean + self.zscore_threshold * std_dev;

        Ok(collect_outside(
            series,
            OutlierMethod::Zscore,
            lower_bound,
            upper_bound,
        ))
    }
}

fn collect_outside(
    series: &SampleSeries,
    method: OutlierMethod,
    lower_bound: f64,
    upper_bound: f64,
) -> OutlierReport {
    let mut outlier_indices = Vec::new();
    let mut outlier_values = Vec::new();

    for (index, &value) in series.values().iter().enumerate() {
        if value < lower_bound || value > upper_bound {
            outlier_indices.push(index);
            outlier_values.push(value);
        }
    }

    let outliers_count = outlier_indices.len();
    OutlierReport {
        method,
        outliers_count,
        outliers_percent: outliers_count as f64 / series.len() as f64 * 100.0,
        outlier_indices,
        outlier_values,
        lower_bound,
        upper_bound,
    }
}
