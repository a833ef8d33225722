//! Statistical primitives: descriptive summaries, outlier detection,
//! two-sample hypothesis tests, one-way ANOVA, and power analysis.
//!
//! All quantiles in this crate share a single convention (linear
//! interpolation between ranks over the sorted sample); see [`percentile`].

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

mod anova;
mod descriptive;
mod outliers;
mod power;
mod ttest;

pub use anova::{AnovaResult, MultiGroupComparator};
pub use descriptive::DescriptiveStatistics;
pub use outliers::{OutlierDetector, OutlierMethod, OutlierReport};
pub use power::statistical_power;
pub use ttest::{
    EffectSizeLabel, StatisticalComparison, TestKind, TwoSampleComparator, DEFAULT_ALPHA,
};

/// An ordered sequence of finite observations for one metric.
///
/// Construction rejects NaN and infinite values, so every statistic in this
/// crate can assume finite input. An empty series is allowed (it means the
/// metric was absent from every run) and is rejected by the individual
/// statistics that need data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct SampleSeries {
    values: Vec<f64>,
}

impl SampleSeries {
    /// Build a series from raw observations.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] if any value is NaN or
    /// infinite.
    pub fn new(values: Vec<f64>) -> Result<Self, AnalysisError> {
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "sample contains non-finite value {bad}"
            )));
        }
        Ok(Self { values })
    }

    /// The observations in their original order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// A sorted copy of the observations.
    pub(crate) fn sorted_values(&self) -> Vec<f64> {
        let mut sorted = self.values.clone();
        sorted.sort_unstable_by(|a, b| a.total_cmp(b));
        sorted
    }
}

impl TryFrom<Vec<f64>> for SampleSeries {
    type Error = AnalysisError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<SampleSeries> for Vec<f64> {
    fn from(series: SampleSeries) -> Self {
        series.values
    }
}

/// Percentile of a sorted slice by linear interpolation between ranks.
///
/// `p` is in `[0, 100]`. The interpolated rank is `p/100 * (n - 1)`. This is
/// the one quantile definition used everywhere in the crate, including the
/// IQR outlier bounds.
pub(crate) fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty(), "percentile of empty slice");
    debug_assert!((0.0..=100.0).contains(&p), "percentile out of range");

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = p / 100.0 * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
