use std::fmt;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, StudentsT};

use super::{DescriptiveStatistics, SampleSeries};
use crate::error::AnalysisError;

/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// Which two-sample test produced a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestKind {
    /// Pooled-variance Student's t-test (equal variances assumed).
    TwoSampleTTest,
    /// Welch's t-test (unequal-variance correction).
    WelchTTest,
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::TwoSampleTTest => write!(f, "two_sample_t_test"),
            TestKind::WelchTTest => write!(f, "welch_t_test"),
        }
    }
}

/// Magnitude label for Cohen's d, per Cohen's guidelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectSizeLabel {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectSizeLabel {
    /// Classify `|d|`: <0.2 negligible, [0.2, 0.5) small, [0.5, 0.8) medium,
    /// ≥0.8 large.
    pub fn from_cohens_d(d: f64) -> Self {
        let abs_d = d.abs();
        if abs_d < 0.2 {
            EffectSizeLabel::Negligible
        } else if abs_d < 0.5 {
            EffectSizeLabel::Small
        } else if abs_d < 0.8 {
            EffectSizeLabel::Medium
        } else {
            EffectSizeLabel::Large
        }
    }
}

impl fmt::Display for EffectSizeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffectSizeLabel::Negligible => write!(f, "negligible"),
            EffectSizeLabel::Small => write!(f, "small"),
            EffectSizeLabel::Medium => write!(f, "medium"),
            EffectSizeLabel::Large => write!(f, "large"),
        }
    }
}

/// Result of comparing a baseline sample against a treatment sample.
///
/// The t-statistic follows the `baseline − treatment` direction; Cohen's d
/// and the percent difference are treatment-relative
/// (`treatment − baseline`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalComparison {
    pub baseline_stats: DescriptiveStatistics,
    pub treatment_stats: DescriptiveStatistics,

    pub t_statistic: f64,
    pub p_value: f64,
    /// Fractional for Welch's test (Welch–Satterthwaite), `n1 + n2 − 2`
    /// for the pooled test.
    pub degrees_of_freedom: f64,

    /// `(treatment.mean − baseline.mean) / pooled_std`, 0 when the pooled
    /// standard deviation is 0.
    pub cohens_d: f64,
    pub effect_size_interpretation: EffectSizeLabel,

    /// `(treatment.mean − baseline.mean) / baseline.mean × 100`, 0 when the
    /// baseline mean is 0.
    pub percent_difference: f64,

    pub is_significant: bool,
    /// False only when one 95% CI lies strictly below the other.
    pub confidence_intervals_overlap: bool,

    pub test_type: TestKind,
    pub alpha: f64,
}

/// Compares a baseline sample against a treatment sample with a two-sample
/// t-test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TwoSampleComparator {
    /// Significance level for the test (default: 0.05).
    pub alpha: f64,
    /// Assume equal population variances (default: true). When false,
    /// Welch's correction is applied.
    pub equal_variance: bool,
}

impl Default for TwoSampleComparator {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            equal_variance: true,
        }
    }
}

impl TwoSampleComparator {
    /// Create a comparator with the specified significance level.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not in the range (0, 1).
    pub fn new(alpha: f64, equal_variance: bool) -> Self {
        assert!(
            alpha > 0.0 && alpha < 1.0,
            "alpha must be between 0 and 1 (exclusive)"
        );
        Self {
            alpha,
            equal_variance,
        }
    }

    /// Compare a baseline sample against a treatment sample.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InsufficientSamples`] if either sample has
    /// fewer than 2 observations.
    pub fn compare(
        &self,
        baseline: &SampleSeries,
        treatment: &SampleSeries,
    ) -> Result<StatisticalComparison, AnalysisError> {
        let n1 = baseline.len();
        let n2 = treatment.len();
        if n1 < 2 || n2 < 2 {
            return Err(AnalysisError::InsufficientSamples(format!(
                "each sample must have at least 2 observations (got {n1} and {n2})"
            )));
        }

        let baseline_stats = DescriptiveStatistics::from_series(baseline)?;
        let treatment_stats = DescriptiveStatistics::from_series(treatment)?;

        let var1 = baseline_stats.variance;
        let var2 = treatment_stats.variance;
        let mean1 = baseline_stats.mean;
        let mean2 = treatment_stats.mean;

        let (standard_error, degrees_of_freedom, test_type) = if self.equal_variance {
            let pooled_var =
                ((n1 - 1) as f64 * var1 + (n2 - 1) as f64 * var2) / (n1 + n2 - 2) as f64;
            let se = (pooled_var * (1.0 / n1 as f64 + 1.0 / n2 as f64)).sqrt();
            (se, (n1 + n2 - 2) as f64, TestKind::TwoSampleTTest)
        } else {
            let se = (var1 / n1 as f64 + var2 / n2 as f64).sqrt();
            (
                se,
                welch_satterthwaite_df(var1, n1, var2, n2),
                TestKind::WelchTTest,
            )
        };

        let (t_statistic, p_value) = if standard_error == 0.0 {
            // Both samples constant: an exact tie is certain, anything else
            // is a certain difference.
            (0.0, if mean1 == mean2 { 1.0 } else { 0.0 })
        } else {
            let t = (mean1 - mean2) / standard_error;
            (t, two_tailed_p_value(t, degrees_of_freedom))
        };

        let pooled_std = (((n1 - 1) as f64 * var1 + (n2 - 1) as f64 * var2)
            / (n1 + n2 - 2) as f64)
            .sqrt();
        let cohens_d = if pooled_std > 0.0 {
            (mean2 - mean1) / pooled_std
        } else {
            0.0
        };

        let percent_difference = if mean1 == 0.0 {
            0.0
        } else {
            (mean2 - mean1) / mean1 * 100.0
        };

        Ok(StatisticalComparison {
            t_statistic,
            p_value,
            degrees_of_freedom,
            cohens_d,
            effect_size_interpretation: EffectSizeLabel::from_cohens_d(cohens_d),
            percent_difference,
            is_significant: p_value < self.alpha,
            confidence_intervals_overlap: intervals_overlap(
                baseline_stats.confidence_interval_95,
                treatment_stats.confidence_interval_95,
            ),
            test_type,
            alpha: self.alpha,
            baseline_stats,
            treatment_stats,
        })
    }
}

/// Degrees of freedom by the Welch–Satterthwaite equation.
///
/// Falls back to `min(n1, n2) − 1` when both variances are zero.
fn welch_satterthwaite_df(var1: f64, n1: usize, var2: f64, n2: usize) -> f64 {
    let s1 = var1 / n1 as f64;
    let s2 = var2 / n2 as f64;
    let numerator = (s1 + s2) * (s1 + s2);
    let denominator = s1 * s1 / (n1 - 1) as f64 + s2 * s2 / (n2 - 1) as f64;

    if denominator == 0.0 {
        return (n1.min(n2) - 1) as f64;
    }

    numerator / denominator
}

/// Two-tailed p-value from the t-distribution: `2 · P(T > |t|)`.
fn two_tailed_p_value(t_statistic: f64, degrees_of_freedom: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, degrees_of_freedom) {
        Ok(dist) => 2.0 * (1.0 - dist.cdf(t_statistic.abs())),
        // Conservative fallback if the distribution cannot be constructed.
        Err(_) => 1.0,
    }
}

fn intervals_overlap(a: (f64, f64), b: (f64, f64)) -> bool {
    !(a.1 < b.0 || b.1 < a.0)
}
