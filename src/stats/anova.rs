use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor};

use super::{DescriptiveStatistics, SampleSeries, DEFAULT_ALPHA};
use crate::error::AnalysisError;

/// One-way ANOVA across two or more independent groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaResult {
    pub f_statistic: f64,
    pub p_value: f64,
    pub degrees_of_freedom_between: usize,
    pub degrees_of_freedom_within: usize,

    /// Explained variance `SS_between / SS_total`, 0 when all observations
    /// are identical.
    pub eta_squared: f64,

    pub is_significant: bool,
    pub alpha: f64,

    /// Per-group descriptive statistics for drill-down.
    pub group_statistics: BTreeMap<String, DescriptiveStatistics>,
}

/// Runs a one-way variance analysis (F-test) across named groups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiGroupComparator {
    /// Significance level for the test (default: 0.05).
    pub alpha: f64,
}

impl Default for MultiGroupComparator {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
        }
    }
}

impl MultiGroupComparator {
    /// Create a comparator with the specified significance level.
    ///
    /// # Panics
    ///
    /// Panics if `alpha` is not in the range (0, 1).
    pub fn new(alpha: f64) -> Self {
        assert!(
            alpha > 0.0 && alpha < 1.0,
            "alpha must be between 0 and 1 (exclusive)"
        );
        Self { alpha }
    }

    /// Compare all groups simultaneously.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InsufficientGroups`] for fewer than 2
    /// groups, [`AnalysisError::InvalidInput`] if any group is empty, and
    /// [`AnalysisError::InsufficientSamples`] when the total observation
    /// count leaves no within-group degrees of freedom.
    pub fn compare(
        &self,
        groups: &BTreeMap<String, SampleSeries>,
    ) -> Result<AnovaResult, AnalysisError> {
        let k = groups.len();
        if k < 2 {
            return Err(AnalysisError::InsufficientGroups(format!(
                "need at least 2 groups (got {k})"
            )));
        }

        let mut group_statistics = BTreeMap::new();
        for (name, series) in groups {
            let stats = DescriptiveStatistics::from_series(series).map_err(|_| {
                AnalysisError::InvalidInput(format!("group {name:?} has no observations"))
            })?;
            group_statistics.insert(name.clone(), stats);
        }

        let n: usize = groups.values().map(SampleSeries::len).sum();
        if n <= k {
            return Err(AnalysisError::InsufficientSamples(format!(
                "F-test needs more observations than groups (got {n} across {k} groups)"
            )));
        }
        let df_between = k - 1;
        let df_within = n - k;

        let grand_mean =
            groups.values().flat_map(|s| s.values()).sum::<f64>() / n as f64;

        let mut ss_between = 0.0;
        let mut ss_within = 0.0;
        for (name, series) in groups {
            let group_mean = group_statistics[name].mean;
            let group_n = series.len() as f64;
            ss_between += group_n * (group_mean - grand_mean) * (group_mean - grand_mean);
            ss_within += series
                .values()
                .iter()
                .map(|v| (v - group_mean) * (v - group_mean))
                .sum::<f64>();
        }

        let ms_between = ss_between / df_between as f64;
        let ms_within = ss_within / df_within as f64;

        // Exactly separated groups (zero within-group variance, distinct
        // means) produce F = +inf, p = 0; all-identical data produces
        // F = 0, p = 1.
        let (f_statistic, p_value) = if ms_within == 0.0 {
            if ms_between == 0.0 {
                (0.0, 1.0)
            } else {
                (f64::INFINITY, 0.0)
            }
        } else {
            let f = ms_between / ms_within;
            (f, f_test_p_value(f, df_between as f64, df_within as f64))
        };

        let ss_total = ss_between + ss_within;
        let eta_squared = if ss_total == 0.0 {
            0.0
        } else {
            ss_between / ss_total
        };

        Ok(AnovaResult {
            f_statistic,
            p_value,
            degrees_of_freedom_between: df_between,
            degrees_of_freedom_within: df_within,
            eta_squared,
            is_significant: p_value < self.alpha,
            alpha: self.alpha,
            group_statistics,
        })
    }
}

/// Upper-tail p-value from the F-distribution: `P(F > f)`.
fn f_test_p_value(f_statistic: f64, df_between: f64, df_within: f64) -> f64 {
    match FisherSnedecor::new(df_between, df_within) {
        Ok(dist) => 1.0 - dist.cdf(f_statistic),
        // Conservative fallback if the distribution cannot be constructed.
        Err(_) => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::TwoSampleComparator;

    fn series(values: &[f64]) -> SampleSeries {
        SampleSeries::new(values.to_vec()).unwrap()
    }

    fn groups(entries: &[(&str, &[f64])]) -> BTreeMap<String, SampleSeries> {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), series(values)))
            .collect()
    }

    #[test]
    fn test_well_separated_groups_are_significant() {
        let comparator = MultiGroupComparator::default();
        let data = groups(&[
            ("baseline", &[100.0, 102.0, 98.0, 101.0, 99.0]),
            ("istio", &[80.0, 82.0, 78.0, 81.0, 79.0]),
            ("linkerd", &[90.0, 92.0, 88.0, 91.0, 89.0]),
        ]);

        let result = comparator.compare(&data).unwrap();

        assert!(result.is_significant);
        assert!(result.p_value < 0.05);
        assert!(result.f_statistic > 1.0);
        assert_eq!(result.degrees_of_freedom_between, 2);
        assert_eq!(result.degrees_of_freedom_within, 12);
        assert_eq!(result.group_statistics.len(), 3);
        assert!(result.eta_squared > 0.9);
    }

    #[test]
    fn test_similar_groups_are_not_significant() {
        let comparator = MultiGroupComparator::default();
        let data = groups(&[
            ("baseline", &[10.0, 12.0, 11.0, 13.0, 10.0]),
            ("istio", &[11.0, 13.0, 10.0, 12.0, 11.0]),
        ]);

        let result = comparator.compare(&data).unwrap();

        assert!(!result.is_significant);
        assert!(result.p_value > 0.05);
    }

    #[test]
    fn test_insufficient_groups() {
        let comparator = MultiGroupComparator::default();
        let data = groups(&[("baseline", &[1.0, 2.0, 3.0])]);

        let result = comparator.compare(&data);
        assert!(matches!(result, Err(AnalysisError::InsufficientGroups(_))));
    }

    #[test]
    fn test_empty_group_is_invalid() {
        let comparator = MultiGroupComparator::default();
        let mut data = groups(&[("baseline", &[1.0, 2.0, 3.0])]);
        data.insert("istio".to_string(), series(&[]));

        let result = comparator.compare(&data);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_no_within_group_degrees_of_freedom() {
        let comparator = MultiGroupComparator::default();
        let data = groups(&[("baseline", &[1.0]), ("istio", &[2.0])]);

        let result = comparator.compare(&data);
        assert!(matches!(
            result,
            Err(AnalysisError::InsufficientSamples(_))
        ));
    }

    #[test]
    fn test_all_identical_observations() {
        let comparator = MultiGroupComparator::default();
        let data = groups(&[("baseline", &[5.0, 5.0, 5.0]), ("istio", &[5.0, 5.0])]);

        let result = comparator.compare(&data).unwrap();

        assert_eq!(result.f_statistic, 0.0);
        assert_eq!(result.p_value, 1.0);
        assert_eq!(result.eta_squared, 0.0);
        assert!(!result.is_significant);
    }

    #[test]
    fn test_exactly_separated_groups() {
        let comparator = MultiGroupComparator::default();
        let data = groups(&[("baseline", &[5.0, 5.0, 5.0]), ("istio", &[7.0, 7.0])]);

        let result = comparator.compare(&data).unwrap();

        assert_eq!(result.p_value, 0.0);
        assert!(result.is_significant);
        assert!(result.f_statistic.is_infinite());
        assert_eq!(result.eta_squared, 1.0);
    }

    #[test]
    fn test_two_groups_agree_with_t_test() {
        // For 2 groups, one-way ANOVA is equivalent to the pooled t-test
        // (F = t²); the conclusions must land on the same side of alpha.
        let baseline = [100.0, 102.0, 98.0, 101.0, 99.0];
        let treatment = [80.0, 82.0, 78.0, 81.0, 79.0];

        let anova = MultiGroupComparator::default()
            .compare(&groups(&[("baseline", &baseline), ("istio", &treatment)]))
            .unwrap();
        let ttest = TwoSampleComparator::default()
            .compare(&series(&baseline), &series(&treatment))
            .unwrap();

        assert_eq!(anova.is_significant, ttest.is_significant);
        assert!(anova.is_significant);
        // F = t² up to floating-point noise.
        let t_squared = ttest.t_statistic * ttest.t_statistic;
        assert!(
            (anova.f_statistic - t_squared).abs() / t_squared < 1e-9,
            "F = {} vs t² = {}",
            anova.f_statistic,
            t_squared
        );
        // The p-values agree analytically; allow numerical tolerance.
        assert!((anova.p_value - ttest.p_value).abs() < 1e-6);
    }

    #[test]
    fn test_deterministic_recomputation() {
        let comparator = MultiGroupComparator::default();
        let data = groups(&[
            ("a", &[1.0, 2.0, 3.0]),
            ("b", &[4.0, 5.0, 6.0]),
            ("c", &[7.0, 8.0, 9.0]),
        ]);

        let first = comparator.compare(&data).unwrap();
        let second = comparator.compare(&data).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    #[should_panic(expected = "alpha must be between 0 and 1")]
    fn test_invalid_alpha() {
        MultiGroupComparator::new(0.0);
    }
}
