//! One-call composition of a full statistical report for a single metric:
//! baseline summary, pairwise comparisons, cross-group ANOVA, and outlier
//! analysis. Partial results are always preferred over failing the report.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::error::AnalysisError;
use crate::stats::{
    AnovaResult, DescriptiveStatistics, MultiGroupComparator, OutlierDetector, OutlierMethod,
    OutlierReport, SampleSeries, StatisticalComparison, TwoSampleComparator,
};

/// Outcome of one baseline-vs-treatment comparison within a report.
///
/// Serializes to either the comparison object itself or an `{"error": ...}`
/// entry, so a single undersized treatment cannot sink the whole report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PairwiseOutcome {
    Compared(Box<StatisticalComparison>),
    Skipped { error: String },
}

impl PairwiseOutcome {
    pub fn comparison(&self) -> Option<&StatisticalComparison> {
        match self {
            PairwiseOutcome::Compared(comparison) => Some(comparison),
            PairwiseOutcome::Skipped { .. } => None,
        }
    }
}

/// Statistical report comparing a baseline against every treatment for one
/// metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricReport {
    pub metric: String,
    pub alpha: f64,
    pub baseline_statistics: DescriptiveStatistics,
    pub pairwise_comparisons: BTreeMap<String, PairwiseOutcome>,
    /// One-way ANOVA over baseline plus all treatments; present only when
    /// there are at least 2 treatments and the test is computable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anova: Option<AnovaResult>,
    pub outlier_analysis: BTreeMap<String, OutlierReport>,
}

/// Name under which the baseline appears in ANOVA groups and outlier
/// analysis.
const BASELINE_GROUP: &str = "baseline";

/// Build a [`MetricReport`] for one metric.
///
/// Per-treatment comparison failures are captured as
/// [`PairwiseOutcome::Skipped`] entries; ANOVA and outlier failures are
/// logged and omitted.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] only when the baseline series
/// itself is empty; without baseline statistics there is no report.
pub fn generate_metric_report(
    baseline: &SampleSeries,
    treatments: &BTreeMap<String, SampleSeries>,
    metric: impl Into<String>,
    alpha: f64,
) -> Result<MetricReport, AnalysisError> {
    let metric = metric.into();
    let baseline_statistics = DescriptiveStatistics::from_series(baseline)?;

    let comparator = TwoSampleComparator {
        alpha,
        ..TwoSampleComparator::default()
    };
    let pairwise_comparisons = treatments
        .iter()
        .map(|(name, series)| {
            let outcome = match comparator.compare(baseline, series) {
                Ok(comparison) => PairwiseOutcome::Compared(Box::new(comparison)),
                Err(err) => PairwiseOutcome::Skipped {
                    error: err.to_string(),
                },
            };
            (name.clone(), outcome)
        })
        .collect();

    let anova = if treatments.len() > 1 {
        let mut groups: BTreeMap<String, SampleSeries> = treatments.clone();
        groups.insert(BASELINE_GROUP.to_string(), baseline.clone());
        match MultiGroupComparator::new(alpha).compare(&groups) {
            Ok(result) => Some(result),
            Err(err) => {
                warn!(%metric, %err, "ANOVA omitted from report");
                None
            }
        }
    } else {
        None
    };

    let detector = OutlierDetector::default();
    let mut outlier_analysis = BTreeMap::new();
    let named = std::iter::once((BASELINE_GROUP, baseline))
        .chain(treatments.iter().map(|(name, series)| (name.as_str(), series)));
    for (name, series) in named {
        match detector.detect(series, OutlierMethod::Iqr) {
            Ok(report) => {
                outlier_analysis.insert(name.to_string(), report);
            }
            Err(err) => {
                warn!(%metric, group = name, %err, "outlier analysis omitted");
            }
        }
    }

    Ok(MetricReport {
        metric,
        alpha,
        baseline_statistics,
        pairwise_comparisons,
        anova,
        outlier_analysis,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> SampleSeries {
        SampleSeries::new(values.to_vec()).unwrap()
    }

    fn treatments(entries: &[(&str, &[f64])]) -> BTreeMap<String, SampleSeries> {
        entries
            .iter()
            .map(|(name, values)| (name.to_string(), series(values)))
            .collect()
    }

    #[test]
    fn test_full_report() {
        let baseline = series(&[100.0, 102.0, 98.0, 101.0, 99.0]);
        let meshes = treatments(&[
            ("istio", &[80.0, 82.0, 78.0, 81.0, 79.0]),
            ("linkerd", &[95.0, 97.0, 93.0, 96.0, 94.0]),
        ]);

        let report = generate_metric_report(&baseline, &meshes, "latency", 0.05).unwrap();

        assert_eq!(report.metric, "latency");
        assert_eq!(report.pairwise_comparisons.len(), 2);
        let istio = report.pairwise_comparisons["istio"].comparison().unwrap();
        assert!(istio.is_significant);
        // Baseline + 2 treatments -> ANOVA over 3 groups.
        let anova = report.anova.as_ref().unwrap();
        assert_eq!(anova.group_statistics.len(), 3);
        assert!(anova.is_significant);
        assert_eq!(report.outlier_analysis.len(), 3);
    }

    #[test]
    fn test_single_treatment_has_no_anova() {
        let baseline = series(&[100.0, 102.0, 98.0]);
        let meshes = treatments(&[("istio", &[80.0, 82.0, 78.0])]);

        let report = generate_metric_report(&baseline, &meshes, "throughput", 0.05).unwrap();

        assert!(report.anova.is_none());
        assert_eq!(report.pairwise_comparisons.len(), 1);
    }

    #[test]
    fn test_undersized_treatment_is_skipped_not_fatal() {
        let baseline = series(&[100.0, 102.0, 98.0, 101.0]);
        let meshes = treatments(&[
            ("istio", &[80.0, 82.0, 78.0]),
            ("broken", &[55.0]),
        ]);

        let report = generate_metric_report(&baseline, &meshes, "throughput", 0.05).unwrap();

        assert!(report.pairwise_comparisons["istio"].comparison().is_some());
        assert!(matches!(
            report.pairwise_comparisons["broken"],
            PairwiseOutcome::Skipped { .. }
        ));
    }

    #[test]
    fn test_empty_baseline_fails() {
        let baseline = SampleSeries::new(Vec::new()).unwrap();
        let meshes = treatments(&[("istio", &[80.0, 82.0])]);

        let result = generate_metric_report(&baseline, &meshes, "throughput", 0.05);
        assert!(matches!(result, Err(AnalysisError::InvalidInput(_))));
    }

    #[test]
    fn test_skipped_outcome_serializes_as_error_entry() {
        let baseline = series(&[100.0, 102.0, 98.0]);
        let meshes = treatments(&[("broken", &[55.0])]);

        let report = generate_metric_report(&baseline, &meshes, "throughput", 0.05).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert!(json["pairwise_comparisons"]["broken"]["error"]
            .as_str()
            .unwrap()
            .contains("insufficient samples"));
    }

    #[test]
    fn test_compared_outcome_serializes_flat() {
        let baseline = series(&[100.0, 102.0, 98.0]);
        let meshes = treatments(&[("istio", &[80.0, 82.0, 78.0])]);

        let report = generate_metric_report(&baseline, &meshes, "throughput", 0.05).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        let istio = &json["pairwise_comparisons"]["istio"];
        assert!(istio.get("p_value").is_some());
        assert!(istio.get("cohens_d").is_some());
        assert!(istio.get("error").is_none());
    }
}
