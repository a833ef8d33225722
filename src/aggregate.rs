//! Grouping of raw runs and attachment of baseline comparisons.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AnalysisConfig;
use crate::record::{extract_metric_series, GroupKey, Metric, RunRecord};
use crate::stats::{
    DescriptiveStatistics, SampleSeries, StatisticalComparison, TwoSampleComparator,
};

/// One (workload, configuration) bucket with its derived statistics.
///
/// The comparison fields are populated only for non-baseline groups whose
/// same-workload baseline sibling exists and has enough data; their absence
/// is a normal, reportable condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedGroup {
    pub key: GroupKey,
    pub runs: Vec<RunRecord>,
    pub run_count: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput: Option<DescriptiveStatistics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<DescriptiveStatistics>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub throughput_comparison: Option<StatisticalComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_comparison: Option<StatisticalComparison>,
}

/// Groups raw run records and compares each group against its baseline.
///
/// A pure function of its input: the same records and configuration always
/// produce byte-identical output, and no state is held across calls.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregator {
    baseline_mesh: String,
    comparator: TwoSampleComparator,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self {
            baseline_mesh: "baseline".to_string(),
            comparator: TwoSampleComparator::default(),
        }
    }
}

impl Aggregator {
    /// Create an aggregator comparing against the named baseline
    /// configuration.
    pub fn new(baseline_mesh: impl Into<String>) -> Self {
        Self {
            baseline_mesh: baseline_mesh.into(),
            ..Self::default()
        }
    }

    /// Create an aggregator from a loaded configuration.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            baseline_mesh: config.aggregation.baseline_mesh.clone(),
            comparator: TwoSampleComparator::new(
                config.hypothesis.alpha,
                config.hypothesis.equal_variance,
            ),
        }
    }

    /// The configuration name treated as baseline.
    pub fn baseline_mesh(&self) -> &str {
        &self.baseline_mesh
    }

    /// Group records by `(test_type, mesh_type)`, summarize each group's
    /// throughput and latency, and attach comparisons against the
    /// same-workload baseline group where possible.
    pub fn aggregate(&self, runs: &[RunRecord]) -> BTreeMap<GroupKey, AggregatedGroup> {
        let mut buckets: BTreeMap<GroupKey, Vec<RunRecord>> = BTreeMap::new();
        for run in runs {
            buckets.entry(run.group_key()).or_default().push(run.clone());
        }

        let series: BTreeMap<GroupKey, GroupSeries> = buckets
            .iter()
            .map(|(key, bucket)| (key.clone(), GroupSeries::extract(key, bucket)))
            .collect();

        buckets
            .into_iter()
            .map(|(key, bucket)| {
                let own = &series[&key];

                let (throughput_comparison, latency_comparison) = if key.mesh_type
                    == self.baseline_mesh
                {
                    // A baseline group never compares against itself.
                    (None, None)
                } else {
                    let baseline_key = GroupKey::new(&key.test_type, &self.baseline_mesh);
                    match series.get(&baseline_key) {
                        Some(baseline) => (
                            self.compare_series(&key, Metric::Throughput, &baseline.throughput, &own.throughput),
                            self.compare_series(&key, Metric::Latency, &baseline.latency, &own.latency),
                        ),
                        None => {
                            debug!(group = %key, "no baseline sibling, skipping comparisons");
                            (None, None)
                        }
                    }
                };

                let group = AggregatedGroup {
                    run_count: bucket.len(),
                    throughput: stats_for(&key, Metric::Throughput, &own.throughput),
                    latency: stats_for(&key, Metric::Latency, &own.latency),
                    throughput_comparison,
                    latency_comparison,
                    key: key.clone(),
                    runs: bucket,
                };
                (key, group)
            })
            .collect()
    }

    /// As [`Aggregator::aggregate`], keyed by the flat
    /// `"{test_type}_{mesh_type}"` label for external consumers.
    pub fn aggregate_labeled(&self, runs: &[RunRecord]) -> BTreeMap<String, AggregatedGroup> {
        self.aggregate(runs)
            .into_iter()
            .map(|(key, group)| (key.label(), group))
            .collect()
    }

    fn compare_series(
        &self,
        key: &GroupKey,
        metric: Metric,
        baseline: &Option<SampleSeries>,
        treatment: &Option<SampleSeries>,
    ) -> Option<StatisticalComparison> {
        let (baseline, treatment) = match (baseline, treatment) {
            (Some(b), Some(t)) => (b, t),
            _ => return None,
        };
        if baseline.len() < 2 || treatment.len() < 2 {
            debug!(
                group = %key,
                %metric,
                baseline_points = baseline.len(),
                treatment_points = treatment.len(),
                "fewer than 2 points on one side, skipping comparison"
            );
            return None;
        }
        match self.comparator.compare(baseline, treatment) {
            Ok(comparison) => Some(comparison),
            Err(err) => {
                warn!(group = %key, %metric, %err, "comparison skipped");
                None
            }
        }
    }
}

/// The two extracted metric series for one bucket.
struct GroupSeries {
    throughput: Option<SampleSeries>,
    latency: Option<SampleSeries>,
}

impl GroupSeries {
    fn extract(key: &GroupKey, bucket: &[RunRecord]) -> Self {
        Self {
            throughput: extracted(key, bucket, Metric::Throughput),
            latency: extracted(key, bucket, Metric::Latency),
        }
    }
}

fn extracted(key: &GroupKey, bucket: &[RunRecord], metric: Metric) -> Option<SampleSeries> {
    match extract_metric_series(bucket, metric) {
        Ok(series) => Some(series),
        Err(err) => {
            warn!(group = %key, %metric, %err, "metric series unusable, omitting");
            None
        }
    }
}

fn stats_for(
    key: &GroupKey,
    metric: Metric,
    series: &Option<SampleSeries>,
) -> Option<DescriptiveStatistics> {
    let series = series.as_ref().filter(|s| !s.is_empty())?;
    match DescriptiveStatistics::from_series(series) {
        Ok(stats) => Some(stats),
        Err(err) => {
            warn!(group = %key, %metric, %err, "statistics unavailable, omitting");
            None
        }
    }
}
