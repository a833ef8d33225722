//! The validated edge between the external run collector and the engine.
//!
//! Raw records arrive as free-form JSON; everything past this module
//! operates on [`SampleSeries`] and typed keys.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::stats::SampleSeries;

/// One benchmark execution's output, as produced by the run collector.
///
/// Only `test_type`, `mesh_type`, and the two metric keys named by
/// [`Metric`] are interpreted here; every other top-level field and metric
/// key passes through untouched for downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub test_type: String,

    /// Configuration under test; absent means the run was unmeshed.
    #[serde(default = "default_mesh_type")]
    pub mesh_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    #[serde(default)]
    pub metrics: BTreeMap<String, serde_json::Value>,

    /// Unrecognized top-level fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn default_mesh_type() -> String {
    "baseline".to_string()
}

impl RunRecord {
    /// Create a record with no metrics yet.
    pub fn new(test_type: impl Into<String>, mesh_type: impl Into<String>) -> Self {
        Self {
            test_type: test_type.into(),
            mesh_type: mesh_type.into(),
            timestamp: None,
            metrics: BTreeMap::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Attach a numeric metric value.
    pub fn with_metric(mut self, name: impl Into<String>, value: f64) -> Self {
        self.metrics.insert(name.into(), value.into());
        self
    }

    /// Look up a metric as a float, if present and numeric.
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).and_then(serde_json::Value::as_f64)
    }

    /// The grouping key for this record.
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(&self.test_type, &self.mesh_type)
    }
}

/// Composite key identifying one (workload, configuration) bucket.
///
/// An explicit struct rather than a concatenated string, so a delimiter
/// appearing inside a workload or configuration name cannot collide two
/// buckets. [`GroupKey::label`] renders the external
/// `"{test_type}_{mesh_type}"` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupKey {
    pub test_type: String,
    pub mesh_type: String,
}

impl GroupKey {
    pub fn new(test_type: impl Into<String>, mesh_type: impl Into<String>) -> Self {
        Self {
            test_type: test_type.into(),
            mesh_type: mesh_type.into(),
        }
    }

    /// The flat key used in serialized output mappings.
    pub fn label(&self) -> String {
        format!("{}_{}", self.test_type, self.mesh_type)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.test_type, self.mesh_type)
    }
}

/// The metric series this engine derives per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Throughput,
    Latency,
}

impl Metric {
    /// The key under `metrics` in the raw record.
    pub const fn key(self) -> &'static str {
        match self {
            Metric::Throughput => "requests_per_sec",
            Metric::Latency => "avg_latency_ms",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Extract one of the engine's metric series from a set of runs.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if any extracted value is
/// non-finite.
pub fn extract_metric_series(
    runs: &[RunRecord],
    metric: Metric,
) -> Result<SampleSeries, AnalysisError> {
    extract_named_series(runs, metric.key())
}

/// Extract an arbitrary named numeric series from a set of runs.
///
/// A run missing the metric (or carrying a non-numeric value under it) is
/// excluded from the series; the remaining values keep their run order.
///
/// # Errors
///
/// Returns [`AnalysisError::InvalidInput`] if any extracted value is
/// non-finite.
pub fn extract_named_series(
    runs: &[RunRecord],
    metric_key: &str,
) -> Result<SampleSeries, AnalysisError> {
    let values: Vec<f64> = runs.iter().filter_map(|run| run.metric(metric_key)).collect();
    SampleSeries::new(values)
        .map_err(|_| AnalysisError::InvalidInput(format!("metric {metric_key:?} contains a non-finite value")))
}
