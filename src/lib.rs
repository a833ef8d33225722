//! Statistical comparison and aggregation of service mesh benchmark runs.
//!
//! This library turns raw per-run benchmark records (one baseline
//! configuration plus any number of mesh configurations) into comparative
//! statistics: descriptive summaries with confidence intervals, two-sample
//! hypothesis tests with effect sizes, one-way ANOVA across meshes, and
//! outlier flags.
//!
//! All computation is synchronous, pure, and deterministic: the same
//! records and configuration always produce identical output. Rendering,
//! persistence, and run collection are owned by external layers; this crate
//! is the analysis boundary only.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod record;
pub mod report;
pub mod stats;

// Re-export main types for convenience
pub use aggregate::{AggregatedGroup, Aggregator};
pub use config::{AggregationConfig, AnalysisConfig, HypothesisConfig, OutlierConfig};
pub use error::AnalysisError;
pub use record::{extract_metric_series, extract_named_series, GroupKey, Metric, RunRecord};
pub use report::{generate_metric_report, MetricReport, PairwiseOutcome};
pub use stats::{
    statistical_power, AnovaResult, DescriptiveStatistics, EffectSizeLabel, MultiGroupComparator,
    OutlierDetector, OutlierMethod, OutlierReport, SampleSeries, StatisticalComparison, TestKind,
    TwoSampleComparator,
};
