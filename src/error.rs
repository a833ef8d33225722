use thiserror::Error;

/// Errors produced by the analysis engine.
///
/// Every variant is fatal only to the specific computation that raised it:
/// aggregation over many groups captures these per group and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The sample was empty or contained a NaN/infinite value.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A hypothesis test needs at least 2 observations per sample.
    #[error("insufficient samples: {0}")]
    InsufficientSamples(String),

    /// Multi-group analysis needs at least 2 groups.
    #[error("insufficient groups: {0}")]
    InsufficientGroups(String),
}
