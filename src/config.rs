//! Configuration loading for the analysis engine.
//!
//! Supports loading configuration from TOML files, with sensible defaults
//! for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::stats::{OutlierDetector, DEFAULT_ALPHA};

/// Top-level configuration for the analysis engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Settings for statistical hypothesis testing.
    pub hypothesis: HypothesisConfig,
    /// Settings for grouping and baseline matching.
    pub aggregation: AggregationConfig,
    /// Settings for outlier detection.
    pub outliers: OutlierConfig,
}

/// Configuration for statistical hypothesis testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HypothesisConfig {
    /// Significance level for all tests (e.g. 0.05).
    pub alpha: f64,
    /// Assume equal population variances in two-sample tests; when false,
    /// Welch's correction is applied.
    pub equal_variance: bool,
}

/// Configuration for grouping and baseline matching.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Configuration name treated as the comparison baseline.
    pub baseline_mesh: String,
}

/// Configuration for outlier detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Multiplier `k` for the IQR bounds `[Q1 - k·IQR, Q3 + k·IQR]`.
    pub iqr_multiplier: f64,
    /// Threshold on `|z|` for the z-score rule.
    pub zscore_threshold: f64,
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            equal_variance: true,
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            baseline_mesh: "baseline".to_string(),
        }
    }
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            iqr_multiplier: 1.5,
            zscore_threshold: 3.0,
        }
    }
}

/// Default configuration file name.
const DEFAULT_CONFIG_FILE: &str = ".meshbench-analysis.toml";

impl AnalysisConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML configuration file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<AnalysisConfig> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AnalysisConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from the default file (`.meshbench-analysis.toml`)
    /// or use defaults.
    ///
    /// This function searches for the configuration file in the current
    /// directory. If the file doesn't exist, default configuration is
    /// returned. If the file exists but cannot be parsed, an error is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be
    /// parsed.
    pub fn load_or_default() -> Result<AnalysisConfig> {
        let path = Path::new(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load(path)
        } else {
            Ok(AnalysisConfig::default())
        }
    }

    /// Load configuration from the specified path, or try default locations.
    ///
    /// If a path is provided, loads from that path. Otherwise, tries to
    /// load from `.meshbench-analysis.toml` or uses defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the specified file cannot be read or parsed.
    pub fn load_from(path: Option<&Path>) -> Result<AnalysisConfig> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load_or_default(),
        }
    }

    /// The outlier detector described by this configuration.
    pub fn outlier_detector(&self) -> OutlierDetector {
        OutlierDetector::new(self.outliers.iqr_multiplier, self.outliers.zscore_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();

        assert_eq!(config.hypothesis.alpha, 0.05);
        assert!(config.hypothesis.equal_variance);
        assert_eq!(config.aggregation.baseline_mesh, "baseline");
        assert_eq!(config.outliers.iqr_multiplier, 1.5);
        assert_eq!(config.outliers.zscore_threshold, 3.0);
    }

    #[test]
    fn test_load_partial_config() {
        let toml_content = r#"
[hypothesis]
alpha = 0.01

[aggregation]
baseline_mesh = "vanilla"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = AnalysisConfig::load(file.path()).unwrap();

        // Overridden values
        assert_eq!(config.hypothesis.alpha, 0.01);
        assert_eq!(config.aggregation.baseline_mesh, "vanilla");

        // Default values
        assert!(config.hypothesis.equal_variance);
        assert_eq!(config.outliers.iqr_multiplier, 1.5);
    }

    #[test]
    fn test_load_full_config() {
        let toml_content = r#"
[hypothesis]
alpha = 0.01
equal_variance = false

[aggregation]
baseline_mesh = "no-mesh"

[outliers]
iqr_multiplier = 3.0
zscore_threshold = 2.5
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = AnalysisConfig::load(file.path()).unwrap();

        assert_eq!(config.hypothesis.alpha, 0.01);
        assert!(!config.hypothesis.equal_variance);
        assert_eq!(config.aggregation.baseline_mesh, "no-mesh");
        assert_eq!(config.outliers.iqr_multiplier, 3.0);
        assert_eq!(config.outliers.zscore_threshold, 2.5);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = AnalysisConfig::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"this is not valid toml {{{{").unwrap();

        let result = AnalysisConfig::load(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_outlier_detector_from_config() {
        let mut config = AnalysisConfig::default();
        config.outliers.iqr_multiplier = 3.0;

        let detector = config.outlier_detector();
        assert_eq!(detector.iqr_multiplier, 3.0);
        assert_eq!(detector.zscore_threshold, 3.0);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AnalysisConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: AnalysisConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.hypothesis.alpha, parsed.hypothesis.alpha);
        assert_eq!(
            config.hypothesis.equal_variance,
            parsed.hypothesis.equal_variance
        );
        assert_eq!(
            config.aggregation.baseline_mesh,
            parsed.aggregation.baseline_mesh
        );
        assert_eq!(config.outliers.iqr_multiplier, parsed.outliers.iqr_multiplier);
    }
}
