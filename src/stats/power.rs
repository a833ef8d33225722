use statrs::distribution::{ContinuousCDF, Normal};

/// Statistical power of a two-sample test, by normal approximation.
///
/// `effect_size` is the expected Cohen's d and `sample_size` the number of
/// observations per group. Returns `1 − β`, the probability of detecting
/// the effect at significance level `alpha`.
pub fn statistical_power(effect_size: f64, sample_size: usize, alpha: f64) -> f64 {
    let normal = match Normal::new(0.0, 1.0) {
        Ok(dist) => dist,
        // Conservative fallback if the distribution cannot be constructed.
        Err(_) => return 0.0,
    };

    let critical_value = normal.inverse_cdf(1.0 - alpha / 2.0);

    // Non-centrality parameter for equal-sized groups.
    let ncp = effect_size * (sample_size as f64 / 2.0).sqrt();

    1.0 - normal.cdf(critical_value - ncp) + normal.cdf(-critical_value - ncp)
}
