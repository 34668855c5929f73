//! Descriptive statistics for baseline computation.

/// Arithmetic mean. NaN for empty input.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance Σ(x−mean)²/n. NaN for empty input.
///
/// The population (not sample) formula is load-bearing: trained variance
/// baselines were produced with it and must stay comparable.
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

/// Round to two decimal places: `round(v * 100) / 100`.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
