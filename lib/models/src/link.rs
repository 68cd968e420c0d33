//! Link and normalization functions
//!
//! Pure numeric helpers shared by the evaluators.

use std::collections::BTreeMap;

/// Logistic function `1 / (1 + e^-x)`, evaluated without overflow for
/// large negative inputs.
#[inline]
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln(Σ e^x)` computed around the maximum.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    max + values.iter().map(|v| (v - max).exp()).sum::<f64>().ln()
}

/// Turn per-class log-likelihoods into probabilities that sum to one.
pub fn softmax_log(log_likelihoods: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let values: Vec<f64> = log_likelihoods.values().copied().collect();
    let norm = log_sum_exp(&values);
    log_likelihoods
        .iter()
        .map(|(class, ll)| {
            let p = if norm == f64::NEG_INFINITY { 0.0 } else { (ll - norm).exp() };
            (class.clone(), p)
        })
        .collect()
}

/// Log density of a normal distribution.
#[inline]
pub fn gaussian_log_pdf(x: f64, mean: f64, variance: f64) -> f64 {
    let diff = x - mean;
    -0.5 * ((2.0 * std::f64::consts::PI * variance).ln() + diff * diff / variance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!((sigmoid(2.0) - 0.8807970779778823).abs() < 1e-12);
        assert!((sigmoid(-2.0) - 0.11920292202211755).abs() < 1e-12);
        assert!(sigmoid(-1000.0) >= 0.0);
        assert_eq!(sigmoid(1000.0), 1.0);
    }

    #[test]
    fn test_sigmoid_symmetry() {
        use rand::Rng;
        let mut rng = rand::rng();
        for _ in 0..1000 {
            let x: f64 = rng.random_range(-50.0..50.0);
            assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_log() {
        let mut lls = BTreeMap::new();
        lls.insert("a".to_string(), 2.0f64.ln());
        lls.insert("b".to_string(), 6.0f64.ln());
        let probs = softmax_log(&lls);
        assert!((probs["a"] - 0.25).abs() < 1e-12);
        assert!((probs["b"] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_gaussian_log_pdf() {
        let expected = (1.0 / (2.0 * std::f64::consts::PI).sqrt()).ln();
        assert!((gaussian_log_pdf(0.0, 0.0, 1.0) - expected).abs() < 1e-12);
    }
}
