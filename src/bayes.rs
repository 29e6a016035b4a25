//! Bayesian update of a cohort prior with stressor evidence.
//!
//! Stressors are treated as conditionally independent given failure, so the
//! combined likelihood ratio is the product of the active ratios:
//!
//! ```text
//! prior odds     = p / (1 - p)
//! posterior odds = prior odds * Π LRᵢ
//! posterior      = odds / (1 + odds)
//! ```
//!
//! ```
//! use stressmap::bayes::{posterior_probability, combined_likelihood_ratio};
//! use stressmap::config::BayesConfig;
//!
//! let lr = combined_likelihood_ratio([6.2, 2.3]);
//! let posterior = posterior_probability(0.04, lr, &BayesConfig::default());
//! assert!((posterior - 0.3727).abs() < 1e-4);
//! ```

use crate::config::BayesConfig;
use crate::stressors::StressorEvaluation;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesianUpdate {
    pub prior: f64,
    pub combined_likelihood_ratio: f64,
    pub posterior: f64,
}

/// Product of the ratios; 1.0 for no evidence.
pub fn combined_likelihood_ratio(ratios: impl IntoIterator<Item = f64>) -> f64 {
    ratios.into_iter().product()
}

pub fn odds(probability: f64, epsilon: f64) -> f64 {
    let p = probability.clamp(epsilon, 1.0 - epsilon);
    p / (1.0 - p)
}

pub fn probability_from_odds(odds: f64) -> f64 {
    if odds.is_infinite() {
        return 1.0;
    }
    odds / (1.0 + odds)
}

/// Posterior for `prior` after applying `likelihood_ratio`, clamped to the
/// configured floor and ceiling.
pub fn posterior_probability(prior: f64, likelihood_ratio: f64, config: &BayesConfig) -> f64 {
    let posterior_odds = odds(prior, config.epsilon) * likelihood_ratio.max(0.0);
    let posterior = probability_from_odds(posterior_odds);
    if posterior.is_nan() {
        return config.floor;
    }
    posterior.clamp(config.floor, config.ceiling)
}

/// Apply every active evaluation's contribution to `prior`.
pub fn update(prior: f64, evaluations: &[StressorEvaluation], config: &BayesConfig) -> BayesianUpdate {
    let combined =
        combined_likelihood_ratio(evaluations.iter().filter(|e| e.active).map(|e| e.contribution));
    BayesianUpdate {
        prior,
        combined_likelihood_ratio: combined,
        posterior: posterior_probability(prior, combined, config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StressorKind;
    use crate::stressors::StressorOrigin;

    #[test]
    fn worked_example() {
        let config = BayesConfig::default();
        let lr = combined_likelihood_ratio([6.2, 2.3]);
        assert!((lr - 14.26).abs() < 1e-9);
        let posterior = posterior_probability(0.04, lr, &config);
        assert!((posterior - 0.3727).abs() < 1e-4, "{}", posterior);
    }

    #[test]
    fn no_evidence_returns_prior() {
        let config = BayesConfig::default();
        assert!((posterior_probability(0.04, 1.0, &config) - 0.04).abs() < 1e-12);
    }

    #[test]
    fn posterior_is_clamped() {
        let config = BayesConfig::default();
        assert_eq!(posterior_probability(0.49, 1e9, &config), 0.999);
        assert_eq!(posterior_probability(0.002, 1e-6, &config), 0.001);
        assert_eq!(posterior_probability(1.0, 1.0, &config), 0.999);
    }

    #[test]
    fn only_active_evaluations_contribute() {
        let config = BayesConfig::default();
        let evaluations = vec![
            StressorEvaluation::accepted(
                StressorKind::ExtremeHeat,
                StressorOrigin::Requested,
                6.2,
                1.0,
            ),
            StressorEvaluation::rejected(
                StressorKind::ColdCrank,
                StressorOrigin::Requested,
                0.0,
                "hot".into(),
            ),
            StressorEvaluation::accepted(
                StressorKind::HotClimateRegion,
                StressorOrigin::Detected,
                2.3,
                0.6,
            ),
        ];
        let result = update(0.04, &evaluations, &config);
        assert!((result.combined_likelihood_ratio - 14.26).abs() < 1e-9);
        assert!(result.posterior > 0.37 && result.posterior < 0.38);
    }
}
