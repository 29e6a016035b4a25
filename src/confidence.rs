//! Confidence estimation for a risk score.
//!
//! ```text
//! data quality = (1 - w + w * completeness) * freshness
//! raw          = match confidence * data quality * extremity + evidence
//! confidence   = clamp(raw, floor, ceiling), capped when the fallback cohort was used
//! ```

use crate::config::ConfidenceConfig;
use serde::{Deserialize, Serialize};

/// Everything the estimator looks at, gathered by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    pub match_confidence: f64,
    pub fallback_used: bool,
    /// Fraction of known context signals, in [0, 1]
    pub completeness: f64,
    pub telemetry_age_hours: Option<f64>,
    pub active_stressors: usize,
    pub prior: f64,
    pub combined_likelihood_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceEstimate {
    pub value: f64,
    pub data_quality: f64,
    pub freshness: f64,
    pub extremity: f64,
    pub evidence_adjustment: f64,
}

/// Freshness multiplier for telemetry of the given age.
pub fn freshness_factor(age_hours: Option<f64>, config: &ConfidenceConfig) -> f64 {
    match age_hours {
        None => config.unknown_age_factor,
        Some(h) if h > config.stale_hours => config.stale_factor,
        Some(h) if h > config.aging_hours => config.aging_factor,
        Some(_) => 1.0,
    }
}

pub fn data_quality(completeness: f64, age_hours: Option<f64>, config: &ConfidenceConfig) -> f64 {
    let w = config.completeness_weight;
    let completeness = completeness.clamp(0.0, 1.0);
    (1.0 - w + w * completeness) * freshness_factor(age_hours, config)
}

/// Multiplier applied once for an extreme prior and once for an extreme
/// combined likelihood ratio.
pub fn extremity_factor(prior: f64, combined_lr: f64, config: &ConfidenceConfig) -> f64 {
    let extreme_prior = prior < config.extreme_prior_low || prior > config.extreme_prior_high;
    let extreme_ratio =
        combined_lr < config.extreme_ratio_low || combined_lr > config.extreme_ratio_high;
    let hits = [extreme_prior, extreme_ratio].iter().filter(|x| **x).count();
    config.extremity_factor.powi(hits as i32)
}

pub fn evidence_adjustment(active_stressors: usize, config: &ConfidenceConfig) -> f64 {
    if active_stressors == 0 {
        -config.no_evidence_penalty
    } else if active_stressors >= config.corroboration_min_stressors {
        config.corroboration_bonus
    } else {
        0.0
    }
}

pub fn estimate(inputs: &ConfidenceInputs, config: &ConfidenceConfig) -> ConfidenceEstimate {
    let freshness = freshness_factor(inputs.telemetry_age_hours, config);
    let data_quality = data_quality(inputs.completeness, inputs.telemetry_age_hours, config);
    let extremity = extremity_factor(inputs.prior, inputs.combined_likelihood_ratio, config);
    let evidence = evidence_adjustment(inputs.active_stressors, config);

    let raw = inputs.match_confidence * data_quality * extremity + evidence;
    let mut value = if raw.is_nan() {
        config.floor
    } else {
        raw.clamp(config.floor, config.ceiling)
    };
    if inputs.fallback_used {
        value = value.min(config.fallback_cap);
    }

    ConfidenceEstimate {
        value,
        data_quality,
        freshness,
        extremity,
        evidence_adjustment: evidence,
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn confidence_within_floor_and_ceiling(
            match_confidence in 0.0..=1.0f64,
            fallback_used in any::<bool>(),
            completeness in 0.0..=1.0f64,
            age in prop::option::of(0.0..1000.0f64),
            active in 0usize..12,
            prior in 0.001..0.5f64,
            lr in 0.0..1e4f64,
        ) {
            let config = ConfidenceConfig::default();
            let est = estimate(
                &ConfidenceInputs {
                    match_confidence,
                    fallback_used,
                    completeness,
                    telemetry_age_hours: age,
                    active_stressors: active,
                    prior,
                    combined_likelihood_ratio: lr,
                },
                &config,
            );
            prop_assert!(est.value >= config.floor && est.value <= config.ceiling);
            if fallback_used {
                prop_assert!(est.value < 0.5);
            }
        }
    }
}
