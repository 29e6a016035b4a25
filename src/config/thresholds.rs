use serde::{Deserialize, Serialize};

/// Cohort matching thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Confidence reported when the default cohort is used (must stay below 0.5)
    #[serde(default = "default_fallback_confidence")]
    pub fallback_confidence: f64,

    /// Ties above this many top-scoring candidates count as ambiguous
    #[serde(default = "default_ambiguity_threshold")]
    pub ambiguity_threshold: usize,

    /// Multiplier applied to match confidence for ambiguous matches
    #[serde(default = "default_ambiguity_penalty")]
    pub ambiguity_penalty: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            fallback_confidence: default_fallback_confidence(),
            ambiguity_threshold: default_ambiguity_threshold(),
            ambiguity_penalty: default_ambiguity_penalty(),
        }
    }
}

fn default_fallback_confidence() -> f64 {
    0.3
}
fn default_ambiguity_threshold() -> usize {
    3
}
fn default_ambiguity_penalty() -> f64 {
    0.8
}

/// Stressor validation thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Fraction of required conditions that must hold to accept a stressor
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: f64,

    /// Confidence assigned to stressors detected from context alone
    #[serde(default = "default_detected_confidence")]
    pub detected_confidence: f64,

    /// Whether stressors implied by context are added to the evaluation
    #[serde(default = "default_include_detected")]
    pub include_detected: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: default_acceptance_threshold(),
            detected_confidence: default_detected_confidence(),
            include_detected: default_include_detected(),
        }
    }
}

fn default_acceptance_threshold() -> f64 {
    0.7
}
fn default_detected_confidence() -> f64 {
    0.6
}
fn default_include_detected() -> bool {
    true
}

/// Bayesian update guards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesConfig {
    /// Distance kept between the prior and 0/1 before converting to odds
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Lowest posterior ever reported
    #[serde(default = "default_posterior_floor")]
    pub floor: f64,

    /// Highest posterior ever reported
    #[serde(default = "default_posterior_ceiling")]
    pub ceiling: f64,
}

impl Default for BayesConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            floor: default_posterior_floor(),
            ceiling: default_posterior_ceiling(),
        }
    }
}

fn default_epsilon() -> f64 {
    1e-9
}
fn default_posterior_floor() -> f64 {
    0.001
}
fn default_posterior_ceiling() -> f64 {
    0.999
}

/// Confidence estimation weights and bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceConfig {
    #[serde(default = "default_confidence_floor")]
    pub floor: f64,

    #[serde(default = "default_confidence_ceiling")]
    pub ceiling: f64,

    /// Upper bound on confidence whenever the default cohort was used
    #[serde(default = "default_fallback_cap")]
    pub fallback_cap: f64,

    /// Share of the data-quality multiplier driven by signal completeness
    #[serde(default = "default_completeness_weight")]
    pub completeness_weight: f64,

    /// Telemetry older than this many hours is aging
    #[serde(default = "default_aging_hours")]
    pub aging_hours: f64,

    /// Telemetry older than this many hours is stale
    #[serde(default = "default_stale_hours")]
    pub stale_hours: f64,

    #[serde(default = "default_aging_factor")]
    pub aging_factor: f64,

    #[serde(default = "default_stale_factor")]
    pub stale_factor: f64,

    /// Freshness factor when telemetry age is unknown
    #[serde(default = "default_unknown_age_factor")]
    pub unknown_age_factor: f64,

    /// Active stressors needed for the corroboration bonus
    #[serde(default = "default_corroboration_min")]
    pub corroboration_min_stressors: usize,

    #[serde(default = "default_corroboration_bonus")]
    pub corroboration_bonus: f64,

    /// Subtracted when no stressor is active
    #[serde(default = "default_no_evidence_penalty")]
    pub no_evidence_penalty: f64,

    /// Multiplier applied once per extreme input (prior or combined ratio)
    #[serde(default = "default_extremity_factor")]
    pub extremity_factor: f64,

    #[serde(default = "default_extreme_prior_low")]
    pub extreme_prior_low: f64,

    #[serde(default = "default_extreme_prior_high")]
    pub extreme_prior_high: f64,

    #[serde(default = "default_extreme_ratio_low")]
    pub extreme_ratio_low: f64,

    #[serde(default = "default_extreme_ratio_high")]
    pub extreme_ratio_high: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            floor: default_confidence_floor(),
            ceiling: default_confidence_ceiling(),
            fallback_cap: default_fallback_cap(),
            completeness_weight: default_completeness_weight(),
            aging_hours: default_aging_hours(),
            stale_hours: default_stale_hours(),
            aging_factor: default_aging_factor(),
            stale_factor: default_stale_factor(),
            unknown_age_factor: default_unknown_age_factor(),
            corroboration_min_stressors: default_corroboration_min(),
            corroboration_bonus: default_corroboration_bonus(),
            no_evidence_penalty: default_no_evidence_penalty(),
            extremity_factor: default_extremity_factor(),
            extreme_prior_low: default_extreme_prior_low(),
            extreme_prior_high: default_extreme_prior_high(),
            extreme_ratio_low: default_extreme_ratio_low(),
            extreme_ratio_high: default_extreme_ratio_high(),
        }
    }
}

fn default_confidence_floor() -> f64 {
    0.3
}
fn default_confidence_ceiling() -> f64 {
    1.0
}
fn default_fallback_cap() -> f64 {
    0.45
}
fn default_completeness_weight() -> f64 {
    0.3
}
fn default_aging_hours() -> f64 {
    48.0
}
fn default_stale_hours() -> f64 {
    168.0
}
fn default_aging_factor() -> f64 {
    0.85
}
fn default_stale_factor() -> f64 {
    0.7
}
fn default_unknown_age_factor() -> f64 {
    0.9
}
fn default_corroboration_min() -> usize {
    3
}
fn default_corroboration_bonus() -> f64 {
    0.1
}
fn default_no_evidence_penalty() -> f64 {
    0.1
}
fn default_extremity_factor() -> f64 {
    0.9
}
fn default_extreme_prior_low() -> f64 {
    0.005
}
fn default_extreme_prior_high() -> f64 {
    0.3
}
fn default_extreme_ratio_low() -> f64 {
    0.25
}
fn default_extreme_ratio_high() -> f64 {
    50.0
}
