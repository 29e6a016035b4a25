//! Engine configuration.
//!
//! Every knob has a default, so an empty `.stressmap.toml` (or none at all)
//! yields the standard five-tier ladder and the documented matching,
//! validation and confidence constants.
//!
//! ```toml
//! [severity]
//! moderate = 0.03
//! high = 0.07
//! critical = 0.12
//! severe = 0.20
//!
//! [confidence]
//! floor = 0.3
//! ceiling = 1.0
//! ```

mod loader;
mod parallel;
mod thresholds;

pub use loader::{
    directory_ancestors, load_config, load_config_from, parse_and_validate_config,
    CONFIG_FILE_NAME,
};
pub use parallel::ParallelConfig;
pub use thresholds::{BayesConfig, ConfidenceConfig, MatchingConfig, ValidationConfig};

use crate::severity::SeverityLadder;
use serde::{Deserialize, Serialize};

/// Root configuration structure for stressmap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StressmapConfig {
    /// Default severity ladder (cohorts may override)
    #[serde(default)]
    pub severity: SeverityLadder,

    #[serde(default)]
    pub confidence: ConfidenceConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    /// Stressor validation thresholds
    #[serde(default)]
    pub validation: ValidationConfig,

    #[serde(default)]
    pub bayes: BayesConfig,

    #[serde(default)]
    pub parallel: ParallelConfig,
}

fn unit_interval(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

impl StressmapConfig {
    /// Check cross-field invariants, collecting every problem found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut issues = Vec::new();

        if let Err(e) = self.severity.validate() {
            issues.push(e);
        }

        let c = &self.confidence;
        if !unit_interval(c.floor) || !unit_interval(c.ceiling) || c.floor > c.ceiling {
            issues.push(format!(
                "confidence floor {} and ceiling {} must satisfy 0 <= floor <= ceiling <= 1",
                c.floor, c.ceiling
            ));
        }
        if !(c.fallback_cap < 0.5 && c.fallback_cap >= c.floor) {
            issues.push(format!(
                "confidence fallback_cap {} must be below 0.5 and at least the floor {}",
                c.fallback_cap, c.floor
            ));
        }
        if !(c.aging_hours > 0.0 && c.stale_hours > c.aging_hours) {
            issues.push(format!(
                "freshness bands must satisfy 0 < aging_hours ({}) < stale_hours ({})",
                c.aging_hours, c.stale_hours
            ));
        }
        for (name, value) in [
            ("completeness_weight", c.completeness_weight),
            ("aging_factor", c.aging_factor),
            ("stale_factor", c.stale_factor),
            ("unknown_age_factor", c.unknown_age_factor),
            ("extremity_factor", c.extremity_factor),
            ("corroboration_bonus", c.corroboration_bonus),
            ("no_evidence_penalty", c.no_evidence_penalty),
        ] {
            if !unit_interval(value) {
                issues.push(format!("confidence {} {} must lie in [0, 1]", name, value));
            }
        }
        if !(c.extreme_prior_low < c.extreme_prior_high && c.extreme_ratio_low < c.extreme_ratio_high)
        {
            issues.push("confidence extremity bands must have low < high".to_string());
        }

        let m = &self.matching;
        if !(m.fallback_confidence.is_finite()
            && m.fallback_confidence >= 0.0
            && m.fallback_confidence < 0.5)
        {
            issues.push(format!(
                "matching fallback_confidence {} must lie in [0, 0.5)",
                m.fallback_confidence
            ));
        }
        if !unit_interval(m.ambiguity_penalty) {
            issues.push(format!(
                "matching ambiguity_penalty {} must lie in [0, 1]",
                m.ambiguity_penalty
            ));
        }

        let v = &self.validation;
        if !(v.acceptance_threshold > 0.0 && v.acceptance_threshold <= 1.0) {
            issues.push(format!(
                "validation acceptance_threshold {} must lie in (0, 1]",
                v.acceptance_threshold
            ));
        }
        if !unit_interval(v.detected_confidence) {
            issues.push(format!(
                "validation detected_confidence {} must lie in [0, 1]",
                v.detected_confidence
            ));
        }

        let b = &self.bayes;
        if !(b.epsilon > 0.0 && b.epsilon < 0.5) {
            issues.push(format!("bayes epsilon {} must lie in (0, 0.5)", b.epsilon));
        }
        if !(b.floor > 0.0 && b.floor < b.ceiling && b.ceiling < 1.0) {
            issues.push(format!(
                "bayes floor {} and ceiling {} must satisfy 0 < floor < ceiling < 1",
                b.floor, b.ceiling
            ));
        }

        if self.parallel.max_concurrency == Some(0) {
            issues.push("parallel max_concurrency must be at least 1".to_string());
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Render the configuration as TOML, as written by `stressmap init`.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
