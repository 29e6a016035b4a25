//! Context-aware stressor validation.
//!
//! A requested stressor only contributes its likelihood ratio when the
//! vehicle's context makes it plausible: cold cranking is not evidence for a
//! truck in a hot coastal July. Rejections are not errors; they are kept in
//! the report with a reason so the final score stays auditable.

pub mod rules;
pub mod validator;

pub use rules::{rule_for, Blocker, Condition, StressorRule};
pub use validator::StressorValidator;

use crate::catalog::StressorKind;
use serde::{Deserialize, Serialize};

/// Where a stressor under evaluation came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressorOrigin {
    /// Supplied by the caller
    Requested,
    /// Implied by context without being requested
    Detected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressorEvaluation {
    pub stressor: StressorKind,
    pub active: bool,
    /// The likelihood ratio when active, otherwise 1.0
    pub contribution: f64,
    /// Fraction of required conditions satisfied, or the detection confidence
    pub confidence: f64,
    pub origin: StressorOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<String>,
}

impl StressorEvaluation {
    pub fn accepted(
        stressor: StressorKind,
        origin: StressorOrigin,
        likelihood_ratio: f64,
        confidence: f64,
    ) -> Self {
        Self {
            stressor,
            active: true,
            contribution: likelihood_ratio,
            confidence,
            origin,
            rejection: None,
        }
    }

    pub fn rejected(
        stressor: StressorKind,
        origin: StressorOrigin,
        confidence: f64,
        reason: String,
    ) -> Self {
        Self {
            stressor,
            active: false,
            contribution: 1.0,
            confidence,
            origin,
            rejection: Some(reason),
        }
    }
}

/// Outcome of validating one vehicle's stressors against one cohort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Requested stressors, accepted and rejected
    pub evaluations: Vec<StressorEvaluation>,
    /// Stressors implied by context but not requested
    pub detected: Vec<StressorEvaluation>,
}

impl ValidationReport {
    /// Requested evaluations followed by detected ones.
    pub fn all(&self) -> impl Iterator<Item = &StressorEvaluation> {
        self.evaluations.iter().chain(self.detected.iter())
    }

    pub fn active(&self) -> impl Iterator<Item = &StressorEvaluation> {
        self.all().filter(|e| e.active)
    }

    pub fn rejected(&self) -> impl Iterator<Item = &StressorEvaluation> {
        self.all().filter(|e| !e.active)
    }

    /// Active stressors in stressor order.
    pub fn active_stressors(&self) -> Vec<StressorKind> {
        let mut kinds: Vec<StressorKind> = self.active().map(|e| e.stressor).collect();
        kinds.sort();
        kinds
    }

    pub fn get(&self, stressor: StressorKind) -> Option<&StressorEvaluation> {
        self.all().find(|e| e.stressor == stressor)
    }

    pub fn into_evaluations(self) -> Vec<StressorEvaluation> {
        let mut all = self.evaluations;
        all.extend(self.detected);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_evaluation_is_neutral() {
        let eval = StressorEvaluation::rejected(
            StressorKind::ColdCrank,
            StressorOrigin::Requested,
            0.0,
            "too hot".into(),
        );
        assert!(!eval.active);
        assert_eq!(eval.contribution, 1.0);
    }

    #[test]
    fn active_stressors_are_sorted_across_origins() {
        let report = ValidationReport {
            evaluations: vec![StressorEvaluation::accepted(
                StressorKind::ShortTrips,
                StressorOrigin::Requested,
                1.8,
                1.0,
            )],
            detected: vec![StressorEvaluation::accepted(
                StressorKind::ExtremeHeat,
                StressorOrigin::Detected,
                6.2,
                0.6,
            )],
        };
        assert_eq!(
            report.active_stressors(),
            vec![StressorKind::ExtremeHeat, StressorKind::ShortTrips]
        );
        assert_eq!(report.rejected().count(), 0);
    }
}
