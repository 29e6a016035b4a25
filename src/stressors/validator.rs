use super::rules::{rule_for, StressorRule};
use super::{StressorEvaluation, StressorOrigin, ValidationReport};
use crate::catalog::{CohortDefinition, StressorKind};
use crate::config::ValidationConfig;
use crate::context::{VehicleAttributes, VehicleContext};
use std::collections::BTreeSet;

/// Filters requested stressors against context and adds those the context
/// implies on its own.
#[derive(Debug, Clone, Copy)]
pub struct StressorValidator<'a> {
    config: &'a ValidationConfig,
}

impl<'a> StressorValidator<'a> {
    pub fn new(config: &'a ValidationConfig) -> Self {
        Self { config }
    }

    /// Evaluate `candidates` (duplicates ignored) for one vehicle and cohort.
    ///
    /// Requested evaluations come back in stressor order, followed by the
    /// detected addendum, also in stressor order.
    pub fn validate(
        &self,
        candidates: &[StressorKind],
        context: &VehicleContext,
        cohort: &CohortDefinition,
    ) -> ValidationReport {
        let attrs = context.attributes();
        let requested: BTreeSet<StressorKind> = candidates.iter().copied().collect();

        let evaluations = requested
            .iter()
            .map(|kind| self.evaluate_requested(*kind, context, &attrs, cohort))
            .collect();

        let detected = if self.config.include_detected {
            StressorKind::ALL
                .iter()
                .filter(|kind| !requested.contains(kind))
                .filter_map(|kind| self.detect(*kind, context, &attrs, cohort))
                .collect()
        } else {
            Vec::new()
        };

        ValidationReport {
            evaluations,
            detected,
        }
    }

    fn evaluate_requested(
        &self,
        stressor: StressorKind,
        ctx: &VehicleContext,
        attrs: &VehicleAttributes,
        cohort: &CohortDefinition,
    ) -> StressorEvaluation {
        let Some(ratio) = cohort.likelihood_ratio(stressor) else {
            return StressorEvaluation::rejected(
                stressor,
                StressorOrigin::Requested,
                0.0,
                format!("cohort {} has no likelihood ratio for {}", cohort.id, stressor),
            );
        };
        let Some(rule) = rule_for(stressor) else {
            return StressorEvaluation::accepted(stressor, StressorOrigin::Requested, ratio.value, 1.0);
        };

        if let Some(reason) = blocking_reason(rule, ctx, attrs) {
            return StressorEvaluation::rejected(
                stressor,
                StressorOrigin::Requested,
                0.0,
                reason.to_string(),
            );
        }

        let (satisfied, total) = required_satisfied(rule, ctx, attrs);
        let local_confidence = if total == 0 {
            1.0
        } else {
            satisfied as f64 / total as f64
        };

        if satisfied == total || local_confidence >= self.config.acceptance_threshold {
            StressorEvaluation::accepted(
                stressor,
                StressorOrigin::Requested,
                ratio.value,
                local_confidence,
            )
        } else {
            StressorEvaluation::rejected(
                stressor,
                StressorOrigin::Requested,
                local_confidence,
                format!(
                    "context supports {} of {} required conditions for {}",
                    satisfied, total, stressor
                ),
            )
        }
    }

    fn detect(
        &self,
        stressor: StressorKind,
        ctx: &VehicleContext,
        attrs: &VehicleAttributes,
        cohort: &CohortDefinition,
    ) -> Option<StressorEvaluation> {
        let rule = rule_for(stressor)?;
        let ratio = cohort.likelihood_ratio(stressor)?;
        let implied = rule.detection.as_ref()?.holds(ctx, attrs);
        if !implied || blocking_reason(rule, ctx, attrs).is_some() {
            return None;
        }
        Some(StressorEvaluation::accepted(
            stressor,
            StressorOrigin::Detected,
            ratio.value,
            self.config.detected_confidence,
        ))
    }
}

fn blocking_reason(
    rule: &StressorRule,
    ctx: &VehicleContext,
    attrs: &VehicleAttributes,
) -> Option<&'static str> {
    rule.blocking
        .iter()
        .find(|b| b.condition.holds(ctx, attrs))
        .map(|b| b.reason)
}

fn required_satisfied(
    rule: &StressorRule,
    ctx: &VehicleContext,
    attrs: &VehicleAttributes,
) -> (usize, usize) {
    let satisfied = rule
        .required
        .iter()
        .filter(|c| c.holds(ctx, attrs))
        .count();
    (satisfied, rule.required.len())
}
