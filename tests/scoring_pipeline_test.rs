//! End-to-end scoring of single vehicles against the built-in catalog.

mod common;

use common::{builtin_scorer, cold_ram, hot_coastal_f150, unknown_vehicle};
use pretty_assertions::assert_eq;
use stressmap::catalog::StressorKind;
use stressmap::{ErrorKind, MatchCriterion, SeverityTier, StressorOrigin, VehicleContext};

#[test]
fn worked_example_scores_severe() {
    let result = builtin_scorer()
        .score_vehicle(&hot_coastal_f150("F150-HOT-1"))
        .unwrap();

    assert_eq!(result.cohort_id, "ford_f150_hot_coastal");
    assert!(!result.fallback_used);
    assert!((result.metadata.prior - 0.04).abs() < 1e-12);
    assert!((result.combined_likelihood_ratio - 14.26).abs() < 1e-9);
    assert!((result.posterior_probability - 0.3727).abs() < 1e-4);
    assert_eq!(result.severity, SeverityTier::Severe);
    assert_eq!(
        result.active_stressors,
        vec![StressorKind::ExtremeHeat, StressorKind::HotClimateRegion]
    );
    assert!(result
        .metadata
        .match_criteria
        .contains(&MatchCriterion::Model));
}

#[test]
fn cold_crank_in_hot_coastal_july_is_rejected() {
    let mut ctx = hot_coastal_f150("F150-HOT-2");
    ctx.climate.max_temp_f = Some(100.0);
    ctx.requested_stressors = vec![StressorKind::ColdCrank];

    let result = builtin_scorer().score_vehicle(&ctx).unwrap();

    let cold_crank = result
        .evaluations
        .iter()
        .find(|e| e.stressor == StressorKind::ColdCrank)
        .unwrap();
    assert!(!cold_crank.active);
    assert_eq!(cold_crank.contribution, 1.0);
    assert!(cold_crank.rejection.is_some());
    assert!(!result.active_stressors.contains(&StressorKind::ColdCrank));
    assert!(!result.dominant_stressors.contains(&StressorKind::ColdCrank));
}

#[test]
fn unmatched_vehicle_fails_open() {
    let result = builtin_scorer()
        .score_vehicle(&unknown_vehicle("LADA-1"))
        .unwrap();

    assert!(result.fallback_used);
    assert_eq!(result.cohort_id, "generic_default");
    assert!(result.confidence < 0.5);
    assert!(result.metadata.match_criteria.is_empty());
}

#[test]
fn cohort_ladder_overrides_configured_ladder() {
    let scorer = builtin_scorer();
    let result = scorer.score_vehicle(&cold_ram("RAM-1")).unwrap();

    assert_eq!(result.cohort_id, "ram_1500_start_stop_cold");
    assert!((result.posterior_probability - 0.12844).abs() < 1e-4);
    // Default ladder would say critical; the cohort's own ladder says high
    assert_eq!(
        scorer.config().severity.classify(result.posterior_probability),
        SeverityTier::Critical
    );
    assert_eq!(result.severity, SeverityTier::High);
}

#[test]
fn scoring_is_deterministic() {
    let scorer = builtin_scorer();
    let ctx = hot_coastal_f150("F150-HOT-3");
    let first = scorer.score_vehicle(&ctx).unwrap();
    for _ in 0..5 {
        assert_eq!(scorer.score_vehicle(&ctx).unwrap(), first);
    }
}

#[test]
fn detected_stressors_are_reported_and_applied() {
    let mut ctx = hot_coastal_f150("F150-HOT-4");
    ctx.requested_stressors.clear();
    ctx.climate.max_temp_f = Some(113.0);

    let result = builtin_scorer().score_vehicle(&ctx).unwrap();
    let detected: Vec<StressorKind> = result
        .evaluations
        .iter()
        .filter(|e| e.origin == StressorOrigin::Detected)
        .map(|e| e.stressor)
        .collect();
    assert_eq!(
        detected,
        vec![StressorKind::ExtremeHeat, StressorKind::HotClimateRegion]
    );
    assert!((result.combined_likelihood_ratio - 14.26).abs() < 1e-9);
}

#[test]
fn citations_start_with_prior_source_without_duplicates() {
    let result = builtin_scorer()
        .score_vehicle(&hot_coastal_f150("F150-HOT-5"))
        .unwrap();
    let citations = &result.metadata.citations;
    assert_eq!(citations[0], result.metadata.prior_source);
    let mut unique = citations.clone();
    unique.dedup();
    assert_eq!(&unique, citations);
}

#[test]
fn invalid_context_is_reported_with_its_kind() {
    let mut ctx = VehicleContext::new("FLEET-9");
    ctx.month = Some(14);
    let err = builtin_scorer().score_vehicle(&ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidVehicleContext);
}

#[test]
fn confidence_respects_configured_bounds() {
    let scorer = builtin_scorer();
    let floor = scorer.config().confidence.floor;
    let ceiling = scorer.config().confidence.ceiling;
    for ctx in [
        hot_coastal_f150("A"),
        cold_ram("B"),
        unknown_vehicle("C"),
        VehicleContext::new("D"),
    ] {
        let result = scorer.score_vehicle(&ctx).unwrap();
        assert!(result.confidence >= floor && result.confidence <= ceiling);
        assert!(result.posterior_probability > 0.0 && result.posterior_probability < 1.0);
    }
}
