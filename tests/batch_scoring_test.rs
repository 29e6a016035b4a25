//! Batch scoring: grouping, ordering, failure isolation and parallelism.

mod common;

use common::{builtin_scorer, cold_ram, hot_coastal_f150, scorer_with, unknown_vehicle};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use stressmap::catalog::{BuiltinSource, CatalogHandle, Region};
use stressmap::context::ContextProvider;
use stressmap::{
    Error, ErrorKind, InMemoryContextProvider, Result, RiskScorer, SeverityTier, StressmapConfig,
    VehicleContext,
};

fn mixed_batch() -> Vec<VehicleContext> {
    vec![
        hot_coastal_f150("F150-1"),
        VehicleContext::new(""),
        unknown_vehicle("LADA-1"),
        cold_ram("RAM-1"),
        hot_coastal_f150("F150-2"),
    ]
}

#[test]
fn results_keep_input_order_and_failures_are_isolated() {
    let report = builtin_scorer().score_batch(&mixed_batch()).unwrap();

    let ids: Vec<&str> = report.results.iter().map(|r| r.vehicle_id.as_str()).collect();
    assert_eq!(ids, vec!["F150-1", "LADA-1", "RAM-1", "F150-2"]);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].vehicle_id, "");
    assert_eq!(report.failures[0].kind, ErrorKind::InvalidVehicleContext);
}

#[test]
fn cohort_counts_group_by_matched_cohort() {
    let report = builtin_scorer().score_batch(&mixed_batch()).unwrap();
    assert_eq!(report.cohort_counts.get("ford_f150_hot_coastal"), Some(&2));
    assert_eq!(report.cohort_counts.get("generic_default"), Some(&1));
    assert_eq!(report.cohort_counts.get("ram_1500_start_stop_cold"), Some(&1));
    assert_eq!(report.cohort_counts.values().sum::<usize>(), 4);
}

#[test]
fn batch_matches_individual_scoring() {
    let scorer = builtin_scorer();
    let report = scorer.score_batch(&mixed_batch()).unwrap();
    for result in &report.results {
        let ctx = mixed_batch()
            .into_iter()
            .find(|c| c.vehicle_id == result.vehicle_id)
            .unwrap();
        assert_eq!(&scorer.score_vehicle(&ctx).unwrap(), result);
    }
}

#[test]
fn parallel_and_sequential_agree() {
    let contexts: Vec<VehicleContext> = (0..120)
        .map(|i| {
            let mut ctx = match i % 3 {
                0 => hot_coastal_f150(&format!("F150-{}", i)),
                1 => cold_ram(&format!("RAM-{}", i)),
                _ => unknown_vehicle(&format!("LADA-{}", i)),
            };
            ctx.climate.max_temp_f = ctx.climate.max_temp_f.map(|t| t + (i % 7) as f64);
            ctx
        })
        .collect();

    let parallel = builtin_scorer().score_batch(&contexts).unwrap();
    let mut config = StressmapConfig::default();
    config.parallel.enabled = false;
    let sequential = scorer_with(config).score_batch(&contexts).unwrap();

    assert_eq!(parallel, sequential);
    assert_eq!(parallel.results.len(), 120);
}

#[test]
fn summary_counts_tiers_and_fallbacks() {
    let summary = builtin_scorer().score_batch(&mixed_batch()).unwrap().summary();
    assert_eq!(summary.scored, 4);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.fallbacks, 1);
    assert_eq!(summary.by_severity[&SeverityTier::Severe], 2);
    assert_eq!(summary.by_severity[&SeverityTier::High], 1);
}

#[test]
fn missing_catalog_fails_the_whole_batch() {
    let scorer = RiskScorer::with_default_config(Arc::new(CatalogHandle::new(BuiltinSource)));
    let err = scorer.score_batch(&mixed_batch()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CatalogUnavailable);
}

/// Provider whose lookups fail for one vehicle.
struct PartialProvider {
    inner: InMemoryContextProvider,
}

impl ContextProvider for PartialProvider {
    fn vehicle_context(&self, vehicle_id: &str) -> Result<VehicleContext> {
        if vehicle_id == "GHOST" {
            return Err(Error::invalid_context(vehicle_id, "telemetry feed unavailable"));
        }
        self.inner.vehicle_context(vehicle_id)
    }

    fn vehicle_ids(&self) -> Vec<String> {
        let mut ids = self.inner.vehicle_ids();
        ids.push("GHOST".to_string());
        ids
    }
}

#[test]
fn provider_lookup_failures_are_recorded() {
    let mut ctx = hot_coastal_f150("F150-P");
    ctx.region = Some(Region::HotArid);
    let provider = PartialProvider {
        inner: InMemoryContextProvider::from_contexts([ctx, cold_ram("RAM-P")]),
    };

    let report = builtin_scorer().score_provider(&provider).unwrap();
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].vehicle_id, "GHOST");
}

#[test]
fn load_failures_are_recorded_in_input_order() {
    let entries = vec![
        Ok(hot_coastal_f150("F150-L")),
        Err(Error::invalid_context("#1", "vehicle identifier is missing")),
        Ok(VehicleContext::new("")),
        Ok(cold_ram("RAM-L")),
    ];

    let report = builtin_scorer().score_loaded(&entries).unwrap();
    let ids: Vec<&str> = report.results.iter().map(|r| r.vehicle_id.as_str()).collect();
    assert_eq!(ids, vec!["F150-L", "RAM-L"]);

    let failed: Vec<&str> = report.failures.iter().map(|f| f.vehicle_id.as_str()).collect();
    assert_eq!(failed, vec!["#1", ""]);
    assert!(report
        .failures
        .iter()
        .all(|f| f.kind == ErrorKind::InvalidVehicleContext));
}
