//! Risk scoring engine.
//!
//! Pipeline per vehicle:
//!
//! 1. validate the context (`InvalidVehicleContext` aborts this vehicle only)
//! 2. match a cohort (falls back to the default cohort, never fails)
//! 3. validate requested stressors and detect implied ones
//! 4. Bayesian update of the cohort prior
//! 5. severity tier from the cohort's ladder, or the configured one
//! 6. confidence estimate
//!
//! Every call captures the published catalog snapshot once at the start and
//! finishes against it, even if a reload publishes a new one meanwhile.

use crate::bayes;
use crate::catalog::{CatalogHandle, CohortCatalogSnapshot, CohortDefinition, StressorKind};
use crate::confidence::{self, ConfidenceInputs};
use crate::config::StressmapConfig;
use crate::context::{ContextProvider, VehicleContext};
use crate::errors::{Error, ErrorKind, Result};
use crate::matching::{CohortMatchResult, CohortMatcher, MatchCriterion, RelaxationLevel};
use crate::severity::SeverityTier;
use crate::stressors::{StressorEvaluation, StressorValidator};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

/// Provenance of a score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreMetadata {
    pub prior: f64,
    pub prior_source: String,
    /// Prior source first, then sources of active ratios in stressor order
    pub citations: Vec<String>,
    pub catalog_version: String,
    pub match_confidence: f64,
    pub match_criteria: Vec<MatchCriterion>,
    pub relaxation: RelaxationLevel,
    pub computation_micros: u64,
}

/// Timing is excluded: two scores of the same context against the same
/// snapshot compare equal.
impl PartialEq for ScoreMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.prior == other.prior
            && self.prior_source == other.prior_source
            && self.citations == other.citations
            && self.catalog_version == other.catalog_version
            && self.match_confidence == other.match_confidence
            && self.match_criteria == other.match_criteria
            && self.relaxation == other.relaxation
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskScoreResult {
    pub vehicle_id: String,
    pub cohort_id: String,
    pub posterior_probability: f64,
    pub severity: SeverityTier,
    pub confidence: f64,
    /// Active stressors in stressor order
    pub active_stressors: Vec<StressorKind>,
    /// Active stressors by likelihood ratio, strongest first
    pub dominant_stressors: Vec<StressorKind>,
    pub combined_likelihood_ratio: f64,
    pub fallback_used: bool,
    /// Requested evaluations, then detected ones
    pub evaluations: Vec<StressorEvaluation>,
    pub metadata: ScoreMetadata,
}

impl RiskScoreResult {
    pub fn rejected(&self) -> impl Iterator<Item = &StressorEvaluation> {
        self.evaluations.iter().filter(|e| !e.active)
    }
}

/// One vehicle a batch could not score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub vehicle_id: String,
    pub kind: ErrorKind,
    pub message: String,
}

impl BatchFailure {
    fn from_error(vehicle_id: &str, error: &Error) -> Self {
        Self {
            vehicle_id: vehicle_id.to_string(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// Scored vehicles, in input order
    pub results: Vec<RiskScoreResult>,
    pub failures: Vec<BatchFailure>,
    /// Vehicles per matched cohort
    pub cohort_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub scored: usize,
    pub failed: usize,
    pub fallbacks: usize,
    pub by_severity: BTreeMap<SeverityTier, usize>,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        let mut by_severity: BTreeMap<SeverityTier, usize> =
            SeverityTier::ALL.iter().map(|t| (*t, 0)).collect();
        for result in &self.results {
            *by_severity.entry(result.severity).or_default() += 1;
        }
        BatchSummary {
            scored: self.results.len(),
            failed: self.failures.len(),
            fallbacks: self.results.iter().filter(|r| r.fallback_used).count(),
            by_severity,
        }
    }
}

/// Batch member: input position, its context and the cohort it matched.
type Member<'a> = (usize, &'a VehicleContext, CohortMatchResult);

/// Scores vehicles against the catalog published on a `CatalogHandle`.
#[derive(Debug)]
pub struct RiskScorer {
    catalog: Arc<CatalogHandle>,
    config: StressmapConfig,
}

impl RiskScorer {
    pub fn new(catalog: Arc<CatalogHandle>, config: StressmapConfig) -> Self {
        Self { catalog, config }
    }

    pub fn with_default_config(catalog: Arc<CatalogHandle>) -> Self {
        Self::new(catalog, StressmapConfig::default())
    }

    pub fn config(&self) -> &StressmapConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<CatalogHandle> {
        &self.catalog
    }

    /// Score one vehicle against the currently published snapshot.
    pub fn score_vehicle(&self, context: &VehicleContext) -> Result<RiskScoreResult> {
        let snapshot = self.catalog.snapshot()?;
        self.score_with_snapshot(&snapshot, context)
    }

    /// Score one vehicle against an explicit snapshot.
    pub fn score_with_snapshot(
        &self,
        snapshot: &CohortCatalogSnapshot,
        context: &VehicleContext,
    ) -> Result<RiskScoreResult> {
        let started = Instant::now();
        context.validate()?;
        let matched = CohortMatcher::new(snapshot, &self.config.matching).match_vehicle(context);
        self.score_matched(snapshot, context, matched, started)
    }

    /// Score many vehicles against one snapshot.
    ///
    /// Invalid contexts are recorded as failures and the rest of the batch
    /// continues. A missing catalog fails the whole batch.
    pub fn score_batch(&self, contexts: &[VehicleContext]) -> Result<BatchReport> {
        let entries: Vec<std::result::Result<&VehicleContext, &Error>> =
            contexts.iter().map(Ok).collect();
        self.score_entries(&entries)
    }

    /// Score contexts that were loaded one by one, some of which may have
    /// failed to load. Load failures become batch failures at their position.
    pub fn score_loaded(&self, entries: &[Result<VehicleContext>]) -> Result<BatchReport> {
        let entries: Vec<std::result::Result<&VehicleContext, &Error>> =
            entries.iter().map(|entry| entry.as_ref()).collect();
        self.score_entries(&entries)
    }

    /// Score every vehicle a provider knows about.
    pub fn score_provider(&self, provider: &dyn ContextProvider) -> Result<BatchReport> {
        let mut entries = Vec::new();
        for id in provider.vehicle_ids() {
            match provider.vehicle_context(&id) {
                Err(e) if e.is_fatal() => return Err(e),
                entry => entries.push(entry),
            }
        }
        self.score_loaded(&entries)
    }

    fn score_entries(
        &self,
        entries: &[std::result::Result<&VehicleContext, &Error>],
    ) -> Result<BatchReport> {
        let _span = info_span!("score_batch", vehicles = entries.len()).entered();
        let snapshot = self.catalog.snapshot()?;
        let matcher = CohortMatcher::new(&snapshot, &self.config.matching);

        let mut failures: Vec<(usize, BatchFailure)> = Vec::new();
        let mut groups: BTreeMap<String, Vec<Member<'_>>> = BTreeMap::new();
        for (index, entry) in entries.iter().enumerate() {
            let validated = match entry {
                Ok(context) => context.validate().map(|()| *context),
                Err(e) => {
                    let id = e.vehicle_id().unwrap_or_default();
                    failures.push((index, BatchFailure::from_error(id, e)));
                    continue;
                }
            };
            match validated {
                Ok(context) => {
                    let matched = matcher.match_vehicle(context);
                    groups
                        .entry(matched.cohort_id.clone())
                        .or_default()
                        .push((index, context, matched));
                }
                Err(e) => {
                    warn!(error = %e, "Skipping vehicle");
                    let id = e.vehicle_id().unwrap_or_default();
                    failures.push((index, BatchFailure::from_error(id, &e)));
                }
            }
        }

        let cohort_counts = groups
            .iter()
            .map(|(id, members)| (id.clone(), members.len()))
            .collect();

        let snapshot_ref: &CohortCatalogSnapshot = &snapshot;
        let scored: Vec<(usize, &VehicleContext, Result<RiskScoreResult>)> =
            if self.config.parallel.enabled {
                groups
                    .par_iter()
                    .flat_map_iter(|(_, members)| self.score_members(snapshot_ref, members))
                    .collect()
            } else {
                groups
                    .iter()
                    .flat_map(|(_, members)| self.score_members(snapshot_ref, members))
                    .collect()
            };

        let mut results: Vec<(usize, RiskScoreResult)> = Vec::with_capacity(scored.len());
        for (index, context, outcome) in scored {
            match outcome {
                Ok(result) => results.push((index, result)),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => failures.push((index, BatchFailure::from_error(&context.vehicle_id, &e))),
            }
        }
        results.sort_by_key(|(index, _)| *index);
        failures.sort_by_key(|(index, _)| *index);

        let report = BatchReport {
            results: results.into_iter().map(|(_, r)| r).collect(),
            failures: failures.into_iter().map(|(_, f)| f).collect(),
            cohort_counts,
        };
        info!(
            scored = report.results.len(),
            failed = report.failures.len(),
            catalog = snapshot.version(),
            "Batch scored"
        );
        Ok(report)
    }

    fn score_members<'s>(
        &'s self,
        snapshot: &'s CohortCatalogSnapshot,
        members: &'s [Member<'s>],
    ) -> impl Iterator<Item = (usize, &'s VehicleContext, Result<RiskScoreResult>)> + 's {
        members.iter().map(move |(index, context, matched)| {
            let started = Instant::now();
            let outcome = self.score_matched(snapshot, context, matched.clone(), started);
            (*index, *context, outcome)
        })
    }

    fn score_matched(
        &self,
        snapshot: &CohortCatalogSnapshot,
        context: &VehicleContext,
        matched: CohortMatchResult,
        started: Instant,
    ) -> Result<RiskScoreResult> {
        let cohort = snapshot.get(&matched.cohort_id).ok_or_else(|| {
            Error::CatalogUnavailable(format!(
                "cohort {} is not in catalog {}",
                matched.cohort_id,
                snapshot.version()
            ))
        })?;

        if matched.fallback_used {
            warn!(
                vehicle = %context.vehicle_id,
                cohort = %matched.cohort_id,
                "No cohort matched, using default cohort"
            );
        }

        let evaluations = StressorValidator::new(&self.config.validation)
            .validate(&context.requested_stressors, context, cohort)
            .into_evaluations();
        let update = bayes::update(cohort.prior.probability, &evaluations, &self.config.bayes);

        let ladder = cohort
            .severity_thresholds
            .as_ref()
            .unwrap_or(&self.config.severity);
        let severity = ladder.classify(update.posterior);

        let active_stressors = active_in_order(&evaluations);
        let estimate = confidence::estimate(
            &ConfidenceInputs {
                match_confidence: matched.confidence,
                fallback_used: matched.fallback_used,
                completeness: context.completeness(),
                telemetry_age_hours: context.telemetry_age_hours,
                active_stressors: active_stressors.len(),
                prior: cohort.prior.probability,
                combined_likelihood_ratio: update.combined_likelihood_ratio,
            },
            &self.config.confidence,
        );

        debug!(
            vehicle = %context.vehicle_id,
            cohort = %cohort.id,
            posterior = update.posterior,
            severity = %severity,
            "Scored vehicle"
        );

        Ok(RiskScoreResult {
            vehicle_id: context.vehicle_id.clone(),
            cohort_id: cohort.id.clone(),
            posterior_probability: update.posterior,
            severity,
            confidence: estimate.value,
            dominant_stressors: dominant_stressors(&evaluations),
            active_stressors: active_stressors.clone(),
            combined_likelihood_ratio: update.combined_likelihood_ratio,
            fallback_used: matched.fallback_used,
            metadata: ScoreMetadata {
                prior: cohort.prior.probability,
                prior_source: cohort.prior.source.clone(),
                citations: citations(cohort, &active_stressors),
                catalog_version: snapshot.version().to_string(),
                match_confidence: matched.confidence,
                match_criteria: matched.criteria,
                relaxation: matched.relaxation,
                computation_micros: started.elapsed().as_micros() as u64,
            },
            evaluations,
        })
    }
}

fn active_in_order(evaluations: &[StressorEvaluation]) -> Vec<StressorKind> {
    let mut kinds: Vec<StressorKind> = evaluations
        .iter()
        .filter(|e| e.active)
        .map(|e| e.stressor)
        .collect();
    kinds.sort();
    kinds.dedup();
    kinds
}

/// Active stressors by descending likelihood ratio, ties in stressor order.
pub fn dominant_stressors(evaluations: &[StressorEvaluation]) -> Vec<StressorKind> {
    let mut active: Vec<&StressorEvaluation> = evaluations.iter().filter(|e| e.active).collect();
    active.sort_by(|a, b| {
        b.contribution
            .total_cmp(&a.contribution)
            .then(a.stressor.cmp(&b.stressor))
    });
    active.into_iter().map(|e| e.stressor).collect()
}

/// Prior source, then each active ratio's source, without repeats.
pub fn citations(cohort: &CohortDefinition, active: &[StressorKind]) -> Vec<String> {
    let mut seen = HashSet::new();
    std::iter::once(cohort.prior.source.as_str())
        .chain(
            active
                .iter()
                .filter_map(|kind| cohort.likelihood_ratio(*kind))
                .map(|lr| lr.source.as_str()),
        )
        .filter(|source| seen.insert(*source))
        .map(str::to_string)
        .collect()
}
