//! Cohort matching.
//!
//! Selects the catalog cohort that best describes a vehicle. Matching never
//! fails: when no cohort admits the vehicle on any relaxation level, the
//! catalog's default cohort is returned with `fallback_used` set and a
//! confidence below 0.5.
//!
//! Candidates are searched in three passes, each considering fewer axes:
//!
//! | Level            | Axes considered                                   |
//! |------------------|---------------------------------------------------|
//! | `full`           | make, model, model year, region, class, powertrain |
//! | `without_region` | make, model, model year, class, powertrain        |
//! | `without_class`  | make, model, model year                           |
//!
//! A cohort is a candidate on a level when every considered axis admits the
//! vehicle and at least one considered axis matches explicitly. The default
//! cohort never competes; it only backs the fallback.

use crate::catalog::{AxisMatch, CohortCatalogSnapshot, CohortDefinition};
use crate::config::MatchingConfig;
use crate::context::{VehicleAttributes, VehicleContext};
use serde::{Deserialize, Serialize};
use std::fmt;

const MODEL_POINTS: u32 = 10;
const YEAR_POINTS: u32 = 5;
const REGION_POINTS: u32 = 3;
const CLASS_POINTS: u32 = 2;

const BASE_CONFIDENCE: f64 = 0.5;
const MODEL_CONFIDENCE: f64 = 0.3;
const YEAR_CONFIDENCE: f64 = 0.2;
const REGION_CONFIDENCE: f64 = 0.1;

/// Cohort axis a vehicle satisfied explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchCriterion {
    Make,
    Model,
    ModelYear,
    Region,
    VehicleClass,
    Powertrain,
}

impl fmt::Display for MatchCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MatchCriterion::Make => "make",
            MatchCriterion::Model => "model",
            MatchCriterion::ModelYear => "model_year",
            MatchCriterion::Region => "region",
            MatchCriterion::VehicleClass => "vehicle_class",
            MatchCriterion::Powertrain => "powertrain",
        };
        f.write_str(s)
    }
}

/// How far the search had to relax before a candidate appeared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelaxationLevel {
    Full,
    WithoutRegion,
    WithoutClass,
    Fallback,
}

impl RelaxationLevel {
    const SEARCH_ORDER: [RelaxationLevel; 3] = [
        RelaxationLevel::Full,
        RelaxationLevel::WithoutRegion,
        RelaxationLevel::WithoutClass,
    ];

    fn considers_region(self) -> bool {
        matches!(self, RelaxationLevel::Full)
    }

    fn considers_class(self) -> bool {
        matches!(self, RelaxationLevel::Full | RelaxationLevel::WithoutRegion)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortMatchResult {
    pub cohort_id: String,
    /// Match certainty in [0, 1]
    pub confidence: f64,
    pub fallback_used: bool,
    /// Axes the chosen cohort matched explicitly, in axis order
    pub criteria: Vec<MatchCriterion>,
    pub relaxation: RelaxationLevel,
    /// Number of cohorts sharing the winning score
    pub tied_candidates: usize,
}

impl CohortMatchResult {
    pub fn satisfied(&self, criterion: MatchCriterion) -> bool {
        self.criteria.contains(&criterion)
    }
}

/// Per-axis outcome of comparing one cohort against one vehicle.
#[derive(Debug, Clone, Copy)]
struct AxisOutcome {
    make: AxisMatch,
    model: AxisMatch,
    year: AxisMatch,
    region: AxisMatch,
    class: AxisMatch,
    powertrain: AxisMatch,
}

impl AxisOutcome {
    fn evaluate(cohort: &CohortDefinition, attrs: &VehicleAttributes) -> Self {
        Self {
            make: cohort.match_make(attrs.make.as_deref()),
            model: cohort.match_model(attrs.model.as_deref()),
            year: cohort.match_year(attrs.model_year),
            region: cohort.match_region(attrs.region),
            class: cohort.match_class(attrs.vehicle_class),
            powertrain: cohort.match_powertrain(attrs.powertrain),
        }
    }

    fn considered(&self, level: RelaxationLevel) -> Vec<(MatchCriterion, AxisMatch)> {
        let mut axes = vec![
            (MatchCriterion::Make, self.make),
            (MatchCriterion::Model, self.model),
            (MatchCriterion::ModelYear, self.year),
        ];
        if level.considers_region() {
            axes.push((MatchCriterion::Region, self.region));
        }
        if level.considers_class() {
            axes.push((MatchCriterion::VehicleClass, self.class));
            axes.push((MatchCriterion::Powertrain, self.powertrain));
        }
        axes
    }
}

#[derive(Debug)]
struct Candidate<'c> {
    cohort: &'c CohortDefinition,
    criteria: Vec<MatchCriterion>,
    score: u32,
}

fn criterion_points(criterion: MatchCriterion) -> u32 {
    match criterion {
        MatchCriterion::Model => MODEL_POINTS,
        MatchCriterion::ModelYear => YEAR_POINTS,
        MatchCriterion::Region => REGION_POINTS,
        MatchCriterion::VehicleClass => CLASS_POINTS,
        MatchCriterion::Make | MatchCriterion::Powertrain => 0,
    }
}

/// Pure function: candidate for `cohort` on `level`, if it is one.
fn candidate_at<'c>(
    cohort: &'c CohortDefinition,
    attrs: &VehicleAttributes,
    level: RelaxationLevel,
) -> Option<Candidate<'c>> {
    let axes = AxisOutcome::evaluate(cohort, attrs).considered(level);
    if !axes.iter().all(|(_, m)| m.admits()) {
        return None;
    }
    let criteria: Vec<MatchCriterion> = axes
        .iter()
        .filter(|(_, m)| m.is_explicit())
        .map(|(c, _)| *c)
        .collect();
    if criteria.is_empty() {
        return None;
    }
    let score = criteria.iter().map(|c| criterion_points(*c)).sum();
    Some(Candidate {
        cohort,
        criteria,
        score,
    })
}

/// Pure function: confidence for a non-fallback match.
pub fn match_confidence(
    criteria: &[MatchCriterion],
    tied_candidates: usize,
    config: &MatchingConfig,
) -> f64 {
    let mut confidence = BASE_CONFIDENCE;
    if criteria.contains(&MatchCriterion::Model) {
        confidence += MODEL_CONFIDENCE;
    }
    if criteria.contains(&MatchCriterion::ModelYear) {
        confidence += YEAR_CONFIDENCE;
    }
    if criteria.contains(&MatchCriterion::Region) {
        confidence += REGION_CONFIDENCE;
    }
    if tied_candidates > config.ambiguity_threshold {
        confidence *= config.ambiguity_penalty;
    }
    confidence.clamp(0.0, 1.0)
}

/// Matches vehicles against one catalog snapshot.
#[derive(Debug, Clone, Copy)]
pub struct CohortMatcher<'a> {
    catalog: &'a CohortCatalogSnapshot,
    config: &'a MatchingConfig,
}

impl<'a> CohortMatcher<'a> {
    pub fn new(catalog: &'a CohortCatalogSnapshot, config: &'a MatchingConfig) -> Self {
        Self { catalog, config }
    }

    pub fn match_vehicle(&self, context: &VehicleContext) -> CohortMatchResult {
        self.match_attributes(&context.attributes())
    }

    pub fn match_attributes(&self, attrs: &VehicleAttributes) -> CohortMatchResult {
        for level in RelaxationLevel::SEARCH_ORDER {
            let candidates: Vec<Candidate<'_>> = self
                .catalog
                .cohorts()
                .iter()
                .filter(|c| !self.catalog.is_default(&c.id))
                .filter_map(|c| candidate_at(c, attrs, level))
                .collect();

            if let Some(result) = self.select(candidates, level) {
                log::debug!(
                    "Matched cohort {} at {:?} (confidence {:.2})",
                    result.cohort_id,
                    level,
                    result.confidence
                );
                return result;
            }
        }

        self.fallback()
    }

    fn select(
        &self,
        candidates: Vec<Candidate<'_>>,
        level: RelaxationLevel,
    ) -> Option<CohortMatchResult> {
        let top_score = candidates.iter().map(|c| c.score).max()?;
        let tied = candidates.iter().filter(|c| c.score == top_score).count();
        // First in catalog order wins ties
        let best = candidates.into_iter().find(|c| c.score == top_score)?;

        Some(CohortMatchResult {
            cohort_id: best.cohort.id.clone(),
            confidence: match_confidence(&best.criteria, tied, self.config),
            fallback_used: false,
            criteria: best.criteria,
            relaxation: level,
            tied_candidates: tied,
        })
    }

    fn fallback(&self) -> CohortMatchResult {
        CohortMatchResult {
            cohort_id: self.catalog.default_cohort().id.clone(),
            confidence: self.config.fallback_confidence.clamp(0.0, 1.0),
            fallback_used: true,
            criteria: Vec::new(),
            relaxation: RelaxationLevel::Fallback,
            tied_candidates: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{builtin_catalog, Powertrain, Region, VehicleClass};
    use indoc::indoc;

    fn f150(region: Region) -> VehicleAttributes {
        VehicleAttributes {
            make: Some("Ford".into()),
            model: Some("F-150".into()),
            model_year: Some(2019),
            region: Some(region),
            vehicle_class: Some(VehicleClass::LightTruck),
            powertrain: Some(Powertrain::Ice),
            ..Default::default()
        }
    }

    #[test]
    fn exact_match_on_all_axes() {
        let catalog = builtin_catalog().unwrap();
        let config = MatchingConfig::default();
        let result = CohortMatcher::new(&catalog, &config).match_attributes(&f150(Region::HotCoastal));

        assert_eq!(result.cohort_id, "ford_f150_hot_coastal");
        assert!(!result.fallback_used);
        assert_eq!(result.relaxation, RelaxationLevel::Full);
        assert!(result.satisfied(MatchCriterion::Model));
        assert!(result.satisfied(MatchCriterion::Region));
        // 0.5 + 0.3 + 0.2 + 0.1, clamped
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn region_dropped_when_no_regional_cohort_fits() {
        let catalog = builtin_catalog().unwrap();
        let config = MatchingConfig::default();
        let attrs = VehicleAttributes {
            make: Some("Toyota".into()),
            model: Some("Camry".into()),
            model_year: Some(2020),
            region: Some(Region::Cold),
            vehicle_class: Some(VehicleClass::Sedan),
            ..Default::default()
        };
        let result = CohortMatcher::new(&catalog, &config).match_attributes(&attrs);

        assert_eq!(result.cohort_id, "toyota_camry_hot_coastal");
        assert_eq!(result.relaxation, RelaxationLevel::WithoutRegion);
        assert!(!result.satisfied(MatchCriterion::Region));
        assert!((result.confidence - 1.0).abs() < 1e-12);
    }

    #[test]
    fn nothing_known_falls_back_to_default() {
        let catalog = builtin_catalog().unwrap();
        let config = MatchingConfig::default();
        let result =
            CohortMatcher::new(&catalog, &config).match_attributes(&VehicleAttributes::default());

        assert!(result.fallback_used);
        assert_eq!(result.cohort_id, catalog.default_cohort().id);
        assert_eq!(result.relaxation, RelaxationLevel::Fallback);
        assert!(result.confidence < 0.5);
        assert!(result.criteria.is_empty());
    }

    #[test]
    fn confidence_penalized_for_ambiguous_ties() {
        let config = MatchingConfig::default();
        let criteria = [MatchCriterion::Make];
        assert_eq!(match_confidence(&criteria, 3, &config), 0.5);
        assert!((match_confidence(&criteria, 4, &config) - 0.4).abs() < 1e-12);
    }

    #[test]
    fn matching_is_deterministic() {
        let catalog = builtin_catalog().unwrap();
        let config = MatchingConfig::default();
        let matcher = CohortMatcher::new(&catalog, &config);
        let first = matcher.match_attributes(&f150(Region::Cold));
        for _ in 0..10 {
            assert_eq!(matcher.match_attributes(&f150(Region::Cold)), first);
        }
        assert_eq!(first.cohort_id, "ford_f150_cold");
    }

    const FLEET_CATALOG: &str = indoc! {r#"
        {
          "metadata": { "version": "fleet-1", "default_cohort": "generic" },
          "cohorts": [
            { "id": "hino_268_box", "makes": ["Hino"], "models": ["268"],
              "model_years": [2018, 2019, 2020], "region": "temperate",
              "vehicle_class": "heavy_duty",
              "prior": { "probability": 0.06, "source": "fleet survey" } },
            { "id": "isuzu_van_a", "makes": ["Isuzu"], "vehicle_class": "van",
              "prior": { "probability": 0.04, "source": "fleet survey" } },
            { "id": "isuzu_van_b", "makes": ["Isuzu"], "vehicle_class": "van",
              "prior": { "probability": 0.04, "source": "fleet survey" } },
            { "id": "isuzu_van_c", "makes": ["Isuzu"], "vehicle_class": "van",
              "prior": { "probability": 0.04, "source": "fleet survey" } },
            { "id": "isuzu_van_hybrid", "makes": ["Isuzu"], "vehicle_class": "van",
              "powertrain": "hybrid",
              "prior": { "probability": 0.04, "source": "fleet survey" } },
            { "id": "generic",
              "prior": { "probability": 0.03, "source": "fleet survey" } }
          ]
        }
    "#};

    fn isuzu_van(powertrain: Option<Powertrain>) -> VehicleAttributes {
        VehicleAttributes {
            make: Some("Isuzu".into()),
            model: Some("NPR".into()),
            region: Some(Region::Temperate),
            vehicle_class: Some(VehicleClass::Van),
            powertrain,
            ..Default::default()
        }
    }

    #[test]
    fn class_dropped_after_region() {
        let catalog = CohortCatalogSnapshot::from_json(FLEET_CATALOG).unwrap();
        let config = MatchingConfig::default();
        // Right truck, wrong class: only the make/model/year pass admits it
        let attrs = VehicleAttributes {
            make: Some("Hino".into()),
            model: Some("268".into()),
            model_year: Some(2019),
            region: Some(Region::Temperate),
            vehicle_class: Some(VehicleClass::Van),
            ..Default::default()
        };
        let result = CohortMatcher::new(&catalog, &config).match_attributes(&attrs);

        assert_eq!(result.cohort_id, "hino_268_box");
        assert!(!result.fallback_used);
        assert_eq!(result.relaxation, RelaxationLevel::WithoutClass);
        assert_eq!(
            result.criteria,
            vec![MatchCriterion::Make, MatchCriterion::Model, MatchCriterion::ModelYear]
        );
        assert_eq!(result.tied_candidates, 1);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn four_way_tie_is_penalized_and_first_cohort_wins() {
        let catalog = CohortCatalogSnapshot::from_json(FLEET_CATALOG).unwrap();
        let config = MatchingConfig::default();
        let result = CohortMatcher::new(&catalog, &config).match_attributes(&isuzu_van(None));

        assert_eq!(result.cohort_id, "isuzu_van_a");
        assert_eq!(result.relaxation, RelaxationLevel::Full);
        assert_eq!(result.tied_candidates, 4);
        assert_eq!(
            result.criteria,
            vec![MatchCriterion::Make, MatchCriterion::VehicleClass]
        );
        assert!((result.confidence - 0.5 * 0.8).abs() < 1e-12);
    }

    #[test]
    fn three_way_tie_is_not_penalized() {
        let catalog = CohortCatalogSnapshot::from_json(FLEET_CATALOG).unwrap();
        let config = MatchingConfig::default();
        // Known ICE powertrain rules out the hybrid cohort
        let result = CohortMatcher::new(&catalog, &config)
            .match_attributes(&isuzu_van(Some(Powertrain::Ice)));

        assert_eq!(result.cohort_id, "isuzu_van_a");
        assert_eq!(result.tied_candidates, 3);
        assert_eq!(result.confidence, 0.5);
    }
}
