//! Cohort definitions as they appear in the catalog document.

use crate::severity::SeverityLadder;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Geographic/climate region a cohort (or vehicle) operates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    HotCoastal,
    HotArid,
    Temperate,
    Cold,
    Mountain,
}

impl Region {
    pub const ALL: [Region; 5] = [
        Region::HotCoastal,
        Region::HotArid,
        Region::Temperate,
        Region::Cold,
        Region::Mountain,
    ];

    pub fn is_hot(self) -> bool {
        matches!(self, Region::HotCoastal | Region::HotArid)
    }

    pub fn is_cold(self) -> bool {
        matches!(self, Region::Cold | Region::Mountain)
    }

    pub fn is_coastal(self) -> bool {
        matches!(self, Region::HotCoastal)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Region::HotCoastal => "hot/coastal",
            Region::HotArid => "hot/arid",
            Region::Temperate => "temperate",
            Region::Cold => "cold",
            Region::Mountain => "mountain",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleClass {
    LightTruck,
    Suv,
    Sedan,
    Compact,
    Van,
    HeavyDuty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Powertrain {
    Ice,
    StartStop,
    Hybrid,
    Electric,
}

/// Operating-condition signal hypothesized to raise failure likelihood.
///
/// The declaration order is the canonical stressor order used for
/// deterministic iteration, citation lists and tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressorKind {
    ExtremeHeat,
    HotClimateRegion,
    ColdCrank,
    ShortTrips,
    HighIgnitionCycles,
    CommercialUse,
    PoorMaintenance,
    DeepDischarge,
    HighHumidity,
    CoastalExposure,
    HighAltitude,
    VehicleAge,
}

impl StressorKind {
    pub const ALL: [StressorKind; 12] = [
        StressorKind::ExtremeHeat,
        StressorKind::HotClimateRegion,
        StressorKind::ColdCrank,
        StressorKind::ShortTrips,
        StressorKind::HighIgnitionCycles,
        StressorKind::CommercialUse,
        StressorKind::PoorMaintenance,
        StressorKind::DeepDischarge,
        StressorKind::HighHumidity,
        StressorKind::CoastalExposure,
        StressorKind::HighAltitude,
        StressorKind::VehicleAge,
    ];

    /// Wire name, identical to the catalog key.
    pub fn as_str(self) -> &'static str {
        match self {
            StressorKind::ExtremeHeat => "extreme_heat",
            StressorKind::HotClimateRegion => "hot_climate_region",
            StressorKind::ColdCrank => "cold_crank",
            StressorKind::ShortTrips => "short_trips",
            StressorKind::HighIgnitionCycles => "high_ignition_cycles",
            StressorKind::CommercialUse => "commercial_use",
            StressorKind::PoorMaintenance => "poor_maintenance",
            StressorKind::DeepDischarge => "deep_discharge",
            StressorKind::HighHumidity => "high_humidity",
            StressorKind::CoastalExposure => "coastal_exposure",
            StressorKind::HighAltitude => "high_altitude",
            StressorKind::VehicleAge => "vehicle_age",
        }
    }
}

impl fmt::Display for StressorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evidence multiplier for one stressor within a cohort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodRatio {
    pub value: f64,
    /// Condition under which the stressor is considered present
    pub definition: String,
    /// Citation for the coefficient
    pub source: String,
}

/// Base failure rate for a cohort before vehicle-specific evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prior {
    pub probability: f64,
    pub source: String,
}

/// How a single cohort axis relates to a vehicle attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMatch {
    /// The cohort lists the attribute explicitly
    Explicit,
    /// The cohort does not constrain this axis, or the attribute is unknown
    Open,
    /// The cohort constrains the axis and the attribute is not in it
    Miss,
}

impl AxisMatch {
    pub fn admits(self) -> bool {
        !matches!(self, AxisMatch::Miss)
    }

    pub fn is_explicit(self) -> bool {
        matches!(self, AxisMatch::Explicit)
    }
}

/// A bucket of vehicles sharing one prior and one stressor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortDefinition {
    pub id: String,
    #[serde(default)]
    pub region: Option<Region>,
    #[serde(default)]
    pub vehicle_class: Option<VehicleClass>,
    #[serde(default)]
    pub powertrain: Option<Powertrain>,
    /// Empty means any model year
    #[serde(default)]
    pub model_years: BTreeSet<u16>,
    /// Empty means any make
    #[serde(default)]
    pub makes: Vec<String>,
    /// Empty means any model
    #[serde(default)]
    pub models: Vec<String>,
    pub prior: Prior,
    #[serde(default)]
    pub likelihood_ratios: BTreeMap<StressorKind, LikelihoodRatio>,
    /// Replaces the configured severity ladder for this cohort
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_thresholds: Option<SeverityLadder>,
}

impl CohortDefinition {
    pub fn likelihood_ratio(&self, stressor: StressorKind) -> Option<&LikelihoodRatio> {
        self.likelihood_ratios.get(&stressor)
    }

    pub fn match_make(&self, make: Option<&str>) -> AxisMatch {
        match_names(&self.makes, make)
    }

    pub fn match_model(&self, model: Option<&str>) -> AxisMatch {
        match_names(&self.models, model)
    }

    pub fn match_year(&self, year: Option<u16>) -> AxisMatch {
        match year {
            _ if self.model_years.is_empty() => AxisMatch::Open,
            None => AxisMatch::Open,
            Some(y) if self.model_years.contains(&y) => AxisMatch::Explicit,
            Some(_) => AxisMatch::Miss,
        }
    }

    pub fn match_region(&self, region: Option<Region>) -> AxisMatch {
        match_optional(self.region, region)
    }

    pub fn match_class(&self, class: Option<VehicleClass>) -> AxisMatch {
        match_optional(self.vehicle_class, class)
    }

    pub fn match_powertrain(&self, powertrain: Option<Powertrain>) -> AxisMatch {
        match_optional(self.powertrain, powertrain)
    }
}

fn match_optional<T: PartialEq>(cohort: Option<T>, vehicle: Option<T>) -> AxisMatch {
    match (cohort, vehicle) {
        (Some(c), Some(v)) if c == v => AxisMatch::Explicit,
        (Some(_), Some(_)) => AxisMatch::Miss,
        _ => AxisMatch::Open,
    }
}

fn match_names(names: &[String], value: Option<&str>) -> AxisMatch {
    match value {
        _ if names.is_empty() => AxisMatch::Open,
        None => AxisMatch::Open,
        Some(v) => {
            let wanted = normalize_name(v);
            if names.iter().any(|n| normalize_name(n) == wanted) {
                AxisMatch::Explicit
            } else {
                AxisMatch::Miss
            }
        }
    }
}

/// Case-insensitive comparison key that ignores punctuation and spacing,
/// so "F-150", "f150" and "F 150" compare equal.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cohort() -> CohortDefinition {
        CohortDefinition {
            id: "ford_f150_hot".into(),
            region: Some(Region::HotCoastal),
            vehicle_class: Some(VehicleClass::LightTruck),
            powertrain: None,
            model_years: [2018, 2019].into_iter().collect(),
            makes: vec!["Ford".into()],
            models: vec!["F-150".into()],
            prior: Prior {
                probability: 0.04,
                source: "fleet study".into(),
            },
            likelihood_ratios: BTreeMap::new(),
            severity_thresholds: None,
        }
    }

    #[test]
    fn names_match_ignoring_case_and_punctuation() {
        let c = cohort();
        assert_eq!(c.match_model(Some("f150")), AxisMatch::Explicit);
        assert_eq!(c.match_model(Some("F 150")), AxisMatch::Explicit);
        assert_eq!(c.match_model(Some("Ranger")), AxisMatch::Miss);
        assert_eq!(c.match_make(Some("FORD")), AxisMatch::Explicit);
    }

    #[test]
    fn unknown_attributes_are_open() {
        let c = cohort();
        assert_eq!(c.match_model(None), AxisMatch::Open);
        assert_eq!(c.match_year(None), AxisMatch::Open);
        assert_eq!(c.match_region(None), AxisMatch::Open);
        assert_eq!(c.match_powertrain(Some(Powertrain::Hybrid)), AxisMatch::Open);
    }

    #[test]
    fn year_outside_set_misses() {
        let c = cohort();
        assert_eq!(c.match_year(Some(2019)), AxisMatch::Explicit);
        assert_eq!(c.match_year(Some(2012)), AxisMatch::Miss);
    }

    #[test]
    fn stressor_keys_use_snake_case_wire_names() {
        let json = serde_json::to_string(&StressorKind::ColdCrank).unwrap();
        assert_eq!(json, "\"cold_crank\"");
        for kind in StressorKind::ALL {
            let round: StressorKind =
                serde_json::from_str(&format!("\"{}\"", kind.as_str())).unwrap();
            assert_eq!(round, kind);
        }
    }

    #[test]
    fn region_climate_helpers() {
        assert!(Region::HotCoastal.is_hot() && Region::HotCoastal.is_coastal());
        assert!(Region::Mountain.is_cold());
        assert!(!Region::Temperate.is_hot() && !Region::Temperate.is_cold());
    }
}
