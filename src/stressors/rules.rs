//! Context conditions that make a stressor plausible or rule it out.
//!
//! Every condition evaluates to `Some(true)`, `Some(false)` or `None` when the
//! signal it reads is unknown. Unknown never satisfies a requirement and
//! never blocks.

use crate::catalog::{Region, StressorKind};
use crate::context::{VehicleAttributes, VehicleContext};
use once_cell::sync::Lazy;
use std::collections::HashMap;

const SUMMER: &[u32] = &[6, 7, 8];
const WINTER: &[u32] = &[12, 1, 2];
const HEAT_SEASON: &[u32] = &[5, 6, 7, 8, 9];
const COLD_SEASON: &[u32] = &[11, 12, 1, 2, 3];
const HOT_REGIONS: &[Region] = &[Region::HotCoastal, Region::HotArid];
const COLD_REGIONS: &[Region] = &[Region::Cold, Region::Mountain];
const COASTAL_REGIONS: &[Region] = &[Region::HotCoastal];
const MILD_OR_COLD_REGIONS: &[Region] = &[Region::Temperate, Region::Cold, Region::Mountain];

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    MaxTempAtLeast(f64),
    MaxTempBelow(f64),
    MinTempAtMost(f64),
    RegionIn(&'static [Region]),
    MonthIn(&'static [u32]),
    ShortTripRatioAtLeast(f64),
    AvgTripMilesAtMost(f64),
    AvgTripMilesAtLeast(f64),
    IgnitionCyclesAtLeast(f64),
    HumidityAtLeast(f64),
    HumidityAtMost(f64),
    CoastWithin(f64),
    CoastBeyond(f64),
    AltitudeAtLeast(f64),
    AltitudeBelow(f64),
    CommercialUse(bool),
    MaintenanceBelow(f64),
    MaintenanceAtLeast(f64),
    DischargeEventsAtLeast(u32),
    AgeAtLeast(f64),
    AgeBelow(f64),
    /// Every inner condition holds; unknown if any is unknown and none fails
    All(Vec<Condition>),
    /// Some inner condition holds; unknown if none holds and any is unknown
    Any(Vec<Condition>),
}

impl Condition {
    pub fn evaluate(&self, ctx: &VehicleContext, attrs: &VehicleAttributes) -> Option<bool> {
        let climate = &ctx.climate;
        let usage = &ctx.usage;
        match self {
            Condition::MaxTempAtLeast(t) => climate.max_temp_f.map(|v| v >= *t),
            Condition::MaxTempBelow(t) => climate.max_temp_f.map(|v| v < *t),
            Condition::MinTempAtMost(t) => climate.min_temp_f.map(|v| v <= *t),
            Condition::RegionIn(regions) => attrs.region.map(|r| regions.contains(&r)),
            Condition::MonthIn(months) => ctx.month.map(|m| months.contains(&m)),
            Condition::ShortTripRatioAtLeast(r) => usage.short_trip_ratio.map(|v| v >= *r),
            Condition::AvgTripMilesAtMost(m) => usage.avg_trip_miles.map(|v| v <= *m),
            Condition::AvgTripMilesAtLeast(m) => usage.avg_trip_miles.map(|v| v >= *m),
            Condition::IgnitionCyclesAtLeast(n) => usage.ignition_cycles_per_day.map(|v| v >= *n),
            Condition::HumidityAtLeast(h) => climate.avg_humidity_pct.map(|v| v >= *h),
            Condition::HumidityAtMost(h) => climate.avg_humidity_pct.map(|v| v <= *h),
            Condition::CoastWithin(d) => climate.coast_distance_miles.map(|v| v <= *d),
            Condition::CoastBeyond(d) => climate.coast_distance_miles.map(|v| v > *d),
            Condition::AltitudeAtLeast(a) => climate.altitude_ft.map(|v| v >= *a),
            Condition::AltitudeBelow(a) => climate.altitude_ft.map(|v| v < *a),
            Condition::CommercialUse(flag) => usage.commercial_use.map(|v| v == *flag),
            Condition::MaintenanceBelow(s) => usage.maintenance_compliance.map(|v| v < *s),
            Condition::MaintenanceAtLeast(s) => usage.maintenance_compliance.map(|v| v >= *s),
            Condition::DischargeEventsAtLeast(n) => usage.discharge_events.map(|v| v >= *n),
            Condition::AgeAtLeast(y) => attrs.age_years.map(|v| v >= *y),
            Condition::AgeBelow(y) => attrs.age_years.map(|v| v < *y),
            Condition::All(inner) => {
                let results: Vec<Option<bool>> =
                    inner.iter().map(|c| c.evaluate(ctx, attrs)).collect();
                if results.contains(&Some(false)) {
                    Some(false)
                } else if results.contains(&None) {
                    None
                } else {
                    Some(true)
                }
            }
            Condition::Any(inner) => {
                let results: Vec<Option<bool>> =
                    inner.iter().map(|c| c.evaluate(ctx, attrs)).collect();
                if results.contains(&Some(true)) {
                    Some(true)
                } else if results.contains(&None) {
                    None
                } else {
                    Some(false)
                }
            }
        }
    }

    pub fn holds(&self, ctx: &VehicleContext, attrs: &VehicleAttributes) -> bool {
        self.evaluate(ctx, attrs) == Some(true)
    }
}

/// A condition that rules a stressor out, with the reason reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Blocker {
    pub condition: Condition,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StressorRule {
    pub stressor: StressorKind,
    /// Checked first; any match rejects the stressor
    pub blocking: Vec<Blocker>,
    /// Independent supporting evidence. The fraction that holds is the
    /// stressor's local confidence.
    pub required: Vec<Condition>,
    /// Context that implies the stressor even when nobody asked for it
    pub detection: Option<Condition>,
}

fn blocker(condition: Condition, reason: &'static str) -> Blocker {
    Blocker { condition, reason }
}

fn build_rules() -> Vec<StressorRule> {
    use Condition::*;

    vec![
        StressorRule {
            stressor: StressorKind::ExtremeHeat,
            blocking: vec![
                blocker(
                    MaxTempBelow(80.0),
                    "recent maximum temperature below 80°F rules out extreme heat",
                ),
                blocker(
                    All(vec![RegionIn(COLD_REGIONS), MonthIn(WINTER)]),
                    "cold region in winter rules out extreme heat",
                ),
            ],
            required: vec![
                MaxTempAtLeast(95.0),
                RegionIn(HOT_REGIONS),
                MonthIn(HEAT_SEASON),
            ],
            detection: Some(All(vec![MaxTempAtLeast(110.0), MonthIn(HEAT_SEASON)])),
        },
        StressorRule {
            stressor: StressorKind::HotClimateRegion,
            blocking: vec![blocker(
                RegionIn(MILD_OR_COLD_REGIONS),
                "vehicle does not operate in a hot climate region",
            )],
            required: vec![RegionIn(HOT_REGIONS)],
            detection: Some(RegionIn(HOT_REGIONS)),
        },
        StressorRule {
            stressor: StressorKind::ColdCrank,
            blocking: vec![
                blocker(
                    MaxTempAtLeast(90.0),
                    "recent maximum temperature at or above 90°F rules out cold cranking",
                ),
                blocker(
                    All(vec![RegionIn(HOT_REGIONS), MonthIn(SUMMER)]),
                    "hot region in summer rules out cold cranking",
                ),
            ],
            required: vec![
                MinTempAtMost(32.0),
                MaxTempBelow(50.0),
                RegionIn(COLD_REGIONS),
                MonthIn(COLD_SEASON),
            ],
            detection: Some(All(vec![MinTempAtMost(0.0), MonthIn(WINTER)])),
        },
        StressorRule {
            stressor: StressorKind::ShortTrips,
            blocking: vec![blocker(
                AvgTripMilesAtLeast(40.0),
                "average trip of 40 miles or more contradicts short-trip usage",
            )],
            required: vec![
                ShortTripRatioAtLeast(0.5),
                AvgTripMilesAtMost(8.0),
                IgnitionCyclesAtLeast(4.0),
            ],
            detection: Some(ShortTripRatioAtLeast(0.7)),
        },
        StressorRule {
            stressor: StressorKind::HighIgnitionCycles,
            blocking: vec![],
            required: vec![IgnitionCyclesAtLeast(8.0)],
            detection: None,
        },
        StressorRule {
            stressor: StressorKind::CommercialUse,
            blocking: vec![blocker(
                CommercialUse(false),
                "vehicle is in personal, not commercial, use",
            )],
            required: vec![CommercialUse(true)],
            detection: Some(CommercialUse(true)),
        },
        StressorRule {
            stressor: StressorKind::PoorMaintenance,
            blocking: vec![blocker(
                MaintenanceAtLeast(0.9),
                "maintenance compliance of 90% or better",
            )],
            required: vec![MaintenanceBelow(0.6)],
            detection: None,
        },
        StressorRule {
            stressor: StressorKind::DeepDischarge,
            blocking: vec![],
            required: vec![DischargeEventsAtLeast(2)],
            detection: Some(DischargeEventsAtLeast(5)),
        },
        StressorRule {
            stressor: StressorKind::HighHumidity,
            blocking: vec![blocker(
                HumidityAtMost(30.0),
                "average humidity at or below 30% rules out high humidity",
            )],
            required: vec![HumidityAtLeast(70.0)],
            detection: None,
        },
        StressorRule {
            stressor: StressorKind::CoastalExposure,
            blocking: vec![blocker(
                CoastBeyond(100.0),
                "vehicle operates more than 100 miles from the coast",
            )],
            required: vec![
                CoastWithin(10.0),
                RegionIn(COASTAL_REGIONS),
                HumidityAtLeast(60.0),
            ],
            detection: None,
        },
        StressorRule {
            stressor: StressorKind::HighAltitude,
            blocking: vec![blocker(
                AltitudeBelow(2000.0),
                "operating altitude below 2000 ft",
            )],
            required: vec![AltitudeAtLeast(5000.0)],
            detection: None,
        },
        StressorRule {
            stressor: StressorKind::VehicleAge,
            blocking: vec![blocker(AgeBelow(2.0), "vehicle is less than two years old")],
            required: vec![AgeAtLeast(5.0)],
            detection: None,
        },
    ]
}

static RULES: Lazy<HashMap<StressorKind, StressorRule>> = Lazy::new(|| {
    build_rules()
        .into_iter()
        .map(|rule| (rule.stressor, rule))
        .collect()
});

/// Rule for a stressor. Every `StressorKind` has one.
pub fn rule_for(stressor: StressorKind) -> Option<&'static StressorRule> {
    RULES.get(&stressor)
}
