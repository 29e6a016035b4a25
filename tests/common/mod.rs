// Shared fixtures for stressmap integration tests
#![allow(dead_code)]

use std::sync::Arc;
use stressmap::catalog::{BuiltinSource, CatalogHandle, Powertrain, Region, StressorKind, VehicleClass};
use stressmap::{RiskScorer, StressmapConfig, VehicleContext};

/// Scorer over the built-in catalog with default configuration.
pub fn builtin_scorer() -> RiskScorer {
    scorer_with(StressmapConfig::default())
}

pub fn scorer_with(config: StressmapConfig) -> RiskScorer {
    let handle = CatalogHandle::load(BuiltinSource).expect("built-in catalog loads");
    RiskScorer::new(Arc::new(handle), config)
}

/// 2019 F-150 in a hot coastal July, requesting extreme heat and hot region.
pub fn hot_coastal_f150(vehicle_id: &str) -> VehicleContext {
    let mut ctx = VehicleContext::new(vehicle_id);
    ctx.make = Some("Ford".into());
    ctx.model = Some("F-150".into());
    ctx.model_year = Some(2019);
    ctx.vehicle_class = Some(VehicleClass::LightTruck);
    ctx.region = Some(Region::HotCoastal);
    ctx.month = Some(7);
    ctx.telemetry_age_hours = Some(6.0);
    ctx.climate.max_temp_f = Some(104.0);
    ctx.requested_stressors = vec![StressorKind::ExtremeHeat, StressorKind::HotClimateRegion];
    ctx
}

/// 2020 Ram 1500 start-stop in a cold region with repeated deep discharges.
pub fn cold_ram(vehicle_id: &str) -> VehicleContext {
    let mut ctx = VehicleContext::new(vehicle_id);
    ctx.make = Some("Ram".into());
    ctx.model = Some("1500".into());
    ctx.model_year = Some(2020);
    ctx.vehicle_class = Some(VehicleClass::LightTruck);
    ctx.powertrain = Some(Powertrain::StartStop);
    ctx.region = Some(Region::Cold);
    ctx.usage.discharge_events = Some(3);
    ctx.requested_stressors = vec![StressorKind::DeepDischarge];
    ctx
}

/// A vehicle nothing in the catalog describes.
pub fn unknown_vehicle(vehicle_id: &str) -> VehicleContext {
    let mut ctx = VehicleContext::new(vehicle_id);
    ctx.make = Some("Lada".into());
    ctx.model = Some("Niva".into());
    ctx
}
