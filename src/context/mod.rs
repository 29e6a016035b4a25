//! Per-request vehicle context.
//!
//! A `VehicleContext` is built by a context provider for each scoring call
//! and never persisted by the core. Every field except `vehicle_id` is
//! optional; unknown signals degrade confidence rather than failing.

pub mod provider;
pub mod vin;

pub use provider::{load_contexts, ContextProvider, InMemoryContextProvider, JsonContextProvider};
pub use vin::{decode_vin, looks_like_vin, VinInfo};

use crate::catalog::{Powertrain, Region, StressorKind, VehicleClass};
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Plausible model-year window for validation.
const MODEL_YEAR_RANGE: std::ops::RangeInclusive<u16> = 1980..=2100;

/// Recent climate observations around the vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClimateSignals {
    /// Highest recent ambient temperature, °F
    #[serde(default)]
    pub max_temp_f: Option<f64>,
    /// Lowest recent ambient temperature, °F
    #[serde(default)]
    pub min_temp_f: Option<f64>,
    #[serde(default)]
    pub avg_humidity_pct: Option<f64>,
    #[serde(default)]
    pub coast_distance_miles: Option<f64>,
    #[serde(default)]
    pub altitude_ft: Option<f64>,
}

/// How the vehicle is driven and maintained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSignals {
    #[serde(default)]
    pub avg_trip_miles: Option<f64>,
    /// Fraction of trips under 10 miles, 0-1
    #[serde(default)]
    pub short_trip_ratio: Option<f64>,
    #[serde(default)]
    pub ignition_cycles_per_day: Option<f64>,
    #[serde(default)]
    pub commercial_use: Option<bool>,
    /// Fraction of scheduled maintenance performed on time, 0-1
    #[serde(default)]
    pub maintenance_compliance: Option<f64>,
    #[serde(default)]
    pub discharge_events: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleContext {
    /// VIN or fleet identifier. Missing in input means empty, which
    /// `validate` rejects.
    #[serde(default)]
    pub vehicle_id: String,
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub model_year: Option<u16>,
    #[serde(default)]
    pub age_years: Option<f64>,
    #[serde(default)]
    pub vehicle_class: Option<VehicleClass>,
    #[serde(default)]
    pub powertrain: Option<Powertrain>,
    #[serde(default)]
    pub region: Option<Region>,
    /// Calendar month of the observation, 1-12
    #[serde(default)]
    pub month: Option<u32>,
    /// Year used to derive age from model year when age is not supplied
    #[serde(default)]
    pub reference_year: Option<u16>,
    /// Hours since the newest telemetry in this context was recorded
    #[serde(default)]
    pub telemetry_age_hours: Option<f64>,
    /// Stressors the caller asks to evaluate
    #[serde(default)]
    pub requested_stressors: Vec<StressorKind>,
    #[serde(default)]
    pub climate: ClimateSignals,
    #[serde(default)]
    pub usage: UsageSignals,
}

/// Attributes used for matching after merging explicit context with VIN
/// decoding. Explicit values always win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleAttributes {
    pub make: Option<String>,
    pub model: Option<String>,
    pub model_year: Option<u16>,
    pub age_years: Option<f64>,
    pub region: Option<Region>,
    pub vehicle_class: Option<VehicleClass>,
    pub powertrain: Option<Powertrain>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub fn from_month(month: u32) -> Option<Season> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::Spring),
            6..=8 => Some(Season::Summer),
            9..=11 => Some(Season::Autumn),
            _ => None,
        }
    }
}

impl VehicleContext {
    pub fn new(vehicle_id: impl Into<String>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            ..Default::default()
        }
    }

    pub fn season(&self) -> Option<Season> {
        self.month.and_then(Season::from_month)
    }

    /// Reject contexts whose identifying fields are absent or malformed, or
    /// whose signals are physically meaningless.
    pub fn validate(&self) -> Result<()> {
        let id = self.vehicle_id.as_str();
        let fail = |reason: String| Err(Error::invalid_context(id, reason));

        if id.trim().is_empty() {
            return fail("vehicle identifier is empty".to_string());
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return fail("vehicle identifier contains whitespace or control characters".into());
        }
        if let Some(month) = self.month {
            if !(1..=12).contains(&month) {
                return fail(format!("month {} is outside 1-12", month));
            }
        }
        if let Some(year) = self.model_year {
            if !MODEL_YEAR_RANGE.contains(&year) {
                return fail(format!("model year {} is implausible", year));
            }
        }

        let non_negative = [
            ("age_years", self.age_years),
            ("telemetry_age_hours", self.telemetry_age_hours),
            ("coast_distance_miles", self.climate.coast_distance_miles),
            ("avg_trip_miles", self.usage.avg_trip_miles),
            ("ignition_cycles_per_day", self.usage.ignition_cycles_per_day),
        ];
        for (name, value) in non_negative {
            match value {
                Some(v) if !v.is_finite() => return fail(format!("{} is not a finite number", name)),
                Some(v) if v < 0.0 => return fail(format!("{} is negative ({})", name, v)),
                _ => {}
            }
        }

        let finite = [
            ("max_temp_f", self.climate.max_temp_f),
            ("min_temp_f", self.climate.min_temp_f),
            ("altitude_ft", self.climate.altitude_ft),
        ];
        for (name, value) in finite {
            if matches!(value, Some(v) if !v.is_finite()) {
                return fail(format!("{} is not a finite number", name));
            }
        }
        if let (Some(max), Some(min)) = (self.climate.max_temp_f, self.climate.min_temp_f) {
            if min > max {
                return fail(format!("min_temp_f {} exceeds max_temp_f {}", min, max));
            }
        }

        let bounded = [
            ("short_trip_ratio", self.usage.short_trip_ratio, 1.0),
            ("maintenance_compliance", self.usage.maintenance_compliance, 1.0),
            ("avg_humidity_pct", self.climate.avg_humidity_pct, 100.0),
        ];
        for (name, value, upper) in bounded {
            if let Some(v) = value {
                if !v.is_finite() || !(0.0..=upper).contains(&v) {
                    return fail(format!("{} {} is outside [0, {}]", name, v, upper));
                }
            }
        }

        Ok(())
    }

    /// Merge explicit attributes with whatever the VIN can tell us.
    pub fn attributes(&self) -> VehicleAttributes {
        let vin = decode_vin(&self.vehicle_id);
        let model_year = self
            .model_year
            .or_else(|| vin.as_ref().and_then(|v| v.model_year));
        let age_years = self.age_years.or_else(|| {
            match (self.reference_year, model_year) {
                (Some(reference), Some(year)) if reference >= year => {
                    Some(f64::from(reference - year))
                }
                _ => None,
            }
        });

        VehicleAttributes {
            make: self
                .make
                .clone()
                .or_else(|| vin.as_ref().and_then(|v| v.make.map(str::to_string))),
            model: self.model.clone(),
            model_year,
            age_years,
            region: self.region,
            vehicle_class: self
                .vehicle_class
                .or_else(|| vin.as_ref().and_then(|v| v.class_hint)),
            powertrain: self.powertrain,
        }
    }

    /// Fraction of optional signals that are known, in [0, 1].
    pub fn completeness(&self) -> f64 {
        let attrs = self.attributes();
        let known = [
            attrs.make.is_some(),
            attrs.model.is_some(),
            attrs.model_year.is_some(),
            attrs.region.is_some(),
            self.month.is_some(),
            self.telemetry_age_hours.is_some(),
            self.climate.max_temp_f.is_some(),
            self.climate.min_temp_f.is_some(),
            self.climate.avg_humidity_pct.is_some(),
            self.climate.coast_distance_miles.is_some(),
            self.climate.altitude_ft.is_some(),
            self.usage.avg_trip_miles.is_some() || self.usage.short_trip_ratio.is_some(),
            self.usage.ignition_cycles_per_day.is_some(),
            self.usage.commercial_use.is_some(),
            self.usage.maintenance_compliance.is_some(),
            self.usage.discharge_events.is_some(),
        ];
        known.iter().filter(|k| **k).count() as f64 / known.len() as f64
    }
}
