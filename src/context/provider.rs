//! Context providers: the boundary between telemetry ingestion and scoring.
//!
//! Providers do their I/O up front (reading files, querying services) and
//! hand the core fully built `VehicleContext` values. Tests use
//! `InMemoryContextProvider` as a test double.

use super::VehicleContext;
use crate::errors::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Supplies a `VehicleContext` per vehicle.
pub trait ContextProvider: Send + Sync {
    /// Context for one vehicle. An unknown vehicle is an
    /// `InvalidVehicleContext` error.
    fn vehicle_context(&self, vehicle_id: &str) -> Result<VehicleContext>;

    /// Every vehicle this provider can describe, in a stable order.
    fn vehicle_ids(&self) -> Vec<String>;

    /// All contexts in `vehicle_ids` order, with per-vehicle failures kept.
    fn all_contexts(&self) -> Vec<Result<VehicleContext>> {
        self.vehicle_ids()
            .iter()
            .map(|id| self.vehicle_context(id))
            .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryContextProvider {
    contexts: BTreeMap<String, VehicleContext>,
}

impl InMemoryContextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_contexts(contexts: impl IntoIterator<Item = VehicleContext>) -> Self {
        let mut provider = Self::new();
        for ctx in contexts {
            provider.insert(ctx);
        }
        provider
    }

    /// Insert or replace the context for its vehicle id.
    pub fn insert(&mut self, context: VehicleContext) {
        self.contexts.insert(context.vehicle_id.clone(), context);
    }

    pub fn contains(&self, vehicle_id: &str) -> bool {
        self.contexts.contains_key(vehicle_id)
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}

impl ContextProvider for InMemoryContextProvider {
    fn vehicle_context(&self, vehicle_id: &str) -> Result<VehicleContext> {
        self.contexts
            .get(vehicle_id)
            .cloned()
            .ok_or_else(|| Error::invalid_context(vehicle_id, "no context available for vehicle"))
    }

    fn vehicle_ids(&self) -> Vec<String> {
        self.contexts.keys().cloned().collect()
    }
}

/// Contexts read once from a JSON array on disk.
///
/// Elements that fail to load stay addressable: looking them up returns the
/// load error, so a batch over this provider records them as failures.
#[derive(Debug, Clone)]
pub struct JsonContextProvider {
    inner: InMemoryContextProvider,
    rejected: BTreeMap<String, String>,
    order: Vec<String>,
}

impl JsonContextProvider {
    pub fn from_path(path: &Path) -> Result<Self> {
        let mut provider = Self {
            inner: InMemoryContextProvider::new(),
            rejected: BTreeMap::new(),
            order: Vec::new(),
        };
        for entry in load_contexts(path)? {
            let (id, outcome) = match entry {
                Ok(context) => (context.vehicle_id.clone(), Ok(context)),
                Err(Error::InvalidVehicleContext { vehicle_id, reason }) => (vehicle_id, Err(reason)),
                Err(e) => return Err(e),
            };
            if provider.inner.contains(&id) || provider.rejected.contains_key(&id) {
                log::warn!(
                    "Duplicate vehicle '{}' in {}, keeping the first entry",
                    id,
                    path.display()
                );
                continue;
            }
            match outcome {
                Ok(context) => provider.inner.insert(context),
                Err(reason) => {
                    provider.rejected.insert(id.clone(), reason);
                }
            }
            provider.order.push(id);
        }
        Ok(provider)
    }
}

impl ContextProvider for JsonContextProvider {
    fn vehicle_context(&self, vehicle_id: &str) -> Result<VehicleContext> {
        match self.rejected.get(vehicle_id) {
            Some(reason) => Err(Error::invalid_context(vehicle_id, reason.clone())),
            None => self.inner.vehicle_context(vehicle_id),
        }
    }

    /// File order, first occurrence of each id.
    fn vehicle_ids(&self) -> Vec<String> {
        self.order.clone()
    }
}

/// Read a JSON array of vehicle contexts.
///
/// Only a file that cannot be read, or is not a JSON array, fails as a
/// whole. Each element is decoded on its own: one that does not decode, or
/// has no `vehicle_id`, becomes an `InvalidVehicleContext` entry named by
/// its raw id or by `#<index>`.
pub fn load_contexts(path: &Path) -> Result<Vec<Result<VehicleContext>>> {
    let contents = fs::read_to_string(path)?;
    let elements: Vec<Value> = serde_json::from_str(&contents)?;
    let entries: Vec<Result<VehicleContext>> = elements
        .into_iter()
        .enumerate()
        .map(|(index, element)| decode_context(index, element))
        .collect();

    let failed = entries.iter().filter(|e| e.is_err()).count();
    if failed > 0 {
        log::warn!(
            "{} of {} vehicle contexts in {} could not be decoded",
            failed,
            entries.len(),
            path.display()
        );
    }
    log::debug!("Loaded {} vehicle contexts from {}", entries.len(), path.display());
    Ok(entries)
}

fn decode_context(index: usize, element: Value) -> Result<VehicleContext> {
    let raw_id = element
        .get("vehicle_id")
        .and_then(Value::as_str)
        .map(str::to_string);
    match raw_id {
        None => Err(Error::invalid_context(
            format!("#{}", index),
            "vehicle identifier is missing",
        )),
        Some(id) => serde_json::from_value(element)
            .map_err(|e| Error::invalid_context(id, format!("malformed context: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use indoc::indoc;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn in_memory_lookup_and_miss() {
        let provider = InMemoryContextProvider::from_contexts([
            VehicleContext::new("B-2"),
            VehicleContext::new("A-1"),
        ]);
        assert_eq!(provider.vehicle_ids(), vec!["A-1", "B-2"]);
        assert!(provider.vehicle_context("A-1").is_ok());

        let err = provider.vehicle_context("Z-9").unwrap_err();
        assert!(!err.is_fatal());
    }

    #[test]
    fn json_provider_keeps_file_order() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            indoc! {r#"
                [
                  { "vehicle_id": "TRUCK-2", "month": 7 },
                  { "vehicle_id": "TRUCK-1", "region": "cold" }
                ]
            "#}
            .as_bytes(),
        )
        .unwrap();

        let provider = JsonContextProvider::from_path(file.path()).unwrap();
        assert_eq!(provider.vehicle_ids(), vec!["TRUCK-2", "TRUCK-1"]);
        let all = provider.all_contexts();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].as_ref().unwrap().month, Some(7));
    }

    fn write_fleet(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn malformed_elements_do_not_sink_the_file() {
        let file = write_fleet(indoc! {r#"
            [
              { "vehicle_id": "GOOD-1", "month": 7 },
              { "month": 7 },
              { "vehicle_id": "BAD-2", "model_year": 70000 },
              { "vehicle_id": "GOOD-3", "region": "cold" }
            ]
        "#});

        let entries = load_contexts(file.path()).unwrap();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].as_ref().unwrap().vehicle_id, "GOOD-1");
        assert_eq!(entries[3].as_ref().unwrap().vehicle_id, "GOOD-3");

        let missing = entries[1].as_ref().unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::InvalidVehicleContext);
        assert_eq!(missing.vehicle_id(), Some("#1"));

        let malformed = entries[2].as_ref().unwrap_err();
        assert_eq!(malformed.kind(), ErrorKind::InvalidVehicleContext);
        assert_eq!(malformed.vehicle_id(), Some("BAD-2"));
    }

    #[test]
    fn non_array_file_is_an_error() {
        let file = write_fleet(r#"{ "vehicle_id": "SOLO-1" }"#);
        assert!(load_contexts(file.path()).is_err());
    }

    #[test]
    fn json_provider_reports_rejected_elements() {
        let file = write_fleet(indoc! {r#"
            [
              { "vehicle_id": "VAN-1" },
              { "vehicle_id": "VAN-2", "month": "july" }
            ]
        "#});

        let provider = JsonContextProvider::from_path(file.path()).unwrap();
        assert_eq!(provider.vehicle_ids(), vec!["VAN-1", "VAN-2"]);
        assert!(provider.vehicle_context("VAN-1").is_ok());
        let err = provider.vehicle_context("VAN-2").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidVehicleContext);
    }

    #[test]
    fn json_provider_keeps_first_of_duplicate_ids() {
        let file = write_fleet(indoc! {r#"
            [
              { "vehicle_id": "CAR-1", "month": 1 },
              { "vehicle_id": "CAR-2" },
              { "vehicle_id": "CAR-1", "month": 8 }
            ]
        "#});

        let provider = JsonContextProvider::from_path(file.path()).unwrap();
        assert_eq!(provider.vehicle_ids(), vec!["CAR-1", "CAR-2"]);
        assert_eq!(provider.vehicle_context("CAR-1").unwrap().month, Some(1));
    }
}
