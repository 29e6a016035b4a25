//! Where catalog snapshots come from.
//!
//! Loading is the only I/O the catalog layer performs and it always happens
//! before scoring. Sources build a complete snapshot or fail; they never hand
//! out partial data.

use super::snapshot::{CatalogDocument, CohortCatalogSnapshot};
use crate::errors::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Catalog embedded into the binary at build time.
pub const BUILTIN_CATALOG_JSON: &str = include_str!("../../data/cohorts.json");

/// A provider of complete, validated catalog snapshots.
pub trait CatalogSource: Send + Sync {
    fn load_catalog(&self) -> Result<CohortCatalogSnapshot>;

    /// Short human-readable origin, used in logs
    fn describe(&self) -> String;
}

/// Catalog read from a JSON document on disk at every load.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonFileSource {
    fn load_catalog(&self) -> Result<CohortCatalogSnapshot> {
        let contents = fs::read_to_string(&self.path).map_err(|e| {
            Error::catalog_parse(format!("cannot read catalog: {}", e), Some(self.path.clone()))
        })?;
        let document: CatalogDocument = serde_json::from_str(&contents)
            .map_err(|e| Error::catalog_parse(e.to_string(), Some(self.path.clone())))?;
        CohortCatalogSnapshot::from_document(document)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Catalog held in memory as a JSON string.
#[derive(Debug, Clone)]
pub struct StaticSource {
    json: String,
    label: String,
}

impl StaticSource {
    pub fn new(json: impl Into<String>) -> Self {
        Self {
            json: json.into(),
            label: "in-memory catalog".to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

impl CatalogSource for StaticSource {
    fn load_catalog(&self) -> Result<CohortCatalogSnapshot> {
        CohortCatalogSnapshot::from_json(&self.json)
    }

    fn describe(&self) -> String {
        self.label.clone()
    }
}

/// The catalog shipped with the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

impl CatalogSource for BuiltinSource {
    fn load_catalog(&self) -> Result<CohortCatalogSnapshot> {
        CohortCatalogSnapshot::from_json(BUILTIN_CATALOG_JSON)
    }

    fn describe(&self) -> String {
        "builtin catalog".to_string()
    }
}

/// Load the builtin catalog snapshot.
pub fn builtin_catalog() -> Result<CohortCatalogSnapshot> {
    BuiltinSource.load_catalog()
}
