//! Immutable, validated catalog snapshots.
//!
//! A snapshot is built once from a [`CatalogDocument`], validated as a whole
//! and never mutated afterwards. Reloading produces a new snapshot; nothing
//! is patched in place.

use super::model::CohortDefinition;
use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Open interval a cohort prior must fall in.
pub const PRIOR_RANGE: (f64, f64) = (0.001, 0.5);

/// Open interval a likelihood ratio value must fall in.
pub const LIKELIHOOD_RATIO_RANGE: (f64, f64) = (0.1, 10.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogMetadata {
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Cohort used when a vehicle matches nothing else
    pub default_cohort: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

/// Wire shape of a catalog: `{ "metadata": ..., "cohorts": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub metadata: CatalogMetadata,
    pub cohorts: Vec<CohortDefinition>,
}

impl CatalogDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::catalog_parse(e.to_string(), None))
    }
}

/// A versioned, validated, read-only view of every cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortCatalogSnapshot {
    metadata: CatalogMetadata,
    cohorts: Vec<CohortDefinition>,
    index: HashMap<String, usize>,
    default_index: usize,
}

impl CohortCatalogSnapshot {
    /// Validate a document and freeze it into a snapshot.
    ///
    /// Every violated invariant is collected, so a rejected catalog reports
    /// all of its problems at once.
    pub fn from_document(document: CatalogDocument) -> Result<Self> {
        let issues = validate_document(&document);
        if !issues.is_empty() {
            return Err(Error::CatalogValidation { issues });
        }

        let index: HashMap<String, usize> = document
            .cohorts
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        let default_index = index
            .get(&document.metadata.default_cohort)
            .copied()
            .ok_or_else(|| Error::CatalogValidation {
                issues: vec![format!(
                    "default cohort '{}' is not defined",
                    document.metadata.default_cohort
                )],
            })?;

        Ok(Self {
            metadata: document.metadata,
            cohorts: document.cohorts,
            index,
            default_index,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_document(CatalogDocument::from_json(json)?)
    }

    pub fn metadata(&self) -> &CatalogMetadata {
        &self.metadata
    }

    pub fn version(&self) -> &str {
        &self.metadata.version
    }

    /// Cohorts in catalog (insertion) order.
    pub fn cohorts(&self) -> &[CohortDefinition] {
        &self.cohorts
    }

    pub fn get(&self, id: &str) -> Option<&CohortDefinition> {
        self.index.get(id).map(|&i| &self.cohorts[i])
    }

    pub fn default_cohort(&self) -> &CohortDefinition {
        &self.cohorts[self.default_index]
    }

    pub fn is_default(&self, id: &str) -> bool {
        self.default_cohort().id == id
    }

    pub fn len(&self) -> usize {
        self.cohorts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cohorts.is_empty()
    }

    pub fn to_document(&self) -> CatalogDocument {
        CatalogDocument {
            metadata: self.metadata.clone(),
            cohorts: self.cohorts.clone(),
        }
    }
}

fn in_open_range(value: f64, (lo, hi): (f64, f64)) -> bool {
    value.is_finite() && value > lo && value < hi
}

fn validate_document(document: &CatalogDocument) -> Vec<String> {
    let mut issues = Vec::new();

    if document.metadata.version.trim().is_empty() {
        issues.push("catalog version is empty".to_string());
    }
    if document.cohorts.is_empty() {
        issues.push("catalog defines no cohorts".to_string());
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for cohort in &document.cohorts {
        if cohort.id.trim().is_empty() {
            issues.push("cohort with empty id".to_string());
        }
        *seen.entry(cohort.id.as_str()).or_default() += 1;
        issues.extend(validate_cohort(cohort));
    }

    let mut duplicates: Vec<&str> = seen
        .iter()
        .filter(|(_, &count)| count > 1)
        .map(|(id, _)| *id)
        .collect();
    duplicates.sort_unstable();
    issues.extend(
        duplicates
            .into_iter()
            .map(|id| format!("cohort id '{}' is defined more than once", id)),
    );

    if !document.cohorts.is_empty() && !seen.contains_key(document.metadata.default_cohort.as_str()) {
        issues.push(format!(
            "default cohort '{}' is not defined",
            document.metadata.default_cohort
        ));
    }

    issues
}

fn validate_cohort(cohort: &CohortDefinition) -> Vec<String> {
    let mut issues = Vec::new();
    let id = &cohort.id;

    if !in_open_range(cohort.prior.probability, PRIOR_RANGE) {
        issues.push(format!(
            "cohort '{}': prior {} outside ({}, {})",
            id, cohort.prior.probability, PRIOR_RANGE.0, PRIOR_RANGE.1
        ));
    }
    if cohort.prior.source.trim().is_empty() {
        issues.push(format!("cohort '{}': prior has no source citation", id));
    }

    for (stressor, lr) in &cohort.likelihood_ratios {
        if !in_open_range(lr.value, LIKELIHOOD_RATIO_RANGE) {
            issues.push(format!(
                "cohort '{}': likelihood ratio {} for {} outside ({}, {})",
                id, lr.value, stressor, LIKELIHOOD_RATIO_RANGE.0, LIKELIHOOD_RATIO_RANGE.1
            ));
        }
        if lr.source.trim().is_empty() {
            issues.push(format!(
                "cohort '{}': likelihood ratio for {} has no source citation",
                id, stressor
            ));
        }
        if lr.definition.trim().is_empty() {
            issues.push(format!(
                "cohort '{}': likelihood ratio for {} has no definition",
                id, stressor
            ));
        }
    }

    if let Some(ladder) = &cohort.severity_thresholds {
        if let Err(e) = ladder.validate() {
            issues.push(format!("cohort '{}': {}", id, e));
        }
    }

    issues
}
