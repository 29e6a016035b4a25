use crate::catalog::{BuiltinSource, CatalogSource, CohortCatalogSnapshot, JsonFileSource};
use anyhow::{Context, Result};
use colored::*;
use std::io::Write;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct CatalogCommandConfig {
    pub catalog: Option<PathBuf>,
    pub json: bool,
}

pub fn load_snapshot(catalog: Option<&PathBuf>) -> Result<CohortCatalogSnapshot> {
    let snapshot = match catalog {
        Some(path) => JsonFileSource::new(path)
            .load_catalog()
            .with_context(|| format!("loading cohort catalog {}", path.display()))?,
        None => BuiltinSource
            .load_catalog()
            .context("loading built-in cohort catalog")?,
    };
    Ok(snapshot)
}

/// Validate the catalog and describe it on `out`.
pub fn describe_catalog(config: &CatalogCommandConfig, out: &mut impl Write) -> Result<()> {
    let snapshot = load_snapshot(config.catalog.as_ref())?;

    if config.json {
        serde_json::to_writer_pretty(&mut *out, &snapshot.to_document())?;
        writeln!(out)?;
        return Ok(());
    }

    let metadata = snapshot.metadata();
    writeln!(out, "{} {}", "Catalog".bold().blue(), metadata.version)?;
    if let Some(description) = &metadata.description {
        writeln!(out, "  {}", description)?;
    }
    if let Some(generated_at) = metadata.generated_at {
        writeln!(out, "  Generated: {}", generated_at.format("%Y-%m-%d"))?;
    }
    writeln!(out, "  Cohorts: {}", snapshot.len())?;
    writeln!(out, "  Default cohort: {}", snapshot.default_cohort().id)?;
    writeln!(out)?;
    for cohort in snapshot.cohorts() {
        writeln!(
            out,
            "  {:<32} prior {:.3}  {} ratios{}",
            cohort.id,
            cohort.prior.probability,
            cohort.likelihood_ratios.len(),
            if cohort.severity_thresholds.is_some() {
                "  custom ladder"
            } else {
                ""
            }
        )?;
    }
    Ok(())
}
