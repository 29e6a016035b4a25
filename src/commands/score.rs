use super::catalog::load_snapshot;
use crate::catalog::CatalogHandle;
use crate::cli::setup::configure_thread_pool;
use crate::config::{load_config, load_config_from, StressmapConfig};
use crate::context::{load_contexts, VehicleContext};
use crate::engine::{BatchReport, RiskScorer};
use crate::io::output::{create_writer, OutputFormat};
use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScoreConfig {
    pub contexts: PathBuf,
    pub catalog: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub jobs: usize,
    pub month: Option<u32>,
    pub no_parallel: bool,
}

/// Fill observation month and reference year where a context leaves them
/// unknown.
pub fn fill_observation_defaults<'a>(
    contexts: impl IntoIterator<Item = &'a mut VehicleContext>,
    month: u32,
    year: u16,
) {
    for context in contexts {
        context.month.get_or_insert(month);
        context.reference_year.get_or_insert(year);
    }
}

fn resolve_config(score: &ScoreConfig) -> Result<StressmapConfig> {
    let mut config = match &score.config {
        Some(path) => load_config_from(path)?,
        None => load_config(),
    };
    if score.no_parallel {
        config.parallel.enabled = false;
    }
    Ok(config)
}

/// Score every context in the input file and write the report.
pub fn score_contexts(score: ScoreConfig) -> Result<BatchReport> {
    let config = resolve_config(&score)?;
    let jobs = if score.jobs > 0 {
        score.jobs
    } else {
        config.parallel.effective_concurrency()
    };
    configure_thread_pool(jobs);

    let snapshot = load_snapshot(score.catalog.as_ref())?;
    let handle = Arc::new(CatalogHandle::from_snapshot(snapshot));

    let mut entries = load_contexts(&score.contexts)
        .with_context(|| format!("reading vehicle contexts {}", score.contexts.display()))?;
    let now = Utc::now();
    let month = score.month.unwrap_or_else(|| now.month());
    let year = u16::try_from(now.year()).unwrap_or(u16::MAX);
    fill_observation_defaults(
        entries.iter_mut().filter_map(|entry| entry.as_mut().ok()),
        month,
        year,
    );

    let report = RiskScorer::new(handle, config).score_loaded(&entries)?;

    if score.output.is_some() {
        colored::control::set_override(false);
    }
    let mut writer = create_writer(score.format, score.output.as_deref())?;
    writer.write_report(&report)?;

    if !report.failures.is_empty() {
        log::warn!("{} vehicle(s) could not be scored", report.failures.len());
    }
    Ok(report)
}
