use crate::engine::{BatchReport, RiskScoreResult};
use crate::severity::SeverityTier;
use colored::*;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Json,
    Terminal,
}

pub trait OutputWriter {
    fn write_report(&mut self, report: &BatchReport) -> anyhow::Result<()>;
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_report(&mut self, report: &BatchReport) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, report)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_header(&mut self, report: &BatchReport) -> anyhow::Result<()> {
        let version = report
            .results
            .first()
            .map(|r| r.metadata.catalog_version.as_str())
            .unwrap_or("-");
        writeln!(self.writer, "{}", "Stressmap Risk Report".bold().blue())?;
        writeln!(self.writer, "{}", "=====================".blue())?;
        writeln!(self.writer, "Catalog version: {}", version)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_summary(&mut self, report: &BatchReport) -> anyhow::Result<()> {
        let summary = report.summary();
        writeln!(self.writer, "{}", "Summary:".bold())?;
        writeln!(self.writer, "  Vehicles scored: {}", summary.scored)?;
        writeln!(self.writer, "  Fallback cohort: {}", summary.fallbacks)?;
        let failed = if summary.failed > 0 {
            summary.failed.to_string().red().to_string()
        } else {
            summary.failed.to_string()
        };
        writeln!(self.writer, "  Failures: {}", failed)?;
        for (tier, count) in summary.by_severity.iter().rev() {
            writeln!(self.writer, "    {:<9} {}", paint_tier(*tier), count)?;
        }
        writeln!(self.writer)?;
        Ok(())
    }

    fn write_result(&mut self, result: &RiskScoreResult) -> anyhow::Result<()> {
        writeln!(
            self.writer,
            "{} [{}] p={:.4} confidence={:.2} cohort={}{}",
            result.vehicle_id.bold(),
            paint_tier(result.severity),
            result.posterior_probability,
            result.confidence,
            result.cohort_id,
            if result.fallback_used {
                " (fallback)".yellow().to_string()
            } else {
                String::new()
            }
        )?;
        if !result.dominant_stressors.is_empty() {
            let names: Vec<&str> = result.dominant_stressors.iter().map(|s| s.as_str()).collect();
            writeln!(
                self.writer,
                "  stressors: {} (combined LR x{:.2})",
                names.join(", "),
                result.combined_likelihood_ratio
            )?;
        }
        for rejected in result.rejected() {
            if let Some(reason) = &rejected.rejection {
                writeln!(
                    self.writer,
                    "  {} {}: {}",
                    "rejected".dimmed(),
                    rejected.stressor,
                    reason
                )?;
            }
        }
        Ok(())
    }

    fn write_failures(&mut self, report: &BatchReport) -> anyhow::Result<()> {
        if report.failures.is_empty() {
            return Ok(());
        }
        writeln!(self.writer)?;
        writeln!(self.writer, "{}", "Failures:".bold().red())?;
        for failure in &report.failures {
            writeln!(
                self.writer,
                "  {} [{}] {}",
                failure.vehicle_id,
                failure.kind.code(),
                failure.message
            )?;
        }
        Ok(())
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_report(&mut self, report: &BatchReport) -> anyhow::Result<()> {
        self.write_header(report)?;
        self.write_summary(report)?;
        for result in &report.results {
            self.write_result(result)?;
        }
        self.write_failures(report)?;
        self.writer.flush()?;
        Ok(())
    }
}

fn paint_tier(tier: SeverityTier) -> ColoredString {
    let label = tier.as_str();
    match tier {
        SeverityTier::Severe => label.red().bold(),
        SeverityTier::Critical => label.red(),
        SeverityTier::High => label.yellow(),
        SeverityTier::Moderate => label.cyan(),
        SeverityTier::Low => label.green(),
    }
}

/// Writer for `format`, to `output` when given, stdout otherwise.
pub fn create_writer(
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<Box<dyn OutputWriter>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout()),
    };
    Ok(match format {
        OutputFormat::Json => Box::new(JsonWriter::new(sink)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(sink)),
    })
}
