//! Rendering of runs and the language table.

use std::io::Write;

use clap::ValueEnum;
use mdtd_analysis::parsers::AdapterRegistry;
use mdtd_analysis::{AnalysisRun, FileOutcome};
use serde::Serialize;

use crate::error::CliResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// The full per-file output contract as JSON
    #[default]
    Json,
    /// Human-readable run summary
    Summary,
}

pub fn write_run(out: &mut dyn Write, run: &AnalysisRun, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, run)?;
            writeln!(out)?;
        }
        OutputFormat::Summary => {
            for file in &run.files {
                match &file.outcome {
                    FileOutcome::Failed { failure } => {
                        let first = failure.regions.first();
                        match first {
                            Some(r) => writeln!(
                                out,
                                "failed: {} ({} syntax regions, first at {}:{}: {})",
                                file.path,
                                failure.regions.len(),
                                r.start_line,
                                r.start_column,
                                r.message
                            )?,
                            None => writeln!(out, "failed: {}", file.path)?,
                        }
                    }
                    FileOutcome::Skipped { reason } => writeln!(out, "skipped: {} ({reason})", file.path)?,
                    _ => {}
                }
                for unit in &file.synthesis.units {
                    for warning in &unit.warnings {
                        writeln!(out, "warning: {} {}: {warning}", file.path, unit.unit.qualified_name())?;
                    }
                }
            }
            writeln!(out, "{}", run.summary)?;
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct LanguageRow {
    id: &'static str,
    name: &'static str,
    extensions: &'static [&'static str],
}

pub fn write_languages(out: &mut dyn Write, registry: &AdapterRegistry, format: OutputFormat) -> CliResult<()> {
    let rows: Vec<LanguageRow> = registry
        .languages()
        .into_iter()
        .map(|l| LanguageRow {
            id: l.id(),
            name: l.name(),
            extensions: l.extensions(),
        })
        .collect();
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &rows)?;
            writeln!(out)?;
        }
        OutputFormat::Summary => {
            for row in rows {
                writeln!(out, "{:<12} {}", row.name, row.extensions.join(" "))?;
            }
        }
    }
    Ok(())
}
