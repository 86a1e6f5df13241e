//! Per-file results and the run summary.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::model::{ParseFailure, SourceUnit};
use crate::scanner::Language;
use crate::synthesis::{CategoryOutcome, FileSynthesis, ScenarioCategory, TestScenario};

/// What happened to one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Parsed { source: SourceUnit },
    /// Syntax errors; units from intact regions are in `failure.partial`.
    Failed { failure: ParseFailure },
    /// No adapter handles the file.
    Unsupported { reason: String },
    /// The file's language is disabled by configuration.
    Disabled { reason: String },
    /// Too large, unreadable or not text.
    Skipped { reason: String },
}

impl FileOutcome {
    pub fn status(&self) -> &'static str {
        match self {
            FileOutcome::Parsed { .. } => "parsed",
            FileOutcome::Failed { .. } => "failed",
            FileOutcome::Unsupported { .. } => "unsupported",
            FileOutcome::Disabled { .. } => "disabled",
            FileOutcome::Skipped { .. } => "skipped",
        }
    }

    pub fn source(&self) -> Option<&SourceUnit> {
        match self {
            FileOutcome::Parsed { source } => Some(source),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ParseFailure> {
        match self {
            FileOutcome::Failed { failure } => Some(failure),
            _ => None,
        }
    }
}

/// One entry of the output contract: the model or failure of a file plus
/// the scenarios derived from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileAnalysis {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(flatten)]
    pub outcome: FileOutcome,
    #[serde(flatten)]
    pub synthesis: FileSynthesis,
}

impl FileAnalysis {
    pub fn new(path: impl Into<String>, language: Option<Language>, outcome: FileOutcome) -> Self {
        Self {
            path: path.into(),
            language,
            outcome,
            synthesis: FileSynthesis::default(),
        }
    }
}

/// Aggregate counts for a run. Returned as data and logged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub files_total: usize,
    pub files_analyzed: usize,
    pub files_failed: usize,
    pub files_unsupported: usize,
    /// Disabled languages, oversized and unreadable files.
    pub files_skipped: usize,
    pub units_analyzed: usize,
    pub scenarios_total: usize,
    pub scenarios: BTreeMap<ScenarioCategory, usize>,
    /// Units for which a category found nothing to generate.
    pub categories_skipped: BTreeMap<ScenarioCategory, usize>,
    pub warnings: usize,
    pub duration_ms: u64,
}

impl RunSummary {
    pub fn tally(files: &[FileAnalysis], duration: Duration) -> Self {
        let mut summary = RunSummary {
            files_total: files.len(),
            duration_ms: duration.as_millis() as u64,
            ..Default::default()
        };
        for category in ScenarioCategory::ALL {
            summary.scenarios.insert(*category, 0);
            summary.categories_skipped.insert(*category, 0);
        }
        for file in files {
            match &file.outcome {
                FileOutcome::Parsed { .. } => summary.files_analyzed += 1,
                FileOutcome::Failed { .. } => summary.files_failed += 1,
                FileOutcome::Unsupported { .. } => summary.files_unsupported += 1,
                FileOutcome::Disabled { .. } | FileOutcome::Skipped { .. } => summary.files_skipped += 1,
            }
            summary.units_analyzed += file.synthesis.units.len();
            summary.scenarios_total += file.synthesis.scenarios.len();
            for scenario in &file.synthesis.scenarios {
                *summary.scenarios.entry(scenario.category).or_default() += 1;
            }
            for unit in &file.synthesis.units {
                summary.warnings += unit.warnings.len();
                for (category, outcome) in &unit.categories {
                    if matches!(outcome, CategoryOutcome::Skipped { .. }) {
                        *summary.categories_skipped.entry(*category).or_default() += 1;
                    }
                }
            }
        }
        summary
    }

    pub fn has_failures(&self) -> bool {
        self.files_failed > 0
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "files: {} total, {} analyzed, {} failed, {} unsupported, {} skipped",
            self.files_total, self.files_analyzed, self.files_failed, self.files_unsupported, self.files_skipped
        )?;
        writeln!(f, "units analyzed: {}", self.units_analyzed)?;
        writeln!(f, "scenarios generated: {}", self.scenarios_total)?;
        for (category, count) in &self.scenarios {
            let skipped = self.categories_skipped.get(category).copied().unwrap_or(0);
            writeln!(f, "  {:<22} {count:>6}  ({skipped} units skipped)", category.name())?;
        }
        if self.warnings > 0 {
            writeln!(f, "warnings: {}", self.warnings)?;
        }
        write!(f, "duration: {} ms", self.duration_ms)
    }
}

/// Everything one coordinator run produced, files in path order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRun {
    pub root: String,
    pub files: Vec<FileAnalysis>,
    pub summary: RunSummary,
}

impl AnalysisRun {
    pub fn file(&self, path: &str) -> Option<&FileAnalysis> {
        self.files.iter().find(|f| f.path == path)
    }

    pub fn scenarios(&self) -> impl Iterator<Item = &TestScenario> {
        self.files.iter().flat_map(|f| f.synthesis.scenarios.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &ParseFailure> {
        self.files.iter().filter_map(|f| f.outcome.failure())
    }
}
