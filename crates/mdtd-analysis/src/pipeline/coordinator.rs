//! AnalysisCoordinator: walk, dispatch, parse, synthesize, tally.
//!
//! Files are independent, so they are analyzed in parallel with rayon.
//! `par_iter().map().collect()` keeps the walk order, which keeps the output
//! deterministic. One file's failure is recorded on that file only; the
//! only errors that abort a run are configuration errors (at construction)
//! and a missing root.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;

use mdtd_core::config::MdtdConfig;
use mdtd_core::errors::{ConfigError, PipelineError, ScanError};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::types::{AnalysisRun, FileAnalysis, FileOutcome, RunSummary};
use crate::parsers::AdapterRegistry;
use crate::scanner::walker::{Exclusions, SourceWalker};
use crate::scanner::Language;
use crate::synthesis::{FileSynthesis, ScenarioSynthesizer, SynthesisSettings};

/// Resolved scan and dispatch settings.
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub exclusions: Exclusions,
    pub disabled_languages: BTreeSet<Language>,
    pub max_file_size: u64,
    /// 0 = rayon's global pool.
    pub threads: usize,
    pub respect_gitignore: bool,
}

impl CoordinatorSettings {
    pub fn from_config(config: &MdtdConfig) -> Result<Self, ConfigError> {
        let exclusions = Exclusions::new(&config.scan.exclude)?;
        let mut disabled_languages = BTreeSet::new();
        for name in &config.languages.disabled {
            let language = Language::from_name(name).ok_or_else(|| {
                ConfigError::invalid("languages.disabled", format!("unknown language '{name}'"))
            })?;
            disabled_languages.insert(language);
        }
        let max_file_size = config.scan.effective_max_file_size();
        if max_file_size == 0 {
            return Err(ConfigError::invalid("scan.max_file_size", "must be greater than 0"));
        }
        Ok(Self {
            exclusions,
            disabled_languages,
            max_file_size,
            threads: config.scan.effective_threads(),
            respect_gitignore: config.scan.effective_respect_gitignore(),
        })
    }
}

pub struct AnalysisCoordinator {
    settings: CoordinatorSettings,
    registry: AdapterRegistry,
    synthesizer: ScenarioSynthesizer,
    pool: Option<rayon::ThreadPool>,
}

impl AnalysisCoordinator {
    /// Validate `config` and build a coordinator with every built-in
    /// adapter. Fails before any file is touched.
    pub fn new(config: &MdtdConfig) -> Result<Self, ConfigError> {
        MdtdConfig::validate(config)?;
        let settings = CoordinatorSettings::from_config(config)?;
        let synthesis = SynthesisSettings::from_config(&config.synthesis)?;
        let pool = match settings.threads {
            0 => None,
            n => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| ConfigError::invalid("scan.threads", e.to_string()))?,
            ),
        };
        Ok(Self {
            settings,
            registry: AdapterRegistry::with_defaults(),
            synthesizer: ScenarioSynthesizer::new(synthesis),
            pool,
        })
    }

    /// Build a coordinator from `config` and analyze `path` in one go.
    pub fn run(config: &MdtdConfig, path: &Path) -> Result<AnalysisRun, PipelineError> {
        let coordinator = Self::new(config)?;
        Ok(coordinator.analyze_path(path)?)
    }

    /// Replace the adapter registry.
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Analyze a file or every file under a directory.
    pub fn analyze_path(&self, path: &Path) -> Result<AnalysisRun, ScanError> {
        let start = Instant::now();
        info!(root = %path.display(), "analysis started");

        let walker = SourceWalker::new(path, self.settings.exclusions.clone(), self.settings.respect_gitignore);
        let files = walker.collect()?;
        let base = if path.is_file() {
            path.parent().unwrap_or(path)
        } else {
            path
        };

        let work = || -> Vec<FileAnalysis> {
            files
                .par_iter()
                .map(|file| self.analyze_file(base, file))
                .collect()
        };
        let analyses = match &self.pool {
            Some(pool) => pool.install(work),
            None => work(),
        };

        let summary = RunSummary::tally(&analyses, start.elapsed());
        info!(
            files = summary.files_total,
            analyzed = summary.files_analyzed,
            failed = summary.files_failed,
            unsupported = summary.files_unsupported,
            skipped = summary.files_skipped,
            units = summary.units_analyzed,
            scenarios = summary.scenarios_total,
            duration_ms = summary.duration_ms,
            "analysis finished"
        );
        Ok(AnalysisRun {
            root: path.display().to_string(),
            files: analyses,
            summary,
        })
    }

    fn analyze_file(&self, base: &Path, file: &Path) -> FileAnalysis {
        let shown = file
            .strip_prefix(base)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/");

        let size = match std::fs::metadata(file) {
            Ok(meta) => meta.len(),
            Err(e) => return unreadable(shown, e),
        };
        if size > self.settings.max_file_size {
            debug!(path = %shown, size, "file over size limit");
            return FileAnalysis::new(
                shown,
                Language::from_extension(file.extension().and_then(|e| e.to_str())),
                FileOutcome::Skipped {
                    reason: format!("larger than {} bytes", self.settings.max_file_size),
                },
            );
        }
        let bytes = match std::fs::read(file) {
            Ok(bytes) => bytes,
            Err(e) => return unreadable(shown, e),
        };

        let Some(language) = Language::detect(file, &bytes) else {
            debug!(path = %shown, "no adapter for file");
            let reason = match file.extension().and_then(|e| e.to_str()) {
                Some(ext) => format!("no adapter for .{ext} files"),
                None => "no adapter for files without an extension".to_string(),
            };
            return FileAnalysis::new(shown, None, FileOutcome::Unsupported { reason });
        };
        match String::from_utf8(bytes) {
            Ok(text) => self.analyze_source(&shown, language, &text),
            Err(_) => FileAnalysis::new(
                shown,
                Some(language),
                FileOutcome::Skipped {
                    reason: "not valid UTF-8".to_string(),
                },
            ),
        }
    }

    /// Parse and synthesize in-memory source text.
    pub fn analyze_source(&self, path: &str, language: Language, text: &str) -> FileAnalysis {
        if self.settings.disabled_languages.contains(&language) {
            debug!(path, language = language.name(), "language disabled");
            let reason = format!("{} is disabled by configuration", language.name());
            return FileAnalysis::new(path, Some(language), FileOutcome::Disabled { reason });
        }
        let adapter = match self.registry.get(language) {
            Ok(adapter) => adapter,
            Err(e) => {
                debug!(path, error = %e, "unsupported");
                return FileAnalysis::new(path, Some(language), FileOutcome::Unsupported { reason: e.to_string() });
            }
        };

        match adapter.parse(path, text) {
            Ok(source) => {
                let synthesis = self.synthesizer.synthesize(&source);
                debug!(path, units = source.units.len(), scenarios = synthesis.scenarios.len(), "parsed");
                FileAnalysis {
                    path: path.to_string(),
                    language: Some(language),
                    outcome: FileOutcome::Parsed { source },
                    synthesis,
                }
            }
            Err(failure) => {
                warn!(
                    path,
                    regions = failure.regions.len(),
                    recovered = failure.partial.units.len(),
                    "parse failure"
                );
                let synthesis = if self.synthesizer.settings().synthesize_partial {
                    self.synthesizer.synthesize(&failure.partial)
                } else {
                    FileSynthesis::default()
                };
                FileAnalysis {
                    path: path.to_string(),
                    language: Some(language),
                    outcome: FileOutcome::Failed { failure },
                    synthesis,
                }
            }
        }
    }
}

fn unreadable(path: String, e: std::io::Error) -> FileAnalysis {
    warn!(path = %path, error = %e, "unreadable file");
    FileAnalysis::new(path, None, FileOutcome::Skipped {
        reason: format!("unreadable: {e}"),
    })
}
