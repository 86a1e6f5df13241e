//! mdtd-analysis: from source files to model-driven test scenarios.
//!
//! The pipeline has three stages:
//! 1. `parsers`: one [`parsers::LanguageAdapter`] per language turns source
//!    text into a language-neutral [`model::SourceUnit`].
//! 2. `synthesis`: the [`synthesis::ScenarioSynthesizer`] derives
//!    equivalence-partition, boundary-value, error-condition and
//!    state-transition scenarios per callable unit.
//! 3. `pipeline`: the [`pipeline::AnalysisCoordinator`] walks a path, fans
//!    files out over rayon and assembles the per-file results.

pub mod guards;
pub mod model;
pub mod parsers;
pub mod pipeline;
pub mod scanner;
pub mod synthesis;

pub use model::{CallableUnit, ParseFailure, SourceUnit};
pub use pipeline::{AnalysisCoordinator, AnalysisRun, FileAnalysis, FileOutcome, RunSummary};
pub use scanner::Language;
pub use synthesis::{ScenarioCategory, ScenarioSynthesizer, TestScenario};
