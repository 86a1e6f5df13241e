//! Coordinator: from a path to per-file models, scenarios and a summary.

pub mod coordinator;
pub mod types;

pub use coordinator::{AnalysisCoordinator, CoordinatorSettings};
pub use types::{AnalysisRun, FileAnalysis, FileOutcome, RunSummary};
