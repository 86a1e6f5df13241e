//! The four scenario strategies behind one trait.

use crate::model::{CallableUnit, SourceUnit};

use super::boundaries::BoundaryValueStrategy;
use super::equivalence::EquivalencePartitionStrategy;
use super::error_conditions::ErrorConditionStrategy;
use super::settings::SynthesisSettings;
use super::state_transition::StateTransitionStrategy;
use super::types::{CallStep, ExpectedOutcome, ScenarioCategory, ScenarioInputs};

/// What a strategy sees of one unit.
pub struct UnitContext<'a> {
    pub source: &'a SourceUnit,
    pub index: usize,
    pub unit: &'a CallableUnit,
    pub settings: &'a SynthesisSettings,
}

/// A scenario before it is numbered.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub description: String,
    pub inputs: ScenarioInputs,
    pub expected: ExpectedOutcome,
    pub call_sequence: Vec<CallStep>,
}

impl Draft {
    pub fn new(description: impl Into<String>, inputs: ScenarioInputs, expected: ExpectedOutcome) -> Self {
        Self {
            description: description.into(),
            inputs,
            expected,
            call_sequence: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Drafts { drafts: Vec<Draft>, warnings: Vec<String> },
    /// Nothing applies to the unit; the reason is reported.
    Skipped(String),
}

impl StrategyOutcome {
    pub fn drafts(drafts: Vec<Draft>) -> Self {
        StrategyOutcome::Drafts {
            drafts,
            warnings: Vec::new(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        StrategyOutcome::Skipped(reason.into())
    }
}

/// Trait for one MDTD heuristic.
pub trait ScenarioStrategy: Send + Sync {
    fn category(&self) -> ScenarioCategory;

    fn synthesize(&self, ctx: &UnitContext<'_>) -> StrategyOutcome;
}

/// All strategies in emission order.
pub fn all_strategies() -> Vec<Box<dyn ScenarioStrategy>> {
    vec![
        Box::new(EquivalencePartitionStrategy),
        Box::new(BoundaryValueStrategy),
        Box::new(ErrorConditionStrategy),
        Box::new(StateTransitionStrategy),
    ]
}
