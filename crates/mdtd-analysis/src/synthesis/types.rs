//! Scenario types: the output contract handed to downstream generators.

use std::collections::BTreeMap;
use std::fmt;

use mdtd_core::types::collections::SmallVec4;
use serde::{Deserialize, Serialize};

use crate::model::{ErrorSignal, LiteralValue, TypeCategory, UnitRef};

/// The four MDTD heuristics, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioCategory {
    EquivalencePartition,
    BoundaryValue,
    ErrorCondition,
    StateTransition,
}

impl ScenarioCategory {
    pub const ALL: &'static [ScenarioCategory] = &[
        Self::EquivalencePartition,
        Self::BoundaryValue,
        Self::ErrorCondition,
        Self::StateTransition,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::EquivalencePartition => "equivalence_partition",
            Self::BoundaryValue => "boundary_value",
            Self::ErrorCondition => "error_condition",
            Self::StateTransition => "state_transition",
        }
    }

    /// Short code used in scenario ids.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EquivalencePartition => "EP",
            Self::BoundaryValue => "BV",
            Self::ErrorCondition => "EC",
            Self::StateTransition => "ST",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name.trim())
    }
}

impl fmt::Display for ScenarioCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A concrete or symbolic input value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ScenarioValue {
    Integer(i64),
    Float(f64),
    Text(String),
    /// A string of this many characters; kept symbolic to keep output small.
    LongText(usize),
    Boolean(bool),
    /// A collection holding this many elements.
    Collection(usize),
    Null,
    Symbolic(String),
}

impl ScenarioValue {
    pub fn from_literal(literal: &LiteralValue) -> Self {
        match literal {
            LiteralValue::Integer(i) => Self::Integer(*i),
            LiteralValue::Float(f) => Self::Float(*f),
            LiteralValue::Text(s) => Self::Text(s.clone()),
            LiteralValue::Boolean(b) => Self::Boolean(*b),
            LiteralValue::Null => Self::Null,
        }
    }

    /// A numeric value of the given category; integers round toward zero.
    pub fn number(category: TypeCategory, value: f64) -> Self {
        if category == TypeCategory::FloatingPoint {
            Self::Float(value)
        } else {
            Self::Integer(value as i64)
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Category the value belongs to, if it is concrete.
    pub fn category(&self) -> Option<TypeCategory> {
        match self {
            Self::Integer(_) => Some(TypeCategory::Integer),
            Self::Float(_) => Some(TypeCategory::FloatingPoint),
            Self::Text(_) | Self::LongText(_) => Some(TypeCategory::Text),
            Self::Boolean(_) => Some(TypeCategory::Boolean),
            Self::Collection(_) => Some(TypeCategory::Collection),
            Self::Null | Self::Symbolic(_) => None,
        }
    }

    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::Symbolic(_))
    }
}

impl fmt::Display for ScenarioValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v:?}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::LongText(n) => write!(f, "<text of {n} chars>"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Collection(n) => write!(f, "<collection of {n}>"),
            Self::Null => f.write_str("null"),
            Self::Symbolic(d) => write!(f, "<{d}>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputBinding {
    pub name: String,
    pub value: ScenarioValue,
}

impl InputBinding {
    pub fn new(name: impl Into<String>, value: ScenarioValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Parameter bindings in declaration order.
pub type ScenarioInputs = SmallVec4<InputBinding>;

/// Value bound to `name`, if any.
pub fn input<'a>(inputs: &'a [InputBinding], name: &str) -> Option<&'a ScenarioValue> {
    inputs.iter().find(|b| b.name == name).map(|b| &b.value)
}

/// Replace the value bound to `name`.
pub fn rebind(inputs: &mut [InputBinding], name: &str, value: ScenarioValue) {
    if let Some(binding) = inputs.iter_mut().find(|b| b.name == name) {
        binding.value = value;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExpectedOutcome {
    ReturnsValue { value: ScenarioValue },
    RaisesError { signal: ErrorSignal },
    /// The generator has to infer the behaviour.
    Unspecified,
}

impl ExpectedOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::RaisesError { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepRole {
    /// Drives the instance into a state before the target runs.
    Setup,
    Target,
    /// Reads back the state the target left behind.
    Observe,
}

/// One call in a state-transition sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStep {
    pub unit: UnitRef,
    pub role: StepRole,
    pub inputs: ScenarioInputs,
}

/// A single synthesized test scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestScenario {
    /// `<qualified name>@<unit index>:<code>-<nn>`.
    pub id: String,
    pub target: UnitRef,
    pub category: ScenarioCategory,
    pub description: String,
    pub inputs: ScenarioInputs,
    pub expected: ExpectedOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub call_sequence: Vec<CallStep>,
}

impl TestScenario {
    pub fn input(&self, name: &str) -> Option<&ScenarioValue> {
        input(&self.inputs, name)
    }

    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|b| b.name.as_str()).collect()
    }
}

/// What one category produced for one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CategoryOutcome {
    Generated { count: usize },
    /// No heuristic of the category applied. Not an error.
    Skipped { reason: String },
    Disabled,
}

/// Per-unit synthesis report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSynthesis {
    pub unit: UnitRef,
    pub categories: BTreeMap<ScenarioCategory, CategoryOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl UnitSynthesis {
    pub fn outcome(&self, category: ScenarioCategory) -> Option<&CategoryOutcome> {
        self.categories.get(&category)
    }

    pub fn generated(&self, category: ScenarioCategory) -> usize {
        match self.categories.get(&category) {
            Some(CategoryOutcome::Generated { count }) => *count,
            _ => 0,
        }
    }
}

/// Everything synthesized for one source file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSynthesis {
    pub scenarios: Vec<TestScenario>,
    pub units: Vec<UnitSynthesis>,
}

impl FileSynthesis {
    pub fn count(&self, category: ScenarioCategory) -> usize {
        self.scenarios.iter().filter(|s| s.category == category).count()
    }

    pub fn for_unit(&self, index: usize) -> impl Iterator<Item = &TestScenario> {
        self.scenarios.iter().filter(move |s| s.target.index == index)
    }
}
