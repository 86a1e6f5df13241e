//! Callable units and everything the synthesizer needs to know about them.

use std::collections::BTreeSet;
use std::fmt;

use mdtd_core::types::collections::SmallVec4;
use serde::{Deserialize, Serialize};

use super::{Condition, NumericRange, TypeCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Function,
    Method,
    Constructor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlFlowHint {
    HasLoop,
    HasConditional,
    HasRecursion,
    HasEarlyReturn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub type_category: TypeCategory,
    /// Declared type text, when the language has one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_type: Option<String>,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub declared_range: Option<NumericRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub variadic: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, type_category: TypeCategory) -> Self {
        Self {
            name: name.into(),
            type_category,
            declared_type: None,
            nullable: false,
            declared_range: None,
            default_value: None,
            variadic: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// `throw`, `raise`, `panic`.
    Throw,
    /// An error value handed back to the caller (`return Err(..)`, `return -1`).
    ErrorReturn,
    /// A failing assertion.
    Assertion,
    /// Listed in the signature (`throws X`) with no raise site in the body.
    Declared,
}

/// When an error signal fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum SignalGuard {
    /// Fires exactly when the condition holds.
    Condition { condition: Condition },
    /// Fires on every call that reaches it.
    Unconditional,
    /// Depends on something other than the inputs (a caught error, a loop
    /// iteration, a switch arm).
    Undetermined,
}

impl SignalGuard {
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            SignalGuard::Condition { condition } => Some(condition),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorSignal {
    pub kind: SignalKind,
    /// Exception type, error value or assertion label.
    pub name: String,
    pub guard: SignalGuard,
    pub line: u32,
}

/// Literal values found in source: returned constants and guard operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum LiteralValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Null,
}

impl fmt::Display for LiteralValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LiteralValue::Integer(i) => write!(f, "{i}"),
            LiteralValue::Float(v) => write!(f, "{v}"),
            LiteralValue::Text(s) => write!(f, "\"{s}\""),
            LiteralValue::Boolean(b) => write!(f, "{b}"),
            LiteralValue::Null => f.write_str("null"),
        }
    }
}

/// A guarded `return <expr>` ahead of the main path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarlyReturn {
    pub guard: Condition,
    /// The returned literal, if the expression was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<LiteralValue>,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessMode {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldAccess {
    pub field: String,
    pub mode: AccessMode,
}

/// A function, method or constructor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallableUnit {
    pub name: String,
    pub kind: UnitKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owning_type: Option<String>,
    pub parameters: SmallVec4<Parameter>,
    /// `None` when the unit returns nothing.
    pub return_type: Option<TypeCategory>,
    pub error_signals: Vec<ErrorSignal>,
    pub early_returns: Vec<EarlyReturn>,
    pub control_flow_hints: BTreeSet<ControlFlowHint>,
    pub field_accesses: BTreeSet<FieldAccess>,
    pub visibility: Visibility,
    pub is_static: bool,
    pub is_async: bool,
    pub complexity: u32,
    pub line: u32,
    pub end_line: u32,
}

impl CallableUnit {
    /// `Type.name` for members, `name` otherwise.
    pub fn qualified_name(&self) -> String {
        match &self.owning_type {
            Some(owner) => format!("{owner}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Human-readable signature such as `Calculator.divide(a: double, b: double)`.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .parameters
            .iter()
            .map(|p| {
                let ty = p.declared_type.as_deref().unwrap_or(p.type_category.label());
                format!("{}: {}", p.name, ty)
            })
            .collect();
        format!("{}({})", self.qualified_name(), params.join(", "))
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn has_hint(&self, hint: ControlFlowHint) -> bool {
        self.control_flow_hints.contains(&hint)
    }

    pub fn writes(&self) -> impl Iterator<Item = &str> {
        self.field_accesses
            .iter()
            .filter(|a| a.mode == AccessMode::Write)
            .map(|a| a.field.as_str())
    }

    pub fn touches(&self, field: &str) -> bool {
        self.field_accesses.iter().any(|a| a.field == field)
    }

    pub fn reads(&self, field: &str) -> bool {
        self.field_accesses
            .iter()
            .any(|a| a.field == field && a.mode == AccessMode::Read)
    }

    pub fn writes_field(&self, field: &str) -> bool {
        self.field_accesses
            .iter()
            .any(|a| a.field == field && a.mode == AccessMode::Write)
    }
}

/// Stable reference from a scenario back to its unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRef {
    /// Position of the unit in its `SourceUnit`.
    pub index: usize,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owning_type: Option<String>,
    pub signature: String,
}

impl UnitRef {
    pub fn of(index: usize, unit: &CallableUnit) -> Self {
        Self {
            index,
            name: unit.name.clone(),
            owning_type: unit.owning_type.clone(),
            signature: unit.signature(),
        }
    }

    pub fn qualified_name(&self) -> String {
        match &self.owning_type {
            Some(owner) => format!("{owner}.{}", self.name),
            None => self.name.clone(),
        }
    }
}
