//! Equivalence classes per parameter.
//!
//! Every parameter gets the classes of its type category. A class is
//! invalid when its representative falls outside the declared range, is
//! null, or alone satisfies an error guard of the unit. Valid classes are
//! combined; invalid ones are tested one at a time against valid peers.
//!
//! Text parameters also get one class per literal they are compared with in
//! a guard, so dispatch on a keyword reaches each of its branches.

use std::borrow::Cow;

use crate::model::{CallableUnit, GuardTest, NumericRange, Parameter, RangeOrigin, SignalGuard, TypeCategory};

use super::evaluation::{evaluate, Truth};
use super::types::{InputBinding, ScenarioInputs, ScenarioValue};

/// Length of the "very long" text representative.
pub const LONG_TEXT_LEN: usize = 10_000;

#[derive(Debug, Clone, PartialEq)]
pub struct EquivalenceClass {
    pub label: Cow<'static, str>,
    pub value: ScenarioValue,
    /// Why the class is invalid; `None` for valid classes.
    pub invalid: Option<String>,
}

impl EquivalenceClass {
    fn valid(label: impl Into<Cow<'static, str>>, value: ScenarioValue) -> Self {
        Self {
            label: label.into(),
            value,
            invalid: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.invalid.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct ParameterClasses {
    pub name: String,
    pub classes: Vec<EquivalenceClass>,
    nominal: usize,
}

impl ParameterClasses {
    pub fn valid(&self) -> Vec<&EquivalenceClass> {
        self.classes.iter().filter(|c| c.is_valid()).collect()
    }

    pub fn invalid(&self) -> impl Iterator<Item = &EquivalenceClass> {
        self.classes.iter().filter(|c| !c.is_valid())
    }

    /// The value used for this parameter when another one is under test.
    pub fn nominal(&self) -> &EquivalenceClass {
        &self.classes[self.nominal]
    }
}

pub fn partition(unit: &CallableUnit, param: &Parameter) -> ParameterClasses {
    let mut classes = match param.type_category {
        TypeCategory::Integer | TypeCategory::FloatingPoint => numeric_classes(param),
        TypeCategory::Text => {
            let mut classes = vec![
                EquivalenceClass::valid("empty", ScenarioValue::Text(String::new())),
                EquivalenceClass::valid("non-empty", ScenarioValue::Text("hello".to_string())),
                EquivalenceClass::valid("very long", ScenarioValue::LongText(LONG_TEXT_LEN)),
            ];
            for literal in compared_literals(unit, &param.name) {
                let value = ScenarioValue::Text(literal);
                if classes.iter().all(|c| c.value != value) {
                    classes.push(EquivalenceClass::valid(format!("= {value}"), value));
                }
            }
            classes
        }
        TypeCategory::Boolean => vec![
            EquivalenceClass::valid("true", ScenarioValue::Boolean(true)),
            EquivalenceClass::valid("false", ScenarioValue::Boolean(false)),
        ],
        TypeCategory::Collection => vec![
            EquivalenceClass::valid("empty", ScenarioValue::Collection(0)),
            EquivalenceClass::valid("singleton", ScenarioValue::Collection(1)),
            EquivalenceClass::valid("many", ScenarioValue::Collection(5)),
        ],
        TypeCategory::ReferenceType => {
            let ty = param.declared_type.as_deref().unwrap_or("object");
            vec![EquivalenceClass::valid(
                "instance",
                ScenarioValue::Symbolic(format!("valid {ty} instance")),
            )]
        }
        TypeCategory::Unknown => vec![EquivalenceClass::valid(
            "any",
            ScenarioValue::Symbolic("value of unknown type".to_string()),
        )],
    };
    if param.nullable {
        classes.push(EquivalenceClass {
            label: "null".into(),
            value: ScenarioValue::Null,
            invalid: Some("null input".to_string()),
        });
    }

    for class in classes.iter_mut().filter(|c| c.is_valid()) {
        class.invalid = guard_violation(unit, &param.name, &class.value);
    }

    let preference: &[&str] = &["positive", "non-empty", "singleton", "true", "instance", "any", "zero", "many", "negative"];
    let nominal = preference
        .iter()
        .find_map(|label| classes.iter().position(|c| c.label == *label && c.is_valid()))
        .or_else(|| classes.iter().position(EquivalenceClass::is_valid))
        .unwrap_or(0);

    ParameterClasses {
        name: param.name.clone(),
        classes,
        nominal,
    }
}

/// Nominal bindings for every parameter of `unit`.
pub fn nominal_inputs(unit: &CallableUnit) -> ScenarioInputs {
    unit.parameters
        .iter()
        .map(|p| {
            let classes = partition(unit, p);
            InputBinding::new(&p.name, classes.nominal().value.clone())
        })
        .collect()
}

fn numeric_classes(param: &Parameter) -> Vec<EquivalenceClass> {
    let float = param.type_category == TypeCategory::FloatingPoint;
    let (step, representatives): (f64, [f64; 3]) = if float {
        (0.01, [-3.14, 0.0, 3.14])
    } else {
        (1.0, [-10.0, 0.0, 10.0])
    };
    let spans = [
        ("negative", f64::NEG_INFINITY, -step),
        ("zero", 0.0, 0.0),
        ("positive", step, f64::INFINITY),
    ];
    let range = param.declared_range.unwrap_or_default();
    let lo = range.min.map_or(f64::NEG_INFINITY, |b| b.value);
    let hi = range.max.map_or(f64::INFINITY, |b| b.value);

    let mut out = Vec::with_capacity(3);
    for ((label, from, to), rep) in spans.into_iter().zip(representatives) {
        let (inner_lo, inner_hi) = (from.max(lo), to.min(hi));
        if inner_lo <= inner_hi {
            let value = rep.clamp(inner_lo, inner_hi);
            out.push(EquivalenceClass::valid(label, ScenarioValue::number(param.type_category, value)));
            continue;
        }
        let excluded_by = if to < lo { range.min } else { range.max };
        if excluded_by.is_some_and(|b| b.origin == RangeOrigin::TypeWidth) {
            // Not representable in the declared type.
            continue;
        }
        out.push(EquivalenceClass {
            label: label.into(),
            value: ScenarioValue::number(param.type_category, rep),
            invalid: Some(format!("outside declared range {}", describe_range(&range))),
        });
    }
    out
}

/// Text literals `param` is tested for equality with, in guard order.
fn compared_literals(unit: &CallableUnit, param: &str) -> Vec<String> {
    let signal_guards = unit.error_signals.iter().filter_map(|s| s.guard.condition());
    let return_guards = unit.early_returns.iter().map(|r| &r.guard);
    let mut out: Vec<String> = Vec::new();
    for condition in signal_guards.chain(return_guards) {
        for atom in condition.atoms().into_iter().filter(|a| a.param == param) {
            if let GuardTest::EqualsText { value } = &atom.test {
                if !out.contains(value) {
                    out.push(value.clone());
                }
            }
        }
    }
    out
}

/// Reason the value alone fires an error guard of the unit.
fn guard_violation(unit: &CallableUnit, param: &str, value: &ScenarioValue) -> Option<String> {
    let bindings = [InputBinding::new(param, value.clone())];
    for signal in &unit.error_signals {
        let SignalGuard::Condition { condition } = &signal.guard else {
            continue;
        };
        for disjunct in condition.disjuncts() {
            if disjunct.has_opaque() || disjunct.params() != [param] {
                continue;
            }
            if evaluate(disjunct, &bindings) == Truth::True {
                return Some(format!("{} when {}", signal.name, disjunct));
            }
        }
    }
    None
}

pub fn describe_range(range: &NumericRange) -> String {
    let side = |b: Option<f64>, inf: &str| b.map_or(inf.to_string(), |v| v.to_string());
    format!(
        "[{}, {}]",
        side(range.min.map(|b| b.value), "-inf"),
        side(range.max.map(|b| b.value), "inf")
    )
}
