//! Witness search: inputs that make a guard condition hold.

use crate::model::{CallableUnit, Condition, GuardAtom, GuardTest, Parameter, TypeCategory};

use super::evaluation::{evaluate, evaluate_atom, Truth};
use super::partitions::partition;
use super::types::{input, rebind, InputBinding, ScenarioInputs, ScenarioValue};

/// Conjunctions explored per condition.
const MAX_CONJUNCTIONS: usize = 64;
/// Input assignments explored per conjunction.
const MAX_ASSIGNMENTS: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub struct Witness {
    pub inputs: ScenarioInputs,
    /// False when part of the condition is opaque and the inputs only
    /// satisfy the interpretable remainder.
    pub exact: bool,
}

/// Inputs derived from `base` that satisfy `condition`, or `None` when the
/// interpretable part is contradictory.
pub fn satisfy(unit: &CallableUnit, condition: &Condition, base: &ScenarioInputs) -> Option<Witness> {
    satisfy_where(unit, condition, base, |_| true)
}

/// First satisfying inputs that `accept` also admits.
pub fn satisfy_where(
    unit: &CallableUnit,
    condition: &Condition,
    base: &ScenarioInputs,
    mut accept: impl FnMut(&ScenarioInputs) -> bool,
) -> Option<Witness> {
    for (atoms, opaque) in conjunctions(condition) {
        for inputs in assignments(unit, &atoms, base) {
            if !accept(&inputs) {
                continue;
            }
            let exact = !opaque && evaluate(condition, &inputs) == Truth::True;
            return Some(Witness { inputs, exact });
        }
    }
    None
}

/// The condition in disjunctive normal form: atom lists plus whether an
/// opaque term was dropped from the conjunction.
fn conjunctions(condition: &Condition) -> Vec<(Vec<&GuardAtom>, bool)> {
    match condition {
        Condition::Atom(atom) => vec![(vec![atom], false)],
        Condition::Opaque { .. } => vec![(Vec::new(), true)],
        Condition::Any { terms } => {
            let mut out: Vec<_> = terms.iter().flat_map(conjunctions).collect();
            out.truncate(MAX_CONJUNCTIONS);
            out
        }
        Condition::All { terms } => {
            let mut acc: Vec<(Vec<&GuardAtom>, bool)> = vec![(Vec::new(), false)];
            for term in terms {
                let options = conjunctions(term);
                let mut next = Vec::with_capacity(acc.len() * options.len());
                for (atoms, opaque) in &acc {
                    for (more, more_opaque) in &options {
                        let mut merged = atoms.clone();
                        merged.extend(more.iter().copied());
                        next.push((merged, *opaque || *more_opaque));
                        if next.len() >= MAX_CONJUNCTIONS {
                            break;
                        }
                    }
                }
                acc = next;
            }
            acc
        }
    }
}

/// Every combination of per-parameter values satisfying `atoms`, first
/// candidates first, capped at [`MAX_ASSIGNMENTS`].
fn assignments(unit: &CallableUnit, atoms: &[&GuardAtom], base: &ScenarioInputs) -> Vec<ScenarioInputs> {
    let mut out = vec![base.clone()];
    for param in &unit.parameters {
        let own: Vec<&GuardAtom> = atoms.iter().copied().filter(|a| a.param == param.name).collect();
        if own.is_empty() {
            continue;
        }
        let start = input(base, &param.name).cloned();
        let mut values: Vec<ScenarioValue> = Vec::new();
        for value in candidates(unit, param, &own, start) {
            if values.contains(&value) {
                continue;
            }
            let alone = [InputBinding::new(&param.name, value.clone())];
            if own.iter().all(|a| evaluate_atom(a, &alone) == Truth::True) {
                values.push(value);
            }
        }
        if values.is_empty() {
            return Vec::new();
        }
        let mut next = Vec::with_capacity((out.len() * values.len()).min(MAX_ASSIGNMENTS));
        'fill: for inputs in &out {
            for value in &values {
                let mut extended = inputs.clone();
                rebind(&mut extended, &param.name, value.clone());
                next.push(extended);
                if next.len() >= MAX_ASSIGNMENTS {
                    break 'fill;
                }
            }
        }
        out = next;
    }
    out
}

fn candidates(unit: &CallableUnit, param: &Parameter, atoms: &[&GuardAtom], start: Option<ScenarioValue>) -> Vec<ScenarioValue> {
    let mut out: Vec<ScenarioValue> = start.into_iter().collect();
    for atom in atoms {
        match &atom.test {
            GuardTest::Compare { value, .. } => {
                let category = match param.type_category {
                    c if c.is_numeric() => c,
                    _ if value.fract() == 0.0 => TypeCategory::Integer,
                    _ => TypeCategory::FloatingPoint,
                };
                let mut points = vec![*value, value - 1.0, value + 1.0];
                if category == TypeCategory::FloatingPoint {
                    points.extend([value - 0.5, value + 0.5]);
                } else {
                    points.extend([value.floor(), value.ceil()]);
                }
                out.extend(points.into_iter().map(|p| ScenarioValue::number(category, p)));
            }
            GuardTest::EqualsText { value } => {
                out.push(ScenarioValue::Text(value.clone()));
                out.push(ScenarioValue::Text(format!("not_{value}")));
            }
            GuardTest::IsNull => out.push(ScenarioValue::Null),
            GuardTest::IsEmpty => match param.type_category {
                TypeCategory::Collection => out.extend([ScenarioValue::Collection(0), ScenarioValue::Collection(1)]),
                _ => out.extend([ScenarioValue::Text(String::new()), ScenarioValue::Text("hello".into())]),
            },
            GuardTest::IsInstance { categories } => {
                out.extend(categories.iter().filter_map(|c| representative(*c)));
                let outsider = if categories.contains(&TypeCategory::Text) {
                    ScenarioValue::Collection(1)
                } else {
                    ScenarioValue::Text("not a number".into())
                };
                out.push(outsider);
            }
            GuardTest::Truthy => out.extend([
                ScenarioValue::Boolean(true),
                ScenarioValue::Boolean(false),
                ScenarioValue::Integer(0),
                ScenarioValue::Null,
            ]),
        }
    }
    // Class representatives catch what the literal points miss.
    out.extend(partition(unit, param).classes.into_iter().map(|c| c.value));
    out
}

fn representative(category: TypeCategory) -> Option<ScenarioValue> {
    Some(match category {
        TypeCategory::Integer => ScenarioValue::Integer(1),
        TypeCategory::FloatingPoint => ScenarioValue::Float(1.5),
        TypeCategory::Text => ScenarioValue::Text("hello".into()),
        TypeCategory::Boolean => ScenarioValue::Boolean(true),
        TypeCategory::Collection => ScenarioValue::Collection(1),
        TypeCategory::ReferenceType | TypeCategory::Unknown => return None,
    })
}
