//! Expected outcomes from the unit's guarded exits.
//!
//! Exits are visited in source order. The first one whose guard holds
//! decides the outcome; a guard that cannot be decided makes the whole
//! outcome `Unspecified`, since an earlier exit might have fired.

use crate::model::{CallableUnit, EarlyReturn, ErrorSignal, SignalGuard, SignalKind};

use super::evaluation::{evaluate, Truth};
use super::types::{ExpectedOutcome, InputBinding, ScenarioValue};

enum Exit<'a> {
    Signal(&'a ErrorSignal),
    Return(&'a EarlyReturn),
}

impl Exit<'_> {
    fn line(&self) -> u32 {
        match self {
            Exit::Signal(s) => s.line,
            Exit::Return(r) => r.line,
        }
    }
}

pub fn expected_outcome(unit: &CallableUnit, inputs: &[InputBinding]) -> ExpectedOutcome {
    let mut exits: Vec<Exit<'_>> = unit
        .error_signals
        .iter()
        .filter(|s| s.kind != SignalKind::Declared)
        .map(Exit::Signal)
        .chain(unit.early_returns.iter().map(Exit::Return))
        .collect();
    exits.sort_by_key(Exit::line);

    for exit in exits {
        match exit {
            Exit::Signal(signal) => match &signal.guard {
                SignalGuard::Unconditional => return raises(signal),
                SignalGuard::Undetermined => return ExpectedOutcome::Unspecified,
                SignalGuard::Condition { condition } => match evaluate(condition, inputs) {
                    Truth::True => return raises(signal),
                    Truth::False => {}
                    Truth::Unknown => return ExpectedOutcome::Unspecified,
                },
            },
            Exit::Return(early) => match evaluate(&early.guard, inputs) {
                Truth::True => {
                    let value = match &early.value {
                        Some(literal) => ScenarioValue::from_literal(literal),
                        None if unit.return_type.is_none() => completes(),
                        None => ScenarioValue::Symbolic(format!("value returned at line {}", early.line)),
                    };
                    return ExpectedOutcome::ReturnsValue { value };
                }
                Truth::False => {}
                Truth::Unknown => return ExpectedOutcome::Unspecified,
            },
        }
    }

    let value = match unit.return_type {
        None => completes(),
        Some(category) => ScenarioValue::Symbolic(format!("computed {} result", category.label())),
    };
    ExpectedOutcome::ReturnsValue { value }
}

fn raises(signal: &ErrorSignal) -> ExpectedOutcome {
    ExpectedOutcome::RaisesError {
        signal: signal.clone(),
    }
}

fn completes() -> ScenarioValue {
    ScenarioValue::Symbolic("completes".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{JavaAdapter, LanguageAdapter, PythonAdapter};
    use crate::synthesis::types::InputBinding as B;

    const PY: &str = r#"
def grade(score: int) -> str:
    if score < 0:
        raise ValueError("negative")
    if score >= 90:
        return "A"
    return "B"

def opaque(x: int) -> int:
    if helper(x):
        raise RuntimeError("nope")
    return x
"#;

    fn py(name: &str) -> CallableUnit {
        PythonAdapter.parse("o.py", PY).unwrap().find(name).unwrap().clone()
    }

    #[test]
    fn first_satisfied_exit_wins() {
        let u = py("grade");
        let raised = expected_outcome(&u, &[B::new("score", ScenarioValue::Integer(-1))]);
        assert!(matches!(raised, ExpectedOutcome::RaisesError { ref signal } if signal.name == "ValueError"));
        let a = expected_outcome(&u, &[B::new("score", ScenarioValue::Integer(95))]);
        assert_eq!(a, ExpectedOutcome::ReturnsValue { value: ScenarioValue::Text("A".into()) });
        let b = expected_outcome(&u, &[B::new("score", ScenarioValue::Integer(50))]);
        assert!(matches!(b, ExpectedOutcome::ReturnsValue { value: ScenarioValue::Symbolic(_) }));
    }

    #[test]
    fn opaque_guards_leave_outcome_open() {
        let u = py("opaque");
        let out = expected_outcome(&u, &[B::new("x", ScenarioValue::Integer(3))]);
        assert_eq!(out, ExpectedOutcome::Unspecified);
    }

    #[test]
    fn void_units_complete() {
        let src = "class Counter { private int n; public void reset() { n = 0; } }";
        let unit = JavaAdapter.parse("Counter.java", src).unwrap().find("Counter.reset").unwrap().clone();
        assert_eq!(
            expected_outcome(&unit, &[]),
            ExpectedOutcome::ReturnsValue { value: completes() }
        );
    }
}
