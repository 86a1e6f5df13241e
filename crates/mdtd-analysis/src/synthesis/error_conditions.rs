//! Error condition testing: one scenario per way each error signal fires.

use crate::model::{CallableUnit, Condition, ErrorSignal, SignalGuard, SignalKind};

use super::evaluation::{evaluate, Truth};
use super::oracle::expected_outcome;
use super::partitions::nominal_inputs;
use super::strategy::{Draft, ScenarioStrategy, StrategyOutcome, UnitContext};
use super::types::{ExpectedOutcome, ScenarioCategory, ScenarioInputs};
use super::witness::{satisfy, satisfy_where, Witness};

pub struct ErrorConditionStrategy;

impl ScenarioStrategy for ErrorConditionStrategy {
    fn category(&self) -> ScenarioCategory {
        ScenarioCategory::ErrorCondition
    }

    fn synthesize(&self, ctx: &UnitContext<'_>) -> StrategyOutcome {
        let unit = ctx.unit;
        if unit.error_signals.is_empty() {
            return StrategyOutcome::skipped("no error signals");
        }
        let nominal = nominal_inputs(unit);
        let mut drafts: Vec<Draft> = Vec::new();

        for signal in &unit.error_signals {
            let expected = ExpectedOutcome::RaisesError {
                signal: signal.clone(),
            };
            let mut push = |description: String, inputs, expected: &ExpectedOutcome| {
                let draft = Draft::new(description, inputs, expected.clone());
                if !drafts.contains(&draft) {
                    drafts.push(draft);
                }
            };
            match &signal.guard {
                SignalGuard::Condition { condition } => {
                    let mut found = false;
                    for disjunct in condition.disjuncts() {
                        let Some((witness, reached)) = witness_for(unit, signal, disjunct, &nominal) else {
                            continue;
                        };
                        found = true;
                        let Witness { inputs, exact } = witness;
                        let mut description = format!("{} when {}", signal.name, disjunct);
                        if !exact {
                            description.push_str("; uninterpreted parts of the guard must also hold");
                        }
                        if reached {
                            push(description, inputs, &expected);
                        } else {
                            // Every satisfying input leaves through an earlier exit.
                            description.push_str(" (shadowed by an earlier exit)");
                            let outcome = expected_outcome(unit, &inputs);
                            push(description, inputs, &outcome);
                        }
                    }
                    if !found {
                        push(
                            format!("{} when {} (no inputs satisfy the guard)", signal.name, condition),
                            nominal.clone(),
                            &expected,
                        );
                    }
                }
                SignalGuard::Unconditional => push(format!("{} on every call", signal.name), nominal.clone(), &expected),
                SignalGuard::Undetermined if signal.kind == SignalKind::Declared => {
                    push(format!("{} declared in the signature", signal.name), nominal.clone(), &expected)
                }
                SignalGuard::Undetermined => push(
                    format!("{} under conditions not derivable from the inputs", signal.name),
                    nominal.clone(),
                    &expected,
                ),
            }
        }
        StrategyOutcome::drafts(drafts)
    }
}

/// Inputs satisfying `disjunct`, preferring ones the oracle confirms end in
/// `signal`, then undecidable ones. The flag is false when every satisfying
/// input is caught by an earlier exit.
fn witness_for(
    unit: &CallableUnit,
    signal: &ErrorSignal,
    disjunct: &Condition,
    nominal: &ScenarioInputs,
) -> Option<(Witness, bool)> {
    let confirmed = |i: &ScenarioInputs| reaches(unit, signal, i) == Some(true);
    if let Some(w) = satisfy_where(unit, disjunct, nominal, confirmed) {
        return Some((w, true));
    }
    if let Some(escape) = earlier_exits_skipped(unit, signal) {
        let guarded = Condition::all(vec![disjunct.clone(), escape]);
        if let Some(w) = satisfy_where(unit, &guarded, nominal, confirmed) {
            let exact = !disjunct.has_opaque() && evaluate(disjunct, &w.inputs) == Truth::True;
            return Some((Witness { exact, ..w }, true));
        }
    }
    satisfy_where(unit, disjunct, nominal, |i| reaches(unit, signal, i).is_none())
        .map(|w| (w, true))
        .or_else(|| satisfy(unit, disjunct, nominal).map(|w| (w, false)))
}

/// Condition under which every exit before `signal` is passed over, or
/// `None` when one of them always fires or cannot be interpreted.
fn earlier_exits_skipped(unit: &CallableUnit, signal: &ErrorSignal) -> Option<Condition> {
    let mut terms = Vec::new();
    for other in unit.error_signals.iter().filter(|s| s.line < signal.line && s.kind != SignalKind::Declared) {
        match &other.guard {
            SignalGuard::Condition { condition } => terms.push(condition.negate()),
            SignalGuard::Unconditional | SignalGuard::Undetermined => return None,
        }
    }
    terms.extend(
        unit.early_returns
            .iter()
            .filter(|r| r.line < signal.line)
            .map(|r| r.guard.negate()),
    );
    if terms.is_empty() {
        return None;
    }
    Some(Condition::all(terms))
}

/// Whether `inputs` end in `signal`: `None` when the outcome is undecidable.
fn reaches(unit: &CallableUnit, signal: &ErrorSignal, inputs: &ScenarioInputs) -> Option<bool> {
    match expected_outcome(unit, inputs) {
        ExpectedOutcome::RaisesError { signal: raised } => Some(raised == *signal),
        ExpectedOutcome::Unspecified => None,
        _ => Some(false),
    }
}
