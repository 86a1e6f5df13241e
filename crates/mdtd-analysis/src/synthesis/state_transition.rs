//! State transition testing for methods that mutate shared instance state.
//!
//! A target qualifies when it writes a field that another instance method
//! of the same type reads or writes. Each chain runs an optional mutator,
//! the target, then an observer reading the shared state.

use crate::model::{CallableUnit, UnitKind, UnitRef};

use super::partitions::nominal_inputs;
use super::strategy::{Draft, ScenarioStrategy, StrategyOutcome, UnitContext};
use super::types::{CallStep, ExpectedOutcome, ScenarioCategory, StepRole};

pub struct StateTransitionStrategy;

impl ScenarioStrategy for StateTransitionStrategy {
    fn category(&self) -> ScenarioCategory {
        ScenarioCategory::StateTransition
    }

    fn synthesize(&self, ctx: &UnitContext<'_>) -> StrategyOutcome {
        let target = ctx.unit;
        let Some(owner) = target.owning_type.as_deref() else {
            return StrategyOutcome::skipped("not a method");
        };
        if !is_instance_method(target) {
            return StrategyOutcome::skipped("not an instance method");
        }

        let peers: Vec<(usize, &CallableUnit)> = ctx
            .source
            .members_of(owner)
            .filter(|(i, u)| *i != ctx.index && is_instance_method(u))
            .collect();
        let shared: Vec<&str> = target
            .writes()
            .filter(|field| peers.iter().any(|(_, u)| u.touches(field)))
            .collect();
        if shared.is_empty() {
            return StrategyOutcome::skipped("writes no field shared with another method");
        }

        let reads_shared = |u: &CallableUnit| shared.iter().any(|f| u.reads(f));
        let writes_shared = |u: &CallableUnit| shared.iter().any(|f| u.writes_field(f));
        // Pure readers make the best observers.
        let mut observers: Vec<(usize, &CallableUnit)> = peers.iter().copied().filter(|(_, u)| reads_shared(u)).collect();
        observers.sort_by_key(|(i, u)| (writes_shared(u), *i));
        let observer = observers.first().copied();
        let mutators: Vec<(usize, &CallableUnit)> = peers
            .iter()
            .copied()
            .filter(|(i, u)| writes_shared(u) && Some(*i) != observer.map(|o| o.0))
            .collect();

        let target_step = step(ctx.index, target, StepRole::Target);
        let observe_step = observer.map(|(i, u)| step(i, u, StepRole::Observe));
        let fields = shared.join(", ");

        let mut chains: Vec<Vec<CallStep>> = Vec::new();
        match &observe_step {
            Some(observe) => chains.push(vec![target_step.clone(), observe.clone()]),
            None => chains.push(vec![
                step(ctx.index, target, StepRole::Setup),
                target_step.clone(),
            ]),
        }
        for (i, mutator) in &mutators {
            let mut chain = vec![step(*i, mutator, StepRole::Setup), target_step.clone()];
            chain.extend(observe_step.clone());
            chains.push(chain);
        }
        chains.truncate(ctx.settings.max_state_chains);

        let inputs = nominal_inputs(target);
        let drafts = chains
            .into_iter()
            .map(|chain| {
                let calls: Vec<&str> = chain.iter().map(|s| s.unit.name.as_str()).collect();
                let description = format!("{} on one instance; {fields} must reflect every call", calls.join(" -> "));
                Draft {
                    description,
                    inputs: inputs.clone(),
                    expected: ExpectedOutcome::Unspecified,
                    call_sequence: chain,
                }
            })
            .collect();
        StrategyOutcome::drafts(drafts)
    }
}

fn is_instance_method(unit: &CallableUnit) -> bool {
    unit.kind != UnitKind::Constructor && !unit.is_static
}

fn step(index: usize, unit: &CallableUnit, role: StepRole) -> CallStep {
    CallStep {
        unit: UnitRef::of(index, unit),
        role,
        inputs: nominal_inputs(unit),
    }
}
