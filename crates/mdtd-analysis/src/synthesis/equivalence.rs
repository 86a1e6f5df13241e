//! Equivalence partitioning: valid class combinations plus one scenario per
//! invalid class.

use tracing::warn;

use super::oracle::expected_outcome;
use super::pairwise::combine;
use super::partitions::{partition, EquivalenceClass, ParameterClasses};
use super::strategy::{Draft, ScenarioStrategy, StrategyOutcome, UnitContext};
use super::types::{rebind, InputBinding, ScenarioCategory, ScenarioInputs};

pub struct EquivalencePartitionStrategy;

impl ScenarioStrategy for EquivalencePartitionStrategy {
    fn category(&self) -> ScenarioCategory {
        ScenarioCategory::EquivalencePartition
    }

    fn synthesize(&self, ctx: &UnitContext<'_>) -> StrategyOutcome {
        let unit = ctx.unit;
        if unit.parameters.is_empty() {
            let inputs = ScenarioInputs::new();
            let expected = expected_outcome(unit, &inputs);
            return StrategyOutcome::drafts(vec![Draft::new("default call", inputs, expected)]);
        }

        let classes: Vec<ParameterClasses> = unit.parameters.iter().map(|p| partition(unit, p)).collect();
        // A parameter whose every class is invalid still needs a value.
        let choices: Vec<Vec<&EquivalenceClass>> = classes
            .iter()
            .map(|c| match c.valid() {
                v if v.is_empty() => vec![c.nominal()],
                v => v,
            })
            .collect();
        let sizes: Vec<usize> = choices.iter().map(Vec::len).collect();
        let ceiling = ctx.settings.max_combinations_per_unit;
        let combos = combine(&sizes, ceiling);

        let mut warnings = Vec::new();
        if combos.uncovered > 0 {
            warn!(
                unit = %unit.qualified_name(),
                uncovered = combos.uncovered,
                ceiling,
                "pairwise coverage incomplete"
            );
            warnings.push(format!(
                "{} class pairs left uncovered: no pairwise set fits within {ceiling} combinations",
                combos.uncovered
            ));
        }

        let mut drafts = Vec::with_capacity(combos.rows.len());
        for row in &combos.rows {
            let picked: Vec<&EquivalenceClass> = row.iter().zip(&choices).map(|(&i, c)| c[i]).collect();
            let inputs: ScenarioInputs = classes
                .iter()
                .zip(&picked)
                .map(|(pc, class)| InputBinding::new(&pc.name, class.value.clone()))
                .collect();
            let labels: Vec<String> = classes
                .iter()
                .zip(&picked)
                .map(|(pc, class)| format!("{} {}", pc.name, class.label))
                .collect();
            let mut description = if picked.iter().all(|c| c.is_valid()) {
                format!("valid classes: {}", labels.join(", "))
            } else {
                let stuck: Vec<&str> = classes
                    .iter()
                    .zip(&picked)
                    .filter(|(_, class)| !class.is_valid())
                    .map(|(pc, _)| pc.name.as_str())
                    .collect();
                format!("classes with no valid choice for {}: {}", stuck.join(", "), labels.join(", "))
            };
            if combos.pairwise {
                description.push_str(" (pairwise)");
            }
            let expected = expected_outcome(unit, &inputs);
            drafts.push(Draft::new(description, inputs, expected));
        }

        let nominal: ScenarioInputs = classes
            .iter()
            .map(|c| InputBinding::new(&c.name, c.nominal().value.clone()))
            .collect();
        for pc in &classes {
            for class in pc.invalid() {
                let mut inputs = nominal.clone();
                rebind(&mut inputs, &pc.name, class.value.clone());
                let reason = class.invalid.as_deref().unwrap_or_default();
                let description = format!("invalid class: {} {} ({reason})", pc.name, class.label);
                let expected = expected_outcome(unit, &inputs);
                drafts.push(Draft::new(description, inputs, expected));
            }
        }

        StrategyOutcome::Drafts { drafts, warnings }
    }
}
