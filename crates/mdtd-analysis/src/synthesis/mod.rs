//! Scenario synthesis: MDTD heuristics over the unified model.
//!
//! For every unit the four strategies run in a fixed order (equivalence
//! partitioning, boundary values, error conditions, state transitions).
//! Scenario ids are numbered per unit and category in emission order, so
//! the same model and settings always give the same output.

pub mod boundaries;
pub mod equivalence;
pub mod error_conditions;
pub mod evaluation;
pub mod oracle;
pub mod pairwise;
pub mod partitions;
pub mod settings;
pub mod state_transition;
pub mod strategy;
pub mod types;
pub mod witness;

use std::collections::BTreeMap;

use tracing::debug;

use crate::model::{SourceUnit, UnitRef};

pub use settings::SynthesisSettings;
pub use strategy::{all_strategies, ScenarioStrategy, StrategyOutcome};
pub use types::{
    CallStep, CategoryOutcome, ExpectedOutcome, FileSynthesis, InputBinding, ScenarioCategory,
    ScenarioInputs, ScenarioValue, StepRole, TestScenario, UnitSynthesis,
};

use strategy::UnitContext;

pub struct ScenarioSynthesizer {
    settings: SynthesisSettings,
    strategies: Vec<Box<dyn ScenarioStrategy>>,
}

impl Default for ScenarioSynthesizer {
    fn default() -> Self {
        Self::new(SynthesisSettings::default())
    }
}

impl ScenarioSynthesizer {
    pub fn new(settings: SynthesisSettings) -> Self {
        Self {
            settings,
            strategies: all_strategies(),
        }
    }

    pub fn settings(&self) -> &SynthesisSettings {
        &self.settings
    }

    /// Scenarios for every unit of `source`, units in declaration order.
    pub fn synthesize(&self, source: &SourceUnit) -> FileSynthesis {
        let mut out = FileSynthesis::default();
        for (index, unit) in source.units.iter().enumerate() {
            let target = UnitRef::of(index, unit);
            let qualified = target.qualified_name();
            let ctx = UnitContext {
                source,
                index,
                unit,
                settings: &self.settings,
            };
            let mut report = UnitSynthesis {
                unit: target.clone(),
                categories: BTreeMap::new(),
                warnings: Vec::new(),
            };

            for strategy in &self.strategies {
                let category = strategy.category();
                if !self.settings.is_enabled(category) {
                    report.categories.insert(category, CategoryOutcome::Disabled);
                    continue;
                }
                let outcome = match strategy.synthesize(&ctx) {
                    StrategyOutcome::Skipped(reason) => CategoryOutcome::Skipped { reason },
                    StrategyOutcome::Drafts { drafts, warnings } => {
                        report.warnings.extend(warnings);
                        let count = drafts.len();
                        for (n, draft) in drafts.into_iter().enumerate() {
                            out.scenarios.push(TestScenario {
                                id: format!("{qualified}@{index}:{}-{:02}", category.code(), n + 1),
                                target: target.clone(),
                                category,
                                description: draft.description,
                                inputs: draft.inputs,
                                expected: draft.expected,
                                call_sequence: draft.call_sequence,
                            });
                        }
                        if count == 0 {
                            CategoryOutcome::Skipped {
                                reason: "no applicable scenarios".to_string(),
                            }
                        } else {
                            CategoryOutcome::Generated { count }
                        }
                    }
                };
                report.categories.insert(category, outcome);
            }
            debug!(unit = %qualified, scenarios = out.for_unit(index).count(), "unit synthesized");
            out.units.push(report);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsers::{JavaAdapter, LanguageAdapter, PythonAdapter};

    const CALCULATOR: &str = r#"
public class Calculator {
    private double result;

    public Calculator() {
        result = 0;
    }

    public double add(double value) {
        result += value;
        return result;
    }

    public double divide(double a, double b) {
        if (b == 0) {
            throw new ArithmeticException("Division by zero");
        }
        return a / b;
    }

    public double getResult() {
        return result;
    }
}
"#;

    fn calculator() -> (SourceUnit, FileSynthesis) {
        let source = JavaAdapter.parse("Calculator.java", CALCULATOR).unwrap();
        let synthesis = ScenarioSynthesizer::default().synthesize(&source);
        (source, synthesis)
    }

    fn index_of(source: &SourceUnit, qualified: &str) -> usize {
        source.units.iter().position(|u| u.qualified_name() == qualified).unwrap()
    }

    #[test]
    fn zero_argument_getter_gets_one_default_call() {
        let (source, synthesis) = calculator();
        let idx = index_of(&source, "Calculator.getResult");
        let scenarios: Vec<&TestScenario> = synthesis.for_unit(idx).collect();
        assert_eq!(scenarios.len(), 1);
        assert_eq!(scenarios[0].category, ScenarioCategory::EquivalencePartition);
        assert!(scenarios[0].inputs.is_empty());
        assert!(matches!(
            scenarios[0].expected,
            ExpectedOutcome::ReturnsValue { value: ScenarioValue::Symbolic(_) }
        ));
        let report = &synthesis.units[idx];
        assert!(matches!(
            report.outcome(ScenarioCategory::BoundaryValue),
            Some(CategoryOutcome::Skipped { .. })
        ));
        assert!(matches!(
            report.outcome(ScenarioCategory::ErrorCondition),
            Some(CategoryOutcome::Skipped { .. })
        ));
    }

    #[test]
    fn divide_by_zero_raises_and_neighbours_return() {
        let (source, synthesis) = calculator();
        let idx = index_of(&source, "Calculator.divide");
        let scenarios: Vec<&TestScenario> = synthesis.for_unit(idx).collect();

        let error = scenarios
            .iter()
            .find(|s| s.category == ScenarioCategory::ErrorCondition)
            .unwrap();
        assert_eq!(error.input("b"), Some(&ScenarioValue::Float(0.0)));
        assert!(error.input("a").and_then(ScenarioValue::as_f64).is_some_and(f64::is_finite));
        assert!(matches!(
            &error.expected,
            ExpectedOutcome::RaisesError { signal } if signal.name == "ArithmeticException"
        ));

        for v in [-1.0, 1.0] {
            let bv = scenarios
                .iter()
                .find(|s| {
                    s.category == ScenarioCategory::BoundaryValue
                        && s.input("b") == Some(&ScenarioValue::Float(v))
                })
                .unwrap();
            assert!(matches!(
                bv.expected,
                ExpectedOutcome::ReturnsValue { value: ScenarioValue::Symbolic(_) }
            ));
        }
    }

    #[test]
    fn categories_are_emitted_in_order_with_stable_ids() {
        let (source, synthesis) = calculator();
        let idx = index_of(&source, "Calculator.divide");
        let categories: Vec<ScenarioCategory> = synthesis.for_unit(idx).map(|s| s.category).collect();
        let mut sorted = categories.clone();
        sorted.sort();
        assert_eq!(categories, sorted);
        let first = synthesis.for_unit(idx).next().unwrap();
        assert_eq!(first.id, format!("Calculator.divide@{idx}:EP-01"));
    }

    #[test]
    fn mutators_get_state_chains_and_readers_do_not() {
        let (source, synthesis) = calculator();
        let add = index_of(&source, "Calculator.add");
        let chain = synthesis
            .for_unit(add)
            .find(|s| s.category == ScenarioCategory::StateTransition)
            .unwrap();
        let calls: Vec<&str> = chain.call_sequence.iter().map(|s| s.unit.name.as_str()).collect();
        assert_eq!(calls, ["add", "getResult"]);
        assert_eq!(chain.expected, ExpectedOutcome::Unspecified);

        let getter = index_of(&source, "Calculator.getResult");
        assert_eq!(synthesis.units[getter].generated(ScenarioCategory::StateTransition), 0);
    }

    #[test]
    fn disabled_categories_are_reported() {
        let source = JavaAdapter.parse("Calculator.java", CALCULATOR).unwrap();
        let settings = SynthesisSettings::default().with_categories(&[ScenarioCategory::ErrorCondition]);
        let synthesis = ScenarioSynthesizer::new(settings).synthesize(&source);
        assert!(synthesis
            .scenarios
            .iter()
            .all(|s| s.category == ScenarioCategory::ErrorCondition));
        assert_eq!(
            synthesis.units[0].outcome(ScenarioCategory::EquivalencePartition),
            Some(&CategoryOutcome::Disabled)
        );
    }

    #[test]
    fn every_scenario_binds_exactly_the_parameters() {
        let src = r#"
def configure(host: str, port: int, secure: bool = False, retries=3, tags=None):
    if port < 1 or port > 65535:
        raise ValueError("port")
    if not host:
        raise ValueError("host")
    return host
"#;
        let source = PythonAdapter.parse("cfg.py", src).unwrap();
        let synthesis = ScenarioSynthesizer::default().synthesize(&source);
        let unit = &source.units[0];
        let names: Vec<&str> = unit.parameters.iter().map(|p| p.name.as_str()).collect();
        assert!(!synthesis.scenarios.is_empty());
        for s in &synthesis.scenarios {
            assert_eq!(s.input_names(), names, "{}", s.id);
        }
    }

    #[test]
    fn wide_signatures_go_pairwise_under_the_ceiling() {
        let src = "def wide(a: int, b: int, c: int, d: int, e: int, f: int):\n    return a\n";
        let source = PythonAdapter.parse("wide.py", src).unwrap();
        let ep = |synthesis: &FileSynthesis| synthesis.count(ScenarioCategory::EquivalencePartition);

        let roomy = ScenarioSynthesizer::default().synthesize(&source);
        assert_eq!(ep(&roomy), 18);
        assert!(roomy.scenarios[0].description.ends_with("(pairwise)"));
        assert!(roomy.units[0].warnings.is_empty());

        let tight = ScenarioSynthesizer::new(SynthesisSettings::default().with_ceiling(16)).synthesize(&source);
        assert_eq!(ep(&tight), 16);
        assert!(tight.units[0].warnings.is_empty());
        let names = ["a", "b", "c", "d", "e", "f"];
        let rows: Vec<Vec<String>> = tight
            .scenarios
            .iter()
            .filter(|s| s.category == ScenarioCategory::EquivalencePartition)
            .map(|s| s.inputs.iter().map(|b| format!("{:?}", b.value)).collect())
            .collect();
        for i in 0..names.len() {
            for j in i + 1..names.len() {
                let mut seen: Vec<(&str, &str)> = rows.iter().map(|row| (row[i].as_str(), row[j].as_str())).collect();
                seen.sort();
                seen.dedup();
                assert_eq!(seen.len(), 9, "pairs of {} and {}", names[i], names[j]);
            }
        }
    }
}
