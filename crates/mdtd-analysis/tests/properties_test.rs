//! Property tests over generated signatures and combination sizes.

use mdtd_analysis::parsers::{LanguageAdapter, PythonAdapter};
use mdtd_analysis::synthesis::evaluation::{evaluate, Truth};
use mdtd_analysis::synthesis::pairwise::{combine, covers_all_pairs};
use mdtd_analysis::synthesis::{ExpectedOutcome, ScenarioCategory, ScenarioSynthesizer, SynthesisSettings};
use mdtd_analysis::model::SignalGuard;
use proptest::prelude::*;

const TYPES: &[&str] = &["int", "float", "str", "bool", "list", "dict"];

#[derive(Debug, Clone)]
struct Param {
    ty: usize,
    guard: Option<i64>,
}

fn arb_param() -> impl Strategy<Value = Param> {
    (0..TYPES.len(), proptest::option::of(-50i64..50)).prop_map(|(ty, guard)| Param { ty, guard })
}

/// A Python function with typed parameters and a `raise` per numeric guard.
fn render(params: &[Param]) -> String {
    let sig: Vec<String> = params
        .iter()
        .enumerate()
        .map(|(i, p)| format!("p{i}: {}", TYPES[p.ty]))
        .collect();
    let mut body = String::new();
    for (i, p) in params.iter().enumerate() {
        if let (Some(c), 0 | 1) = (p.guard, p.ty) {
            body.push_str(&format!("    if p{i} < {c}:\n        raise ValueError('p{i}')\n"));
        }
    }
    body.push_str("    return None\n");
    format!("def target({}):\n{body}", sig.join(", "))
}

fn arb_settings() -> impl Strategy<Value = SynthesisSettings> {
    (16usize..64).prop_map(|ceiling| SynthesisSettings::default().with_ceiling(ceiling))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn every_scenario_binds_every_parameter(params in prop::collection::vec(arb_param(), 0..7)) {
        let source = PythonAdapter.parse("gen.py", &render(&params)).unwrap();
        let synthesis = ScenarioSynthesizer::default().synthesize(&source);
        let expected: Vec<String> = (0..params.len()).map(|i| format!("p{i}")).collect();
        prop_assert!(!synthesis.scenarios.is_empty());
        for s in &synthesis.scenarios {
            prop_assert_eq!(s.input_names(), expected.iter().map(String::as_str).collect::<Vec<_>>());
        }
    }

    #[test]
    fn synthesis_is_a_pure_function_of_the_source(
        params in prop::collection::vec(arb_param(), 0..7),
        settings in arb_settings(),
    ) {
        let source = PythonAdapter.parse("gen.py", &render(&params)).unwrap();
        let a = ScenarioSynthesizer::new(settings.clone()).synthesize(&source);
        let b = ScenarioSynthesizer::new(settings).synthesize(&source);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn valid_combinations_respect_the_ceiling(
        params in prop::collection::vec(arb_param(), 1..9),
        settings in arb_settings(),
    ) {
        let ceiling = settings.max_combinations_per_unit;
        let source = PythonAdapter.parse("gen.py", &render(&params)).unwrap();
        let synthesis = ScenarioSynthesizer::new(settings).synthesize(&source);
        let valid = synthesis
            .scenarios
            .iter()
            .filter(|s| s.category == ScenarioCategory::EquivalencePartition)
            .filter(|s| !s.description.starts_with("invalid class"))
            .count();
        prop_assert!(valid <= ceiling, "{} > {}", valid, ceiling);
    }

    #[test]
    fn numeric_guards_get_satisfying_error_scenarios(params in prop::collection::vec(arb_param(), 1..6)) {
        let source = PythonAdapter.parse("gen.py", &render(&params)).unwrap();
        let synthesis = ScenarioSynthesizer::default().synthesize(&source);
        let unit = &source.units[0];
        for signal in &unit.error_signals {
            let SignalGuard::Condition { condition } = &signal.guard else {
                continue;
            };
            let hit = synthesis.scenarios.iter().any(|s| {
                matches!(&s.expected, ExpectedOutcome::RaisesError { signal: sig } if sig == signal)
                    && evaluate(condition, &s.inputs) == Truth::True
            });
            prop_assert!(hit, "no satisfying scenario for {}", condition);
        }
    }

    #[test]
    fn combinations_cover_every_pair_within_the_ceiling(
        sizes in prop::collection::vec(1usize..5, 1..9),
        ceiling in 16usize..128,
    ) {
        let combos = combine(&sizes, ceiling);
        prop_assert!(combos.rows.len() <= ceiling);
        for row in &combos.rows {
            prop_assert_eq!(row.len(), sizes.len());
            prop_assert!(row.iter().zip(&sizes).all(|(v, s)| v < s));
        }
        prop_assert_eq!(covers_all_pairs(&sizes, &combos.rows), combos.uncovered == 0);
        if sizes.iter().filter(|&&s| s > 3).count() < 2 && sizes.len() <= 8 {
            // At most one wide parameter: a covering set always fits.
            prop_assert_eq!(combos.uncovered, 0);
        }
        if !combos.pairwise {
            prop_assert_eq!(combos.rows.len(), sizes.iter().product::<usize>());
        }
    }
}
