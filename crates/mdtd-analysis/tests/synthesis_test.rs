//! Scenario synthesis over the reference fixtures.

use std::path::PathBuf;

use mdtd_analysis::model::{SignalGuard, SignalKind, SourceUnit};
use mdtd_analysis::parsers::{AdapterRegistry, JavaAdapter, LanguageAdapter, PythonAdapter};
use mdtd_analysis::scanner::Language;
use mdtd_analysis::synthesis::evaluation::{evaluate, Truth};
use mdtd_analysis::synthesis::oracle::expected_outcome;
use mdtd_analysis::synthesis::{
    CategoryOutcome, ExpectedOutcome, FileSynthesis, ScenarioCategory, ScenarioSynthesizer, ScenarioValue,
    SynthesisSettings, TestScenario,
};

const FIXTURES: &[&str] = &[
    "java/Calculator.java",
    "python/sample_python.py",
    "javascript/cart.js",
    "typescript/inventory.ts",
    "csharp/Account.cs",
    "go/stack.go",
    "rust/ledger.rs",
    "c/buffer.c",
    "cpp/matrix.hpp",
];

fn load(rel: &str) -> SourceUnit {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures").join(rel);
    let text = std::fs::read_to_string(&path).unwrap();
    let language = Language::detect(&path, text.as_bytes()).unwrap();
    AdapterRegistry::with_defaults()
        .get(language)
        .unwrap()
        .parse(rel, &text)
        .unwrap()
}

fn synthesize(source: &SourceUnit) -> FileSynthesis {
    ScenarioSynthesizer::default().synthesize(source)
}

fn unit_scenarios<'a>(source: &SourceUnit, synthesis: &'a FileSynthesis, qualified: &str) -> Vec<&'a TestScenario> {
    let index = source.units.iter().position(|u| u.qualified_name() == qualified).unwrap();
    synthesis.for_unit(index).collect()
}

#[test]
fn get_result_is_a_single_default_call() {
    let source = load("java/Calculator.java");
    let synthesis = synthesize(&source);
    let scenarios = unit_scenarios(&source, &synthesis, "Calculator.getResult");
    assert_eq!(scenarios.len(), 1);
    let s = scenarios[0];
    assert_eq!(s.category, ScenarioCategory::EquivalencePartition);
    assert!(s.inputs.is_empty());
    assert!(matches!(s.expected, ExpectedOutcome::ReturnsValue { value: ScenarioValue::Symbolic(_) }));
}

#[test]
fn divide_covers_zero_and_its_neighbours() {
    let source = load("java/Calculator.java");
    let synthesis = synthesize(&source);
    let scenarios = unit_scenarios(&source, &synthesis, "Calculator.divide");

    assert!(scenarios.iter().any(|s| {
        s.input("b") == Some(&ScenarioValue::Float(0.0))
            && s.input("a").and_then(ScenarioValue::as_f64).is_some_and(f64::is_finite)
            && matches!(&s.expected, ExpectedOutcome::RaisesError { signal } if signal.name == "ArithmeticException")
    }));
    for v in [-1.0, 1.0] {
        assert!(scenarios.iter().any(|s| {
            s.category == ScenarioCategory::BoundaryValue
                && s.input("b") == Some(&ScenarioValue::Float(v))
                && matches!(s.expected, ExpectedOutcome::ReturnsValue { value: ScenarioValue::Symbolic(_) })
        }));
    }
}

#[test]
fn calculator_state_chains_observe_the_result() {
    let source = load("java/Calculator.java");
    let synthesis = synthesize(&source);
    let chains: Vec<&TestScenario> = unit_scenarios(&source, &synthesis, "Calculator.add")
        .into_iter()
        .filter(|s| s.category == ScenarioCategory::StateTransition)
        .collect();
    assert_eq!(chains.len(), 2);
    for chain in &chains {
        assert!((2..=3).contains(&chain.call_sequence.len()));
        assert_eq!(chain.call_sequence.last().unwrap().unit.name, "getResult");
        assert_eq!(chain.expected, ExpectedOutcome::Unspecified);
    }
    assert_eq!(chains[1].call_sequence[0].unit.name, "subtract");
}

#[test]
fn every_error_signal_has_a_raising_scenario() {
    for rel in FIXTURES {
        let source = load(rel);
        let synthesis = synthesize(&source);
        for (index, unit) in source.units.iter().enumerate() {
            for signal in &unit.error_signals {
                let raising: Vec<&TestScenario> = synthesis
                    .for_unit(index)
                    .filter(|s| s.category == ScenarioCategory::ErrorCondition)
                    .filter(|s| matches!(&s.expected, ExpectedOutcome::RaisesError { signal: sig } if sig == signal))
                    .collect();
                let shadowed = synthesis
                    .for_unit(index)
                    .any(|s| s.description.starts_with(&signal.name) && s.description.contains("shadowed"));
                assert!(
                    !raising.is_empty() || shadowed,
                    "{rel}: {} has no scenario for {}",
                    unit.qualified_name(),
                    signal.name
                );
                for s in &raising {
                    let oracle = expected_outcome(unit, &s.inputs);
                    assert!(
                        oracle == s.expected || oracle == ExpectedOutcome::Unspecified,
                        "{rel}: {} claims {} but inputs give {oracle:?}",
                        s.id,
                        signal.name
                    );
                }

                // Interpretable guards are satisfied by at least one of them.
                if let SignalGuard::Condition { condition } = &signal.guard {
                    if !condition.has_opaque() && signal.kind != SignalKind::Declared {
                        let satisfied = raising.iter().any(|s| evaluate(condition, &s.inputs) == Truth::True);
                        let contradictory = raising.iter().all(|s| s.description.contains("no inputs satisfy"));
                        assert!(satisfied || contradictory, "{rel}: {} / {condition}", unit.qualified_name());
                    }
                }
            }
        }
    }
}

fn error_scenarios(source: &SourceUnit) -> Vec<TestScenario> {
    synthesize(source)
        .scenarios
        .into_iter()
        .filter(|s| s.category == ScenarioCategory::ErrorCondition)
        .collect()
}

fn raised(s: &TestScenario) -> Option<&str> {
    match &s.expected {
        ExpectedOutcome::RaisesError { signal } => Some(signal.name.as_str()),
        _ => None,
    }
}

#[test]
fn error_inputs_avoid_earlier_exits() {
    let src = r#"
def pick(x: int):
    if x == 5:
        raise KeyError("five")
    if x < 6:
        raise ValueError("small")
    return x
"#;
    let source = PythonAdapter.parse("pick.py", src).unwrap();
    let unit = &source.units[0];
    let scenarios = error_scenarios(&source);
    assert_eq!(scenarios.len(), 2);
    for s in &scenarios {
        assert_eq!(expected_outcome(unit, &s.inputs), s.expected, "{}", s.description);
    }
    let small = scenarios.iter().find(|s| raised(s) == Some("ValueError")).unwrap();
    let x = small.input("x").and_then(ScenarioValue::as_f64).unwrap();
    assert!(x < 6.0 && x != 5.0, "{x}");
}

#[test]
fn unreachable_errors_are_reported_as_shadowed() {
    let src = r#"
def clamp(x: int):
    if x > 10:
        raise KeyError("large")
    if x > 20:
        raise ValueError("huge")
    return x
"#;
    let source = PythonAdapter.parse("clamp.py", src).unwrap();
    let scenarios = error_scenarios(&source);
    let inner = scenarios.iter().find(|s| s.description.starts_with("ValueError")).unwrap();
    assert!(inner.description.ends_with("(shadowed by an earlier exit)"));
    assert_eq!(raised(inner), Some("KeyError"));
    assert!(scenarios.iter().all(|s| raised(s) != Some("ValueError")));
}

#[test]
fn keyword_dispatch_reaches_every_branch() {
    let src = r#"
def calc(op: str, x: int) -> int:
    if op == "add":
        return x + 1
    elif op == "sub":
        return x - 1
    else:
        raise ValueError(op)
"#;
    let source = PythonAdapter.parse("calc.py", src).unwrap();
    let synthesis = synthesize(&source);
    let known = [ScenarioValue::Text("add".into()), ScenarioValue::Text("sub".into())];
    let ep: Vec<&TestScenario> = synthesis
        .scenarios
        .iter()
        .filter(|s| s.category == ScenarioCategory::EquivalencePartition)
        .collect();

    let valid: Vec<&TestScenario> = ep.iter().copied().filter(|s| s.description.starts_with("valid classes")).collect();
    for s in &valid {
        assert!(known.contains(s.input("op").unwrap()), "{}", s.description);
        assert!(!s.expected.is_error(), "{}", s.description);
    }
    let ops: Vec<&ScenarioValue> = valid.iter().filter_map(|s| s.input("op")).collect();
    assert!(ops.contains(&&known[0]) && ops.contains(&&known[1]));
    assert!(ep.iter().any(|s| s.expected.is_error()));

    let bv: Vec<&TestScenario> = synthesis
        .scenarios
        .iter()
        .filter(|s| s.category == ScenarioCategory::BoundaryValue)
        .collect();
    assert!(!bv.is_empty());
    for s in bv {
        assert_eq!(s.input("op"), Some(&known[0]), "{}", s.description);
        assert!(!s.expected.is_error(), "{}", s.description);
    }
}

#[test]
fn inputs_match_parameters_everywhere() {
    for rel in FIXTURES {
        let source = load(rel);
        let synthesis = synthesize(&source);
        for s in &synthesis.scenarios {
            let unit = &source.units[s.target.index];
            assert_eq!(s.target.name, unit.name);
            let params: Vec<&str> = unit.parameters.iter().map(|p| p.name.as_str()).collect();
            assert_eq!(s.input_names(), params, "{rel}: {}", s.id);
        }
    }
}

#[test]
fn declared_ranges_get_edge_scenarios() {
    let source = load("csharp/Account.cs");
    let synthesis = synthesize(&source);
    let boundary: Vec<i64> = unit_scenarios(&source, &synthesis, "Account.Tier")
        .into_iter()
        .filter(|s| s.category == ScenarioCategory::BoundaryValue)
        .filter_map(|s| match s.input("score") {
            Some(ScenarioValue::Integer(v)) => Some(*v),
            _ => None,
        })
        .collect();
    for v in [-1, 0, 1, 5, 9, 10, 11] {
        assert!(boundary.contains(&v), "missing {v} in {boundary:?}");
    }
}

#[test]
fn literal_early_returns_become_concrete_expectations() {
    let source = load("python/sample_python.py");
    let synthesis = synthesize(&source);
    let two = unit_scenarios(&source, &synthesis, "is_prime")
        .into_iter()
        .find(|s| s.category == ScenarioCategory::BoundaryValue && s.input("n") == Some(&ScenarioValue::Integer(2)))
        .unwrap();
    assert_eq!(two.expected, ExpectedOutcome::ReturnsValue { value: ScenarioValue::Boolean(true) });
}

#[test]
fn ids_are_unique_and_numbered_per_category() {
    let source = load("python/sample_python.py");
    let synthesis = synthesize(&source);
    let mut ids: Vec<&str> = synthesis.scenarios.iter().map(|s| s.id.as_str()).collect();
    let total = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), total);
    assert!(synthesis.scenarios.iter().any(|s| s.id == "add@0:EC-01"));
}

#[test]
fn skipped_categories_carry_reasons() {
    let source = PythonAdapter
        .parse("noop.py", "def ping():\n    return 'pong'\n")
        .unwrap();
    let synthesis = synthesize(&source);
    assert_eq!(synthesis.scenarios.len(), 1);
    let report = &synthesis.units[0];
    assert_eq!(report.generated(ScenarioCategory::EquivalencePartition), 1);
    for category in [ScenarioCategory::BoundaryValue, ScenarioCategory::ErrorCondition, ScenarioCategory::StateTransition] {
        match report.outcome(category) {
            Some(CategoryOutcome::Skipped { reason }) => assert!(!reason.is_empty()),
            other => panic!("{category}: {other:?}"),
        }
    }
}

#[test]
fn synthesis_is_deterministic() {
    let settings = SynthesisSettings::default().with_ceiling(16);
    for rel in FIXTURES {
        let source = load(rel);
        let a = ScenarioSynthesizer::new(settings.clone()).synthesize(&source);
        let b = ScenarioSynthesizer::new(settings.clone()).synthesize(&source);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap(), "{rel}");
    }
}

#[test]
fn scenarios_serialize_with_tagged_values() {
    let source = JavaAdapter
        .parse("D.java", "class D { double half(double x) { return x / 2; } }")
        .unwrap();
    let synthesis = synthesize(&source);
    let json = serde_json::to_value(&synthesis.scenarios[0]).unwrap();
    assert_eq!(json["category"], "equivalence_partition");
    assert_eq!(json["inputs"][0]["name"], "x");
    assert_eq!(json["inputs"][0]["value"]["type"], "float");
    assert_eq!(json["expected"]["outcome"], "returns_value");
    assert!(json.get("call_sequence").is_none());
}
