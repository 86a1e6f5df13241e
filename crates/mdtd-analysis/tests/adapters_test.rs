//! Every adapter against its reference fixture.

use std::path::PathBuf;

use mdtd_analysis::model::{ControlFlowHint, SignalGuard, SignalKind, SourceUnit, TypeCategory, UnitKind, Visibility};
use mdtd_analysis::parsers::AdapterRegistry;
use mdtd_analysis::scanner::Language;

fn fixture(rel: &str) -> (PathBuf, String) {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures").join(rel);
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{}: {e}", path.display()));
    (path, text)
}

fn parse(rel: &str) -> SourceUnit {
    let (path, text) = fixture(rel);
    let language = Language::detect(&path, text.as_bytes()).expect("known language");
    let registry = AdapterRegistry::with_defaults();
    registry
        .get(language)
        .unwrap()
        .parse(rel, &text)
        .unwrap_or_else(|f| panic!("{rel} failed to parse: {:?}", f.regions))
}

fn names(source: &SourceUnit) -> Vec<String> {
    source.units.iter().map(|u| u.qualified_name()).collect()
}

#[test]
fn java_calculator() {
    let source = parse("java/Calculator.java");
    assert_eq!(source.language, Language::Java);
    assert_eq!(
        names(&source),
        [
            "Calculator.Calculator",
            "Calculator.add",
            "Calculator.subtract",
            "Calculator.multiply",
            "Calculator.divide",
            "Calculator.getResult",
            "Calculator.isPrime",
        ]
    );
    assert_eq!(source.units[0].kind, UnitKind::Constructor);
    assert!(source.types["Calculator"].has_field("result"));

    let divide = source.find("Calculator.divide").unwrap();
    let thrown: Vec<_> = divide.error_signals.iter().filter(|s| s.kind == SignalKind::Throw).collect();
    assert_eq!(thrown.len(), 1);
    assert_eq!(thrown[0].name, "ArithmeticException");
    assert!(matches!(thrown[0].guard, SignalGuard::Condition { .. }));
    assert!(divide.writes_field("result"));

    let prime = source.find("Calculator.isPrime").unwrap();
    assert!(prime.has_hint(ControlFlowHint::HasLoop));
    assert!(prime.has_hint(ControlFlowHint::HasEarlyReturn));
    assert_eq!(prime.parameters[0].type_category, TypeCategory::Integer);
    assert_eq!(prime.return_type, Some(TypeCategory::Boolean));

    let getter = source.find("Calculator.getResult").unwrap();
    assert!(getter.parameters.is_empty());
    assert!(getter.reads("result"));
}

#[test]
fn python_sample_infers_types_from_guards() {
    let source = parse("python/sample_python.py");
    assert_eq!(
        names(&source),
        [
            "add",
            "is_prime",
            "validate_email",
            "Calculator.__init__",
            "Calculator.calculate",
            "Calculator.get_history",
        ]
    );
    let add = source.find("add").unwrap();
    assert!(add.parameters.iter().all(|p| p.type_category == TypeCategory::FloatingPoint));
    assert_eq!(add.error_signals[0].name, "TypeError");

    let prime = source.find("is_prime").unwrap();
    assert_eq!(prime.parameters[0].type_category, TypeCategory::Integer);
    assert!(prime.early_returns.len() >= 3);

    let email = source.find("validate_email").unwrap();
    assert_eq!(email.parameters[0].type_category, TypeCategory::Text);

    let calculate = source.find("Calculator.calculate").unwrap();
    let names: Vec<&str> = calculate.error_signals.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["ValueError", "ValueError"]);
    assert!(calculate.writes_field("history") || calculate.reads("history"));
    assert_eq!(source.units[3].kind, UnitKind::Constructor);
}

#[test]
fn javascript_cart() {
    let source = parse("javascript/cart.js");
    let add = source.find("Cart.addItem").unwrap();
    let signals: Vec<&str> = add.error_signals.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(signals, ["TypeError", "RangeError"]);
    assert!(add.writes_field("total"));
    assert_eq!(add.parameters[2].default_value.as_deref(), Some("1"));
    assert!(source.find("Cart.getTotal").unwrap().reads("total"));
    let discount = source.find("discount").unwrap();
    assert_eq!(discount.early_returns.len(), 2);
}

#[test]
fn typescript_inventory() {
    let source = parse("typescript/inventory.ts");
    assert_eq!(source.language, Language::TypeScript);
    let restock = source.find("Inventory.restock").unwrap();
    assert_eq!(restock.parameters[0].type_category, TypeCategory::Text);
    assert_eq!(restock.parameters[1].type_category, TypeCategory::FloatingPoint);
    assert_eq!(restock.return_type, None);
    assert_eq!(restock.error_signals[0].name, "RangeError");

    let label = source.find("label").unwrap();
    assert!(label.parameters[0].nullable);
    assert_eq!(label.parameters[1].type_category, TypeCategory::Collection);
}

#[test]
fn csharp_account() {
    let source = parse("csharp/Account.cs");
    let deposit = source.find("Account.Deposit").unwrap();
    assert_eq!(deposit.error_signals[0].name, "ArgumentOutOfRangeException");
    assert!(deposit.writes_field("balance"));

    let tier = source.find("Account.Tier").unwrap();
    assert!(tier.is_static);
    let range = tier.parameters[0].declared_range.unwrap();
    assert_eq!((range.min.unwrap().value, range.max.unwrap().value), (0.0, 10.0));
    assert_eq!(tier.parameters[1].type_category, TypeCategory::Boolean);
    assert_eq!(source.units[0].kind, UnitKind::Constructor);
}

#[test]
fn go_stack() {
    let source = parse("go/stack.go");
    let new = source.units.iter().find(|u| u.name == "NewStack").unwrap();
    assert_eq!(new.kind, UnitKind::Constructor);

    let pop = source.find("Stack.Pop").unwrap();
    assert_eq!(pop.error_signals[0].kind, SignalKind::ErrorReturn);
    assert_eq!(pop.error_signals[0].name, "ErrEmpty");
    assert_eq!(pop.return_type, Some(TypeCategory::Integer));
    assert!(pop.writes_field("size"));

    let percent = source.find("Percent").unwrap();
    assert_eq!(percent.visibility, Visibility::Public);
    assert_eq!(percent.parameters.len(), 2);
    assert_eq!(percent.error_signals[0].name, "error");
}

#[test]
fn rust_ledger() {
    let source = parse("rust/ledger.rs");
    let credit = source.find("Ledger.credit").unwrap();
    assert_eq!(credit.error_signals[0].kind, SignalKind::Assertion);
    assert!(!credit.is_static);

    let debit = source.find("Ledger.debit").unwrap();
    assert_eq!(debit.error_signals.len(), 2);
    assert!(debit.error_signals.iter().all(|s| s.kind == SignalKind::ErrorReturn));
    assert_eq!(debit.return_type, Some(TypeCategory::Integer));

    let clamp = source.find("clamp_percent").unwrap();
    assert_eq!(clamp.early_returns.len(), 2);
    let width = clamp.parameters[0].declared_range.unwrap();
    assert_eq!(width.min.unwrap().value, -32768.0);
}

#[test]
fn c_buffer() {
    let source = parse("c/buffer.c");
    assert_eq!(source.language, Language::C);
    let append = source.find("buffer_append").unwrap();
    assert_eq!(append.error_signals.len(), 2);
    assert!(append.error_signals.iter().all(|s| s.kind == SignalKind::ErrorReturn));
    assert!(append.parameters[0].nullable);

    let checksum = source.find("checksum").unwrap();
    assert_eq!(checksum.visibility, Visibility::Internal);
    assert_eq!(checksum.error_signals[0].kind, SignalKind::Assertion);
    assert!(checksum.has_hint(ControlFlowHint::HasLoop));

    let sign = source.find("sign").unwrap();
    assert!(sign.error_signals.is_empty());
    assert!(sign.parameters[0].declared_range.is_none());
}

#[test]
fn cpp_header_is_cpp() {
    let source = parse("cpp/matrix.hpp");
    assert_eq!(source.language, Language::Cpp);
    let ctor = &source.units[0];
    assert_eq!(ctor.qualified_name(), "Matrix.Matrix");
    assert_eq!(ctor.kind, UnitKind::Constructor);
    let at = source.find("Matrix.at").unwrap();
    assert_eq!(at.error_signals.len(), 1);
    assert!(source.find("Matrix.fill").unwrap().writes_field("filled_"));
    assert!(source.find("Matrix.isFilled").unwrap().reads("filled_"));
}

#[test]
fn broken_file_keeps_intact_units() {
    let (_, text) = fixture("broken/broken.py");
    let registry = AdapterRegistry::with_defaults();
    let failure = registry.get(Language::Python).unwrap().parse("broken.py", &text).unwrap_err();
    assert!(!failure.regions.is_empty());
    assert!(failure.regions.iter().all(|r| r.start_line >= 1));
    let kept: Vec<&str> = failure.partial.units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(kept, ["fine", "also_fine"]);
}

#[test]
fn parsing_is_deterministic() {
    for rel in ["java/Calculator.java", "python/sample_python.py", "go/stack.go"] {
        assert_eq!(parse(rel), parse(rel), "{rel}");
    }
}
