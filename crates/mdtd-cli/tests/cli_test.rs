//! The `mdtd` command surface, driven in-process.

use std::fs;
use std::path::Path;

use mdtd_cli::{run_with_args, EXIT_FATAL, EXIT_OK, EXIT_PARSE_FAILURES};
use serde_json::Value;

const GOOD: &str = "def divide(a: float, b: float) -> float:\n    if b == 0:\n        raise ZeroDivisionError('b')\n    return a / b\n";
const BROKEN: &str = "def half(v:\n    return v /\n";

fn mdtd(args: &[&str]) -> (u8, String) {
    let mut out = Vec::new();
    let argv = std::iter::once("mdtd").chain(args.iter().copied());
    let code = run_with_args(argv, &mut out);
    (code, String::from_utf8(out).unwrap())
}

fn project(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (rel, text) in files {
        fs::write(dir.path().join(rel), text).unwrap();
    }
    dir
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn languages_lists_every_adapter() {
    let (code, out) = mdtd(&["languages"]);
    assert_eq!(code, EXIT_OK);
    for name in ["Java", "Python", "JavaScript", "TypeScript", "C#", "Go", "Rust", "C", "C++"] {
        assert!(out.lines().any(|l| l.starts_with(name)), "{name} missing from\n{out}");
    }

    let (code, out) = mdtd(&["languages", "--format", "json"]);
    assert_eq!(code, EXIT_OK);
    let rows: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(rows.as_array().unwrap().len(), 9);
}

#[test]
fn analyze_prints_the_output_contract() {
    let dir = project(&[("calc.py", GOOD)]);
    let root = path_arg(dir.path());
    let (code, out) = mdtd(&["analyze", &root]);
    assert_eq!(code, EXIT_OK);

    let run: Value = serde_json::from_str(&out).unwrap();
    let file = &run["files"][0];
    assert_eq!(file["path"], "calc.py");
    assert_eq!(file["language"], "python");
    assert_eq!(file["status"], "parsed");
    let scenarios = file["scenarios"].as_array().unwrap();
    assert!(scenarios.iter().any(|s| s["category"] == "error_condition"
        && s["expected"]["outcome"] == "raises_error"
        && s["inputs"][1]["value"]["value"] == 0.0));
    assert_eq!(run["summary"]["files_analyzed"], 1);
}

#[test]
fn parse_failures_only_fail_the_run_on_request() {
    let dir = project(&[("a.py", GOOD), ("b.py", BROKEN)]);
    let root = path_arg(dir.path());

    let (code, out) = mdtd(&["analyze", &root, "--format", "summary"]);
    assert_eq!(code, EXIT_OK);
    assert!(out.contains("failed: b.py"), "{out}");
    assert!(out.contains("1 failed"), "{out}");

    let (code, _) = mdtd(&["analyze", &root, "--fail-on-parse-failure"]);
    assert_eq!(code, EXIT_PARSE_FAILURES);
}

#[test]
fn category_filter_limits_output() {
    let dir = project(&[("calc.py", GOOD)]);
    let root = path_arg(dir.path());
    let (code, out) = mdtd(&["analyze", &root, "--categories", "error_condition,boundary_value"]);
    assert_eq!(code, EXIT_OK);
    let run: Value = serde_json::from_str(&out).unwrap();
    for s in run["files"][0]["scenarios"].as_array().unwrap() {
        assert!(s["category"] == "error_condition" || s["category"] == "boundary_value", "{s}");
    }
    assert_eq!(run["summary"]["scenarios"]["equivalence_partition"], 0);
}

#[test]
fn combination_ceiling_bounds_only_combined_valid_rows() {
    const WIDE: &str = "def wide(a: int, b: int, c: int, d: int, e: int, f: int, g: int):\n    if a > 100:\n        raise ValueError('a')\n    return a\n";
    let dir = project(&[("wide.py", WIDE)]);
    let (code, out) = mdtd(&["analyze", &path_arg(dir.path()), "--max-combinations", "16"]);
    assert_eq!(code, EXIT_OK);
    let run: Value = serde_json::from_str(&out).unwrap();
    let scenarios = run["files"][0]["scenarios"].as_array().unwrap();
    let count = |pred: &dyn Fn(&Value) -> bool| scenarios.iter().filter(|s| pred(s)).count();

    let combined = count(&|s| s["category"] == "equivalence_partition" && s["description"].as_str().unwrap().starts_with("valid classes"));
    assert_eq!(combined, 16);
    assert!(count(&|s| s["category"] == "boundary_value") > 16);
    assert_eq!(count(&|s| s["category"] == "error_condition"), 1);
    assert!(scenarios.len() > 16);
}

#[test]
fn project_config_is_picked_up() {
    let dir = project(&[
        ("calc.py", GOOD),
        ("mdtd.toml", "[synthesis]\nenabled_categories = [\"error_condition\"]\n"),
    ]);
    let (code, out) = mdtd(&["analyze", &path_arg(dir.path())]);
    assert_eq!(code, EXIT_OK);
    let run: Value = serde_json::from_str(&out).unwrap();
    let calc = run["files"].as_array().unwrap().iter().find(|f| f["path"] == "calc.py").unwrap();
    assert!(calc["scenarios"].as_array().unwrap().iter().all(|s| s["category"] == "error_condition"));
}

#[test]
fn fatal_errors_exit_with_two() {
    let (code, out) = mdtd(&["analyze", "/no/such/mdtd/path"]);
    assert_eq!(code, EXIT_FATAL);
    assert!(out.is_empty());

    let dir = project(&[("calc.py", GOOD)]);
    let root = path_arg(dir.path());
    let (code, _) = mdtd(&["analyze", &root, "--categories", "fuzzing"]);
    assert_eq!(code, EXIT_FATAL);
    let (code, _) = mdtd(&["analyze", &root, "--max-combinations", "0"]);
    assert_eq!(code, EXIT_FATAL);
    let (code, _) = mdtd(&["analyze", &root, "--config", "/no/such/mdtd.toml"]);
    assert_eq!(code, EXIT_FATAL);
    let (code, _) = mdtd(&["frobnicate"]);
    assert_eq!(code, EXIT_FATAL);
}
