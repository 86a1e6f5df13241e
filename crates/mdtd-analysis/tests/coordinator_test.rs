//! End-to-end coordinator runs over temporary trees.

use std::fs;
use std::path::{Path, PathBuf};

use mdtd_analysis::pipeline::{AnalysisCoordinator, AnalysisRun, FileOutcome};
use mdtd_analysis::Language;
use mdtd_core::config::MdtdConfig;
use mdtd_core::errors::ScanError;

const GOOD_A: &str = "def clamp(x: int, lo: int, hi: int) -> int:\n    if lo > hi:\n        raise ValueError('bad range')\n    return max(lo, min(x, hi))\n";
const BROKEN: &str = "def half(v:\n    return v /\n";
const GOOD_C: &str = "class Box {\n  private int size;\n  void grow(int by) { if (by < 0) throw new IllegalArgumentException(); size += by; }\n  int size() { return size; }\n}\n";

fn write(root: &Path, rel: &str, text: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, text).unwrap();
}

fn run(root: &Path) -> AnalysisRun {
    run_with(root, MdtdConfig::default())
}

fn run_with(root: &Path, config: MdtdConfig) -> AnalysisRun {
    AnalysisCoordinator::new(&config).unwrap().analyze_path(root).unwrap()
}

fn fixtures() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures")
}

#[test]
fn one_broken_file_does_not_disturb_its_neighbours() {
    let batch = tempfile::tempdir().unwrap();
    write(batch.path(), "a.py", GOOD_A);
    write(batch.path(), "b.py", BROKEN);
    write(batch.path(), "c.java", GOOD_C);
    let run_all = run(batch.path());

    assert_eq!(run_all.summary.files_total, 3);
    assert_eq!(run_all.summary.files_analyzed, 2);
    assert_eq!(run_all.summary.files_failed, 1);
    assert!(run_all.summary.has_failures());

    let failed = run_all.file("b.py").unwrap();
    assert_eq!(failed.outcome.status(), "failed");
    assert!(failed.synthesis.scenarios.is_empty());
    let failure = failed.outcome.failure().unwrap();
    assert_eq!(failure.path, "b.py");
    assert!(!failure.regions.is_empty());

    let alone = tempfile::tempdir().unwrap();
    write(alone.path(), "a.py", GOOD_A);
    write(alone.path(), "c.java", GOOD_C);
    let run_good = run(alone.path());
    assert_eq!(run_good.summary.files_failed, 0);
    assert_eq!(run_all.summary.scenarios_total, run_good.summary.scenarios_total);
    assert_eq!(run_all.file("a.py").unwrap().synthesis, run_good.file("a.py").unwrap().synthesis);
    assert_eq!(run_all.file("c.java").unwrap().synthesis, run_good.file("c.java").unwrap().synthesis);
}

#[test]
fn partial_units_are_synthesized_on_request() {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(fixtures().join("broken/broken.py"), dir.path().join("broken.py")).unwrap();

    let plain = run(dir.path());
    assert!(plain.files[0].synthesis.scenarios.is_empty());

    let mut config = MdtdConfig::default();
    config.synthesis.synthesize_partial = Some(true);
    let partial = run_with(dir.path(), config);
    let file = &partial.files[0];
    assert_eq!(file.outcome.status(), "failed");
    assert!(file.synthesis.scenarios.iter().any(|s| s.target.name == "fine"));
    assert!(file.synthesis.scenarios.iter().any(|s| s.target.name == "also_fine"));
    assert!(file.synthesis.scenarios.iter().all(|s| s.target.name != "broken"));
}

#[test]
fn unknown_extensions_are_recorded_as_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "README.md", "# notes\n");
    write(dir.path(), "src/a.py", GOOD_A);
    let run = run(dir.path());

    assert_eq!(run.summary.files_total, 2);
    assert_eq!(run.summary.files_unsupported, 1);
    assert!(!run.summary.has_failures());
    let readme = run.file("README.md").unwrap();
    match &readme.outcome {
        FileOutcome::Unsupported { reason } => assert!(reason.contains(".md"), "{reason}"),
        other => panic!("{other:?}"),
    }
    assert!(readme.language.is_none());
    assert_eq!(run.file("src/a.py").unwrap().language, Some(Language::Python));
}

#[test]
fn exclusions_and_disabled_languages_apply() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "keep.py", GOOD_A);
    write(dir.path(), "gen/skip.py", GOOD_A);
    write(dir.path(), "Box.java", GOOD_C);

    let mut config = MdtdConfig::default();
    config.scan.exclude = vec!["gen/**".to_string()];
    config.languages.disabled = vec!["java".to_string()];
    let run = run_with(dir.path(), config);

    let paths: Vec<&str> = run.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, ["Box.java", "keep.py"]);
    assert_eq!(run.file("Box.java").unwrap().outcome.status(), "disabled");
    assert_eq!(run.summary.files_skipped, 1);
    assert_eq!(run.summary.files_analyzed, 1);
}

#[test]
fn oversized_files_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "big.py", &"x = 1\n".repeat(200));
    let mut config = MdtdConfig::default();
    config.scan.max_file_size = Some(64);
    let run = run_with(dir.path(), config);
    assert_eq!(run.files[0].outcome.status(), "skipped");
    assert_eq!(run.summary.files_skipped, 1);
}

#[test]
fn single_file_paths_are_relative_to_their_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "one.py", GOOD_A);
    let run = run(&dir.path().join("one.py"));
    assert_eq!(run.files.len(), 1);
    assert_eq!(run.files[0].path, "one.py");
}

#[test]
fn missing_root_is_a_scan_error() {
    let coordinator = AnalysisCoordinator::new(&MdtdConfig::default()).unwrap();
    let err = coordinator.analyze_path(Path::new("/no/such/mdtd/root")).unwrap_err();
    assert!(matches!(err, ScanError::RootNotFound { .. }));
}

#[test]
fn every_fixture_language_is_analyzed() {
    let run = run(&fixtures());
    assert_eq!(run.summary.files_failed, 1, "only the broken fixture fails");
    assert_eq!(run.failures().next().unwrap().path, "broken/broken.py");
    for language in Language::ALL {
        assert!(
            run.files.iter().any(|f| f.language == Some(language) && f.outcome.status() == "parsed"),
            "{language:?}"
        );
    }
    let counted: usize = run.summary.scenarios.values().sum();
    assert_eq!(counted, run.summary.scenarios_total);
    assert_eq!(run.scenarios().count(), run.summary.scenarios_total);
}

#[test]
fn runs_are_reproducible() {
    let mut a = run(&fixtures());
    let mut b = run(&fixtures());
    a.summary.duration_ms = 0;
    b.summary.duration_ms = 0;
    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
}

#[test]
fn thread_count_does_not_change_results() {
    let mut config = MdtdConfig::default();
    config.scan.threads = Some(1);
    let mut serial = run_with(&fixtures(), config);
    let mut parallel = run(&fixtures());
    serial.summary.duration_ms = 0;
    parallel.summary.duration_ms = 0;
    assert_eq!(serial, parallel);
}
