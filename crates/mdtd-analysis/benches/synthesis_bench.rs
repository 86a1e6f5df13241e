//! Parsing and synthesis throughput over the reference fixtures.
//!
//! Run with: cargo bench -p mdtd-analysis --bench synthesis_bench

use std::path::PathBuf;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use mdtd_analysis::parsers::AdapterRegistry;
use mdtd_analysis::pipeline::AnalysisCoordinator;
use mdtd_analysis::synthesis::{ScenarioSynthesizer, SynthesisSettings};
use mdtd_analysis::Language;
use mdtd_core::config::MdtdConfig;

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

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../test-fixtures")
}

fn load(rel: &str) -> (Language, String) {
    let path = fixtures_dir().join(rel);
    let text = std::fs::read_to_string(&path).unwrap();
    (Language::detect(&path, text.as_bytes()).unwrap(), text)
}

fn parse_per_language(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    let registry = AdapterRegistry::with_defaults();
    for rel in FIXTURES {
        let (language, text) = load(rel);
        let adapter = registry.get(language).unwrap();
        group.bench_with_input(BenchmarkId::new("fixture", language.name()), &text, |b, text| {
            b.iter(|| adapter.parse(rel, text).unwrap());
        });
    }
    group.finish();
}

fn synthesize_per_language(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesize");
    let registry = AdapterRegistry::with_defaults();
    let synthesizer = ScenarioSynthesizer::default();
    for rel in FIXTURES {
        let (language, text) = load(rel);
        let source = registry.get(language).unwrap().parse(rel, &text).unwrap();
        group.bench_with_input(BenchmarkId::new("fixture", language.name()), &source, |b, source| {
            b.iter(|| synthesizer.synthesize(source));
        });
    }
    group.finish();
}

fn wide_signature(c: &mut Criterion) {
    let mut group = c.benchmark_group("pairwise");
    group.sample_size(20);
    for width in [4usize, 8, 12] {
        let params: Vec<String> = (0..width).map(|i| format!("p{i}: int")).collect();
        let text = format!("def wide({}):\n    return 0\n", params.join(", "));
        let source = AdapterRegistry::with_defaults()
            .get(Language::Python)
            .unwrap()
            .parse("wide.py", &text)
            .unwrap();
        let synthesizer = ScenarioSynthesizer::new(SynthesisSettings::default().with_ceiling(1_000));
        group.bench_with_input(BenchmarkId::new("params", width), &source, |b, source| {
            b.iter(|| synthesizer.synthesize(source));
        });
        // IPOG needs more than 16 rows from 6 parameters on, so this also times the repair.
        let tight = ScenarioSynthesizer::new(SynthesisSettings::default().with_ceiling(16));
        group.bench_with_input(BenchmarkId::new("params_ceiling_16", width), &source, |b, source| {
            b.iter(|| tight.synthesize(source));
        });
    }
    group.finish();
}

fn full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinator");
    group.sample_size(10);
    let coordinator = AnalysisCoordinator::new(&MdtdConfig::default()).unwrap();
    let root = fixtures_dir();
    group.bench_function("analyze_fixtures", |b| {
        b.iter(|| coordinator.analyze_path(&root).unwrap());
    });
    group.finish();
}

criterion_group!(benches, parse_per_language, synthesize_per_language, wide_signature, full_run);
criterion_main!(benches);
