//! Generation and analysis benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use vassago::{
    analyze, generate, AnalysisKind, FlowBudget, PatternFamily, PatternSpec,
};

fn bench_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    for name in ["fixed", "strided", "longformer", "bigbird", "random"] {
        let spec = PatternSpec::new(PatternFamily::from_name(name).unwrap());
        for n in [256usize, 1024, 4096] {
            group.bench_with_input(
                BenchmarkId::new(name, n),
                &n,
                |b, &n| b.iter(|| generate(black_box(&spec), black_box(n)).unwrap()),
            );
        }
    }
    group.finish();
}

fn bench_information_flow(c: &mut Criterion) {
    let spec = PatternSpec::new(PatternFamily::from_name("longformer").unwrap());
    let mask = generate(&spec, 1024).unwrap();
    let budget = FlowBudget::default();

    c.bench_function("information_flow/exact_1024", |b| {
        b.iter(|| {
            analyze(
                black_box(&mask),
                AnalysisKind::InformationFlow,
                black_box(&budget),
            )
            .unwrap()
        })
    });
}

criterion_group!(benches, bench_generation, bench_information_flow);
criterion_main!(benches);
