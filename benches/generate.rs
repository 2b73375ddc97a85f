#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use dramtrace::{generate, EmitMode, GenerationRequest, TraversalKind};

pub fn generate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for policy in [
        TraversalKind::ColumnMajor,
        TraversalKind::RowMajor,
        TraversalKind::BankRoundRobin,
    ] {
        for steps in [1_000u64, 10_000, 100_000] {
            let request = GenerationRequest::new(policy, steps, EmitMode::WriteThenRead);
            group.throughput(Throughput::Elements(request.num_records()));
            group.bench_with_input(
                BenchmarkId::new(policy.to_string(), steps),
                &request,
                |b, request| {
                    b.iter(|| generate(black_box(request), std::io::sink()).unwrap());
                },
            );
        }
    }
    group.finish();
}

criterion::criterion_group!(benches, generate_benchmark);
criterion::criterion_main!(benches);
