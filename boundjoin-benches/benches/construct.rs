//! Bounded versus naive tree construction benchmarks.
//!
//! Measures the time to build a tree from a preloaded distance matrix with
//! each algorithm, so the bounded search's savings show up against the full
//! scan of the same join rule. Matrix loading is excluded from the timings.
#![expect(
    missing_docs,
    reason = "Criterion macros generate items without doc comments"
)]
#![expect(
    clippy::shadow_reuse,
    reason = "Criterion bench_with_input closures rebind parameter names"
)]
use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};

use boundjoin_benches::{
    error::BenchSetupError,
    params::JoinBenchParams,
    source::{SyntheticConfig, SyntheticSource},
};
use boundjoin_core::{Algorithm, DistanceMatrix, JoinerBuilder};

/// Seed used for all synthetic data generation in this benchmark.
const SEED: u64 = 42;

/// Point dimensionality for all benchmark datasets.
const DIMENSIONS: usize = 8;

/// Dataset sizes to benchmark.
const TAXON_COUNTS: &[usize] = &[200, 500, 1_000];

/// Worker threads used for every run.
const THREADS: usize = 4;

const ALGORITHMS: &[Algorithm] = &[
    Algorithm::Nj,
    Algorithm::RapidNj,
    Algorithm::Bionj,
    Algorithm::RapidBionj,
];

fn construct_impl(c: &mut Criterion) -> Result<(), BenchSetupError> {
    let mut group = c.benchmark_group("construct");
    group.sample_size(10);

    for &taxa in TAXON_COUNTS {
        let source = SyntheticSource::generate(&SyntheticConfig {
            taxa,
            dimensions: DIMENSIONS,
            seed: SEED,
        })?;
        let matrix = DistanceMatrix::<f64>::from_source(&source)?;

        for &algorithm in ALGORITHMS {
            let joiner = JoinerBuilder::new()
                .with_algorithm(algorithm)
                .with_threads(THREADS)
                .build()?;
            let params = JoinBenchParams {
                taxa,
                algorithm,
                threads: THREADS,
            };
            group.bench_with_input(
                BenchmarkId::from_parameter(params),
                &(&joiner, &matrix),
                |b, &(joiner, matrix)| {
                    b.iter_batched(
                        || matrix.clone(),
                        |matrix| joiner.run_matrix(matrix),
                        BatchSize::LargeInput,
                    );
                },
            );
        }
    }

    group.finish();
    Ok(())
}

fn construct(c: &mut Criterion) {
    if let Err(err) = construct_impl(c) {
        panic!("construct benchmark setup failed: {err}");
    }
}

criterion_group!(benches, construct);
criterion_main!(benches);
