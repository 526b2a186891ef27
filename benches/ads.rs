//! Benchmarks for the computation of adaptive distinguishing sequences on random Mealy machines.
//!
//! Run with:
//! ```bash
//! cargo bench --bench ads
//! ```

use automata_ads::{prelude::*, random::generate_random_mealy_with};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn machines(size: usize) -> Vec<MealyMachine> {
    let mut rng = fastrand::Rng::with_seed(size as u64);
    (0..8)
        .map(|_| generate_random_mealy_with(&mut rng, 3, size, 2))
        .collect()
}

fn lee_yannakakis(c: &mut Criterion) {
    let mut group = c.benchmark_group("lee_yannakakis");
    for size in [8, 16, 32, 64] {
        let machines = machines(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &machines, |b, machines| {
            b.iter(|| {
                for mm in machines {
                    criterion::black_box(ads::lee_yannakakis::compute(mm, mm.alphabet()));
                }
            })
        });
    }
    group.finish();
}

fn backtracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("backtracking");
    for size in [6, 8, 10] {
        let machines = machines(size);
        let targets: Vec<usize> = (0..size).step_by(2).collect();
        group.bench_with_input(BenchmarkId::new("satisficing", size), &machines, |b, machines| {
            b.iter(|| {
                for mm in machines {
                    let _ = criterion::black_box(ads::backtracking::compute(
                        mm,
                        mm.alphabet(),
                        targets.iter().copied(),
                    ));
                }
            })
        });
        for aggregator in [CostAggregator::MinLength, CostAggregator::MinSize] {
            group.bench_with_input(
                BenchmarkId::new(format!("{aggregator:?}"), size),
                &machines,
                |b, machines| {
                    b.iter(|| {
                        for mm in machines {
                            let _ = criterion::black_box(ads::compute_optimal(
                                mm,
                                mm.alphabet(),
                                targets.iter().copied(),
                                aggregator,
                            ));
                        }
                    })
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, lee_yannakakis, backtracking);
criterion_main!(benches);
