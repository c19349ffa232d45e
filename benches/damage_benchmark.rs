//! Benchmarks for damage resolution.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use frontier::damage::Damage;
use frontier::game::{Descriptor, Layer, Position};
use frontier::rng::GameRng;

fn volley(shots: usize, targets: i8) -> Damage {
    let mut attack = Damage::new();
    attack.add_caster(Descriptor::unit(Layer::Ground, Position::new(0, 0)), shots, 2);
    for col in 0..targets {
        let target = Descriptor::unit(Layer::Ground, Position::new(1, col));
        attack.add_taker(target, 5, 3);
        attack.add_trenches(target, 2);
    }
    attack
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    for shots in [5usize, 50, 500] {
        group.bench_with_input(BenchmarkId::from_parameter(shots), &shots, |b, &shots| {
            let mut rng = GameRng::seeded(42);
            b.iter(|| {
                let mut attack = volley(shots, 4);
                black_box(attack.resolve(&mut rng).len())
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_resolve);
criterion_main!(benches);
