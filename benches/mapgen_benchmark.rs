//! Benchmarks for map generation and the reachability check.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use kingsgrid::mapgen::{check_reachability, PlayerSlot};
use kingsgrid::{BlockRegistry, GeneratorConfig, MapGenerator, PerlinGenerator, Size};

fn bench_generate(c: &mut Criterion) {
    let generator = PerlinGenerator::new(&BlockRegistry::with_defaults()).unwrap();
    let slots = PlayerSlot::active_seats(4);
    let mut group = c.benchmark_group("generate");

    for side in [16u16, 32, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(side), &side, |b, &side| {
            let mut seed = 0u64;
            b.iter(|| {
                seed += 1;
                let config = GeneratorConfig {
                    seed,
                    ..GeneratorConfig::default()
                };
                black_box(generator.generate(Size::new(side, side), &slots, &config))
            });
        });
    }
    group.finish();
}

fn bench_reachability(c: &mut Criterion) {
    let generator = PerlinGenerator::new(&BlockRegistry::with_defaults()).unwrap();
    let config = GeneratorConfig {
        seed: 7,
        ..GeneratorConfig::default()
    };
    let map = generator
        .generate(Size::new(64, 64), &PlayerSlot::active_seats(4), &config)
        .unwrap();

    c.bench_function("reachability_64x64", |b| {
        b.iter(|| black_box(check_reachability(black_box(&map))));
    });
}

criterion_group!(benches, bench_generate, bench_reachability);
criterion_main!(benches);
