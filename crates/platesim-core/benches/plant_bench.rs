//! Criterion benchmarks for the plant tick loop.
//!
//! - `short_line`: 8 baths, 3 carriers, steady dispatch traffic
//! - `long_line`: 30 baths, 12 carriers, a full shift of simulated time

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use platesim_core::bath::BathType;
use platesim_core::config::PlantConfig;
use platesim_core::plant::Plant;
use platesim_core::test_utils::*;

// ===========================================================================
// Line builders
// ===========================================================================

fn short_line() -> PlantConfig {
    let kinds = [
        BathType::PreTreatment,
        BathType::RinseStand,
        BathType::RinseFlow,
        BathType::Silver,
        BathType::RinseStand,
        BathType::RinseStand,
        BathType::RinseFlow,
        BathType::Parking,
    ];
    linear_line_config(&kinds, 3, 40)
}

fn long_line() -> PlantConfig {
    let pattern = [
        BathType::PreTreatment,
        BathType::RinseStand,
        BathType::Silver,
        BathType::RinseFlow,
        BathType::Parking,
    ];
    let kinds: Vec<BathType> = pattern.iter().copied().cycle().take(30).collect();
    linear_line_config(&kinds, 12, 200)
}

fn run(config: &PlantConfig, ticks: usize) -> u64 {
    let mut plant = Plant::new(config, null_logger()).expect("bench config is valid");
    for _ in 0..ticks {
        plant.tick(2);
    }
    plant.state_hash()
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_short_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("short_line");
    group.sample_size(50);
    let config = short_line();

    group.bench_function("1000_ticks", |b| {
        b.iter(|| std::hint::black_box(run(&config, 1000)));
    });
    group.finish();
}

fn bench_long_line(c: &mut Criterion) {
    let mut group = c.benchmark_group("long_line");
    group.sample_size(20);
    let config = long_line();

    // 57600 s at a 2 s step.
    group.bench_function("full_shift", |b| {
        b.iter(|| std::hint::black_box(run(&config, 28_800)));
    });

    group.bench_function("single_tick_warm", |b| {
        b.iter_batched(
            || {
                let mut plant = Plant::new(&config, null_logger()).expect("bench config is valid");
                for _ in 0..2_000 {
                    plant.tick(2);
                }
                plant
            },
            |mut plant| {
                plant.tick(2);
                plant
            },
            BatchSize::SmallInput,
        );
    });
    group.finish();
}

criterion_group!(benches, bench_short_line, bench_long_line);
criterion_main!(benches);
