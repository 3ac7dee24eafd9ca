use cabin_differential::simulation::generator::{generate_random_scenario, ScenarioConfig};
use cabin_differential::simulation::scenario::Scenario;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn scenario_of(segment_count: usize) -> Scenario {
    generate_random_scenario(&ScenarioConfig {
        segment_count,
        upgrade_probability: 0.6,
        seed: Some(2026),
        ..Default::default()
    })
}

fn bench_validate_4_segments(c: &mut Criterion) {
    let scenario = scenario_of(4);

    c.bench_function("validate_4_segments", |b| {
        b.iter(|| black_box(&scenario).validate())
    });
}

fn bench_validate_8_segments(c: &mut Criterion) {
    let scenario = scenario_of(8);

    c.bench_function("validate_8_segments", |b| {
        b.iter(|| black_box(&scenario).validate())
    });
}

fn bench_validate_12_segments(c: &mut Criterion) {
    let scenario = scenario_of(12);

    c.bench_function("validate_12_segments", |b| {
        b.iter(|| black_box(&scenario).validate())
    });
}

fn bench_validate_12_segments_atomic_only(c: &mut Criterion) {
    let mut scenario = scenario_of(12);
    scenario.config.consolidate = false;

    c.bench_function("validate_12_segments_atomic_only", |b| {
        b.iter(|| black_box(&scenario).validate())
    });
}

criterion_group!(
    benches,
    bench_validate_4_segments,
    bench_validate_8_segments,
    bench_validate_12_segments,
    bench_validate_12_segments_atomic_only
);
criterion_main!(benches);
