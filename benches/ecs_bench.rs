#![allow(dead_code)]
//! Core operation benchmarks
//!
//! Run with: cargo bench
//!
//! Measures, against hecs where there is a counterpart:
//! - Entity creation with components
//! - Entity destruction
//! - Component lookup
//! - Query reads (cold full scan, warm cache, incremental revalidation)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use hecs::World as HecsWorld;
use sparse_ecs::World as SparseWorld;

#[derive(Debug, Copy, Clone)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Debug, Copy, Clone)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

fn position(i: usize) -> Position {
    Position {
        x: i as f32,
        y: 0.0,
        z: 0.0,
    }
}

const VELOCITY: Velocity = Velocity {
    x: 1.0,
    y: 0.0,
    z: 0.0,
};

fn populated_world(count: usize) -> SparseWorld {
    let mut world = SparseWorld::new();
    for i in 0..count {
        let e = world.create();
        world.add_component(e, "position", position(i));
        if i % 2 == 0 {
            world.add_component(e, "velocity", VELOCITY);
        }
    }
    world
}

fn bench_create(c: &mut Criterion) {
    let mut group = c.benchmark_group("create");

    group.bench_function("sparse_create_1k_two_components", |b| {
        b.iter(|| {
            let mut world = SparseWorld::new();
            for i in 0..1_000 {
                let e = world.create();
                world.add_component(e, "position", position(i));
                world.add_component(e, "velocity", VELOCITY);
            }
            black_box(world.entity_count());
        });
    });
    group.bench_function("hecs_spawn_1k_two_components", |b| {
        b.iter(|| {
            let mut world = HecsWorld::new();
            for i in 0..1_000 {
                world.spawn((position(i), VELOCITY));
            }
            black_box(world.len());
        });
    });

    group.finish();
}

fn bench_destroy(c: &mut Criterion) {
    let mut group = c.benchmark_group("destroy");

    group.bench_function("sparse_destroy_1k", |b| {
        b.iter_with_setup(
            || {
                let world = populated_world(1_000);
                let ids: Vec<_> = world.entity_manager().entities().values().to_vec();
                (world, ids)
            },
            |(mut world, ids)| {
                for id in ids {
                    world.destroy(id);
                }
            },
        );
    });
    group.bench_function("hecs_despawn_1k", |b| {
        b.iter_with_setup(
            || {
                let mut world = HecsWorld::new();
                let ids: Vec<_> = (0..1_000)
                    .map(|i| world.spawn((position(i), VELOCITY)))
                    .collect();
                (world, ids)
            },
            |(mut world, ids)| {
                for id in ids {
                    let _ = world.despawn(id);
                }
            },
        );
    });

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    let world = populated_world(10_000);
    let ids: Vec<_> = world.entity_manager().entities().values().to_vec();

    group.bench_function("sparse_get_component_10k", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for &id in &ids {
                if let Some(p) = world.get_component::<Position>(id, "position") {
                    sum += p.x;
                }
            }
            black_box(sum);
        });
    });

    group.finish();
}

fn bench_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("query");

    for count in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("sparse_cold_scan", count), &count, |b, &n| {
            b.iter_with_setup(
                || populated_world(n),
                |world| {
                    let matched = world.include(["position", "velocity"]).len();
                    black_box(matched)
                },
            );
        });

        let world = populated_world(count);
        world.include(["position", "velocity"]).len();
        group.bench_with_input(BenchmarkId::new("sparse_warm_read", count), &count, |b, _| {
            b.iter(|| black_box(world.include(["position", "velocity"]).entities()));
        });

        group.bench_with_input(BenchmarkId::new("hecs_query", count), &count, |b, &n| {
            let mut hecs = HecsWorld::new();
            for i in 0..n {
                if i % 2 == 0 {
                    hecs.spawn((position(i), VELOCITY));
                } else {
                    hecs.spawn((position(i),));
                }
            }
            b.iter(|| black_box(hecs.query::<(&Position, &Velocity)>().iter().count()));
        });
    }

    // one structural change per frame, then a read
    group.bench_function("sparse_incremental_10k", |b| {
        let mut world = populated_world(10_000);
        world.include(["position", "velocity"]).len();
        let mut toggle = false;
        b.iter(|| {
            let e = sparse_ecs::EntityId::from_raw(1);
            if toggle {
                world.remove_component(e, "velocity");
            } else {
                world.add_component(e, "velocity", VELOCITY);
            }
            toggle = !toggle;
            let matched = world.include(["position", "velocity"]).len();
            black_box(matched)
        });
    });

    group.finish();
}

criterion_group!(benches, bench_create, bench_destroy, bench_lookup, bench_query);
criterion_main!(benches);
