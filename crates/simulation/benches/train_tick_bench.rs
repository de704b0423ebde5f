//! Criterion benchmark: ride tick and loop assembly.
//!
//! Measures one `FixedUpdate` schedule execution with 1, 8 and 32 demo ovals,
//! each running the maximum of 4 trains with 6 cars, and the assembly of a
//! single long loop.
//!
//! Run with: cargo bench -p coaster_sim --bench train_tick_bench --features bench

use bevy::prelude::*;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use coaster_sim::catalog::demo::DEMO_COASTER_NAME;
use coaster_sim::catalog::Catalog;
use coaster_sim::config::MAX_PLACED_TRACK_PIECES;
use coaster_sim::coords::Point3;
use coaster_sim::test_harness::{oval_layout, TestPark};
use coaster_sim::track::{assemble_loop, TrackArena};

const OVAL_SIDE: usize = 6;

// ---------------------------------------------------------------------------
// Helper: a park full of running coasters
// ---------------------------------------------------------------------------

fn create_benchmark_park(rides: usize) -> TestPark {
    let mut park = TestPark::new();
    for k in 0..rides {
        let origin = Point3::new(2 + (k % 8) as i32 * 12, 2 + (k / 8) as i32 * 4, 2);
        let id = park.with_demo_oval(origin, OVAL_SIDE);
        park.with_rides(|manager, world| {
            let ride = manager.get_mut(id).expect("oval was just built");
            ride.set_number_of_cars(6, world);
            ride.set_number_of_trains(4, world);
        });
    }
    // Let every train leave the station.
    park.tick(20);
    park
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_ride_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("ride_tick");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    for &count in &[1usize, 8, 32] {
        let mut park = create_benchmark_park(count);

        group.bench_with_input(
            BenchmarkId::new("fixed_update", format!("{count}_rides")),
            &count,
            |b, _| {
                b.iter(|| {
                    park.world_mut().run_schedule(FixedUpdate);
                });
            },
        );
    }

    group.finish();
}

fn bench_loop_assembly(c: &mut Criterion) {
    let park = TestPark::new();
    let catalog = park.resource::<Catalog>();
    let coaster = catalog
        .coaster_type_by_name(DEMO_COASTER_NAME)
        .expect("demo coaster type");

    let mut arena = TrackArena::with_capacity(MAX_PLACED_TRACK_PIECES);
    for piece in oval_layout(coaster, Point3::new(2, 2, 2), 100) {
        arena.insert(piece).expect("arena has room");
    }

    c.bench_function("assemble_loop_204_pieces", |b| {
        b.iter(|| black_box(assemble_loop(&mut arena, &[])));
    });
}

criterion_group!(benches, bench_ride_tick, bench_loop_assembly);
criterion_main!(benches);
