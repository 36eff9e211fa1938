use criterion::*;
use std::hint::black_box;

mod common;
use common::*;

fn iterate_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");

    group.bench_function("integrate_positions_100k", |b| {
        b.iter_batched(
            || {
                let (mut world, p, v, w) = make_world();
                populate(&mut world, AGENTS_MED);
                (world, p, v, w)
            },
            |(mut world, p, v, _)| {
                world.for_each_table_mut(p | v, 0, |table| {
                    let (positions, velocities) = table
                        .column_pair::<Position, Velocity>(p, v)
                        .expect("both columns present");
                    for (position, velocity) in positions.iter_mut().zip(velocities.iter()) {
                        position.x += velocity.x * 0.016;
                        position.y += velocity.y * 0.016;
                    }
                });
                black_box(world);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("read_wealth_sum_100k", |b| {
        b.iter_batched(
            || {
                let (mut world, _, _, w) = make_world();
                populate(&mut world, AGENTS_MED);
                (world, w)
            },
            |(world, w)| {
                let mut total = 0.0f64;
                world.for_each_table(w, 0, |table| {
                    for wealth in table.column_slice::<Wealth>(w) {
                        total += wealth.value as f64;
                    }
                });
                black_box(total);
            },
            BatchSize::LargeInput,
        );
    });

    group.bench_function("query_count_cached_100k", |b| {
        let (mut world, p, v, _) = make_world();
        populate(&mut world, AGENTS_MED);
        // Warm the cache; the measured path is allocation-free.
        world.query_count(p | v, 0);

        b.iter(|| black_box(world.query_count(p | v, 0)));
    });

    group.finish();
}

criterion_group!(benches, iterate_benchmark);
criterion_main!(benches);
