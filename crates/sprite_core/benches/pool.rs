//! Sprite pool benchmarks.
//!
//! Run with: `cargo bench -p sprite_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use sprite_core::prelude::*;

fn full_pool() -> SpritePool {
    let mut pool = SpritePool::default();
    let mut i = 0;
    while let Ok(index) = pool.allocate(SpriteList::Peep) {
        let _ = pool.move_to(index, CoordsXYZ::new((i * 37) % 8000, (i * 53) % 8000, 0));
        i += 1;
    }
    pool
}

/// Allocate and free in a tight loop.
pub fn churn_benchmark(c: &mut Criterion) {
    c.bench_function("allocate_free_churn", |b| {
        let mut pool = SpritePool::default();
        b.iter(|| {
            let index = pool.allocate(SpriteList::Litter).ok();
            if let Some(index) = index {
                let _ = pool.free(black_box(index));
            }
        });
    });
}

/// Walk sprites across tile boundaries.
pub fn move_benchmark(c: &mut Criterion) {
    let mut pool = SpritePool::default();
    let sprites: Vec<SpriteIndex> = (0..1000)
        .filter_map(|_| pool.allocate(SpriteList::Peep).ok())
        .collect();
    let mut step = 0;

    c.bench_function("move_to_across_cells", |b| {
        b.iter(|| {
            step += 1;
            for (i, &index) in sprites.iter().enumerate() {
                let x = ((i as i32) * 32 + step * 5) % 8000;
                let _ = pool.move_to(index, black_box(CoordsXYZ::new(x, 64, 0)));
            }
        });
    });
}

/// Cycle checks and the full audit on a saturated pool.
pub fn check_benchmark(c: &mut Criterion) {
    let pool = full_pool();

    c.bench_function("check_all_cycles", |b| {
        b.iter_batched(
            || pool.clone(),
            |mut pool| {
                black_box(pool.check_list_cycles(false));
                black_box(pool.check_bucket_cycles(false));
            },
            BatchSize::LargeInput,
        );
    });

    c.bench_function("audit", |b| b.iter(|| black_box(pool.audit())));
}

criterion_group!(benches, churn_benchmark, move_benchmark, check_benchmark);
criterion_main!(benches);
