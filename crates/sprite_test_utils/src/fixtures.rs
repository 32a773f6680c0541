//! Test fixtures and helpers.
//!
//! Pre-built pools, collaborators that record what the pool asks of them,
//! and hand-made corruptions for the repair paths.

use fixed::types::I32F32;
use sprite_core::prelude::*;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// A fresh pool with `capacity` slots and the given misc cap.
///
/// # Panics
///
/// Panics if the configuration is invalid.
#[must_use]
pub fn pool(capacity: u16, misc_soft_cap: u16) -> SpritePool {
    SpritePool::new(PoolConfig::with_capacity(capacity, misc_soft_cap))
        .expect("fixture config is valid")
}

/// Allocate from the free list until slot `target` comes up, then return
/// every other slot taken on the way.
///
/// # Panics
///
/// Panics if `target` is never handed out.
pub fn allocate_slot(pool: &mut SpritePool, list: SpriteList, target: u16) -> SpriteIndex {
    let mut spare = Vec::new();
    loop {
        let index = pool
            .allocate(list)
            .expect("target slot reachable before exhaustion");
        if index.0 == target {
            for s in spare {
                pool.free(s).expect("spare slot is live");
            }
            return index;
        }
        spare.push(index);
    }
}

/// Allocate a sprite and place it.
///
/// # Panics
///
/// Panics if the pool is full or the slot cannot be moved.
pub fn place(pool: &mut SpritePool, kind: SpriteKind, at: CoordsXYZ) -> SpriteIndex {
    let index = pool.allocate_kind(kind).expect("pool has room");
    pool.move_to(index, at).expect("fresh slot is live");
    index
}

/// Allocate `n` sprites into `list` and wire the last one back to the
/// `k`-th (counting from the head), leaving a loop of `n - k` slots.
///
/// # Panics
///
/// Panics if `k >= n` or the pool is too small.
pub fn looped_list(pool: &mut SpritePool, list: SpriteList, n: usize, k: usize) -> Vec<SpriteIndex> {
    assert!(k < n, "loop entry must be inside the list");
    for _ in 0..n {
        pool.allocate(list).expect("pool has room");
    }
    let order: Vec<SpriteIndex> = pool.iter_list(list).collect();
    pool.inject_list_link(order[n - 1], Some(order[k]));
    order
}

/// Viewport sink that remembers every request.
#[derive(Debug, Clone, Default)]
pub struct RecordingViewports {
    /// Requests in arrival order.
    pub requests: Vec<(ScreenRect, ZoomLevel)>,
}

impl ViewportSink for RecordingViewports {
    fn invalidate(&mut self, rect: ScreenRect, max_zoom: ZoomLevel) {
        self.requests.push((rect, max_zoom));
    }
}

/// Terrain that accepts litter everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenSurface;

impl LitterSurface for OpenSurface {
    fn can_host_litter(&self, _coords: CoordsXYZ) -> bool {
        true
    }
}
