//! Spatial grid: one bucket chain per 32-unit tile.
//!
//! Each bucket is a singly-linked chain threaded through `next_in_cell`,
//! kept in strictly descending slot order. Allocated sprites that have not
//! been placed live in the [`SpatialKey::UNINDEXED`] bucket, which spatial
//! queries never look at. Free slots are in no bucket.

use serde::{Deserialize, Serialize};

use crate::coords::{CoordsXYZ, COORDS_XY_STEP, LOCATION_NULL, MAXIMUM_MAP_SIZE};
use crate::pool::SpritePool;
use crate::sprite::SpriteIndex;

/// Tiles along one axis of the grid.
const GRID_SIDE: usize = MAXIMUM_MAP_SIZE as usize;

/// Number of buckets, including the unindexed one.
pub const SPATIAL_INDEX_SIZE: usize = GRID_SIDE * GRID_SIDE + 1;

/// Bucket identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpatialKey(u32);

impl SpatialKey {
    /// Bucket for sprites that are not placed in the world.
    pub const UNINDEXED: Self = Self((SPATIAL_INDEX_SIZE - 1) as u32);

    /// Bucket holding world position `(x, y)`.
    ///
    /// Coordinates are clamped to `0..=0xFFFF` first; anything that still
    /// falls off the grid, and `x == LOCATION_NULL`, maps to
    /// [`UNINDEXED`](Self::UNINDEXED).
    #[must_use]
    pub fn from_xy(x: i32, y: i32) -> Self {
        if x == LOCATION_NULL {
            return Self::UNINDEXED;
        }
        let tile_x = (x.clamp(0, 0xFFFF) / COORDS_XY_STEP) as usize;
        let tile_y = ((y.clamp(0, 0xFFFF) >> 5) & 0xFF) as usize;
        let key = tile_x * GRID_SIDE + tile_y;
        if key >= SPATIAL_INDEX_SIZE - 1 {
            Self::UNINDEXED
        } else {
            Self(key as u32)
        }
    }

    /// Bucket for a full position.
    #[must_use]
    pub fn of(coords: CoordsXYZ) -> Self {
        Self::from_xy(coords.x, coords.y)
    }

    /// Whether spatial queries may look in this bucket.
    #[must_use]
    pub const fn is_indexed(self) -> bool {
        self.0 != Self::UNINDEXED.0
    }

    /// Position in the bucket table.
    #[must_use]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Every bucket, the unindexed one last.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..SPATIAL_INDEX_SIZE as u32).map(Self)
    }
}

/// Bucket head table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpatialIndex {
    heads: Vec<Option<SpriteIndex>>,
}

impl SpatialIndex {
    /// An empty grid.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heads: vec![None; SPATIAL_INDEX_SIZE],
        }
    }

    /// Number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heads.len()
    }

    /// Whether the table has no buckets (only true for a malformed load).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    /// First slot in bucket `key`.
    #[must_use]
    pub fn head(&self, key: SpatialKey) -> Option<SpriteIndex> {
        self.heads.get(key.as_usize()).copied().flatten()
    }

    pub(crate) fn set_head(&mut self, key: SpatialKey, head: Option<SpriteIndex>) {
        if let Some(slot) = self.heads.get_mut(key.as_usize()) {
            *slot = head;
        }
    }

    fn clear(&mut self) {
        self.heads.fill(None);
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a chain link lives: a bucket head or a slot's `next_in_cell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellLink {
    Head(SpatialKey),
    Slot(SpriteIndex),
}

impl SpritePool {
    fn cell_link(&self, link: CellLink) -> Option<SpriteIndex> {
        match link {
            CellLink::Head(key) => self.spatial.head(key),
            CellLink::Slot(index) => self.slot(index).and_then(|s| s.next_in_cell),
        }
    }

    fn set_cell_link(&mut self, link: CellLink, value: Option<SpriteIndex>) {
        match link {
            CellLink::Head(key) => self.spatial.set_head(key, value),
            CellLink::Slot(index) => {
                if let Some(sprite) = self.sprites.get_mut(index.as_usize()) {
                    sprite.next_in_cell = value;
                }
            }
        }
    }

    /// Link an allocated slot into the bucket for `coords`.
    ///
    /// Walks past every entry with a higher slot index so the chain stays in
    /// descending order.
    pub(crate) fn spatial_insert(&mut self, index: SpriteIndex, coords: CoordsXYZ) {
        let key = SpatialKey::of(coords);
        let mut link = CellLink::Head(key);
        let mut steps = 0;
        loop {
            match self.cell_link(link) {
                Some(current) if current == index => return,
                Some(current) if current > index && steps < self.capacity() => {
                    link = CellLink::Slot(current);
                    steps += 1;
                }
                rest => {
                    self.set_cell_link(CellLink::Slot(index), rest);
                    self.set_cell_link(link, Some(index));
                    return;
                }
            }
        }
    }

    /// Unlink a slot from the bucket of its current position.
    ///
    /// A slot missing from the bucket it should be in means the grid is
    /// corrupt (the bucket is empty, or the slot was misfiled into another
    /// chain); the grid is rebuilt from the pool and the removal retried.
    pub(crate) fn spatial_remove(&mut self, index: SpriteIndex) {
        let Some(position) = self.slot(index).map(|s| s.position) else {
            return;
        };
        let key = SpatialKey::of(position);

        if self.spatial.head(key).is_none() || !self.unlink_from_bucket(key, index) {
            tracing::warn!(
                index = index.0,
                bucket = key.as_usize(),
                "Bad sprite spatial index, rebuilding"
            );
            self.rebuild_spatial_index();
            if !self.unlink_from_bucket(key, index) {
                tracing::warn!(
                    index = index.0,
                    bucket = key.as_usize(),
                    "Sprite missing from its spatial bucket"
                );
            }
        }
        self.set_cell_link(CellLink::Slot(index), None);
    }

    fn unlink_from_bucket(&mut self, key: SpatialKey, index: SpriteIndex) -> bool {
        let mut link = CellLink::Head(key);
        for _ in 0..=self.capacity() {
            match self.cell_link(link) {
                None => return false,
                Some(current) if current == index => {
                    let after = self.cell_link(CellLink::Slot(index));
                    self.set_cell_link(link, after);
                    return true;
                }
                Some(current) => link = CellLink::Slot(current),
            }
        }
        false
    }

    /// Move a slot between buckets if `to` lands in a different one.
    pub(crate) fn spatial_move(&mut self, index: SpriteIndex, to: CoordsXYZ) {
        let Some(from) = self.slot(index).map(|s| s.position) else {
            return;
        };
        let (old_key, new_key) = (SpatialKey::of(from), SpatialKey::of(to));
        if old_key == new_key {
            return;
        }
        tracing::trace!(
            index = index.0,
            from = old_key.as_usize(),
            to = new_key.as_usize(),
            "Sprite changed bucket"
        );
        self.spatial_remove(index);
        self.spatial_insert(index, to);
    }

    /// Clear every bucket and re-link all allocated slots from their
    /// stored positions.
    ///
    /// Slots are visited in ascending order and pushed onto bucket heads,
    /// which leaves each chain in descending order.
    pub fn rebuild_spatial_index(&mut self) {
        self.spatial.clear();
        for i in 0..self.sprites.len() {
            let sprite = &self.sprites[i];
            if !sprite.is_allocated() {
                self.sprites[i].next_in_cell = None;
                continue;
            }
            let index = sprite.index;
            let key = SpatialKey::of(sprite.position);
            let old_head = self.spatial.head(key);
            self.sprites[i].next_in_cell = old_head;
            self.spatial.set_head(key, Some(index));
        }
    }

    /// First sprite standing in the tile containing `(x, y)`.
    ///
    /// Always `None` for `x == LOCATION_NULL`.
    #[must_use]
    pub fn first_in_bucket(&self, x: i32, y: i32) -> Option<SpriteIndex> {
        let key = SpatialKey::from_xy(x, y);
        if key.is_indexed() {
            self.spatial.head(key)
        } else {
            None
        }
    }

    /// Every sprite standing in the tile containing `(x, y)`, walking the
    /// bucket chain for at most `capacity` steps.
    #[must_use]
    pub fn sprites_at(&self, x: i32, y: i32) -> BucketIter<'_> {
        BucketIter {
            pool: self,
            next: self.first_in_bucket(x, y),
            remaining: self.capacity(),
        }
    }

    /// Head of bucket `key`, including the unindexed bucket.
    #[must_use]
    pub fn bucket_head(&self, key: SpatialKey) -> Option<SpriteIndex> {
        self.spatial.head(key)
    }
}

/// Borrowing iterator over one bucket chain.
#[derive(Debug, Clone)]
pub struct BucketIter<'a> {
    pool: &'a SpritePool,
    next: Option<SpriteIndex>,
    remaining: usize,
}

impl Iterator for BucketIter<'_> {
    type Item = SpriteIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        let sprite = self.pool.slot(current)?;
        self.remaining -= 1;
        self.next = sprite.next_in_cell;
        Some(current)
    }
}
