//! Litter dropped by guests.

use crate::coords::{direction_delta, CoordsXYZ};
use crate::error::Result;
use crate::kind::Litter;
use crate::pool::SpritePool;
use crate::sprite::{LitterKind, SpriteIndex, SpriteKind, SpriteList};
use crate::viewport::{SpriteBounds, ViewportSink};

const LITTER_BOUNDS: SpriteBounds = SpriteBounds::new(6, 6, 3);

/// Horizontal reach of [`SpritePool::remove_litter_at`].
const SWEEP_XY_RANGE: i32 = 8;
/// Vertical reach of [`SpritePool::remove_litter_at`].
const SWEEP_Z_RANGE: i32 = 16;

/// Terrain query deciding where litter may land (owned land with a path
/// at the right height, in the game).
pub trait LitterSurface {
    /// Whether litter may be placed at `coords`.
    fn can_host_litter(&self, coords: CoordsXYZ) -> bool;
}

impl<F: Fn(CoordsXYZ) -> bool> LitterSurface for F {
    fn can_host_litter(&self, coords: CoordsXYZ) -> bool {
        self(coords)
    }
}

impl SpritePool {
    /// Drop a piece of litter near `at`, nudged an eighth of a tile in
    /// `direction`.
    ///
    /// Returns `Ok(None)` when littering is disabled or the surface refuses.
    /// At the litter cap the newest existing litter is removed first.
    ///
    /// # Errors
    ///
    /// [`PoolError::NoCapacity`](crate::error::PoolError::NoCapacity) when
    /// no slot is free.
    pub fn create_litter(
        &mut self,
        at: CoordsXYZ,
        direction: u8,
        kind: LitterKind,
        tick: u32,
        surface: &dyn LitterSurface,
        viewports: &mut dyn ViewportSink,
    ) -> Result<Option<SpriteIndex>> {
        if !self.config.littering_enabled {
            return Ok(None);
        }

        let (dx, dy) = direction_delta(direction >> 3);
        let target = CoordsXYZ::new(at.x + dx / 8, at.y + dy / 8, at.z);
        if !surface.can_host_litter(target) {
            return Ok(None);
        }

        if self.list_count(SpriteList::Litter) >= self.config.litter_cap {
            if let Some(newest) = self.newest_litter() {
                tracing::debug!(index = newest.0, "Litter cap reached, recycling newest");
                self.invalidate_sprite(newest, 0, viewports);
                self.free(newest)?;
            }
        }

        let index = self.allocate_kind(SpriteKind::Litter(kind))?;
        if let Some(sprite) = self.get_mut(index) {
            sprite.direction = direction;
            sprite.bounds = LITTER_BOUNDS;
        }
        self.move_to(index, target)?;
        self.invalidate_sprite(index, 0, viewports);
        if let Some(sprite) = self.get_mut(index) {
            sprite.creation_tick = tick;
        }
        Ok(Some(index))
    }

    /// Litter with the latest creation tick; on ties, the one furthest
    /// down the list.
    fn newest_litter(&self) -> Option<SpriteIndex> {
        let mut newest = None;
        let mut newest_tick = 0;
        for sprite in self.iter_of::<Litter>() {
            if newest_tick <= sprite.creation_tick {
                newest_tick = sprite.creation_tick;
                newest = Some(sprite.index());
            }
        }
        newest
    }

    /// Remove litter within 8 units horizontally and 16 vertically of `at`,
    /// looking only in the tile containing `at`.
    ///
    /// Returns the number of pieces removed.
    pub fn remove_litter_at(&mut self, at: CoordsXYZ, viewports: &mut dyn ViewportSink) -> u16 {
        let doomed: Vec<SpriteIndex> = self
            .sprites_at(at.x, at.y)
            .filter_map(|i| self.get_as::<Litter>(i))
            .filter(|s| {
                let p = s.position();
                (p.z - at.z).abs() <= SWEEP_Z_RANGE
                    && (p.x - at.x).abs() <= SWEEP_XY_RANGE
                    && (p.y - at.y).abs() <= SWEEP_XY_RANGE
            })
            .map(|s| s.index())
            .collect();

        let mut removed = 0;
        for index in doomed {
            self.invalidate_sprite(index, 0, viewports);
            if self.free(index).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}
