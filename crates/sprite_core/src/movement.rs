//! Placement: the only path that changes a sprite's position.

use crate::coords::{CoordsXYZ, LOCATION_NULL};
use crate::error::Result;
use crate::pool::SpritePool;
use crate::sprite::SpriteIndex;
use crate::viewport::{translate_3d_to_2d, Rotation, ViewportSink, ZoomLevel};

impl SpritePool {
    /// Move a sprite to `target`, relocating it in the spatial grid and
    /// recomputing its screen rectangle.
    ///
    /// A target outside the map is not an error: the sprite is taken off
    /// the world (`x = LOCATION_NULL`, no screen rectangle) but keeps its
    /// list membership.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidIndex`](crate::error::PoolError::InvalidIndex) or
    /// [`PoolError::NotAllocated`](crate::error::PoolError::NotAllocated)
    /// when `index` does not name a live sprite.
    pub fn move_to(&mut self, index: SpriteIndex, target: CoordsXYZ) -> Result<()> {
        self.live_sprite(index)?;

        let mut target = target;
        if !self.config.map_bounds().is_location_valid(target) {
            target.x = LOCATION_NULL;
        }

        self.spatial_move(index, target);
        self.set_coordinates(index, target);
        Ok(())
    }

    /// Store a position and its screen rectangle without touching the
    /// spatial grid. Used by tweening, which restores the real position
    /// before the next tick.
    pub(crate) fn set_coordinates(&mut self, index: SpriteIndex, coords: CoordsXYZ) {
        let rotation = self.rotation;
        let Some(sprite) = self.sprites.get_mut(index.as_usize()) else {
            return;
        };
        sprite.position = coords;
        sprite.screen = if coords.is_null() {
            None
        } else {
            Some(sprite.bounds.rect_around(translate_3d_to_2d(rotation, coords)))
        };
    }

    /// Camera rotation used for screen rectangles.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Change the camera rotation and reproject every placed sprite.
    pub fn set_rotation(&mut self, rotation: Rotation) {
        if self.rotation == rotation {
            return;
        }
        self.rotation = rotation;
        for i in 0..self.sprites.len() {
            let sprite = &self.sprites[i];
            if sprite.is_allocated() && !sprite.position.is_null() {
                let (index, position) = (sprite.index, sprite.position);
                self.set_coordinates(index, position);
            }
        }
    }

    /// Ask every viewport zoomed in to at least `max_zoom` to redraw the
    /// sprite. Sprites with no screen rectangle request nothing.
    pub fn invalidate_sprite(
        &self,
        index: SpriteIndex,
        max_zoom: ZoomLevel,
        viewports: &mut dyn ViewportSink,
    ) {
        if let Some(rect) = self.slot(index).and_then(|s| s.screen) {
            viewports.invalidate(rect, max_zoom);
        }
    }
}
