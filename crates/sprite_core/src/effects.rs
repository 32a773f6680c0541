//! Misc effect hook-in and the built-in explosion and steam effects.
//!
//! Per-kind behaviour lives outside the pool. [`SpritePool::update_misc_all`]
//! walks the misc list once per tick and hands each sprite to a
//! [`MiscUpdater`], which may move or free it.

use crate::coords::CoordsXYZ;
use crate::error::{PoolError, Result};
use crate::pool::SpritePool;
use crate::sprite::{MiscKind, SpriteIndex, SpriteKind, SpriteList};
use crate::viewport::{SpriteBounds, ViewportSink, ZoomLevel};

/// Zoom floor effects redraw at.
const EFFECT_INVALIDATE_ZOOM: ZoomLevel = 2;

const STEAM_FRAME_STEP: u16 = 64;
const STEAM_LAST_FRAME: u16 = 56 * 64;
const STEAM_RISE_INTERVAL: u16 = 4;

const CLOUD_FRAME_STEP: u16 = 128;
const CLOUD_LAST_FRAME: u16 = 36 * 128;
const CLOUD_BOUNDS: SpriteBounds = SpriteBounds::new(44, 32, 34);

const FLARE_FRAME_STEP: u16 = 64;
const FLARE_LAST_FRAME: u16 = 124 * 64;
const FLARE_BOUNDS: SpriteBounds = SpriteBounds::new(25, 85, 8);

/// Height explosions spawn above the requested point.
const EXPLOSION_Z_OFFSET: i32 = 4;

/// Per-tick behaviour for misc sprites.
pub trait MiscUpdater {
    /// Advance one misc sprite by a tick. The sprite may be freed.
    fn update(
        &mut self,
        pool: &mut SpritePool,
        index: SpriteIndex,
        kind: MiscKind,
        viewports: &mut dyn ViewportSink,
    ) -> Result<()>;
}

/// Steam particles, explosion clouds and explosion flares.
///
/// Other kinds are left untouched; wrap this updater to add them.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinEffects;

impl MiscUpdater for BuiltinEffects {
    fn update(
        &mut self,
        pool: &mut SpritePool,
        index: SpriteIndex,
        kind: MiscKind,
        viewports: &mut dyn ViewportSink,
    ) -> Result<()> {
        match kind {
            MiscKind::SteamParticle => update_steam_particle(pool, index, viewports),
            MiscKind::ExplosionCloud => {
                advance_frames(pool, index, CLOUD_FRAME_STEP, CLOUD_LAST_FRAME, viewports)
            }
            MiscKind::ExplosionFlare => {
                advance_frames(pool, index, FLARE_FRAME_STEP, FLARE_LAST_FRAME, viewports)
            }
            _ => Ok(()),
        }
    }
}

/// Steam rises one unit every third tick, starting on the fourth.
fn update_steam_particle(
    pool: &mut SpritePool,
    index: SpriteIndex,
    viewports: &mut dyn ViewportSink,
) -> Result<()> {
    pool.invalidate_sprite(index, EFFECT_INVALIDATE_ZOOM, viewports);

    let sprite = pool.live_sprite(index)?;
    let mut position = sprite.position();
    let mut timer = sprite.timer + 1;
    if timer >= STEAM_RISE_INTERVAL {
        timer = 1;
        position.z += 1;
        pool.move_to(index, position)?;
    }

    let frame = bump_frame(pool, index, STEAM_FRAME_STEP, timer)?;
    if frame >= STEAM_LAST_FRAME {
        pool.free(index)?;
    }
    Ok(())
}

fn advance_frames(
    pool: &mut SpritePool,
    index: SpriteIndex,
    step: u16,
    last: u16,
    viewports: &mut dyn ViewportSink,
) -> Result<()> {
    pool.invalidate_sprite(index, EFFECT_INVALIDATE_ZOOM, viewports);
    let timer = pool.live_sprite(index)?.timer;
    if bump_frame(pool, index, step, timer)? >= last {
        pool.free(index)?;
    }
    Ok(())
}

fn bump_frame(pool: &mut SpritePool, index: SpriteIndex, step: u16, timer: u16) -> Result<u16> {
    let sprite = pool
        .get_mut(index)
        .ok_or(PoolError::InvalidIndex(index.0))?;
    sprite.timer = timer;
    sprite.frame = sprite.frame.saturating_add(step);
    Ok(sprite.frame)
}

impl SpritePool {
    /// Run `updater` over every misc sprite.
    ///
    /// The successor is read before each visit, so the updater may free the
    /// sprite it is given. Failures are logged and the walk continues.
    pub fn update_misc_all(
        &mut self,
        updater: &mut dyn MiscUpdater,
        viewports: &mut dyn ViewportSink,
    ) {
        let mut cursor = self.list_cursor(SpriteList::Misc);
        while let Some(index) = cursor.advance(self) {
            let Some(kind) = self.slot(index).and_then(|s| s.kind.misc_kind()) else {
                continue;
            };
            if let Err(error) = updater.update(self, index, kind, viewports) {
                tracing::warn!(index = index.0, kind = ?kind, %error, "Misc sprite update failed");
            }
        }
    }

    fn spawn_explosion(
        &mut self,
        kind: MiscKind,
        bounds: SpriteBounds,
        at: CoordsXYZ,
    ) -> Result<SpriteIndex> {
        let index = self.allocate_kind(SpriteKind::Misc(kind))?;
        if let Some(sprite) = self.get_mut(index) {
            sprite.bounds = bounds;
            sprite.frame = 0;
        }
        self.move_to(index, CoordsXYZ::new(at.x, at.y, at.z + EXPLOSION_Z_OFFSET))?;
        Ok(index)
    }

    /// Spawn a smoke cloud just above `at`.
    pub fn spawn_explosion_cloud(&mut self, at: CoordsXYZ) -> Result<SpriteIndex> {
        self.spawn_explosion(MiscKind::ExplosionCloud, CLOUD_BOUNDS, at)
    }

    /// Spawn an explosion flash just above `at`.
    pub fn spawn_explosion_flare(&mut self, at: CoordsXYZ) -> Result<SpriteIndex> {
        self.spawn_explosion(MiscKind::ExplosionFlare, FLARE_BOUNDS, at)
    }
}
