//! Render interpolation between simulation ticks.
//!
//! Two snapshots of every slot's position are kept. Before drawing a frame
//! the renderer blends vehicles and guests between them; before the next
//! tick it restores the exact positions. Blending only rewrites positions
//! and screen rectangles, never the spatial grid.

use serde::{Deserialize, Serialize};

use crate::coords::CoordsXYZ;
use crate::math::{clamp_unit, lerp_coord, Fixed};
use crate::pool::SpritePool;
use crate::sprite::{SpriteIdentifier, SpriteIndex};
use crate::viewport::{ViewportSink, ZoomLevel};

/// Zoom floor for tween redraw requests.
const TWEEN_INVALIDATE_ZOOM: ZoomLevel = 2;

/// Which snapshot to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TweenSlot {
    /// Position at the previous tick.
    A,
    /// Position at the current tick.
    B,
}

/// The two snapshot arrays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweenBuffer {
    a: Vec<CoordsXYZ>,
    b: Vec<CoordsXYZ>,
}

impl TweenBuffer {
    /// Snapshots for `capacity` slots, all unplaced.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            a: vec![CoordsXYZ::NULL; capacity],
            b: vec![CoordsXYZ::NULL; capacity],
        }
    }

    pub(crate) fn has_len(&self, capacity: usize) -> bool {
        self.a.len() == capacity && self.b.len() == capacity
    }

    fn slot_mut(&mut self, slot: TweenSlot) -> &mut Vec<CoordsXYZ> {
        match slot {
            TweenSlot::A => &mut self.a,
            TweenSlot::B => &mut self.b,
        }
    }
}

/// Only vehicles and guests move smoothly enough to be worth blending.
fn should_tween(identifier: SpriteIdentifier) -> bool {
    matches!(identifier, SpriteIdentifier::Peep | SpriteIdentifier::Vehicle)
}

impl SpritePool {
    /// Copy every slot's position into one snapshot.
    pub fn store_snapshot(&mut self, slot: TweenSlot) {
        let positions = self.tween.slot_mut(slot);
        positions.clear();
        positions.extend(self.sprites.iter().map(|s| s.position));
    }

    /// Set both snapshots to the current positions.
    pub fn tween_reset(&mut self) {
        self.store_snapshot(TweenSlot::A);
        self.store_snapshot(TweenSlot::B);
    }

    /// Blend tweenable sprites between snapshot A (`alpha = 0`) and
    /// snapshot B (`alpha = 1`).
    ///
    /// Sprites that did not move between the snapshots are left alone.
    pub fn interpolate_all(&mut self, alpha: Fixed, viewports: &mut dyn ViewportSink) {
        let alpha = clamp_unit(alpha);
        for i in 0..self.sprites.len() {
            if !should_tween(self.sprites[i].kind.identifier()) {
                continue;
            }
            let (Some(&from), Some(&to)) = (self.tween.a.get(i), self.tween.b.get(i)) else {
                continue;
            };
            if from == to {
                continue;
            }
            let blended = CoordsXYZ::new(
                lerp_coord(from.x, to.x, alpha),
                lerp_coord(from.y, to.y, alpha),
                lerp_coord(from.z, to.z, alpha),
            );
            let index = SpriteIndex(i as u16);
            self.set_coordinates(index, blended);
            self.invalidate_sprite(index, TWEEN_INVALIDATE_ZOOM, viewports);
        }
    }

    /// Put tweenable sprites back at their snapshot-B positions.
    pub fn restore_exact(&mut self, viewports: &mut dyn ViewportSink) {
        for i in 0..self.sprites.len() {
            if !should_tween(self.sprites[i].kind.identifier()) {
                continue;
            }
            let Some(&exact) = self.tween.b.get(i) else {
                continue;
            };
            let index = SpriteIndex(i as u16);
            self.invalidate_sprite(index, TWEEN_INVALIDATE_ZOOM, viewports);
            self.set_coordinates(index, exact);
        }
    }
}
