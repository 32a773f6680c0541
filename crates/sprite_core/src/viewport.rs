//! Screen projection and viewport invalidation seams.
//!
//! The renderer owns viewports. The pool only needs to know how a world
//! position lands on screen for the current camera rotation, and a place
//! to report screen rectangles that need redrawing.

use serde::{Deserialize, Serialize};

use crate::coords::CoordsXYZ;

/// Camera rotation in quarter turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    /// Default north-up view.
    #[default]
    R0,
    /// Rotated 90 degrees.
    R1,
    /// Rotated 180 degrees.
    R2,
    /// Rotated 270 degrees.
    R3,
}

impl Rotation {
    /// Build a rotation from any integer (taken modulo 4).
    #[must_use]
    pub const fn from_quarter_turns(turns: u8) -> Self {
        match turns & 3 {
            0 => Self::R0,
            1 => Self::R1,
            2 => Self::R2,
            _ => Self::R3,
        }
    }
}

/// Zoom floor for invalidation requests: only viewports zoomed in at least
/// this far are asked to redraw.
pub type ZoomLevel = u8;

/// A point in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenCoords {
    /// Horizontal.
    pub x: i32,
    /// Vertical.
    pub y: i32,
}

/// Screen-space bounding box of a drawn sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenRect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge.
    pub right: i32,
    /// Bottom edge.
    pub bottom: i32,
}

/// Half-extents of a sprite's image around its projected anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteBounds {
    /// Half width.
    pub width: u8,
    /// Extent above the anchor.
    pub height_negative: u8,
    /// Extent below the anchor.
    pub height_positive: u8,
}

impl SpriteBounds {
    /// Create bounds from raw extents.
    #[must_use]
    pub const fn new(width: u8, height_negative: u8, height_positive: u8) -> Self {
        Self {
            width,
            height_negative,
            height_positive,
        }
    }

    /// Bounds applied to every freshly allocated sprite.
    pub const DEFAULT: Self = Self::new(0x10, 0x14, 0x08);

    /// Rectangle around a projected anchor point.
    #[must_use]
    pub fn rect_around(&self, anchor: ScreenCoords) -> ScreenRect {
        ScreenRect {
            left: anchor.x - i32::from(self.width),
            right: anchor.x + i32::from(self.width),
            top: anchor.y - i32::from(self.height_negative),
            bottom: anchor.y + i32::from(self.height_positive),
        }
    }
}

impl Default for SpriteBounds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Project a world position onto the screen for the given rotation.
#[must_use]
pub fn translate_3d_to_2d(rotation: Rotation, coords: CoordsXYZ) -> ScreenCoords {
    let CoordsXYZ { x, y, z } = coords;
    let (sx, sy) = match rotation {
        Rotation::R0 => (y - x, (x + y) / 2),
        Rotation::R1 => (-x - y, (y - x) / 2),
        Rotation::R2 => (x - y, (-x - y) / 2),
        Rotation::R3 => (x + y, (x - y) / 2),
    };
    ScreenCoords { x: sx, y: sy - z }
}

/// Receiver for redraw requests.
///
/// Implemented by the renderer; tests use a recording implementation.
pub trait ViewportSink {
    /// Request a redraw of `rect` in every viewport whose zoom is at most
    /// `max_zoom`.
    fn invalidate(&mut self, rect: ScreenRect, max_zoom: ZoomLevel);
}

/// Sink that drops every request, for headless callers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullViewports;

impl ViewportSink for NullViewports {
    fn invalidate(&mut self, _rect: ScreenRect, _max_zoom: ZoomLevel) {}
}
