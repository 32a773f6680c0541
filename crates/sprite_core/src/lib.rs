//! # Sprite Core
//!
//! Fixed-capacity store for every dynamic world object: vehicles, guests,
//! litter and short-lived effects.
//!
//! One backing array of [`sprite::Sprite`] slots is viewed three ways:
//! - **Type lists**: intrusive doubly-linked lists, one per [`sprite::SpriteList`].
//!   Allocation pops the free list, freeing pushes back onto it.
//! - **Spatial grid**: one singly-linked chain per 32-unit tile, ordered by
//!   descending slot index, answering "what is standing here".
//! - **Tween snapshots**: two position copies used to blend rendered
//!   positions between ticks.
//!
//! The structures are linked by hand and may arrive corrupted from old saves,
//! so [`checker`] and [`audit`] walk them with bounded step counts and can
//! repair cycles and orphaned slots in place.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering (screen rectangles go out through [`viewport::ViewportSink`])
//! - No IO
//! - No system randomness
//! - No floating-point math (blend factors are fixed-point)
//!
//! ## Crate Structure
//!
//! - [`pool`] - Slot storage, allocate/free, reset, save blobs
//! - [`list`] - Type list surgery and iteration
//! - [`spatial`] - Spatial grid buckets
//! - [`movement`] - Placement and screen bounds
//! - [`checker`] - Cycle detection/repair and orphan relinking
//! - [`audit`] - Read-only integrity report
//! - [`tween`] - Render interpolation snapshots
//! - [`effects`], [`litter`] - Built-in sprite behaviours

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod audit;
pub mod checker;
pub mod checksum;
pub mod config;
pub mod coords;
pub mod effects;
pub mod error;
#[cfg(feature = "fault-injection")]
pub mod fault;
pub mod kind;
pub mod list;
pub mod litter;
pub mod math;
pub mod movement;
pub mod pool;
pub mod spatial;
pub mod sprite;
pub mod tween;
pub mod viewport;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::audit::IntegrityReport;
    pub use crate::checksum::SpriteChecksum;
    pub use crate::config::PoolConfig;
    pub use crate::coords::{CoordsXYZ, MapBounds, LOCATION_NULL};
    pub use crate::effects::{BuiltinEffects, MiscUpdater};
    pub use crate::error::{PoolError, Result};
    pub use crate::kind::SpriteType;
    pub use crate::litter::LitterSurface;
    pub use crate::math::Fixed;
    pub use crate::pool::SpritePool;
    pub use crate::spatial::SpatialKey;
    pub use crate::sprite::{
        LitterKind, MiscKind, Sprite, SpriteIdentifier, SpriteIndex, SpriteKind, SpriteList,
    };
    pub use crate::tween::TweenSlot;
    pub use crate::viewport::{
        NullViewports, Rotation, ScreenRect, SpriteBounds, ViewportSink, ZoomLevel,
    };
}
