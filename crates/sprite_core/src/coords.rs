//! World coordinates and map bounds.

use serde::{Deserialize, Serialize};

/// Marks an x coordinate as "not placed in the world".
pub const LOCATION_NULL: i32 = i16::MIN as i32;

/// Size of one map tile in world units.
pub const COORDS_XY_STEP: i32 = 32;

/// Largest map edge the spatial grid can key, in tiles.
pub const MAXIMUM_MAP_SIZE: u16 = 256;

/// A world position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CoordsXYZ {
    /// X coordinate, or [`LOCATION_NULL`] when unplaced.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
    /// Height.
    pub z: i32,
}

impl CoordsXYZ {
    /// Create a new position.
    #[must_use]
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The position every freshly allocated sprite starts at.
    pub const NULL: Self = Self {
        x: LOCATION_NULL,
        y: LOCATION_NULL,
        z: 0,
    };

    /// Whether this position is outside the world.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.x == LOCATION_NULL
    }
}

/// Offset for each of the eight sprite directions (`direction >> 3`).
const DIRECTION_DELTAS: [(i32, i32); 8] = [
    (-COORDS_XY_STEP, 0),
    (0, COORDS_XY_STEP),
    (COORDS_XY_STEP, 0),
    (0, -COORDS_XY_STEP),
    (-COORDS_XY_STEP, COORDS_XY_STEP),
    (COORDS_XY_STEP, COORDS_XY_STEP),
    (COORDS_XY_STEP, -COORDS_XY_STEP),
    (-COORDS_XY_STEP, -COORDS_XY_STEP),
];

/// One-tile step for a direction index in `0..8` (wraps).
#[must_use]
pub const fn direction_delta(direction: u8) -> (i32, i32) {
    DIRECTION_DELTAS[(direction & 7) as usize]
}

/// Square playable map, used to decide whether a position is in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapBounds {
    /// Edge length in tiles.
    pub size_tiles: u16,
}

impl MapBounds {
    /// Create bounds for a square map.
    #[must_use]
    pub const fn new(size_tiles: u16) -> Self {
        Self { size_tiles }
    }

    /// Whether `(x, y)` lies on the map. Height is unrestricted.
    #[must_use]
    pub fn is_location_valid(&self, coords: CoordsXYZ) -> bool {
        let limit = i32::from(self.size_tiles) * COORDS_XY_STEP;
        coords.x >= 0 && coords.y >= 0 && coords.x < limit && coords.y < limit
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        Self::new(MAXIMUM_MAP_SIZE)
    }
}
