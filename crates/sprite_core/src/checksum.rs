//! Game-state checksum over the pool, for desync detection.
//!
//! Only sprites that affect game state are hashed: free slots and misc
//! effects are skipped, and render-only fields are zeroed first.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::pool::SpritePool;
use crate::sprite::{SpriteIdentifier, SpriteIndex};
use crate::viewport::SpriteBounds;

/// Hash of the game-relevant sprite state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpriteChecksum(pub u64);

impl SpriteChecksum {
    /// Lower-case hex, 16 digits.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl fmt::Display for SpriteChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl SpritePool {
    /// Hash every allocated non-misc sprite in slot order.
    ///
    /// Screen rectangles and bounds are cleared before hashing, and a
    /// sprite's `next_in_cell` skips over misc effects, so two pools that
    /// differ only in effects or camera produce the same checksum.
    #[must_use]
    pub fn checksum(&self) -> SpriteChecksum {
        let mut hasher = DefaultHasher::new();

        for sprite in self.slots() {
            let identifier = sprite.kind.identifier();
            if identifier == SpriteIdentifier::Null || identifier == SpriteIdentifier::Misc {
                continue;
            }

            let mut copy = sprite.clone();
            copy.screen = None;
            copy.bounds = SpriteBounds::new(0, 0, 0);
            copy.next_in_cell = self.next_non_misc_in_cell(sprite.next_in_cell);
            copy.hash(&mut hasher);
        }

        SpriteChecksum(hasher.finish())
    }

    fn next_non_misc_in_cell(&self, mut cursor: Option<SpriteIndex>) -> Option<SpriteIndex> {
        for _ in 0..self.capacity() {
            let sprite = self.slot(cursor?)?;
            if sprite.kind.identifier() != SpriteIdentifier::Misc {
                return cursor;
            }
            cursor = sprite.next_in_cell;
        }
        cursor
    }
}
