//! Deliberate corruption for repair tests and tooling.
//!
//! Only compiled with the `fault-injection` feature. Every method here
//! bypasses the list and spatial entry points on purpose.

use crate::pool::SpritePool;
use crate::spatial::SpatialKey;
use crate::sprite::{SpriteIndex, SpriteList};

impl SpritePool {
    /// Overwrite a slot's type-list successor.
    pub fn inject_list_link(&mut self, index: SpriteIndex, next: Option<SpriteIndex>) {
        if let Some(sprite) = self.sprites.get_mut(index.as_usize()) {
            sprite.next = next;
        }
    }

    /// Overwrite a slot's bucket successor.
    pub fn inject_cell_link(&mut self, index: SpriteIndex, next: Option<SpriteIndex>) {
        if let Some(sprite) = self.sprites.get_mut(index.as_usize()) {
            sprite.next_in_cell = next;
        }
    }

    /// Overwrite a list head.
    pub fn inject_list_head(&mut self, list: SpriteList, head: Option<SpriteIndex>) {
        self.lists.set_head(list, head);
    }

    /// Overwrite a list's recorded population.
    pub fn inject_list_count(&mut self, list: SpriteList, count: u16) {
        self.lists.set_count(list, count);
    }

    /// Overwrite a bucket head.
    pub fn inject_bucket_head(&mut self, bucket: SpatialKey, head: Option<SpriteIndex>) {
        self.spatial.set_head(bucket, head);
    }
}
