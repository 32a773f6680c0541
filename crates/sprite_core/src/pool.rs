//! Slot storage and the allocate/free lifecycle.
//!
//! [`SpritePool`] owns every slot plus the indices built over them. It is
//! an ordinary value: create one per session, drop it at the end, and run
//! as many side by side as needed (tests do).
//!
//! # Example
//!
//! ```
//! use sprite_core::prelude::*;
//!
//! let mut pool = SpritePool::new(PoolConfig::with_capacity(64, 8)).unwrap();
//!
//! let guest = pool.allocate(SpriteList::Peep).unwrap();
//! pool.move_to(guest, CoordsXYZ::new(100, 200, 16)).unwrap();
//! assert_eq!(pool.first_in_bucket(100, 200), Some(guest));
//!
//! pool.free(guest).unwrap();
//! assert_eq!(pool.list_head(SpriteList::Free), Some(guest));
//! ```

use serde::{Deserialize, Serialize};

use crate::config::PoolConfig;
use crate::coords::CoordsXYZ;
use crate::error::{PoolError, Result};
use crate::kind::SpriteType;
use crate::list::ListHeads;
use crate::spatial::{SpatialIndex, SPATIAL_INDEX_SIZE};
use crate::sprite::{Sprite, SpriteIdentifier, SpriteIndex, SpriteKind, SpriteList};
use crate::tween::TweenBuffer;
use crate::viewport::{Rotation, SpriteBounds};

/// The sprite pool and every index over it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpritePool {
    pub(crate) config: PoolConfig,
    pub(crate) sprites: Vec<Sprite>,
    pub(crate) lists: ListHeads,
    pub(crate) spatial: SpatialIndex,
    pub(crate) tween: TweenBuffer,
    pub(crate) flashing: Vec<bool>,
    pub(crate) rotation: Rotation,
}

impl SpritePool {
    /// Create a pool with every slot free.
    pub fn new(config: PoolConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: PoolConfig) -> Self {
        let capacity = usize::from(config.capacity);
        let mut pool = Self {
            config,
            sprites: Vec::with_capacity(capacity),
            lists: ListHeads::default(),
            spatial: SpatialIndex::new(),
            tween: TweenBuffer::new(capacity),
            flashing: vec![false; capacity],
            rotation: Rotation::default(),
        };
        pool.reset_all();
        pool
    }

    /// Return every slot to the free list.
    ///
    /// The free list is rebuilt as one chain in ascending slot order, the
    /// spatial grid is emptied and tween snapshots are cleared.
    pub fn reset_all(&mut self) {
        let capacity = usize::from(self.config.capacity);

        self.sprites.clear();
        self.sprites
            .extend((0..self.config.capacity).map(|i| Sprite::vacant(SpriteIndex(i))));

        for i in 0..capacity {
            let sprite = &mut self.sprites[i];
            sprite.prev = i.checked_sub(1).map(|p| SpriteIndex(p as u16));
            sprite.next = (i + 1 < capacity).then(|| SpriteIndex((i + 1) as u16));
        }

        self.lists = ListHeads::default();
        self.lists.set_head(SpriteList::Free, Some(SpriteIndex(0)));
        self.lists.set_count(SpriteList::Free, self.config.capacity);

        self.flashing.clear();
        self.flashing.resize(capacity, false);
        self.tween = TweenBuffer::new(capacity);

        self.rebuild_spatial_index();

        tracing::debug!(capacity, "Sprite pool reset");
    }

    /// Configuration the pool was built with.
    #[must_use]
    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.sprites.len()
    }

    /// Take a slot from the free list and place it in `list`.
    ///
    /// The slot is scrubbed, unplaced (x = `LOCATION_NULL`) and given default
    /// bounds. Its kind stays `Null` until the caller tags it; prefer
    /// [`allocate_kind`](Self::allocate_kind).
    ///
    /// # Errors
    ///
    /// [`PoolError::NoCapacity`] when no slot is free, or when `list` is
    /// [`SpriteList::Misc`] and the misc soft cap refuses the request.
    /// [`PoolError::InvalidList`] for [`SpriteList::Free`].
    pub fn allocate(&mut self, list: SpriteList) -> Result<SpriteIndex> {
        if list == SpriteList::Free {
            return Err(PoolError::InvalidList(Some(list)));
        }

        let free_count = self.lists.count(SpriteList::Free);
        let head = match self.lists.head(SpriteList::Free) {
            Some(head) if free_count > 0 && self.slot(head).is_some() => head,
            _ => {
                tracing::debug!(list = ?list, "No free sprite slots");
                return Err(PoolError::NoCapacity { list });
            }
        };

        if list == SpriteList::Misc && !self.misc_admits(free_count) {
            tracing::debug!(
                misc = self.lists.count(SpriteList::Misc),
                free = free_count,
                "Misc sprite refused by soft cap"
            );
            return Err(PoolError::NoCapacity { list });
        }

        self.relink_list(head, list);

        let sprite = &mut self.sprites[head.as_usize()];
        sprite.scrub();
        sprite.position = CoordsXYZ::NULL;
        sprite.bounds = SpriteBounds::DEFAULT;
        sprite.screen = None;
        self.flashing[head.as_usize()] = false;

        self.spatial_insert(head, CoordsXYZ::NULL);

        self.debug_validate();
        Ok(head)
    }

    /// Allocate a slot for `kind` in the list its identifier maps to, and tag it.
    pub fn allocate_kind(&mut self, kind: SpriteKind) -> Result<SpriteIndex> {
        let list = kind
            .identifier()
            .home_list()
            .ok_or(PoolError::InvalidList(None))?;
        let index = self.allocate(list)?;
        self.sprites[index.as_usize()].kind = kind;
        Ok(index)
    }

    /// Misc effects may not exceed the soft cap, and may not eat into the
    /// headroom the cap reserves for gameplay sprites.
    fn misc_admits(&self, free_count: u16) -> bool {
        let misc = self.lists.count(SpriteList::Misc);
        let cap = self.config.misc_soft_cap;
        misc < cap && cap - misc < free_count
    }

    /// Return a slot to the head of the free list.
    ///
    /// Any type-specific teardown (clearing references other systems hold to
    /// this slot) must happen before calling this.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidIndex`] for an out-of-range slot and
    /// [`PoolError::NotAllocated`] for a slot that is already free.
    pub fn free(&mut self, index: SpriteIndex) -> Result<()> {
        let sprite = self.sprite(index)?;
        if !sprite.is_allocated() {
            debug_assert!(false, "double free of sprite {index}");
            return Err(PoolError::NotAllocated(index.0));
        }

        self.spatial_remove(index);
        self.relink_list(index, SpriteList::Free);

        let sprite = &mut self.sprites[index.as_usize()];
        sprite.scrub();
        sprite.next_in_cell = None;
        self.flashing[index.as_usize()] = false;

        self.debug_validate();
        Ok(())
    }

    /// Slot at `index`, if it exists.
    #[must_use]
    pub fn get(&self, index: SpriteIndex) -> Option<&Sprite> {
        self.slot(index)
    }

    /// Mutable payload access for a slot.
    ///
    /// Links and position are not reachable through this reference; use
    /// [`move_to`](Self::move_to) and [`move_to_list`](Self::move_to_list).
    pub fn get_mut(&mut self, index: SpriteIndex) -> Option<&mut Sprite> {
        self.sprites.get_mut(index.as_usize())
    }

    /// Slot at `index` if it holds a sprite of class `T`.
    #[must_use]
    pub fn get_as<T: SpriteType>(&self, index: SpriteIndex) -> Option<&Sprite> {
        self.slot(index).filter(|s| T::matches(s.kind))
    }

    /// Whether the slot at `index` holds a sprite of class `T`.
    #[must_use]
    pub fn is<T: SpriteType>(&self, index: SpriteIndex) -> bool {
        self.get_as::<T>(index).is_some()
    }

    /// Every sprite of class `T`, walking the lists the class lives in.
    pub fn iter_of<T: SpriteType>(&self) -> impl Iterator<Item = &Sprite> + '_ {
        T::LISTS
            .iter()
            .flat_map(move |&list| self.iter_list(list))
            .filter_map(|i| self.slot(i))
            .filter(|s| T::matches(s.kind))
    }

    /// All slots in index order.
    pub fn slots(&self) -> impl Iterator<Item = &Sprite> + '_ {
        self.sprites.iter()
    }

    /// Mark a sprite as flashing (highlighted by the UI).
    pub fn set_flashing(&mut self, index: SpriteIndex, flashing: bool) -> Result<()> {
        let slot = self
            .flashing
            .get_mut(index.as_usize())
            .ok_or(PoolError::InvalidIndex(index.0))?;
        *slot = flashing;
        Ok(())
    }

    /// Whether a sprite is flashing.
    #[must_use]
    pub fn is_flashing(&self, index: SpriteIndex) -> bool {
        self.flashing.get(index.as_usize()).copied().unwrap_or(false)
    }

    /// Scrub the payload of every free slot.
    ///
    /// Free slots never sit in a spatial bucket, so their `next_in_cell` is
    /// cleared as well; a stale value there is how old saves grew cycles.
    pub fn clear_all_unused(&mut self) {
        for sprite in &mut self.sprites {
            if sprite.list == SpriteList::Free {
                sprite.scrub();
                sprite.next_in_cell = None;
            }
        }
        for (flag, sprite) in self.flashing.iter_mut().zip(&self.sprites) {
            if sprite.list == SpriteList::Free {
                *flag = false;
            }
        }
    }

    /// Free every balloon, money effect and airborne duck.
    ///
    /// Returns the number of sprites removed.
    pub fn remove_floating_sprites(&mut self) -> u16 {
        use crate::sprite::{MiscKind, SPRITE_FLAG_AIRBORNE};

        let floating: Vec<SpriteIndex> = self
            .sprites
            .iter()
            .filter(|s| s.is_allocated())
            .filter(|s| match s.kind {
                SpriteKind::Misc(MiscKind::Balloon | MiscKind::MoneyEffect) => true,
                SpriteKind::Misc(MiscKind::Duck) => s.has_flag(SPRITE_FLAG_AIRBORNE),
                _ => false,
            })
            .map(Sprite::index)
            .collect();

        let mut removed = 0;
        for index in floating {
            if self.free(index).is_ok() {
                removed += 1;
            }
        }
        removed
    }

    /// Number of allocated (non-free) slots.
    #[must_use]
    pub fn allocated_count(&self) -> usize {
        self.capacity() - usize::from(self.lists.count(SpriteList::Free))
    }

    /// Serialize the pool into a save blob.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| PoolError::Serialization(format!("Failed to serialize pool: {}", e)))
    }

    /// Restore a pool from a save blob.
    ///
    /// Table sizes are checked against the stored capacity and slot identity
    /// is restored from array position. Links are not trusted: run
    /// [`audit`](Self::audit) or the repair passes in [`checker`](crate::checker)
    /// before relying on them.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let mut pool: Self = bincode::deserialize(data).map_err(|e| {
            PoolError::Serialization(format!("Failed to deserialize pool: {}", e))
        })?;

        pool.config.validate()?;
        let capacity = usize::from(pool.config.capacity);
        if pool.sprites.len() != capacity
            || pool.flashing.len() != capacity
            || !pool.tween.has_len(capacity)
            || pool.spatial.len() != SPATIAL_INDEX_SIZE
        {
            return Err(PoolError::Serialization(format!(
                "Pool tables do not match capacity {capacity}"
            )));
        }

        for (i, sprite) in pool.sprites.iter_mut().enumerate() {
            sprite.index = SpriteIndex(i as u16);
        }

        Ok(pool)
    }

    /// Slot lookup that tolerates out-of-range indices.
    pub(crate) fn slot(&self, index: SpriteIndex) -> Option<&Sprite> {
        self.sprites.get(index.as_usize())
    }

    /// Slot lookup that reports out-of-range indices.
    pub(crate) fn sprite(&self, index: SpriteIndex) -> Result<&Sprite> {
        self.slot(index).ok_or(PoolError::InvalidIndex(index.0))
    }

    /// Slot lookup for operations that need an allocated sprite.
    pub(crate) fn live_sprite(&self, index: SpriteIndex) -> Result<&Sprite> {
        let sprite = self.sprite(index)?;
        if sprite.is_allocated() {
            Ok(sprite)
        } else {
            Err(PoolError::NotAllocated(index.0))
        }
    }

    #[cfg(feature = "debug-validation")]
    pub(crate) fn debug_validate(&self) {
        let report = self.audit();
        if !report.is_clean() {
            tracing::error!(?report, "Sprite pool integrity violated");
            debug_assert!(false, "sprite pool integrity violated: {report:?}");
        }
    }

    #[cfg(not(feature = "debug-validation"))]
    #[inline]
    pub(crate) fn debug_validate(&self) {}
}

impl Default for SpritePool {
    fn default() -> Self {
        Self::from_valid_config(PoolConfig::default())
    }
}

/// Identifier of the sprite at `index`, `Null` for free or missing slots.
#[must_use]
pub fn identifier_of(pool: &SpritePool, index: SpriteIndex) -> SpriteIdentifier {
    pool.get(index)
        .map_or(SpriteIdentifier::Null, |s| s.kind.identifier())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::{Litter, Peep, Vehicle};
    use crate::sprite::LitterKind;

    fn small_pool() -> SpritePool {
        SpritePool::new(PoolConfig::with_capacity(16, 4)).unwrap()
    }

    #[test]
    fn test_new_pool_is_all_free() {
        let pool = small_pool();
        assert_eq!(pool.capacity(), 16);
        assert_eq!(pool.list_count(SpriteList::Free), 16);
        assert_eq!(pool.list_head(SpriteList::Free), Some(SpriteIndex(0)));
        let order: Vec<u16> = pool.iter_list(SpriteList::Free).map(|i| i.0).collect();
        assert_eq!(order, (0..16).collect::<Vec<_>>());
    }

    #[test]
    fn test_allocate_pops_free_head() {
        let mut pool = small_pool();
        let a = pool.allocate(SpriteList::Peep).unwrap();
        let b = pool.allocate(SpriteList::Peep).unwrap();
        assert_eq!(a, SpriteIndex(0));
        assert_eq!(b, SpriteIndex(1));
        assert_eq!(pool.list_head(SpriteList::Free), Some(SpriteIndex(2)));
        assert_eq!(pool.list_count(SpriteList::Peep), 2);
        assert_eq!(pool.list_count(SpriteList::Free), 14);

        let sprite = pool.get(a).unwrap();
        assert!(sprite.position().is_null());
        assert_eq!(sprite.bounds, SpriteBounds::DEFAULT);
        assert_eq!(sprite.screen(), None);
    }

    #[test]
    fn test_allocate_into_free_is_rejected() {
        let mut pool = small_pool();
        assert_eq!(
            pool.allocate(SpriteList::Free),
            Err(PoolError::InvalidList(Some(SpriteList::Free)))
        );
        assert_eq!(
            pool.allocate_kind(SpriteKind::Null),
            Err(PoolError::InvalidList(None))
        );
    }

    #[test]
    fn test_exhaustion_reports_no_capacity() {
        let mut pool = small_pool();
        for _ in 0..16 {
            pool.allocate(SpriteList::Vehicle).unwrap();
        }
        assert_eq!(
            pool.allocate(SpriteList::Vehicle),
            Err(PoolError::NoCapacity {
                list: SpriteList::Vehicle
            })
        );
    }

    #[test]
    fn test_misc_soft_cap() {
        let mut pool = small_pool();
        for _ in 0..4 {
            pool.allocate(SpriteList::Misc).unwrap();
        }
        assert_eq!(
            pool.allocate(SpriteList::Misc),
            Err(PoolError::NoCapacity {
                list: SpriteList::Misc
            })
        );
        assert!(pool.allocate(SpriteList::Peep).is_ok());
    }

    #[test]
    fn test_misc_headroom() {
        // 16 slots, cap 4: fill 12 with peeps, leaving 4 free.
        let mut pool = small_pool();
        for _ in 0..12 {
            pool.allocate(SpriteList::Peep).unwrap();
        }
        // Remaining misc allowance (4) would consume every free slot.
        assert!(pool.allocate(SpriteList::Misc).is_err());
        // A fifth free slot makes room for one effect.
        pool.free(SpriteIndex(0)).unwrap();
        assert!(pool.allocate(SpriteList::Misc).is_ok());
    }

    #[test]
    fn test_free_returns_to_head() {
        let mut pool = small_pool();
        let a = pool.allocate(SpriteList::Litter).unwrap();
        let _b = pool.allocate(SpriteList::Litter).unwrap();
        pool.free(a).unwrap();
        assert_eq!(pool.list_head(SpriteList::Free), Some(a));
        assert_eq!(pool.get(a).unwrap().kind, SpriteKind::Null);
        assert_eq!(pool.list_count(SpriteList::Litter), 1);
    }

    #[test]
    fn test_free_of_missing_slot() {
        let mut pool = small_pool();
        assert_eq!(
            pool.free(SpriteIndex(99)),
            Err(PoolError::InvalidIndex(99))
        );
    }

    #[test]
    fn test_typed_access() {
        let mut pool = small_pool();
        let litter = pool
            .allocate_kind(SpriteKind::Litter(LitterKind::EmptyCup))
            .unwrap();
        let peep = pool.allocate_kind(SpriteKind::Peep).unwrap();

        assert!(pool.is::<Litter>(litter));
        assert!(!pool.is::<Litter>(peep));
        assert!(pool.get_as::<Peep>(peep).is_some());
        assert_eq!(pool.iter_of::<Litter>().count(), 1);
        assert_eq!(identifier_of(&pool, peep), SpriteIdentifier::Peep);
        assert_eq!(identifier_of(&pool, SpriteIndex(999)), SpriteIdentifier::Null);
    }

    #[test]
    fn test_vehicle_iteration_includes_train_heads() {
        let mut pool = small_pool();
        let car = pool.allocate_kind(SpriteKind::Vehicle).unwrap();
        let lead = pool.allocate_kind(SpriteKind::Vehicle).unwrap();
        pool.move_to_list(lead, SpriteList::TrainHead).unwrap();

        let found: Vec<SpriteIndex> = pool.iter_of::<Vehicle>().map(Sprite::index).collect();
        assert_eq!(found, vec![lead, car]);
        assert!(pool.is::<Vehicle>(lead));
    }

    #[test]
    fn test_flashing_cleared_on_free() {
        let mut pool = small_pool();
        let a = pool.allocate(SpriteList::Peep).unwrap();
        pool.set_flashing(a, true).unwrap();
        assert!(pool.is_flashing(a));
        pool.free(a).unwrap();
        assert!(!pool.is_flashing(a));
        assert!(pool.set_flashing(SpriteIndex(500), true).is_err());
    }

    #[test]
    fn test_reset_all_frees_everything() {
        let mut pool = small_pool();
        let a = pool.allocate(SpriteList::Peep).unwrap();
        pool.move_to(a, CoordsXYZ::new(64, 64, 0)).unwrap();
        pool.reset_all();
        assert_eq!(pool.list_count(SpriteList::Free), 16);
        assert_eq!(pool.list_count(SpriteList::Peep), 0);
        assert_eq!(pool.first_in_bucket(64, 64), None);
        assert!(pool.audit().is_clean());
    }

    #[test]
    fn test_remove_floating_sprites() {
        use crate::sprite::{MiscKind, SPRITE_FLAG_AIRBORNE};

        let mut pool = small_pool();
        pool.allocate_kind(SpriteKind::Misc(MiscKind::Balloon))
            .unwrap();
        let duck = pool.allocate_kind(SpriteKind::Misc(MiscKind::Duck)).unwrap();
        let flying = pool.allocate_kind(SpriteKind::Misc(MiscKind::Duck)).unwrap();
        pool.get_mut(flying).unwrap().flags |= SPRITE_FLAG_AIRBORNE;
        pool.allocate_kind(SpriteKind::Peep).unwrap();

        assert_eq!(pool.remove_floating_sprites(), 2);
        assert!(pool.get(duck).unwrap().is_allocated());
        assert!(!pool.get(flying).unwrap().is_allocated());
        assert_eq!(pool.list_count(SpriteList::Peep), 1);
    }

    #[test]
    fn test_save_blob_roundtrip_keeps_structure() {
        let mut pool = small_pool();
        let a = pool.allocate_kind(SpriteKind::Peep).unwrap();
        pool.move_to(a, CoordsXYZ::new(40, 40, 8)).unwrap();

        let bytes = pool.serialize().unwrap();
        let restored = SpritePool::deserialize(&bytes).unwrap();
        assert_eq!(restored, pool);
        assert!(restored.audit().is_clean());
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let err = SpritePool::deserialize(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, PoolError::Serialization(_)));
    }

    #[test]
    fn test_clear_all_unused_drops_stale_cell_links() {
        let mut pool = small_pool();
        pool.sprites[5].next_in_cell = Some(SpriteIndex(5));
        pool.sprites[5].frame = 7;
        pool.clear_all_unused();
        assert_eq!(pool.sprites[5].next_in_cell, None);
        assert_eq!(pool.sprites[5].frame, 0);
    }
}
