//! Type lists: per-category intrusive doubly-linked lists over the pool.
//!
//! Every slot is in exactly one list at a time, including the free list.
//! All membership changes go through one unlink-and-push routine; the
//! public [`SpritePool::move_to_list`] only moves live sprites between
//! gameplay lists.

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, Result};
use crate::pool::SpritePool;
use crate::sprite::{SpriteIndex, SpriteList};

/// Head slot and population of every type list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListHeads {
    heads: [Option<SpriteIndex>; SpriteList::COUNT],
    counts: [u16; SpriteList::COUNT],
}

impl ListHeads {
    /// First slot of `list`.
    #[must_use]
    pub const fn head(&self, list: SpriteList) -> Option<SpriteIndex> {
        self.heads[list.index()]
    }

    /// Number of slots in `list`.
    #[must_use]
    pub const fn count(&self, list: SpriteList) -> u16 {
        self.counts[list.index()]
    }

    pub(crate) fn set_head(&mut self, list: SpriteList, head: Option<SpriteIndex>) {
        self.heads[list.index()] = head;
    }

    pub(crate) fn set_count(&mut self, list: SpriteList, count: u16) {
        self.counts[list.index()] = count;
    }
}

impl SpritePool {
    /// Move a live sprite to the head of another gameplay list, e.g. a
    /// vehicle becoming a train head.
    ///
    /// No-op when the sprite is already in `list`.
    ///
    /// # Errors
    ///
    /// [`PoolError::InvalidList`] when `list` is [`SpriteList::Free`] (use
    /// [`free`](Self::free)), [`PoolError::NotAllocated`] when the slot is
    /// free (use [`allocate`](Self::allocate)).
    pub fn move_to_list(&mut self, index: SpriteIndex, list: SpriteList) -> Result<()> {
        if list == SpriteList::Free {
            return Err(PoolError::InvalidList(Some(list)));
        }
        self.live_sprite(index)?;
        self.relink_list(index, list);
        self.debug_validate();
        Ok(())
    }

    /// Move a slot from its current list to the head of `list`.
    ///
    /// No-op when the slot is already in `list`. Neighbour links, list heads
    /// and counters are all patched here.
    pub(crate) fn relink_list(&mut self, index: SpriteIndex, list: SpriteList) {
        let Some(sprite) = self.slot(index) else {
            return;
        };
        let old_list = sprite.list;
        if old_list == list {
            return;
        }
        let (prev, next) = (sprite.prev, sprite.next);

        // Unlink from the old list.
        match prev {
            None => self.lists.set_head(old_list, next),
            Some(p) => {
                if let Some(prev_sprite) = self.sprites.get_mut(p.as_usize()) {
                    prev_sprite.next = next;
                }
            }
        }
        if let Some(n) = next {
            if let Some(next_sprite) = self.sprites.get_mut(n.as_usize()) {
                next_sprite.prev = prev;
            }
        }

        // Push onto the new list's head.
        let old_head = self.lists.head(list);
        let sprite = &mut self.sprites[index.as_usize()];
        sprite.list = list;
        sprite.prev = None;
        sprite.next = old_head;
        self.lists.set_head(list, Some(index));
        if let Some(h) = old_head {
            if let Some(head_sprite) = self.sprites.get_mut(h.as_usize()) {
                head_sprite.prev = Some(index);
            }
        }

        let old_count = self.lists.count(old_list);
        self.lists.set_count(old_list, old_count.saturating_sub(1));
        let new_count = self.lists.count(list);
        self.lists.set_count(list, new_count.saturating_add(1));
    }

    /// First slot of `list`.
    #[must_use]
    pub fn list_head(&self, list: SpriteList) -> Option<SpriteIndex> {
        self.lists.head(list)
    }

    /// Number of slots in `list`.
    #[must_use]
    pub fn list_count(&self, list: SpriteList) -> u16 {
        self.lists.count(list)
    }

    /// Populations of every list, in [`SpriteList::ALL`] order.
    #[must_use]
    pub fn list_counts(&self) -> [u16; SpriteList::COUNT] {
        SpriteList::ALL.map(|list| self.lists.count(list))
    }

    /// Lazily walk `list` from its head.
    ///
    /// The walk stops after `capacity` steps, so a corrupted list cannot
    /// hang the caller, but a cyclic list will repeat slots until then; run
    /// [`check_list_cycles`](Self::check_list_cycles) first on suspect data.
    #[must_use]
    pub fn iter_list(&self, list: SpriteList) -> ListIter<'_> {
        ListIter {
            pool: self,
            next: self.lists.head(list),
            remaining: self.capacity(),
        }
    }

    /// Cursor over `list` that tolerates freeing the visited slot.
    #[must_use]
    pub fn list_cursor(&self, list: SpriteList) -> ListCursor {
        ListCursor {
            next: self.lists.head(list),
            remaining: self.capacity(),
        }
    }

    /// Type-list successor of a slot, `None` past the end or off the pool.
    pub(crate) fn list_link(&self, index: SpriteIndex) -> Option<SpriteIndex> {
        self.slot(index).and_then(|s| s.next)
    }
}

/// Borrowing iterator over one type list.
#[derive(Debug, Clone)]
pub struct ListIter<'a> {
    pool: &'a SpritePool,
    next: Option<SpriteIndex>,
    remaining: usize,
}

impl Iterator for ListIter<'_> {
    type Item = SpriteIndex;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.pool.slot(current)?;
        self.remaining -= 1;
        self.next = self.pool.list_link(current);
        Some(current)
    }
}

/// Detached cursor over one type list.
///
/// The successor is read before the current slot is handed out, so update
/// loops may free the slot they are visiting:
///
/// ```
/// use sprite_core::prelude::*;
///
/// let mut pool = SpritePool::new(PoolConfig::with_capacity(8, 2)).unwrap();
/// for _ in 0..3 {
///     pool.allocate(SpriteList::Litter).unwrap();
/// }
///
/// let mut cursor = pool.list_cursor(SpriteList::Litter);
/// while let Some(index) = cursor.advance(&pool) {
///     pool.free(index).unwrap();
/// }
/// assert_eq!(pool.list_count(SpriteList::Litter), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ListCursor {
    next: Option<SpriteIndex>,
    remaining: usize,
}

impl ListCursor {
    /// Return the next slot and step past it.
    pub fn advance(&mut self, pool: &SpritePool) -> Option<SpriteIndex> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        pool.slot(current)?;
        self.remaining -= 1;
        self.next = pool.list_link(current);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::coords::CoordsXYZ;
    use crate::sprite::SpriteKind;

    fn pool() -> SpritePool {
        SpritePool::new(PoolConfig::with_capacity(8, 2)).unwrap()
    }

    fn collect(pool: &SpritePool, list: SpriteList) -> Vec<u16> {
        pool.iter_list(list).map(|i| i.0).collect()
    }

    #[test]
    fn test_relink_pushes_head() {
        let mut pool = pool();
        pool.relink_list(SpriteIndex(3), SpriteList::Peep);
        pool.relink_list(SpriteIndex(5), SpriteList::Peep);

        assert_eq!(collect(&pool, SpriteList::Peep), vec![5, 3]);
        assert_eq!(collect(&pool, SpriteList::Free), vec![0, 1, 2, 4, 6, 7]);
        assert_eq!(pool.get(SpriteIndex(3)).unwrap().prev(), Some(SpriteIndex(5)));
        assert_eq!(pool.list_count(SpriteList::Peep), 2);
        assert_eq!(pool.list_count(SpriteList::Free), 6);
    }

    #[test]
    fn test_move_to_same_list_is_noop() {
        let mut pool = pool();
        pool.relink_list(SpriteIndex(2), SpriteList::Litter);
        let before = pool.clone();
        pool.relink_list(SpriteIndex(2), SpriteList::Litter);
        assert_eq!(pool, before);
    }

    #[test]
    fn test_unlink_head_and_tail() {
        let mut pool = pool();
        // Head of the free list.
        pool.relink_list(SpriteIndex(0), SpriteList::Vehicle);
        assert_eq!(pool.list_head(SpriteList::Free), Some(SpriteIndex(1)));
        assert_eq!(pool.get(SpriteIndex(1)).unwrap().prev(), None);
        // Tail of the free list.
        pool.relink_list(SpriteIndex(7), SpriteList::Vehicle);
        assert_eq!(pool.get(SpriteIndex(6)).unwrap().next(), None);
        assert_eq!(collect(&pool, SpriteList::Vehicle), vec![7, 0]);
    }

    #[test]
    fn test_train_head_transfer() {
        let mut pool = pool();
        let car = pool.allocate(SpriteList::Vehicle).unwrap();
        let lead = pool.allocate(SpriteList::Vehicle).unwrap();
        pool.move_to_list(lead, SpriteList::TrainHead).unwrap();
        assert_eq!(collect(&pool, SpriteList::TrainHead), vec![lead.0]);
        assert_eq!(collect(&pool, SpriteList::Vehicle), vec![car.0]);
        assert_eq!(pool.list_counts().iter().map(|&c| usize::from(c)).sum::<usize>(), 8);
    }

    #[test]
    fn test_move_to_list_rejects_free_list() {
        let mut pool = pool();
        let guest = pool.allocate_kind(SpriteKind::Peep).unwrap();
        pool.move_to(guest, CoordsXYZ::new(10, 10, 0)).unwrap();

        let err = pool.move_to_list(guest, SpriteList::Free).unwrap_err();
        assert_eq!(err, PoolError::InvalidList(Some(SpriteList::Free)));
        let err = pool.move_to_list(SpriteIndex(5), SpriteList::Peep).unwrap_err();
        assert_eq!(err, PoolError::NotAllocated(5));

        // The guest is still a guest, so the next allocation takes a new slot
        // and no slot ends up in two buckets.
        let next = pool.allocate_kind(SpriteKind::Peep).unwrap();
        assert_ne!(next, guest);
        assert_eq!(pool.first_in_bucket(10, 10), Some(guest));
        assert_eq!(pool.list_count(SpriteList::Free), 6);
        assert!(pool.audit().is_clean());
    }

    #[test]
    fn test_iteration_is_bounded_on_cycle() {
        let mut pool = pool();
        pool.sprites[7].next = Some(SpriteIndex(0));
        assert_eq!(pool.iter_list(SpriteList::Free).count(), 8);
    }

    #[test]
    fn test_cursor_survives_free() {
        let mut pool = pool();
        for _ in 0..4 {
            pool.allocate(SpriteList::Peep).unwrap();
        }
        let mut visited = Vec::new();
        let mut cursor = pool.list_cursor(SpriteList::Peep);
        while let Some(index) = cursor.advance(&pool) {
            visited.push(index.0);
            if index.0 % 2 == 0 {
                pool.free(index).unwrap();
            }
        }
        assert_eq!(visited, vec![3, 2, 1, 0]);
        assert_eq!(collect(&pool, SpriteList::Peep), vec![3, 1]);
    }
}
