//! Cycle detection, cycle repair and orphan relinking.
//!
//! The detectors are plain functions over a [`Links`] mapping so they can
//! run against synthetic chains as well as the pool's two link fields.
//! Every walk is bounded by the mapping's capacity; none of them can hang
//! on a corrupted structure.

use crate::pool::SpritePool;
use crate::spatial::SpatialKey;
use crate::sprite::{Sprite, SpriteIndex, SpriteList};

/// A `slot -> next slot` mapping.
pub trait Links {
    /// Number of slots in the domain.
    fn capacity(&self) -> usize;

    /// Successor of `index`. Out-of-range indices have none.
    fn link(&self, index: SpriteIndex) -> Option<SpriteIndex>;

    /// Overwrite the successor of `index`.
    fn set_link(&mut self, index: SpriteIndex, next: Option<SpriteIndex>);
}

impl Links for [Option<SpriteIndex>] {
    fn capacity(&self) -> usize {
        self.len()
    }

    fn link(&self, index: SpriteIndex) -> Option<SpriteIndex> {
        self.get(index.as_usize()).copied().flatten()
    }

    fn set_link(&mut self, index: SpriteIndex, next: Option<SpriteIndex>) {
        if let Some(slot) = self.get_mut(index.as_usize()) {
            *slot = next;
        }
    }
}

/// Type-list links (`next`) of the pool's slots.
struct TypeLinks<'a>(&'a mut [Sprite]);

impl Links for TypeLinks<'_> {
    fn capacity(&self) -> usize {
        self.0.len()
    }

    fn link(&self, index: SpriteIndex) -> Option<SpriteIndex> {
        self.0.get(index.as_usize()).and_then(|s| s.next)
    }

    fn set_link(&mut self, index: SpriteIndex, next: Option<SpriteIndex>) {
        if let Some(sprite) = self.0.get_mut(index.as_usize()) {
            sprite.next = next;
        }
    }
}

/// Bucket links (`next_in_cell`) of the pool's slots.
struct CellLinks<'a>(&'a mut [Sprite]);

impl Links for CellLinks<'_> {
    fn capacity(&self) -> usize {
        self.0.len()
    }

    fn link(&self, index: SpriteIndex) -> Option<SpriteIndex> {
        self.0.get(index.as_usize()).and_then(|s| s.next_in_cell)
    }

    fn set_link(&mut self, index: SpriteIndex, next: Option<SpriteIndex>) {
        if let Some(sprite) = self.0.get_mut(index.as_usize()) {
            sprite.next_in_cell = next;
        }
    }
}

/// Find where the chain starting at `start` loops back on itself.
///
/// Tortoise and hare: the hare takes two steps per round, the tortoise one.
/// If they meet, the tortoise restarts from `start` and both advance one
/// step at a time; they meet again at the first slot of the loop. Returns
/// `None` when the chain ends, runs off the domain, or the step bound is
/// exhausted.
pub fn find_cycle<L: Links + ?Sized>(links: &L, start: Option<SpriteIndex>) -> Option<SpriteIndex> {
    find_cycle_with(links.capacity(), start, |i| links.link(i))
}

fn find_cycle_with(
    capacity: usize,
    start: Option<SpriteIndex>,
    next: impl Fn(SpriteIndex) -> Option<SpriteIndex>,
) -> Option<SpriteIndex> {
    let in_range = |i: SpriteIndex| i.as_usize() < capacity;
    let step = |i: SpriteIndex| next(i).filter(|n| in_range(*n));

    let start = start.filter(|s| in_range(*s))?;
    let mut slow = start;
    let mut fast = start;
    let mut met = false;
    for _ in 0..=capacity {
        fast = step(step(fast)?)?;
        slow = step(slow)?;
        if slow == fast {
            met = true;
            break;
        }
    }
    if !met {
        return None;
    }

    let mut slow = start;
    for _ in 0..=capacity {
        if slow == fast {
            return Some(slow);
        }
        slow = step(slow)?;
        fast = step(fast)?;
    }
    None
}

/// Slots reachable from `head`, as a bitset over the domain.
///
/// The walk stops at the first repeated slot, so it is safe on cycles.
pub fn reachable<L: Links + ?Sized>(links: &L, head: Option<SpriteIndex>) -> Vec<bool> {
    walk_chain(links.capacity(), head, |i| links.link(i)).0
}

/// Mark every slot reachable from `head` and report the last new slot.
fn walk_chain(
    capacity: usize,
    head: Option<SpriteIndex>,
    next: impl Fn(SpriteIndex) -> Option<SpriteIndex>,
) -> (Vec<bool>, Option<SpriteIndex>) {
    let mut seen = vec![false; capacity];
    let mut tail = None;
    let mut cursor = head;
    while let Some(i) = cursor {
        match seen.get_mut(i.as_usize()) {
            Some(flag) if !*flag => *flag = true,
            _ => break,
        }
        tail = Some(i);
        cursor = next(i);
    }
    (seen, tail)
}

/// Cut a looping chain at its entry and re-append the loop body.
///
/// The chain `head .. entry` keeps its order. The slots that followed
/// `entry` are appended one by one until a slot already in the chain is
/// reached, so each slot ends up in the chain exactly once. Returns the
/// number of re-appended slots.
pub fn unroll_cycle<L: Links + ?Sized>(links: &mut L, head: SpriteIndex, entry: SpriteIndex) -> usize {
    let capacity = links.capacity();
    let mut in_chain = vec![false; capacity];

    let mut cursor = Some(head);
    while let Some(i) = cursor {
        match in_chain.get_mut(i.as_usize()) {
            Some(flag) if !*flag => *flag = true,
            _ => break,
        }
        if i == entry {
            break;
        }
        cursor = links.link(i);
    }

    let mut tail = entry;
    let mut pending = links.link(entry);
    links.set_link(entry, None);

    let mut appended = 0;
    while let Some(i) = pending {
        match in_chain.get_mut(i.as_usize()) {
            Some(flag) if !*flag => *flag = true,
            _ => break,
        }
        pending = links.link(i);
        links.set_link(tail, Some(i));
        links.set_link(i, None);
        tail = i;
        appended += 1;
    }
    appended
}

/// Slots flagged free that the free-list walk never reached.
#[must_use]
pub fn orphans(is_free: &[bool], reached: &[bool]) -> Vec<SpriteIndex> {
    is_free
        .iter()
        .zip(reached)
        .enumerate()
        .filter(|(_, (free, seen))| **free && !**seen)
        .map(|(i, _)| SpriteIndex(i as u16))
        .collect()
}

impl SpritePool {
    fn detect_with(
        &self,
        start: Option<SpriteIndex>,
        link: impl Fn(&Sprite) -> Option<SpriteIndex>,
    ) -> Option<SpriteIndex> {
        find_cycle_with(self.capacity(), start, |i| self.slot(i).and_then(&link))
    }

    /// First slot of the loop in the type-list chain starting at `start`.
    #[must_use]
    pub fn detect_list_cycle(&self, start: Option<SpriteIndex>) -> Option<SpriteIndex> {
        self.detect_with(start, |s| s.next)
    }

    /// First slot of the loop in the bucket chain starting at `start`.
    #[must_use]
    pub fn detect_bucket_cycle(&self, start: Option<SpriteIndex>) -> Option<SpriteIndex> {
        self.detect_with(start, |s| s.next_in_cell)
    }

    /// Check every type list for a loop.
    ///
    /// Returns the first list found looping. With `repair`, that list is
    /// unrolled so each of its slots appears once, and back-links are
    /// rewritten along the repaired chain.
    pub fn check_list_cycles(&mut self, repair: bool) -> Option<SpriteList> {
        for list in SpriteList::ALL {
            let head = self.lists.head(list);
            let Some(entry) = self.detect_list_cycle(head) else {
                continue;
            };
            tracing::warn!(list = ?list, entry = entry.0, repair, "Sprite list cycle detected");
            if repair {
                if let Some(head) = head {
                    let appended = unroll_cycle(&mut TypeLinks(&mut self.sprites), head, entry);
                    self.relink_back_pointers(list);
                    tracing::warn!(list = ?list, appended, "Sprite list cycle repaired");
                }
            }
            return Some(list);
        }
        None
    }

    /// Check every spatial bucket for a loop.
    ///
    /// Returns the first bucket found looping; with `repair` it is unrolled
    /// the same way as a type list.
    pub fn check_bucket_cycles(&mut self, repair: bool) -> Option<SpatialKey> {
        for key in SpatialKey::all() {
            let head = self.spatial.head(key);
            let Some(entry) = self.detect_bucket_cycle(head) else {
                continue;
            };
            tracing::warn!(
                bucket = key.as_usize(),
                entry = entry.0,
                repair,
                "Sprite bucket cycle detected"
            );
            if repair {
                if let Some(head) = head {
                    let appended = unroll_cycle(&mut CellLinks(&mut self.sprites), head, entry);
                    tracing::warn!(bucket = key.as_usize(), appended, "Sprite bucket cycle repaired");
                }
            }
            return Some(key);
        }
        None
    }

    /// Append every free-tagged slot the free list cannot reach to its tail.
    ///
    /// The free count is recomputed from the repaired chain. Returns the
    /// number of slots relinked.
    pub fn relink_orphans(&mut self) -> u16 {
        let head = self.lists.head(SpriteList::Free);
        let (reached, mut tail) = walk_chain(self.capacity(), head, |i| self.list_link(i));
        let is_free: Vec<bool> = self
            .sprites
            .iter()
            .map(|s| s.list == SpriteList::Free)
            .collect();

        let found = orphans(&is_free, &reached);
        for &index in &found {
            tracing::warn!(index = index.0, "Relinking orphaned free sprite");
            let sprite = &mut self.sprites[index.as_usize()];
            sprite.index = index;
            sprite.next = None;
            sprite.prev = tail;
            sprite.next_in_cell = None;
            match tail {
                Some(t) => self.sprites[t.as_usize()].next = Some(index),
                None => self.lists.set_head(SpriteList::Free, Some(index)),
            }
            tail = Some(index);
        }

        if !found.is_empty() {
            let count = self.iter_list(SpriteList::Free).count();
            self.lists.set_count(SpriteList::Free, count as u16);
        }
        found.len() as u16
    }

    /// Rewrite `prev` along `list` from its head.
    fn relink_back_pointers(&mut self, list: SpriteList) {
        let mut prev = None;
        let mut cursor = self.lists.head(list);
        for _ in 0..self.capacity() {
            let Some(index) = cursor else {
                break;
            };
            let Some(sprite) = self.sprites.get_mut(index.as_usize()) else {
                break;
            };
            sprite.prev = prev;
            prev = Some(index);
            cursor = sprite.next;
        }
    }
}
