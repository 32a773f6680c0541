//! Read-only integrity audit.
//!
//! [`SpritePool::audit`] walks every type list and every bucket chain with
//! bounded step counts and reports each broken invariant it finds. It never
//! modifies the pool; repairs live in [`checker`](crate::checker).

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pool::SpritePool;
use crate::spatial::SpatialKey;
use crate::sprite::{SpriteIndex, SpriteList};

/// One broken invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityIssue {
    /// A type list loops back on itself.
    ListCycle {
        /// The looping list.
        list: SpriteList,
    },
    /// A bucket chain loops back on itself.
    BucketCycle {
        /// The looping bucket.
        bucket: SpatialKey,
    },
    /// A link points outside the pool.
    DanglingLink {
        /// Slot holding the bad link.
        index: SpriteIndex,
    },
    /// Stored count differs from the walked length of a list.
    CountMismatch {
        /// The list.
        list: SpriteList,
        /// Count kept in the list table.
        recorded: u16,
        /// Slots actually reached.
        walked: u16,
    },
    /// Slot found in a list other than the one it is tagged with, or in
    /// two lists.
    WrongList {
        /// The slot.
        index: SpriteIndex,
        /// List the walk found it in.
        found_in: SpriteList,
    },
    /// `prev` does not point at the slot before it.
    BrokenBackLink {
        /// The slot.
        index: SpriteIndex,
    },
    /// Slot reachable from no list.
    Unlisted {
        /// The slot.
        index: SpriteIndex,
    },
    /// Allocated slot missing from the bucket of its position.
    Unbucketed {
        /// The slot.
        index: SpriteIndex,
    },
    /// Slot in a bucket it does not belong to (wrong cell, or free).
    WrongBucket {
        /// The slot.
        index: SpriteIndex,
        /// Bucket it was found in.
        bucket: SpatialKey,
    },
    /// Bucket chain not in strictly descending slot order.
    OutOfOrder {
        /// The bucket.
        bucket: SpatialKey,
    },
}

impl fmt::Display for IntegrityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ListCycle { list } => write!(f, "list {list:?} contains a cycle"),
            Self::BucketCycle { bucket } => {
                write!(f, "bucket {} contains a cycle", bucket.as_usize())
            }
            Self::DanglingLink { index } => write!(f, "sprite {index} links outside the pool"),
            Self::CountMismatch {
                list,
                recorded,
                walked,
            } => write!(f, "list {list:?} records {recorded} sprites but holds {walked}"),
            Self::WrongList { index, found_in } => {
                write!(f, "sprite {index} found in list {found_in:?}")
            }
            Self::BrokenBackLink { index } => write!(f, "sprite {index} has a bad back-link"),
            Self::Unlisted { index } => write!(f, "sprite {index} is in no list"),
            Self::Unbucketed { index } => write!(f, "sprite {index} is missing from its bucket"),
            Self::WrongBucket { index, bucket } => {
                write!(f, "sprite {index} misfiled in bucket {}", bucket.as_usize())
            }
            Self::OutOfOrder { bucket } => {
                write!(f, "bucket {} is not in descending order", bucket.as_usize())
            }
        }
    }
}

/// Result of [`SpritePool::audit`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Everything found, lists first, then buckets.
    pub issues: Vec<IntegrityIssue>,
    /// Per-list walked populations, in [`SpriteList::ALL`] order.
    pub walked: [u16; SpriteList::COUNT],
}

impl IntegrityReport {
    /// Whether no invariant is broken.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Whether any list or bucket loops.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        self.issues.iter().any(|i| {
            matches!(
                i,
                IntegrityIssue::ListCycle { .. } | IntegrityIssue::BucketCycle { .. }
            )
        })
    }
}

impl SpritePool {
    /// Check every structural invariant without changing anything.
    #[must_use]
    pub fn audit(&self) -> IntegrityReport {
        let mut report = IntegrityReport::default();
        self.audit_lists(&mut report);
        self.audit_buckets(&mut report);
        report
    }

    fn audit_lists(&self, report: &mut IntegrityReport) {
        let capacity = self.capacity();
        let mut listed = vec![false; capacity];

        for list in SpriteList::ALL {
            let mut on_this_list = vec![false; capacity];
            let mut prev = None;
            let mut walked: u16 = 0;
            let mut cursor = self.lists.head(list);

            while let Some(index) = cursor {
                let Some(sprite) = self.slot(index) else {
                    let holder = prev.unwrap_or(index);
                    report.issues.push(IntegrityIssue::DanglingLink { index: holder });
                    break;
                };
                if on_this_list[index.as_usize()] {
                    report.issues.push(IntegrityIssue::ListCycle { list });
                    break;
                }
                on_this_list[index.as_usize()] = true;
                walked = walked.saturating_add(1);

                if sprite.list != list || listed[index.as_usize()] {
                    report.issues.push(IntegrityIssue::WrongList {
                        index,
                        found_in: list,
                    });
                }
                listed[index.as_usize()] = true;
                if sprite.prev != prev {
                    report.issues.push(IntegrityIssue::BrokenBackLink { index });
                }
                prev = Some(index);
                cursor = sprite.next;
            }

            let recorded = self.lists.count(list);
            if recorded != walked {
                report.issues.push(IntegrityIssue::CountMismatch {
                    list,
                    recorded,
                    walked,
                });
            }
            report.walked[list.index()] = walked;
        }

        for (i, seen) in listed.iter().enumerate() {
            if !seen {
                report.issues.push(IntegrityIssue::Unlisted {
                    index: SpriteIndex(i as u16),
                });
            }
        }
    }

    fn audit_buckets(&self, report: &mut IntegrityReport) {
        let capacity = self.capacity();
        let mut bucketed = vec![false; capacity];
        let mut visited_in = vec![u32::MAX; capacity];

        for bucket in SpatialKey::all() {
            let mut cursor = self.spatial.head(bucket);
            if cursor.is_none() {
                continue;
            }
            let stamp = bucket.as_usize() as u32;
            let mut prev: Option<SpriteIndex> = None;
            let mut ordered = true;

            while let Some(index) = cursor {
                let Some(sprite) = self.slot(index) else {
                    let holder = prev.unwrap_or(index);
                    report.issues.push(IntegrityIssue::DanglingLink { index: holder });
                    break;
                };
                if visited_in[index.as_usize()] == stamp {
                    report.issues.push(IntegrityIssue::BucketCycle { bucket });
                    break;
                }
                visited_in[index.as_usize()] = stamp;

                if prev.is_some_and(|p| p <= index) {
                    ordered = false;
                }
                if !sprite.is_allocated() || SpatialKey::of(sprite.position) != bucket {
                    report
                        .issues
                        .push(IntegrityIssue::WrongBucket { index, bucket });
                } else {
                    bucketed[index.as_usize()] = true;
                }
                prev = Some(index);
                cursor = sprite.next_in_cell;
            }

            if !ordered {
                report.issues.push(IntegrityIssue::OutOfOrder { bucket });
            }
        }

        for sprite in self.slots() {
            if sprite.is_allocated() && !bucketed[sprite.index.as_usize()] {
                report
                    .issues
                    .push(IntegrityIssue::Unbucketed { index: sprite.index });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::coords::CoordsXYZ;

    fn pool() -> SpritePool {
        let mut pool = SpritePool::new(PoolConfig::with_capacity(16, 2)).unwrap();
        for i in 0..5 {
            let index = pool.allocate(SpriteList::Peep).unwrap();
            pool.move_to(index, CoordsXYZ::new(20 * i, 20, 0)).unwrap();
        }
        pool
    }

    #[test]
    fn test_healthy_pool_is_clean() {
        let report = pool().audit();
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.walked[SpriteList::Peep.index()], 5);
        assert_eq!(report.walked[SpriteList::Free.index()], 11);
    }

    #[test]
    fn test_detects_list_cycle() {
        let mut pool = pool();
        pool.sprites[0].next = Some(SpriteIndex(2));
        let report = pool.audit();
        assert!(report.has_cycles());
        assert!(report
            .issues
            .contains(&IntegrityIssue::ListCycle { list: SpriteList::Peep }));
    }

    #[test]
    fn test_detects_count_mismatch() {
        let mut pool = pool();
        pool.lists.set_count(SpriteList::Peep, 9);
        assert!(pool.audit().issues.contains(&IntegrityIssue::CountMismatch {
            list: SpriteList::Peep,
            recorded: 9,
            walked: 5,
        }));
    }

    #[test]
    fn test_detects_back_link() {
        let mut pool = pool();
        pool.sprites[2].prev = None;
        assert!(pool
            .audit()
            .issues
            .contains(&IntegrityIssue::BrokenBackLink { index: SpriteIndex(2) }));
    }

    #[test]
    fn test_detects_order_violation() {
        let mut pool = pool();
        // Slots 0 and 1 share the tile at x in 0..32; chain is 1 -> 0.
        let bucket = SpatialKey::from_xy(0, 20);
        pool.spatial.set_head(bucket, Some(SpriteIndex(0)));
        pool.sprites[0].next_in_cell = Some(SpriteIndex(1));
        pool.sprites[1].next_in_cell = None;
        let report = pool.audit();
        assert!(report.issues.contains(&IntegrityIssue::OutOfOrder { bucket }));
    }

    #[test]
    fn test_detects_unbucketed_sprite() {
        let mut pool = pool();
        pool.spatial.set_head(SpatialKey::from_xy(40, 20), None);
        let report = pool.audit();
        assert!(report
            .issues
            .contains(&IntegrityIssue::Unbucketed { index: SpriteIndex(2) }));
    }

    #[test]
    fn test_issue_display() {
        let text = IntegrityIssue::Unlisted { index: SpriteIndex(4) }.to_string();
        assert_eq!(text, "sprite #4 is in no list");
    }
}
