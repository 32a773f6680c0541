//! Save checking and repair.
//!
//! Loads a pool save blob, audits it, and with `fix` runs the same repair
//! passes the game runs after loading: cycle unrolling, orphan relinking and
//! a spatial rebuild.

use std::path::Path;

use serde::Serialize;
use sprite_core::audit::{IntegrityIssue, IntegrityReport};
use sprite_core::prelude::*;

use crate::{read_file, write_file, Result};

/// What [`check_pool`] found and changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    /// Audit of the pool as loaded.
    pub before: IntegrityReport,
    /// Lists whose cycles were unrolled, in repair order.
    pub list_cycles_repaired: Vec<SpriteList>,
    /// Buckets whose cycles were unrolled, in repair order.
    pub bucket_cycles_repaired: Vec<SpatialKey>,
    /// Free slots appended back onto the free list.
    pub orphans_relinked: u16,
    /// Whether the spatial grid was rebuilt from stored positions.
    pub spatial_rebuilt: bool,
    /// Audit after repair (same as `before` when not fixing).
    pub after: IntegrityReport,
}

impl CheckReport {
    /// Whether the pool is consistent after the run.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.after.is_clean()
    }
}

fn is_bucket_issue(issue: &IntegrityIssue) -> bool {
    matches!(
        issue,
        IntegrityIssue::BucketCycle { .. }
            | IntegrityIssue::Unbucketed { .. }
            | IntegrityIssue::WrongBucket { .. }
            | IntegrityIssue::OutOfOrder { .. }
    )
}

/// Audit `pool` and, with `fix`, repair what can be repaired.
pub fn check_pool(pool: &mut SpritePool, fix: bool) -> CheckReport {
    let before = pool.audit();
    if !fix || before.is_clean() {
        return CheckReport {
            after: before.clone(),
            before,
            ..CheckReport::default()
        };
    }

    let mut report = CheckReport {
        before,
        ..CheckReport::default()
    };

    // A pass that reports the same list twice did not make progress.
    while let Some(list) = pool.check_list_cycles(true) {
        if report.list_cycles_repaired.last() == Some(&list) {
            break;
        }
        report.list_cycles_repaired.push(list);
    }
    while let Some(key) = pool.check_bucket_cycles(true) {
        if report.bucket_cycles_repaired.last() == Some(&key) {
            break;
        }
        report.bucket_cycles_repaired.push(key);
    }

    report.orphans_relinked = pool.relink_orphans();

    if pool.audit().issues.iter().any(is_bucket_issue) {
        pool.rebuild_spatial_index();
        report.spatial_rebuilt = true;
    }

    report.after = pool.audit();
    report
}

/// Check a save file, optionally writing the repaired pool to `out`.
///
/// # Errors
///
/// Returns an error if the save cannot be read or decoded, or `out` cannot
/// be written.
pub fn check_file(path: &Path, fix: bool, out: Option<&Path>) -> Result<CheckReport> {
    let bytes = read_file(path)?;
    let mut pool = SpritePool::deserialize(&bytes)?;
    tracing::info!(
        capacity = pool.capacity(),
        allocated = pool.allocated_count(),
        "Loaded sprite pool"
    );

    let report = check_pool(&mut pool, fix);

    if let Some(out) = out {
        write_file(out, &pool.serialize()?)?;
        tracing::info!(path = %out.display(), "Wrote sprite pool");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sprite_test_utils::fixtures::{looped_list, place, pool};

    fn populated() -> SpritePool {
        let mut pool = pool(64, 8);
        for i in 0..10 {
            place(&mut pool, SpriteKind::Peep, CoordsXYZ::new(i * 20, 40, 0));
        }
        pool
    }

    #[test]
    fn test_clean_pool_untouched() {
        let mut pool = populated();
        let before = pool.clone();
        let report = check_pool(&mut pool, true);
        assert!(report.is_clean());
        assert!(report.list_cycles_repaired.is_empty());
        assert_eq!(pool, before);
    }

    #[test]
    fn test_check_without_fix_is_read_only() {
        let mut pool = pool(32, 4);
        looped_list(&mut pool, SpriteList::Vehicle, 6, 2);
        let before = pool.clone();
        let report = check_pool(&mut pool, false);
        assert!(!report.is_clean());
        assert!(report.before.has_cycles());
        assert_eq!(pool, before);
    }

    #[test]
    fn test_fix_repairs_list_cycle() {
        let mut pool = pool(32, 4);
        looped_list(&mut pool, SpriteList::Vehicle, 6, 2);
        let report = check_pool(&mut pool, true);
        assert_eq!(report.list_cycles_repaired, vec![SpriteList::Vehicle]);
        assert!(report.is_clean(), "issues: {:?}", report.after.issues);
    }

    #[test]
    fn test_fix_relinks_orphans() {
        let mut pool = populated();
        let free_head = pool.list_head(SpriteList::Free).unwrap();
        // Cut the free list after its head.
        pool.inject_list_link(free_head, None);
        pool.inject_list_count(SpriteList::Free, 1);

        let report = check_pool(&mut pool, true);
        assert_eq!(usize::from(report.orphans_relinked), 64 - 10 - 1);
        assert!(report.is_clean(), "issues: {:?}", report.after.issues);
    }

    #[test]
    fn test_fix_rebuilds_grid() {
        let mut pool = populated();
        pool.inject_bucket_head(SpatialKey::from_xy(0, 40), None);
        let report = check_pool(&mut pool, true);
        assert!(report.spatial_rebuilt);
        assert!(report.is_clean());
    }

    #[test]
    fn test_check_file_round_trip() {
        let dir = std::env::temp_dir();
        let input = dir.join(format!("sprite_tools_{}_in.bin", std::process::id()));
        let output = dir.join(format!("sprite_tools_{}_out.bin", std::process::id()));

        let mut pool = pool(32, 4);
        looped_list(&mut pool, SpriteList::Peep, 5, 0);
        std::fs::write(&input, pool.serialize().unwrap()).unwrap();

        let report = check_file(&input, true, Some(&output)).unwrap();
        assert!(report.is_clean());
        let repaired = SpritePool::deserialize(&std::fs::read(&output).unwrap()).unwrap();
        assert!(repaired.audit().is_clean());

        std::fs::remove_file(input).ok();
        std::fs::remove_file(output).ok();
    }
}
