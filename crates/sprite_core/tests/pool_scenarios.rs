//! End-to-end pool scenarios.
//!
//! These drive the pool through its public API the way the game does:
//! spawn, move, tick effects, save, corrupt, load and heal.

use sprite_core::audit::IntegrityIssue;
use sprite_core::prelude::*;
use sprite_test_utils::fixtures::{allocate_slot, looped_list, place, pool, RecordingViewports};
use sprite_test_utils::script::{run_script, PoolOp};

// =============================================================================
// Admission control
// =============================================================================

#[test]
fn misc_cap_holds_at_default_size() {
    let mut pool = SpritePool::new(PoolConfig::default()).unwrap();

    let effects: Vec<SpriteIndex> = (0..300)
        .map(|_| pool.allocate(SpriteList::Misc).unwrap())
        .collect();
    assert!(matches!(
        pool.allocate(SpriteList::Misc),
        Err(PoolError::NoCapacity {
            list: SpriteList::Misc
        })
    ));
    pool.allocate(SpriteList::Vehicle).unwrap();

    for index in effects {
        pool.free(index).unwrap();
    }
    pool.allocate(SpriteList::Misc).unwrap();
    assert!(pool.audit().is_clean());
}

#[test]
fn misc_refused_when_free_slots_run_low() {
    let mut pool = pool(20, 10);
    let guests: Vec<SpriteIndex> = (0..14)
        .map(|_| pool.allocate(SpriteList::Peep).unwrap())
        .collect();
    // 6 free slots cannot cover 10 slots of headroom.
    assert!(pool.allocate(SpriteList::Misc).is_err());

    for &guest in &guests[..6] {
        pool.free(guest).unwrap();
    }
    let mut admitted = 0;
    while pool.allocate(SpriteList::Misc).is_ok() {
        admitted += 1;
    }
    assert_eq!(admitted, 10);
    assert_eq!(pool.list_count(SpriteList::Free), 2);
}

// =============================================================================
// Spatial grid
// =============================================================================

#[test]
fn shared_bucket_orders_by_slot() {
    let mut pool = pool(32, 4);
    let a = allocate_slot(&mut pool, SpriteList::Peep, 5);
    let b = allocate_slot(&mut pool, SpriteList::Peep, 12);

    let here = CoordsXYZ::new(100, 100, 0);
    pool.move_to(a, here).unwrap();
    pool.move_to(b, here).unwrap();
    assert_eq!(pool.sprites_at(100, 100).collect::<Vec<_>>(), vec![b, a]);

    pool.move_to(b, CoordsXYZ::new(300, 100, 0)).unwrap();
    assert_eq!(pool.sprites_at(100, 100).collect::<Vec<_>>(), vec![a]);
    assert_eq!(pool.sprites_at(300, 100).collect::<Vec<_>>(), vec![b]);
}

#[test]
fn moving_off_map_unindexes() {
    let mut pool = pool(16, 2);
    let peep = place(&mut pool, SpriteKind::Peep, CoordsXYZ::new(64, 64, 0));
    pool.move_to(peep, CoordsXYZ::new(64, -1, 0)).unwrap();

    assert_eq!(pool.get(peep).unwrap().position().x, LOCATION_NULL);
    assert_eq!(pool.first_in_bucket(64, 64), None);
    assert_eq!(pool.get(peep).unwrap().screen(), None);
    assert!(pool.audit().is_clean());
}

#[test]
fn lost_bucket_head_heals_on_next_move() {
    let mut pool = pool(16, 2);
    let peep = place(&mut pool, SpriteKind::Peep, CoordsXYZ::new(40, 40, 0));
    pool.inject_bucket_head(SpatialKey::from_xy(40, 40), None);

    pool.move_to(peep, CoordsXYZ::new(400, 40, 0)).unwrap();
    assert_eq!(pool.first_in_bucket(400, 40), Some(peep));
    assert_eq!(pool.first_in_bucket(40, 40), None);
    assert!(pool.audit().is_clean());
}

#[test]
fn freeing_misfiled_sprite_heals_both_buckets() {
    let mut pool = pool(16, 2);
    let a = place(&mut pool, SpriteKind::Peep, CoordsXYZ::new(0, 0, 0));
    let b = place(&mut pool, SpriteKind::Peep, CoordsXYZ::new(64, 0, 0));
    let c = place(&mut pool, SpriteKind::Peep, CoordsXYZ::new(64, 0, 0));

    pool.inject_cell_link(c, None);
    pool.inject_cell_link(b, Some(a));
    pool.inject_bucket_head(SpatialKey::from_xy(0, 0), Some(b));

    pool.free(b).unwrap();
    assert_eq!(pool.sprites_at(0, 0).collect::<Vec<_>>(), vec![a]);
    assert_eq!(pool.sprites_at(64, 0).collect::<Vec<_>>(), vec![c]);
    let report = pool.audit();
    assert!(report.is_clean(), "issues: {:?}", report.issues);
}

#[test]
fn promoting_into_free_list_is_refused() {
    let mut pool = pool(16, 2);
    let guest = place(&mut pool, SpriteKind::Peep, CoordsXYZ::new(10, 10, 0));

    assert_eq!(
        pool.move_to_list(guest, SpriteList::Free),
        Err(PoolError::InvalidList(Some(SpriteList::Free)))
    );
    let next = pool.allocate_kind(SpriteKind::Peep).unwrap();
    assert_ne!(next, guest);
    assert_eq!(pool.bucket_head(SpatialKey::UNINDEXED), Some(next));
    assert!(pool.audit().is_clean());
}

// =============================================================================
// Save, corrupt, load, heal
// =============================================================================

#[test]
fn corrupted_save_heals_after_load() {
    let mut pool = pool(64, 8);
    for i in 0..12 {
        place(&mut pool, SpriteKind::Vehicle, CoordsXYZ::new(i * 32, 0, 0));
    }
    let vehicles: Vec<SpriteIndex> = pool.iter_list(SpriteList::Vehicle).collect();
    pool.inject_list_link(vehicles[11], Some(vehicles[4]));
    let free_head = pool.list_head(SpriteList::Free).unwrap();
    pool.inject_list_link(free_head, None);

    let mut loaded = SpritePool::deserialize(&pool.serialize().unwrap()).unwrap();
    let report = loaded.audit();
    assert!(report.has_cycles());
    assert!(report
        .issues
        .iter()
        .any(|i| matches!(i, IntegrityIssue::Unlisted { .. })));

    assert_eq!(loaded.check_list_cycles(true), Some(SpriteList::Vehicle));
    assert_eq!(loaded.check_list_cycles(false), None);
    assert_eq!(loaded.relink_orphans(), 64 - 12 - 1);

    let report = loaded.audit();
    assert!(report.is_clean(), "issues: {:?}", report.issues);
    assert_eq!(loaded.iter_list(SpriteList::Vehicle).collect::<Vec<_>>(), vehicles);
}

#[test]
fn bucket_cycle_repair_keeps_members() {
    let mut pool = pool(32, 4);
    let spot = CoordsXYZ::new(10, 10, 0);
    let placed: Vec<SpriteIndex> = (0..4)
        .map(|_| place(&mut pool, SpriteKind::Peep, spot))
        .collect();
    // Chain is 3 -> 2 -> 1 -> 0; point 0 back at 2.
    pool.inject_cell_link(placed[0], Some(placed[2]));

    let key = SpatialKey::of(spot);
    assert_eq!(pool.check_bucket_cycles(true), Some(key));
    assert_eq!(pool.check_bucket_cycles(false), None);
    let mut members: Vec<SpriteIndex> = pool.sprites_at(spot.x, spot.y).collect();
    members.sort_unstable();
    assert_eq!(members, placed);
}

// =============================================================================
// Rendering collaborators
// =============================================================================

#[test]
fn tween_frame_cycle() {
    let mut pool = pool(16, 2);
    let car = place(&mut pool, SpriteKind::Vehicle, CoordsXYZ::new(0, 0, 0));
    pool.tween_reset();
    pool.store_snapshot(TweenSlot::A);
    pool.move_to(car, CoordsXYZ::new(32, 32, 0)).unwrap();
    pool.store_snapshot(TweenSlot::B);

    let mut viewports = RecordingViewports::default();
    pool.interpolate_all(Fixed::from_num(1) / 4, &mut viewports);
    assert_eq!(pool.get(car).unwrap().position(), CoordsXYZ::new(8, 8, 0));
    pool.restore_exact(&mut viewports);
    assert_eq!(pool.get(car).unwrap().position(), CoordsXYZ::new(32, 32, 0));

    assert_eq!(viewports.requests.len(), 2);
    assert!(viewports.requests.iter().all(|&(_, zoom)| zoom == 2));
}

#[test]
fn checksum_matches_across_replays() {
    let script = vec![
        PoolOp::Allocate(SpriteKind::Peep),
        PoolOp::Allocate(SpriteKind::Vehicle),
        PoolOp::MoveTo(0, CoordsXYZ::new(120, 64, 0)),
        PoolOp::MoveTo(1, CoordsXYZ::new(120, 70, 8)),
        PoolOp::SpawnCloud(CoordsXYZ::new(120, 64, 0)),
        PoolOp::DropLitter(CoordsXYZ::new(200, 64, 0), 8, LitterKind::EmptyCup),
        PoolOp::TickEffects,
        PoolOp::PromoteTrainHead(1),
    ];
    let first = run_script(PoolConfig::with_capacity(64, 8), &script);
    let second = run_script(PoolConfig::with_capacity(64, 8), &script);
    assert_eq!(first.pool.checksum(), second.pool.checksum());
    assert_eq!(first.pool.list_count(SpriteList::TrainHead), 1);
}
