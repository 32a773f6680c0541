//! Operation scripts.
//!
//! A script is a list of [`PoolOp`]s replayed against a pool. Ops name
//! live sprites by position in the live set (`nth % live.len()`), so any
//! script is valid against any pool. Scripts serialize to RON for
//! hand-written regression cases.

use serde::{Deserialize, Serialize};
use sprite_core::prelude::*;

use crate::fixtures::OpenSurface;

/// One step of a script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolOp {
    /// Allocate a sprite of this kind.
    Allocate(SpriteKind),
    /// Free the `nth` live sprite.
    Free(usize),
    /// Move the `nth` live sprite.
    MoveTo(usize, CoordsXYZ),
    /// Promote the `nth` live sprite to train head, if it is a vehicle.
    PromoteTrainHead(usize),
    /// Spawn an explosion cloud.
    SpawnCloud(CoordsXYZ),
    /// Drop litter.
    DropLitter(CoordsXYZ, u8, LitterKind),
    /// Sweep litter near a point.
    SweepLitter(CoordsXYZ),
    /// Run one misc update tick.
    TickEffects,
    /// Drop every balloon, money effect and airborne duck.
    RemoveFloating,
    /// Rebuild the spatial grid from stored positions.
    RebuildSpatial,
}

/// What a script run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptOutcome {
    /// Allocations that succeeded.
    pub allocated: usize,
    /// Allocations refused for capacity.
    pub refused: usize,
    /// Sprites freed directly by the script.
    pub freed: usize,
    /// Ops that had no live sprite to act on.
    pub skipped: usize,
}

/// Replays scripts against a pool, tracking live sprites.
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    /// The pool under test.
    pub pool: SpritePool,
    tick: u32,
    outcome: ScriptOutcome,
}

impl ScriptRunner {
    /// Wrap a pool.
    #[must_use]
    pub fn new(pool: SpritePool) -> Self {
        Self {
            pool,
            tick: 0,
            outcome: ScriptOutcome::default(),
        }
    }

    /// Totals so far.
    #[must_use]
    pub fn outcome(&self) -> &ScriptOutcome {
        &self.outcome
    }

    fn live(&self) -> Vec<SpriteIndex> {
        self.pool
            .slots()
            .filter(|s| s.is_allocated())
            .map(Sprite::index)
            .collect()
    }

    fn nth_live(&mut self, nth: usize) -> Option<SpriteIndex> {
        let live = self.live();
        if live.is_empty() {
            self.outcome.skipped += 1;
            return None;
        }
        Some(live[nth % live.len()])
    }

    fn record_allocation(&mut self, result: Result<SpriteIndex>) {
        match result {
            Ok(_) => self.outcome.allocated += 1,
            Err(PoolError::NoCapacity { .. }) => self.outcome.refused += 1,
            Err(error) => tracing::debug!(%error, "Scripted allocation failed"),
        }
    }

    /// Apply one op.
    pub fn apply(&mut self, op: &PoolOp) {
        self.tick = self.tick.wrapping_add(1);
        match op {
            PoolOp::Allocate(kind) => {
                let result = self.pool.allocate_kind(*kind);
                self.record_allocation(result);
            }
            PoolOp::Free(nth) => {
                if let Some(index) = self.nth_live(*nth) {
                    if self.pool.free(index).is_ok() {
                        self.outcome.freed += 1;
                    }
                }
            }
            PoolOp::MoveTo(nth, at) => {
                if let Some(index) = self.nth_live(*nth) {
                    let _ = self.pool.move_to(index, *at);
                }
            }
            PoolOp::PromoteTrainHead(nth) => {
                if let Some(index) = self.nth_live(*nth) {
                    if self.pool.get(index).map(Sprite::list) == Some(SpriteList::Vehicle) {
                        let _ = self.pool.move_to_list(index, SpriteList::TrainHead);
                    }
                }
            }
            PoolOp::SpawnCloud(at) => {
                let result = self.pool.spawn_explosion_cloud(*at);
                self.record_allocation(result);
            }
            PoolOp::DropLitter(at, direction, kind) => {
                let result = self.pool.create_litter(
                    *at,
                    *direction,
                    *kind,
                    self.tick,
                    &OpenSurface,
                    &mut NullViewports,
                );
                match result {
                    Ok(Some(_)) => self.outcome.allocated += 1,
                    Ok(None) => {}
                    Err(_) => self.outcome.refused += 1,
                }
            }
            PoolOp::SweepLitter(at) => {
                self.pool.remove_litter_at(*at, &mut NullViewports);
            }
            PoolOp::TickEffects => {
                self.pool
                    .update_misc_all(&mut BuiltinEffects, &mut NullViewports);
            }
            PoolOp::RemoveFloating => {
                self.pool.remove_floating_sprites();
            }
            PoolOp::RebuildSpatial => self.pool.rebuild_spatial_index(),
        }
    }

    /// Apply every op in order.
    pub fn run(&mut self, script: &[PoolOp]) -> &ScriptOutcome {
        for op in script {
            self.apply(op);
        }
        &self.outcome
    }
}

/// Run `script` on a fresh pool built from `config`.
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn run_script(config: PoolConfig, script: &[PoolOp]) -> ScriptRunner {
    let pool = SpritePool::new(config).expect("script config is valid");
    let mut runner = ScriptRunner::new(pool);
    runner.run(script);
    runner
}

/// Parse a script from RON text.
pub fn script_from_ron(text: &str) -> std::result::Result<Vec<PoolOp>, ron::error::SpannedError> {
    ron::from_str(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_from_ron() {
        let script = script_from_ron(
            "[Allocate(Peep), MoveTo(0, (x: 40, y: 40, z: 0)), Allocate(Litter(EmptyCan)), Free(1)]",
        )
        .unwrap();
        assert_eq!(script.len(), 4);

        let runner = run_script(PoolConfig::with_capacity(16, 2), &script);
        assert_eq!(runner.outcome().allocated, 2);
        assert_eq!(runner.outcome().freed, 1);
        assert_eq!(runner.pool.allocated_count(), 1);
        assert!(runner.pool.audit().is_clean());
    }

    #[test]
    fn test_ops_on_empty_pool_are_skipped() {
        let runner = run_script(
            PoolConfig::with_capacity(8, 2),
            &[PoolOp::Free(3), PoolOp::MoveTo(0, CoordsXYZ::new(1, 1, 0))],
        );
        assert_eq!(runner.outcome().skipped, 2);
    }

    #[test]
    fn test_refusals_are_counted() {
        let script = vec![PoolOp::Allocate(SpriteKind::Vehicle); 5];
        let runner = run_script(PoolConfig::with_capacity(4, 1), &script);
        assert_eq!(runner.outcome().allocated, 4);
        assert_eq!(runner.outcome().refused, 1);
    }
}
