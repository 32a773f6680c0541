//! Determinism testing utilities.
//!
//! Provides a harness for verifying that the pool produces identical
//! checksums given identical operation scripts.
//!
//! # Testing Strategy
//!
//! Pool checksums are compared across peers to catch desyncs, so every
//! operation must be deterministic. Sources of non-determinism include:
//!
//! - **Floating-point math**: tween blend factors use
//!   [`sprite_core::math::Fixed`] throughout.
//!
//! - **Iteration order**: lists, buckets and the checksum walk slots in a
//!   fixed order; nothing iterates a `HashMap`.
//!
//! - **Slot reuse**: allocation always pops the free-list head, so the
//!   same script hands out the same slots.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual operations inside `sprite_core`
//! 2. **Property tests**: random scripts keep every structural invariant
//! 3. **Parallel tests**: running N pools in parallel all match

use std::thread;

use sprite_core::prelude::*;

use crate::script::{PoolOp, ScriptRunner};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps applied per run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic pool).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Pool is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Replay `script` on fresh pools `runs` times and compare checksums.
///
/// # Example
///
/// ```
/// use sprite_core::prelude::*;
/// use sprite_test_utils::determinism::verify_script_determinism;
/// use sprite_test_utils::script::PoolOp;
///
/// let script = vec![
///     PoolOp::Allocate(SpriteKind::Peep),
///     PoolOp::MoveTo(0, CoordsXYZ::new(64, 64, 0)),
///     PoolOp::SpawnCloud(CoordsXYZ::new(64, 64, 0)),
///     PoolOp::TickEffects,
/// ];
/// verify_script_determinism(PoolConfig::with_capacity(32, 4), &script, 3)
///     .assert_deterministic();
/// ```
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn verify_script_determinism(
    config: PoolConfig,
    script: &[PoolOp],
    runs: usize,
) -> DeterminismResult {
    let mut hashes = Vec::with_capacity(runs);
    for _ in 0..runs {
        let runner = crate::script::run_script(config, script);
        hashes.push(runner.pool.checksum().0);
    }
    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    DeterminismResult {
        is_deterministic,
        hashes,
        steps: script.len() as u64,
    }
}

/// Replay `script` on `num_pools` pools in scoped threads and collect the
/// final checksums.
///
/// # Panics
///
/// Panics if `config` is invalid or a worker thread panics.
#[must_use]
pub fn run_parallel_scripts(config: PoolConfig, script: &[PoolOp], num_pools: usize) -> Vec<u64> {
    thread::scope(|s| {
        let handles: Vec<_> = (0..num_pools)
            .map(|_| s.spawn(|| crate::script::run_script(config, script).pool.checksum().0))
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

/// Compare two replays op by op, finding the first divergence.
///
/// # Returns
///
/// `None` if the replays match throughout, `Some(step)` if they diverge
/// after that many ops (`0` meaning the fresh pools already differ).
///
/// # Panics
///
/// Panics if `config` is invalid.
#[must_use]
pub fn find_first_divergence(config: PoolConfig, script: &[PoolOp]) -> Option<u64> {
    let fresh = || ScriptRunner::new(SpritePool::new(config).expect("config is valid"));
    let mut first = fresh();
    let mut second = fresh();

    if first.pool.checksum() != second.pool.checksum() {
        return Some(0);
    }

    for (step, op) in (1u64..).zip(script) {
        first.apply(op);
        second.apply(op);
        if first.pool.checksum() != second.pool.checksum() {
            return Some(step);
        }
    }

    None
}

/// Verify that a save blob round-trip preserves the pool exactly.
///
/// This is critical for save/load and network synchronization.
#[must_use]
pub fn verify_serialization_determinism(config: PoolConfig, script: &[PoolOp]) -> bool {
    let Ok(pool) = SpritePool::new(config) else {
        return false;
    };
    let mut runner = ScriptRunner::new(pool);
    runner.run(script);
    let before = runner.pool.checksum();

    let Ok(bytes) = runner.pool.serialize() else {
        return false;
    };
    let Ok(restored) = SpritePool::deserialize(&bytes) else {
        return false;
    };

    restored.checksum() == before && restored == runner.pool
}

/// Proptest strategies for pool scripts.
pub mod strategies {
    use proptest::prelude::*;
    use sprite_core::prelude::*;

    use crate::script::PoolOp;

    /// A coordinate on a small map, or occasionally off it.
    pub fn arb_coords() -> impl Strategy<Value = CoordsXYZ> {
        prop_oneof![
            8 => (0i32..2048, 0i32..2048, 0i32..256)
                .prop_map(|(x, y, z)| CoordsXYZ::new(x, y, z)),
            1 => Just(CoordsXYZ::NULL),
            1 => (-4096i32..0, 0i32..2048).prop_map(|(x, y)| CoordsXYZ::new(x, y, 0)),
        ]
    }

    /// Any list a sprite can be allocated into.
    pub fn arb_list() -> impl Strategy<Value = SpriteList> {
        prop_oneof![
            Just(SpriteList::TrainHead),
            Just(SpriteList::Peep),
            Just(SpriteList::Misc),
            Just(SpriteList::Litter),
            Just(SpriteList::Vehicle),
        ]
    }

    /// A misc effect kind.
    pub fn arb_misc_kind() -> impl Strategy<Value = MiscKind> {
        prop_oneof![
            Just(MiscKind::SteamParticle),
            Just(MiscKind::MoneyEffect),
            Just(MiscKind::ExplosionCloud),
            Just(MiscKind::ExplosionFlare),
            Just(MiscKind::Balloon),
            Just(MiscKind::Duck),
        ]
    }

    /// A litter kind.
    pub fn arb_litter_kind() -> impl Strategy<Value = LitterKind> {
        prop_oneof![
            Just(LitterKind::Vomit),
            Just(LitterKind::EmptyCan),
            Just(LitterKind::Rubbish),
            Just(LitterKind::EmptyCup),
        ]
    }

    /// Any allocatable sprite kind.
    pub fn arb_kind() -> impl Strategy<Value = SpriteKind> {
        prop_oneof![
            Just(SpriteKind::Vehicle),
            Just(SpriteKind::Peep),
            arb_litter_kind().prop_map(SpriteKind::Litter),
            arb_misc_kind().prop_map(SpriteKind::Misc),
        ]
    }

    /// One script op, weighted toward allocation and movement.
    pub fn arb_op() -> impl Strategy<Value = PoolOp> {
        prop_oneof![
            6 => arb_kind().prop_map(PoolOp::Allocate),
            3 => any::<usize>().prop_map(PoolOp::Free),
            6 => (any::<usize>(), arb_coords()).prop_map(|(n, at)| PoolOp::MoveTo(n, at)),
            1 => any::<usize>().prop_map(PoolOp::PromoteTrainHead),
            1 => arb_coords().prop_map(PoolOp::SpawnCloud),
            1 => (arb_coords(), any::<u8>(), arb_litter_kind())
                .prop_map(|(at, dir, kind)| PoolOp::DropLitter(at, dir, kind)),
            1 => arb_coords().prop_map(PoolOp::SweepLitter),
            2 => Just(PoolOp::TickEffects),
            1 => Just(PoolOp::RemoveFloating),
            1 => Just(PoolOp::RebuildSpatial),
        ]
    }

    /// A script of up to `max_len` ops.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<PoolOp>> {
        prop::collection::vec(arb_op(), 0..max_len)
    }
}
