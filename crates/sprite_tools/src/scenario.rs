//! Built-in scenarios run against a fresh pool.

use std::fmt;

use serde::Serialize;
use sprite_core::prelude::*;

/// Outcome of one scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioReport {
    /// Scenario name.
    pub name: &'static str,
    /// Whether every check held.
    pub passed: bool,
    /// One line per step, in order.
    pub steps: Vec<String>,
}

impl ScenarioReport {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            passed: true,
            steps: Vec::new(),
        }
    }

    fn check(&mut self, ok: bool, step: impl Into<String>) {
        let step = step.into();
        if !ok {
            tracing::warn!(scenario = self.name, %step, "Scenario check failed");
            self.passed = false;
        }
        self.steps
            .push(format!("[{}] {step}", if ok { "ok" } else { "FAIL" }));
    }

    fn finish(mut self, pool: &SpritePool) -> Self {
        let audit = pool.audit();
        let summary = match audit.issues.first() {
            None => "pool audit clean".to_owned(),
            Some(issue) => format!("pool audit: {issue} (+{} more)", audit.issues.len() - 1),
        };
        self.check(audit.is_clean(), summary);
        self
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verdict = if self.passed { "passed" } else { "FAILED" };
        writeln!(f, "{}: {verdict}", self.name)?;
        for step in &self.steps {
            writeln!(f, "  {step}")?;
        }
        Ok(())
    }
}

/// Fill the misc list to its soft cap, check the cap holds, check a
/// gameplay sprite still fits, then drain and refill.
pub fn misc_admission(config: PoolConfig) -> Result<ScenarioReport> {
    let mut pool = SpritePool::new(config)?;
    let mut report = ScenarioReport::new("misc_admission");
    let cap = config.misc_soft_cap;

    let mut effects = Vec::new();
    while let Ok(index) = pool.allocate(SpriteList::Misc) {
        effects.push(index);
    }
    report.check(
        effects.len() == usize::from(cap),
        format!("allocated {} misc effects (cap {cap})", effects.len()),
    );

    report.check(
        pool.allocate(SpriteList::Misc).is_err(),
        "next misc effect refused",
    );

    report.check(
        pool.allocate(SpriteList::Vehicle).is_ok(),
        "vehicle allocated past the misc cap",
    );

    for &index in &effects {
        pool.free(index)?;
    }
    report.check(
        pool.list_count(SpriteList::Misc) == 0,
        format!("freed {} misc effects", effects.len()),
    );

    report.check(
        cap == 0 || pool.allocate(SpriteList::Misc).is_ok(),
        "misc effect allocated after draining",
    );

    Ok(report.finish(&pool))
}

/// Place slots 5 and 12 on the same tile, check the chain runs 12 then 5,
/// then move 12 away and check both tiles.
pub fn bucket_order(config: PoolConfig) -> Result<ScenarioReport> {
    const LOW: SpriteIndex = SpriteIndex(5);
    const HIGH: SpriteIndex = SpriteIndex(12);

    let mut pool = SpritePool::new(config)?;
    let mut report = ScenarioReport::new("bucket_order");
    if pool.capacity() <= HIGH.as_usize() {
        report.check(false, format!("capacity {} too small", pool.capacity()));
        return Ok(report);
    }

    // A fresh pool hands slots out in ascending order.
    for _ in 0..=HIGH.0 {
        pool.allocate(SpriteList::Peep)?;
    }

    let here = CoordsXYZ::new(100, 100, 0);
    let there = CoordsXYZ::new(300, 100, 0);
    pool.move_to(LOW, here)?;
    pool.move_to(HIGH, here)?;
    let chain: Vec<SpriteIndex> = pool.sprites_at(here.x, here.y).collect();
    report.check(
        chain == [HIGH, LOW],
        format!("shared tile holds {chain:?}"),
    );

    pool.move_to(HIGH, there)?;
    let old: Vec<SpriteIndex> = pool.sprites_at(here.x, here.y).collect();
    let new: Vec<SpriteIndex> = pool.sprites_at(there.x, there.y).collect();
    report.check(old == [LOW], format!("old tile holds {old:?}"));
    report.check(new == [HIGH], format!("new tile holds {new:?}"));

    Ok(report.finish(&pool))
}

/// Run every scenario.
pub fn run_all(config: PoolConfig) -> Result<Vec<ScenarioReport>> {
    Ok(vec![misc_admission(config)?, bucket_order(config)?])
}
