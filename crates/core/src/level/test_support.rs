//! Shared fixtures for the `level` test suites.
//! This module exists to keep authored-level setup short in each test.
//! It does not own production level logic.

use std::time::Duration;

use super::*;
use crate::config::EngineConfig;
use crate::content::{EnemyDef, LevelDef, ObstacleDef, PickupDef, PortalDef};
use crate::mission::{ClearLogic, Condition, ConditionKind, Mission};

pub(super) const FIXTURE_SEED: u64 = 0x5eed;

/// Open grid with the actor at the origin and an explicit goal.
pub(super) fn open_def(width: i32, height: i32, goal: Pos) -> LevelDef {
    LevelDef {
        id: "fixture".to_string(),
        grid_w: Some(width),
        grid_h: Some(height),
        start: Some(Pos { y: 0, x: 0 }),
        goal: Some(goal),
        ..LevelDef::default()
    }
}

pub(super) fn obstacle(y: i32, x: i32, kind: ObstacleKind, pass: PassRule) -> ObstacleDef {
    ObstacleDef { x, y, kind, pass, item: None, group: None }
}

pub(super) fn gate_needing(y: i32, x: i32, item: ItemKind) -> ObstacleDef {
    ObstacleDef { item: Some(item), ..obstacle(y, x, ObstacleKind::Gate, PassRule::NeedItem) }
}

pub(super) fn portal_gate(y: i32, x: i32, group: &str) -> ObstacleDef {
    let gate = obstacle(y, x, ObstacleKind::Portal, PassRule::Always);
    ObstacleDef { group: Some(group.to_string()), ..gate }
}

pub(super) fn pickup(y: i32, x: i32, kind: ItemKind) -> PickupDef {
    PickupDef { kind, x: Some(x), y: Some(y), count: None }
}

pub(super) fn enemy(y: i32, x: i32) -> EnemyDef {
    EnemyDef { kind: "slime".to_string(), count: 1, x: Some(x), y: Some(y) }
}

pub(super) fn portal(a: Pos, b: Pos, requires: &[ItemKind]) -> PortalDef {
    PortalDef { a, b, requires: requires.to_vec(), bidirectional: true }
}

pub(super) fn build(def: &LevelDef) -> Level {
    Level::build(def, FIXTURE_SEED, &EngineConfig::default())
}

/// Feeds commands one tick delay apart and returns every outcome.
pub(super) fn drive(level: &mut Level, mission: &Mission, commands: &[Command]) -> Vec<TickOutcome> {
    let delay = Duration::from_millis(300);
    commands
        .iter()
        .enumerate()
        .map(|(tick, command)| {
            let now = delay * (tick as u32 + 1);
            level.apply(*command, mission, now).outcome
        })
        .collect()
}

pub(super) fn reach_only() -> Mission {
    Mission::new(ClearLogic::And, vec![Condition::new("reach_goal", ConditionKind::Reach)])
}
