//! Per-token resolution: move, then resolve whatever sits on the new cell in a fixed order.
//! This module exists to keep the tick ordering in one place.
//! It does not own cutscenes, rebuilds or mission advance; callers act on the outcome.

use tracing::debug;

use super::*;
use crate::mission::{Mission, MissionProgress};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub outcome: TickOutcome,
    pub events: Vec<LevelEvent>,
}

impl Level {
    /// Applies one token. `now` is the interpreter's virtual time, used for the warp cooldown.
    pub fn apply(&mut self, command: Command, mission: &Mission, now: Duration) -> TickReport {
        let mut events = Vec::new();
        if self.cleared || self.halted.is_some() {
            return TickReport { outcome: TickOutcome::Ignored, events };
        }

        self.ticks += 1;
        let direction = command.direction();
        self.facing = direction;

        let from = self.actor;
        let candidate = self.grid.clamp(direction.step_from(from));
        if !self.can_enter(candidate) {
            debug!(x = candidate.x, y = candidate.y, "move blocked");
            events.push(LevelEvent::Bumped { from, toward: candidate });
            return TickReport { outcome: TickOutcome::Blocked { at: candidate }, events };
        }

        self.actor = candidate;
        events.push(LevelEvent::Moved { to: candidate });

        let outcome = self.resolve_cell(mission, now, &mut events);
        match outcome {
            TickOutcome::GoalReached => self.cleared = true,
            TickOutcome::Fatal(cause) => {
                debug!(?cause, x = candidate.x, y = candidate.y, "attempt failed");
                self.halted = Some(cause);
            }
            _ => {}
        }
        TickReport { outcome, events }
    }

    fn resolve_cell(
        &mut self,
        mission: &Mission,
        now: Duration,
        events: &mut Vec<LevelEvent>,
    ) -> TickOutcome {
        let here = self.actor;
        let mut picked = None;

        if self.collect_single(here, ItemKind::Weapon, events) {
            picked = Some(ItemKind::Weapon);
        }

        if let Some(enemy) = self.enemy_at(here) {
            return self.fight(enemy, events);
        }

        if let Some(id) = self.pickup_at(here, ItemKind::Blueprint) {
            self.pickups.remove(id);
            let collected = (self.inventory.count(ItemKind::Blueprint) + 1).min(self.blueprint_target);
            self.inventory.set(ItemKind::Blueprint, collected);
            events.push(LevelEvent::ItemPicked { item: ItemKind::Blueprint, pos: here });
            picked = Some(ItemKind::Blueprint);
            if self.blueprint_target > 0 && collected >= self.blueprint_target {
                events.push(LevelEvent::BlueprintsComplete);
            }
        }

        if self.collect_single(here, ItemKind::Key, events) {
            picked = Some(ItemKind::Key);
        }
        self.refresh_gates(events);

        if self.collect_single(here, ItemKind::PortalKey, events) {
            picked = Some(ItemKind::PortalKey);
            self.refresh_gates(events);
        }

        if let Some(outcome) = self.try_warp(here, now, events) {
            return outcome;
        }

        if here == self.goal {
            let progress =
                MissionProgress { inventory: &self.inventory, reached_goal: true, life: self.life };
            if !mission.is_done(&progress) {
                return TickOutcome::Fatal(FailCause::GoalConditionsUnmet);
            }
            events.push(LevelEvent::ReachGoal { pos: here });
            return TickOutcome::GoalReached;
        }

        if self.life == 0 {
            return TickOutcome::Fatal(FailCause::LifeExhausted);
        }

        match picked {
            Some(item) => TickOutcome::PickedUp { item },
            None => TickOutcome::Moved { to: here },
        }
    }

    /// Picks up a weapon, key or portal key unless one is already held.
    fn collect_single(&mut self, here: Pos, item: ItemKind, events: &mut Vec<LevelEvent>) -> bool {
        if self.inventory.has(item) {
            return false;
        }
        let Some(id) = self.pickup_at(here, item) else {
            return false;
        };
        self.pickups.remove(id);
        self.inventory.add(item, 1);
        events.push(LevelEvent::ItemPicked { item, pos: here });
        true
    }

    fn fight(&mut self, enemy: EnemyId, events: &mut Vec<LevelEvent>) -> TickOutcome {
        if !self.inventory.has(ItemKind::Weapon) {
            return TickOutcome::Fatal(FailCause::CombatLost);
        }

        if let Some(defeated) = self.enemies.remove(enemy) {
            events.push(LevelEvent::EnemyDown { kind: defeated.kind, pos: defeated.pos });
        }
        if !self.inventory.has(ItemKind::Key) && !self.has_key_pickup {
            self.inventory.add(ItemKind::Key, 1);
            events.push(LevelEvent::ItemPicked { item: ItemKind::Key, pos: self.actor });
        }
        self.refresh_gates(events);
        TickOutcome::CombatWon { enemy }
    }
}
