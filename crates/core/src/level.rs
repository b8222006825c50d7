//! Grid state for one mission attempt.
//!
//! A `Level` is built fresh from a `LevelDef` for every attempt, mutated once per accepted
//! token by `Level::apply`, and thrown away on advance, restart or fail-retry.

use std::collections::BTreeMap;
use std::time::Duration;

use slotmap::SlotMap;

use crate::types::*;

mod build;
mod hash;
mod inventory;
mod placement;
mod seed;
mod tick;
mod warp;

#[cfg(test)]
mod test_support;

pub use inventory::Inventory;
pub use seed::derive_attempt_seed;
pub use tick::TickReport;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Obstacle {
    pub pos: Pos,
    pub kind: ObstacleKind,
    pub pass: PassRule,
    pub item: Option<ItemKind>,
    pub group: Option<String>,
    /// Authoring order, used to cycle grouped portal gates.
    pub order: usize,
    /// Display state for gates, recomputed from the inventory.
    pub open: bool,
}

impl Obstacle {
    /// Item a `need_item` rule asks for.
    pub fn required_item(&self) -> ItemKind {
        self.item.unwrap_or(ItemKind::Key)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pickup {
    pub id: PickupId,
    pub pos: Pos,
    pub kind: ItemKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enemy {
    pub id: EnemyId,
    pub pos: Pos,
    pub kind: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PortalLink {
    pub a: Pos,
    pub b: Pos,
    pub requires: Vec<ItemKind>,
    pub bidirectional: bool,
}

/// Read-only view a presentation layer polls between ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSnapshot {
    pub id: String,
    pub grid: Grid,
    pub actor: Pos,
    pub facing: Direction,
    pub goal: Pos,
    pub inventory: Vec<(ItemKind, u32)>,
    pub life: u32,
    pub life_max: u32,
    pub cleared: bool,
}

#[derive(Debug)]
pub struct Level {
    id: String,
    grid: Grid,
    start: Pos,
    actor: Pos,
    facing: Direction,
    goal: Pos,
    obstacles: BTreeMap<Pos, Obstacle>,
    pickups: SlotMap<PickupId, Pickup>,
    enemies: SlotMap<EnemyId, Enemy>,
    portals: Vec<PortalLink>,
    inventory: Inventory,
    blueprint_target: u32,
    has_key_pickup: bool,
    life: u32,
    life_max: u32,
    cleared: bool,
    halted: Option<FailCause>,
    ticks: u64,
    last_warp_at: Option<Duration>,
    warp_cooldown: Duration,
}

impl Level {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn grid(&self) -> Grid {
        self.grid
    }

    pub fn start(&self) -> Pos {
        self.start
    }

    pub fn actor(&self) -> Pos {
        self.actor
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn goal(&self) -> Pos {
        self.goal
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn life(&self) -> u32 {
        self.life
    }

    pub fn life_max(&self) -> u32 {
        self.life_max
    }

    pub fn is_cleared(&self) -> bool {
        self.cleared
    }

    pub fn halted(&self) -> Option<FailCause> {
        self.halted
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn blueprint_target(&self) -> u32 {
        self.blueprint_target
    }

    pub fn has_key_pickup(&self) -> bool {
        self.has_key_pickup
    }

    pub fn obstacle_at(&self, pos: Pos) -> Option<&Obstacle> {
        self.obstacles.get(&pos)
    }

    pub fn obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.values()
    }

    pub fn pickups(&self) -> impl Iterator<Item = &Pickup> {
        self.pickups.values()
    }

    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    pub fn portals(&self) -> &[PortalLink] {
        &self.portals
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            id: self.id.clone(),
            grid: self.grid,
            actor: self.actor,
            facing: self.facing,
            goal: self.goal,
            inventory: self.inventory.iter().collect(),
            life: self.life,
            life_max: self.life_max,
            cleared: self.cleared,
        }
    }

    pub fn enemy_at(&self, pos: Pos) -> Option<EnemyId> {
        self.enemies.iter().find(|(_, enemy)| enemy.pos == pos).map(|(id, _)| id)
    }

    pub fn pickup_at(&self, pos: Pos, kind: ItemKind) -> Option<PickupId> {
        self.pickups
            .iter()
            .find(|(_, pickup)| pickup.pos == pos && pickup.kind == kind)
            .map(|(id, _)| id)
    }

    /// Rock and wall always block; gates and portals follow their pass rule.
    pub fn can_enter(&self, pos: Pos) -> bool {
        let Some(obstacle) = self.obstacles.get(&pos) else {
            return true;
        };
        match obstacle.kind {
            ObstacleKind::Rock | ObstacleKind::Wall => false,
            ObstacleKind::Gate | ObstacleKind::Portal => self.rule_allows(obstacle),
            ObstacleKind::Unknown => true,
        }
    }

    /// Spends one life for a run attempt. Never goes below zero.
    pub fn spend_life(&mut self) -> u32 {
        self.life = self.life.saturating_sub(1);
        self.life
    }

    fn rule_allows(&self, obstacle: &Obstacle) -> bool {
        match obstacle.pass {
            PassRule::Always => true,
            PassRule::Never => false,
            PassRule::NeedItem => self.inventory.has(obstacle.required_item()),
        }
    }

    pub(crate) fn refresh_gates(&mut self, events: &mut Vec<LevelEvent>) {
        let updates: Vec<(Pos, bool)> = self
            .obstacles
            .values()
            .filter(|obstacle| obstacle.kind == ObstacleKind::Gate)
            .map(|gate| (gate.pos, self.rule_allows(gate)))
            .filter(|(pos, open)| self.obstacles.get(pos).is_some_and(|gate| gate.open != *open))
            .collect();

        for (pos, open) in updates {
            if let Some(gate) = self.obstacles.get_mut(&pos) {
                gate.open = open;
                events.push(LevelEvent::GateChanged { pos, open });
            }
        }
    }
}
