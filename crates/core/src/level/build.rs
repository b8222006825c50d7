//! Level construction from an authored definition.
//! This module exists to turn a `LevelDef` plus a seed into a ready-to-play `Level`.
//! It does not own tick resolution or mission progression.

use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;
use tracing::{debug, warn};

use super::placement::{Occupancy, pick_goal};
use super::*;
use crate::config::EngineConfig;
use crate::content::LevelDef;

impl Level {
    /// Builds one attempt. Cells that are out of bounds or already taken are skipped with a
    /// warning; random placement draws from a `ChaCha8Rng` seeded with `seed`.
    pub fn build(def: &LevelDef, seed: u64, config: &EngineConfig) -> Level {
        let grid = def.grid();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let start = grid.clamp(def.start.unwrap_or(Pos { y: 0, x: 0 }));
        let goal = match def.goal {
            Some(goal) => grid.clamp(goal),
            None => {
                let spec = def.goal_spec.clone().unwrap_or_default();
                pick_goal(grid, start, &spec, &mut rng)
            }
        };

        let mut occupancy = Occupancy::new(grid);
        occupancy.claim(start);
        occupancy.claim(goal);

        let obstacles = place_obstacles(def, &mut occupancy);
        let portals = def
            .portals
            .iter()
            .map(|portal| PortalLink {
                a: grid.clamp(portal.a),
                b: grid.clamp(portal.b),
                requires: portal.requires.clone(),
                bidirectional: portal.bidirectional,
            })
            .collect();

        let mut pickups: SlotMap<PickupId, Pickup> = SlotMap::with_key();
        let mut blueprint_target = 0;
        for pickup_def in &def.pickups {
            if pickup_def.kind == ItemKind::Unknown {
                warn!(level = %def.id, "skipping pickup of unknown type");
                continue;
            }
            let copies = pickup_def.count.unwrap_or(1);
            if pickup_def.kind == ItemKind::Blueprint {
                blueprint_target += copies;
            }
            for copy in 0..copies {
                let preferred = if copy == 0 { pickup_def.fixed_cell() } else { None };
                let Some(pos) = occupancy.claim_preferred(preferred, &mut rng) else {
                    let item = pickup_def.kind.code();
                    warn!(level = %def.id, item, "grid full; pickup dropped");
                    break;
                };
                let id =
                    pickups.insert(Pickup { id: PickupId::default(), pos, kind: pickup_def.kind });
                pickups[id].id = id;
            }
        }
        let has_key_pickup = pickups.values().any(|pickup| pickup.kind == ItemKind::Key);

        let mut enemies: SlotMap<EnemyId, Enemy> = SlotMap::with_key();
        for enemy_def in &def.enemies {
            for copy in 0..enemy_def.count {
                let preferred = if copy == 0 { enemy_def.fixed_cell() } else { None };
                let Some(pos) = occupancy.claim_preferred(preferred, &mut rng) else {
                    warn!(level = %def.id, kind = %enemy_def.kind, "grid full; enemy dropped");
                    break;
                };
                let id = enemies.insert(Enemy {
                    id: EnemyId::default(),
                    pos,
                    kind: enemy_def.kind.clone(),
                });
                enemies[id].id = id;
            }
        }

        let life_max = def.life_max(config.default_life);
        let mut level = Level {
            id: def.id.clone(),
            grid,
            start,
            actor: start,
            facing: Direction::Down,
            goal,
            obstacles,
            pickups,
            enemies,
            portals,
            inventory: Inventory::default(),
            blueprint_target,
            has_key_pickup,
            life: life_max,
            life_max,
            cleared: false,
            halted: None,
            ticks: 0,
            last_warp_at: None,
            warp_cooldown: config.warp_cooldown(),
        };
        let mut initial_gates = Vec::new();
        level.refresh_gates(&mut initial_gates);

        debug!(
            level = %level.id,
            width = grid.width,
            height = grid.height,
            obstacles = level.obstacles.len(),
            pickups = level.pickups.len(),
            enemies = level.enemies.len(),
            "level built"
        );
        level
    }
}

fn place_obstacles(def: &LevelDef, occupancy: &mut Occupancy) -> BTreeMap<Pos, Obstacle> {
    let mut obstacles = BTreeMap::new();
    for (order, obstacle_def) in def.obstacles.iter().enumerate() {
        let pos = Pos { y: obstacle_def.y, x: obstacle_def.x };
        if obstacle_def.kind == ObstacleKind::Unknown {
            warn!(level = %def.id, x = pos.x, y = pos.y, "skipping obstacle of unknown type");
            continue;
        }
        if !occupancy.claim(pos) {
            warn!(level = %def.id, x = pos.x, y = pos.y, "skipping obstacle on blocked cell");
            continue;
        }
        obstacles.insert(
            pos,
            Obstacle {
                pos,
                kind: obstacle_def.kind,
                pass: obstacle_def.pass,
                item: obstacle_def.item,
                group: obstacle_def.group.clone(),
                order,
                open: false,
            },
        );
    }
    obstacles
}
