//! Stable snapshot hashing for deterministic verification.
//! This module exists to keep hashing concerns separate from tick resolution.

use std::hash::Hasher;

use xxhash_rust::xxh3::Xxh3;

use super::*;

impl Level {
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write(self.id.as_bytes());
        write_pos(&mut hasher, self.actor);
        write_pos(&mut hasher, self.goal);
        hasher.write_u8(self.facing as u8);
        hasher.write_u64(self.ticks);
        hasher.write_u32(self.life);
        hasher.write_u8(u8::from(self.cleared));
        hasher.write_u8(match self.halted {
            None => 0,
            Some(FailCause::CombatLost) => 1,
            Some(FailCause::WarpRequirementUnmet) => 2,
            Some(FailCause::GoalConditionsUnmet) => 3,
            Some(FailCause::LifeExhausted) => 4,
        });
        for (item, count) in self.inventory.iter() {
            hasher.write_u8(item as u8);
            hasher.write_u32(count);
        }
        for obstacle in self.obstacles.values() {
            write_pos(&mut hasher, obstacle.pos);
            hasher.write_u8(u8::from(obstacle.open));
        }

        // Slot order depends on removal history, so hash sorted positions instead.
        let mut enemies: Vec<Pos> = self.enemies.values().map(|enemy| enemy.pos).collect();
        enemies.sort();
        for pos in enemies {
            write_pos(&mut hasher, pos);
        }
        let mut pickups: Vec<(Pos, ItemKind)> =
            self.pickups.values().map(|pickup| (pickup.pos, pickup.kind)).collect();
        pickups.sort();
        for (pos, kind) in pickups {
            write_pos(&mut hasher, pos);
            hasher.write_u8(kind as u8);
        }
        hasher.finish()
    }
}

fn write_pos(hasher: &mut Xxh3, pos: Pos) {
    hasher.write_i32(pos.x);
    hasher.write_i32(pos.y);
}
