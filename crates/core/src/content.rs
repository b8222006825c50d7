//! Level pack definitions as authored in JSON.
//! This module exists to own the on-disk shape and its defaults.
//! It does not place anything on a grid; see `level::build` for that.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::LevelError;
use crate::mission::{ClearLogic, Condition, ConditionKind, CutscenePaths};
use crate::program::{DEFAULT_COMMAND_CAP, DEFAULT_REPEAT_INNER_CAP, ProgramLimits};
use crate::types::{Grid, ItemKind, ObstacleKind, PassRule, Pos};

pub const DEFAULT_ENEMY_KIND: &str = "monster-a";

/// Condition ids the engine looks up for cutscene selection.
pub mod condition_ids {
    pub const GET_KEY: &str = "get_key";
    pub const REACH_GOAL: &str = "reach_goal";
    pub const COLLECT_BLUEPRINTS: &str = "collect_blueprints";
    pub const LIFE_ZERO: &str = "life_zero";
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelDef {
    pub id: String,
    pub grid_w: Option<i32>,
    pub grid_h: Option<i32>,
    #[serde(alias = "robot")]
    pub start: Option<Pos>,
    pub goal: Option<Pos>,
    pub goal_spec: Option<GoalSpec>,
    pub cmd_cap: Option<usize>,
    pub repeat_inner_cap: Option<usize>,
    pub obstacles: Vec<ObstacleDef>,
    pub pickups: Vec<PickupDef>,
    pub enemies: Vec<EnemyDef>,
    pub portals: Vec<PortalDef>,
    /// Extra conditions outside the clear rule, e.g. the life count.
    pub conditions: Vec<Condition>,
    pub clear: ClearDef,
    pub defaults: DefaultsDef,
    pub cutscene: Option<CutsceneDef>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalSpec {
    pub pattern: GoalPattern,
    pub min_distance: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalPattern {
    Line,
    Zigzag,
    Perimeter,
    Diagonal,
    #[default]
    #[serde(other)]
    Random,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleDef {
    pub x: i32,
    pub y: i32,
    #[serde(rename = "type")]
    pub kind: ObstacleKind,
    #[serde(default)]
    pub pass: PassRule,
    #[serde(default)]
    pub item: Option<ItemKind>,
    #[serde(default)]
    pub group: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupDef {
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
    #[serde(default)]
    pub count: Option<u32>,
}

impl PickupDef {
    pub fn fixed_cell(&self) -> Option<Pos> {
        Some(Pos { y: self.y?, x: self.x? })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyDef {
    #[serde(rename = "type", default = "default_enemy_kind")]
    pub kind: String,
    #[serde(default = "default_enemy_count")]
    pub count: u32,
    #[serde(default)]
    pub x: Option<i32>,
    #[serde(default)]
    pub y: Option<i32>,
}

impl EnemyDef {
    pub fn fixed_cell(&self) -> Option<Pos> {
        Some(Pos { y: self.y?, x: self.x? })
    }
}

fn default_enemy_kind() -> String {
    DEFAULT_ENEMY_KIND.to_string()
}

fn default_enemy_count() -> u32 {
    1
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalDef {
    pub a: Pos,
    pub b: Pos,
    #[serde(default)]
    pub requires: Vec<ItemKind>,
    #[serde(default = "default_bidirectional")]
    pub bidirectional: bool,
}

fn default_bidirectional() -> bool {
    true
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearDef {
    pub logic: ClearLogic,
    pub conditions: Vec<Condition>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsDef {
    pub cutscenes: DefaultCutscenes,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultCutscenes {
    pub battle: CutscenePaths,
    pub goal: CutscenePaths,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutsceneDef {
    pub image: Option<String>,
}

impl LevelDef {
    pub fn grid(&self) -> Grid {
        let side = |value: Option<i32>| {
            value
                .filter(|v| *v != 0)
                .unwrap_or(Grid::DEFAULT_SIDE)
                .clamp(Grid::MIN_SIDE, Grid::MAX_SIDE)
        };
        Grid { width: side(self.grid_w), height: side(self.grid_h) }
    }

    /// Rejects definitions that cannot produce a playable attempt.
    pub fn validate(&self) -> Result<(), LevelError> {
        let unplayable = |reason| LevelError::Unplayable { id: self.id.clone(), reason };
        if self.cmd_cap == Some(0) {
            return Err(unplayable("command cap is zero"));
        }
        let grid = self.grid();
        let start = grid.clamp(self.start.unwrap_or(Pos { y: 0, x: 0 }));
        if self.goal.is_some_and(|goal| grid.clamp(goal) == start) {
            return Err(unplayable("goal coincides with start"));
        }
        Ok(())
    }

    pub fn limits(&self) -> ProgramLimits {
        ProgramLimits {
            command_cap: self.cmd_cap.unwrap_or(DEFAULT_COMMAND_CAP),
            repeat_inner_cap: self.repeat_inner_cap.unwrap_or(DEFAULT_REPEAT_INNER_CAP),
        }
    }

    /// Top-level conditions followed by the clear rule's conditions.
    pub fn all_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter().chain(self.clear.conditions.iter())
    }

    pub fn condition(&self, id: &str) -> Option<&Condition> {
        self.all_conditions().find(|condition| condition.id == id)
    }

    pub fn life_max(&self, fallback: u32) -> u32 {
        self.all_conditions()
            .find(|c| {
                c.kind == ConditionKind::LifeAboveZero || c.id == condition_ids::LIFE_ZERO
            })
            .and_then(|c| c.count)
            .filter(|count| *count > 0)
            .unwrap_or(fallback)
    }

    pub fn battle_cutscene(&self, success: bool) -> Option<&str> {
        let from_condition = self
            .condition(condition_ids::GET_KEY)
            .and_then(|c| c.cutscenes.pick(success));
        from_condition.or_else(|| self.defaults.cutscenes.battle.pick(success))
    }

    pub fn goal_cutscene(&self, success: bool) -> Option<&str> {
        let from_condition = self
            .condition(condition_ids::REACH_GOAL)
            .and_then(|c| c.cutscenes.pick(success))
            .or_else(|| self.defaults.cutscenes.goal.pick(success));
        if success {
            from_condition.or_else(|| self.cutscene.as_ref().and_then(|c| c.image.as_deref()))
        } else {
            from_condition
        }
    }

    pub fn blueprints_cutscene(&self) -> Option<&str> {
        self.condition(condition_ids::COLLECT_BLUEPRINTS).and_then(|c| c.cutscenes.pick(true))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum PackFile {
    Wrapped { levels: Vec<LevelDef> },
    Bare(Vec<LevelDef>),
}

/// Ordered missions of one campaign.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelPack {
    levels: Vec<LevelDef>,
}

impl LevelPack {
    pub fn new(levels: Vec<LevelDef>) -> Self {
        Self { levels }
    }

    /// Accepts either `{"levels": [...]}` or a bare array of levels.
    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let levels = match serde_json::from_str(json)? {
            PackFile::Wrapped { levels } | PackFile::Bare(levels) => levels,
        };
        Ok(Self { levels })
    }

    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let json = fs::read_to_string(path)
            .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
        Self::from_json_str(&json)
    }

    pub fn levels(&self) -> &[LevelDef] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&LevelDef> {
        self.levels.get(index)
    }

    /// SHA-256 over the canonical JSON of every level, as lowercase hex.
    pub fn content_hash(&self) -> Result<String, LevelError> {
        let canonical = serde_json::to_vec(&self.levels)?;
        let digest = Sha256::digest(&canonical);
        Ok(format!("{digest:064x}"))
    }
}
