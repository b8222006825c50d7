//! Headless helpers behind the `quest-tools` binary: logging, config and pack checks.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use quest_core::level::derive_attempt_seed;
use quest_core::{EngineConfig, Level, LevelPack};
use serde::Serialize;
use tracing_subscriber::{EnvFilter, fmt};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,quest_core=info,quest_tools=debug"));

    fmt().with_env_filter(filter).with_target(false).init();
}

/// Reads an engine config from TOML. A missing path means defaults.
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

pub fn load_pack(path: &Path) -> Result<LevelPack> {
    LevelPack::load(path).with_context(|| format!("failed to load levels {}", path.display()))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MissionSummary {
    pub index: usize,
    pub id: String,
    pub width: i32,
    pub height: i32,
    pub goal: (i32, i32),
    pub obstacles: usize,
    pub pickups: usize,
    pub enemies: usize,
    pub command_cap: usize,
    pub life: u32,
    /// Why the mission cannot be played, if it cannot.
    pub problem: Option<String>,
}

/// Builds every mission's first attempt as a session seeded with `seed` would.
pub fn summarize_pack(pack: &LevelPack, config: &EngineConfig, seed: u64) -> Vec<MissionSummary> {
    pack.levels()
        .iter()
        .enumerate()
        .map(|(index, def)| {
            let level = Level::build(def, derive_attempt_seed(seed, index, 0), config);
            let grid = level.grid();
            MissionSummary {
                index,
                id: def.id.clone(),
                width: grid.width,
                height: grid.height,
                goal: (level.goal().x, level.goal().y),
                obstacles: level.obstacles().count(),
                pickups: level.pickups().count(),
                enemies: level.enemies().count(),
                command_cap: def.limits().command_cap,
                life: level.life(),
                problem: def.validate().err().map(|err| err.to_string()),
            }
        })
        .collect()
}
