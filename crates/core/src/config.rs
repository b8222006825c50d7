//! Engine tunables. Hosts usually deserialize this from a config file; every field has a default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_TICK_DELAY_MS: u64 = 300;
pub const DEFAULT_WARP_COOLDOWN_MS: u64 = 180;
pub const DEFAULT_LIFE: u32 = 3;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delay between two delivered tokens during `run`.
    pub tick_delay_ms: u64,
    /// Minimum virtual time between two warps.
    pub warp_cooldown_ms: u64,
    /// Life per attempt when the mission does not declare one.
    pub default_life: u32,
    /// Empty the program whenever the level is rebuilt.
    pub clear_program_on_rebuild: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_delay_ms: DEFAULT_TICK_DELAY_MS,
            warp_cooldown_ms: DEFAULT_WARP_COOLDOWN_MS,
            default_life: DEFAULT_LIFE,
            clear_program_on_rebuild: true,
        }
    }
}

impl EngineConfig {
    pub fn tick_delay(&self) -> Duration {
        Duration::from_millis(self.tick_delay_ms)
    }

    pub fn warp_cooldown(&self) -> Duration {
        Duration::from_millis(self.warp_cooldown_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"tick_delay_ms": 50}"#).unwrap();
        assert_eq!(config.tick_delay(), Duration::from_millis(50));
        assert_eq!(config.warp_cooldown_ms, DEFAULT_WARP_COOLDOWN_MS);
        assert_eq!(config.default_life, DEFAULT_LIFE);
        assert!(config.clear_program_on_rebuild);
    }
}
