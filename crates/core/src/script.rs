//! Recorded host inputs for one session, replayable against the same level pack.
//!
//! A script is a JSON document: a header (`format_version`, `content_sha256`, `seed`,
//! `start_mission`) followed by the ordered `inputs`. Time only moves through explicit
//! `advance` inputs, so a script fully determines the session it drives.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::content::LevelPack;
use crate::error::{LevelError, ScriptError};
use crate::program::NodeRef;

pub const SCRIPT_FORMAT_VERSION: u16 = 1;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionScript {
    pub format_version: u16,
    /// Level pack hash the script was recorded against. Empty skips the check.
    #[serde(default)]
    pub content_sha256: String,
    pub seed: u64,
    #[serde(default)]
    pub start_mission: usize,
    #[serde(default)]
    pub inputs: Vec<ScriptInput>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptInput {
    /// Palette press: a command spelling, a repeat marker or an end marker.
    Press { token: String },
    BeginRepeat { count: u8 },
    EndRepeat,
    SetRepeatCount { group: usize, count: u8 },
    Remove { node: NodeRef },
    ClearProgram,
    Run,
    Step,
    Stop,
    ResetLevel,
    GotoMission { index: usize },
    Advance { ms: u64 },
    FinishCutscene,
    LockInput,
    UnlockInput,
}

impl SessionScript {
    pub fn new(seed: u64) -> Self {
        Self {
            format_version: SCRIPT_FORMAT_VERSION,
            content_sha256: String::new(),
            seed,
            start_mission: 0,
            inputs: Vec::new(),
        }
    }

    /// A script pinned to `pack`'s content hash.
    pub fn for_pack(pack: &LevelPack, seed: u64) -> Result<Self, LevelError> {
        Ok(Self { content_sha256: pack.content_hash()?, ..Self::new(seed) })
    }

    pub fn append(&mut self, input: ScriptInput) {
        self.inputs.push(input);
    }

    pub fn load(path: &Path) -> Result<Self, ScriptError> {
        let json = fs::read_to_string(path)
            .map_err(|source| ScriptError::Io { path: path.to_path_buf(), source })?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScriptError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ScriptError::Io { path: path.to_path_buf(), source })
    }
}
