use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level pack {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid level pack JSON")]
    Json(#[from] serde_json::Error),
    #[error("level pack has no missions")]
    EmptyPack,
    #[error("mission {index} is out of range (pack has {len})")]
    MissionOutOfRange { index: usize, len: usize },
    #[error("level {id:?} is not playable: {reason}")]
    Unplayable { id: String, reason: &'static str },
}

/// Failure reported by a tick handler. Playback logs it and keeps going.
#[derive(Debug, Error)]
#[error("tick handler failed: {message}")]
pub struct TickError {
    message: String,
}

impl TickError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("script was recorded against level pack {expected}, got {actual}")]
    ContentMismatch { expected: String, actual: String },
    #[error("script starts at mission {index} but the pack has {len}")]
    StartOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Level(#[from] LevelError),
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to access session script {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid session script JSON")]
    Json(#[from] serde_json::Error),
}
