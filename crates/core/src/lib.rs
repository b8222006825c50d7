//! Grid command-program puzzle engine: a learner assembles movement commands and bounded
//! repeat groups, then watches them play out one token per tick on a mission level.

pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod interpreter;
pub mod level;
pub mod mission;
pub mod program;
pub mod replay;
pub mod script;
pub mod session;
pub mod types;

pub use config::EngineConfig;
pub use content::{LevelDef, LevelPack};
pub use context::EngineContext;
pub use error::{LevelError, ReplayError, ScriptError, TickError};
pub use interpreter::{Interpreter, PlaybackState, TickControl, TickSink};
pub use level::{Level, LevelSnapshot, TickReport};
pub use mission::{ClearLogic, Condition, ConditionKind, Mission, MissionProgress};
pub use program::{NodeRef, Program, ProgramLimits, ProgramNode, RepeatGroup};
pub use replay::{ReplayResult, apply_input, replay_script};
pub use script::{ScriptInput, SessionScript};
pub use session::Session;
pub use types::*;
