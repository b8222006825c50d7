//! Replays a [`SessionScript`] against a level pack and reports the final state.

use std::time::Duration;

use tracing::debug;

use crate::config::EngineConfig;
use crate::content::LevelPack;
use crate::error::{LevelError, ReplayError};
use crate::script::{ScriptInput, SessionScript};
use crate::session::Session;
use crate::types::EngineEvent;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayResult {
    pub final_snapshot_hash: u64,
    pub mission_index: usize,
    pub attempt: u64,
    /// Tokens applied to the level on screen at the end of the script.
    pub level_ticks: u64,
    pub missions_cleared: u32,
    pub missions_failed: u32,
}

/// Feeds one recorded input into a live session.
pub fn apply_input(session: &mut Session, input: &ScriptInput) -> Result<(), LevelError> {
    match input {
        ScriptInput::Press { token } => {
            session.program_mut().press(token);
        }
        ScriptInput::BeginRepeat { count } => {
            session.program_mut().begin_repeat(*count);
        }
        ScriptInput::EndRepeat => {
            session.program_mut().end_repeat();
        }
        ScriptInput::SetRepeatCount { group, count } => {
            session.program_mut().set_repeat_count(*group, *count);
        }
        ScriptInput::Remove { node } => {
            session.program_mut().remove_node(*node);
        }
        ScriptInput::ClearProgram => {
            session.program_mut().clear();
        }
        ScriptInput::Run => {
            session.run();
        }
        ScriptInput::Step => {
            session.step();
        }
        ScriptInput::Stop => session.stop(),
        ScriptInput::ResetLevel => session.reset_level(),
        ScriptInput::GotoMission { index } => session.goto_mission(*index)?,
        ScriptInput::Advance { ms } => {
            session.advance_time(Duration::from_millis(*ms));
        }
        ScriptInput::FinishCutscene => {
            session.finish_cutscene();
        }
        ScriptInput::LockInput => session.lock_input(),
        ScriptInput::UnlockInput => session.unlock_input(),
    }
    Ok(())
}

pub fn replay_script(
    pack: &LevelPack,
    config: &EngineConfig,
    script: &SessionScript,
) -> Result<ReplayResult, ReplayError> {
    if !script.content_sha256.is_empty() {
        let actual = pack.content_hash()?;
        if actual != script.content_sha256 {
            return Err(ReplayError::ContentMismatch {
                expected: script.content_sha256.clone(),
                actual,
            });
        }
    }
    if script.start_mission >= pack.len() {
        return Err(ReplayError::StartOutOfRange { index: script.start_mission, len: pack.len() });
    }

    let mut session =
        Session::starting_at(pack.clone(), config.clone(), script.seed, script.start_mission)?;
    let mut missions_cleared = 0;
    let mut missions_failed = 0;

    for (seq, input) in script.inputs.iter().enumerate() {
        apply_input(&mut session, input)?;
        for event in session.drain_events() {
            match event {
                EngineEvent::MissionCleared { .. } => missions_cleared += 1,
                EngineEvent::MissionFailed { .. } => missions_failed += 1,
                _ => {}
            }
        }
        debug!(seq, ?input, "script input applied");
    }

    Ok(ReplayResult {
        final_snapshot_hash: session.snapshot_hash(),
        mission_index: session.mission_index(),
        attempt: session.attempt(),
        level_ticks: session.level().map_or(0, |level| level.ticks()),
        missions_cleared,
        missions_failed,
    })
}
