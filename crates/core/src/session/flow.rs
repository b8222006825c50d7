//! Mission flow: success and fail paths, cutscene holds, and level rebuilds.
//! This module exists to keep every transition between attempts in one place.
//! It does not deliver tokens; see `driver` for that.

use tracing::{error, info};

use super::driver::Signal;
use super::*;
use crate::level::derive_attempt_seed;

impl Session {
    pub(super) fn settle(&mut self, signal: Option<Signal>) {
        match signal {
            None => {}
            Some(Signal::Reset) => self.retry(),
            Some(Signal::Cutscene { path, purpose }) => {
                // The interpreter already took the hold when the tick asked for it.
                if self.ctx.lock_depth() == 1 {
                    self.events.push(EngineEvent::InputLocked);
                }
                self.events.push(EngineEvent::PlayCutscene { path, purpose });
                self.cutscene = Some(AfterCutscene::Resume);
            }
            Some(Signal::Cleared) => self.on_cleared(),
            Some(Signal::Failed(cause)) => self.on_failed(cause),
        }
    }

    fn on_cleared(&mut self) {
        self.stop_playback();
        let index = self.mission_index;
        info!(mission = index, attempt = self.attempt, "mission cleared");
        self.events.push(EngineEvent::PlayAnimation(Animation::Cheer));
        if self.mission.fire_cleared() {
            self.events.push(EngineEvent::MissionCleared { index });
        }

        let cutscene =
            self.current_def().and_then(|def| def.goal_cutscene(true)).map(str::to_string);
        match cutscene {
            Some(path) => {
                self.play_cutscene(path, CutscenePurpose::MissionSuccess, AfterCutscene::Advance);
            }
            None => self.advance_mission(),
        }
    }

    fn on_failed(&mut self, cause: FailCause) {
        self.stop_playback();
        info!(mission = self.mission_index, attempt = self.attempt, ?cause, "mission failed");
        self.events.push(EngineEvent::MissionFailed { cause });
        self.events.push(EngineEvent::PlayAnimation(Animation::Sad));

        let (cutscene, purpose) = match cause {
            FailCause::CombatLost => (
                self.current_def().and_then(|def| def.battle_cutscene(false)),
                CutscenePurpose::BattleLost,
            ),
            _ => (
                self.current_def().and_then(|def| def.goal_cutscene(false)),
                CutscenePurpose::MissionFailed,
            ),
        };
        match cutscene.map(str::to_string) {
            Some(path) => self.play_cutscene(path, purpose, AfterCutscene::Retry),
            None => self.retry(),
        }
    }

    fn play_cutscene(&mut self, path: String, purpose: CutscenePurpose, after: AfterCutscene) {
        self.hold_input();
        self.events.push(EngineEvent::PlayCutscene { path, purpose });
        self.cutscene = Some(after);
    }

    pub(super) fn advance_mission(&mut self) {
        let mut next = self.mission_index + 1;
        if next >= self.pack.len() {
            info!(missions = self.pack.len(), "campaign complete");
            self.events.push(EngineEvent::CampaignComplete);
            next = 0;
        }
        self.mission_index = next;
        self.attempt = 0;
        self.rebuild(true);
    }

    pub(super) fn retry(&mut self) {
        self.attempt += 1;
        self.rebuild(false);
    }

    pub(super) fn drop_cutscene(&mut self) {
        if self.cutscene.take().is_some() {
            self.release_input();
        }
    }

    pub(super) fn hold_input(&mut self) {
        self.interpreter.lock(&mut self.ctx);
        if self.ctx.lock_depth() == 1 {
            self.events.push(EngineEvent::InputLocked);
        }
    }

    pub(super) fn release_input(&mut self) {
        if !self.ctx.is_locked() {
            return;
        }
        self.interpreter.unlock(&mut self.ctx);
        if !self.ctx.is_locked() {
            self.events.push(EngineEvent::InputUnlocked);
        }
    }

    /// Cancels playback and retires the interpreter so no queued firing can land later.
    fn stop_playback(&mut self) {
        self.interpreter.clear();
        self.interpreter = self.interpreter.replace(&mut self.ctx);
    }

    pub(super) fn rebuild(&mut self, announce: bool) {
        self.stop_playback();
        let index = self.mission_index;

        let def = self.pack.get(index).ok_or(LevelError::MissionOutOfRange {
            index,
            len: self.pack.len(),
        });
        let def = match def.and_then(|def| def.validate().map(|()| def)) {
            Ok(def) => def,
            Err(err) => {
                error!(mission = index, error = %err, "no level data for mission");
                self.level = None;
                self.mission = Mission::default();
                self.events.push(EngineEvent::NoLevelData { index });
                return;
            }
        };

        let seed = derive_attempt_seed(self.seed, index, self.attempt);
        let level = Level::build(def, seed, &self.config);
        let limits = def.limits();
        self.mission = Mission::from_level(def);

        if self.config.clear_program_on_rebuild {
            self.program.clear();
        }
        self.program.set_limits(limits);

        info!(
            mission = index,
            level = %level.id(),
            attempt = self.attempt,
            announce,
            "mission start"
        );
        self.events.push(EngineEvent::MissionStart {
            index,
            level_id: level.id().to_string(),
            announce,
        });
        self.events.push(EngineEvent::Limits {
            command_cap: limits.command_cap,
            repeat_inner_cap: limits.repeat_inner_cap,
        });
        self.events.push(EngineEvent::LifeChanged { life: level.life() });
        self.level = Some(level);
    }
}
