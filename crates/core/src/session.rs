//! Host-facing orchestration of one campaign: program editing, playback, mission flow.
//!
//! A `Session` owns the engine context, the level pack, the current attempt's `Level` and
//! `Mission`, the learner's `Program` and the `Interpreter`. Hosts call the input methods,
//! report elapsed time with [`Session::advance_time`], and drain [`EngineEvent`]s to render.
//! Cutscenes hold the input lock until the host calls [`Session::finish_cutscene`].

use std::hash::Hasher;
use std::mem;
use std::time::Duration;

use tracing::{debug, info};
use xxhash_rust::xxh3::Xxh3;

use crate::config::EngineConfig;
use crate::content::{LevelDef, LevelPack};
use crate::context::EngineContext;
use crate::error::{LevelError, TickError};
use crate::interpreter::{Interpreter, PlaybackState, TickControl};
use crate::level::{Level, LevelSnapshot};
use crate::mission::{Evaluation, Mission, MissionProgress};
use crate::program::{Program, ProgramLimits};
use crate::types::*;

mod driver;
mod flow;


use driver::{Signal, TickDriver};

/// What happens once the cutscene on screen is dismissed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AfterCutscene {
    Resume,
    Advance,
    Retry,
}

pub struct Session {
    ctx: EngineContext,
    config: EngineConfig,
    pack: LevelPack,
    seed: u64,
    mission_index: usize,
    attempt: u64,
    level: Option<Level>,
    mission: Mission,
    program: Program,
    interpreter: Interpreter,
    cutscene: Option<AfterCutscene>,
    host_holds: u32,
    events: Vec<EngineEvent>,
}

impl Session {
    pub fn new(pack: LevelPack, config: EngineConfig, seed: u64) -> Result<Self, LevelError> {
        Self::starting_at(pack, config, seed, 0)
    }

    pub fn starting_at(
        pack: LevelPack,
        config: EngineConfig,
        seed: u64,
        mission_index: usize,
    ) -> Result<Self, LevelError> {
        if pack.is_empty() {
            return Err(LevelError::EmptyPack);
        }
        if mission_index >= pack.len() {
            return Err(LevelError::MissionOutOfRange { index: mission_index, len: pack.len() });
        }

        let mut ctx = EngineContext::new();
        let interpreter = Interpreter::new(&mut ctx, config.tick_delay());
        let mut session = Self {
            ctx,
            config,
            pack,
            seed,
            mission_index,
            attempt: 0,
            level: None,
            mission: Mission::default(),
            program: Program::new(ProgramLimits::default()),
            interpreter,
            cutscene: None,
            host_holds: 0,
            events: Vec::new(),
        };
        session.rebuild(true);
        Ok(session)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pack(&self) -> &LevelPack {
        &self.pack
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn mission_index(&self) -> usize {
        self.mission_index
    }

    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// `None` when the current mission had no usable level data.
    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    pub fn snapshot(&self) -> Option<LevelSnapshot> {
        self.level.as_ref().map(Level::snapshot)
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    /// Current per-condition status. The goal counts as reached once the attempt is cleared.
    pub fn evaluate_mission(&self) -> Option<Evaluation> {
        let level = self.level.as_ref()?;
        let progress = MissionProgress {
            inventory: level.inventory(),
            reached_goal: level.is_cleared(),
            life: level.life(),
        };
        Some(self.mission.evaluate(&progress))
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Edits never affect a sequence that is already playing.
    pub fn program_mut(&mut self) -> &mut Program {
        &mut self.program
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.interpreter.state()
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub fn is_input_locked(&self) -> bool {
        self.ctx.is_locked()
    }

    pub fn is_cutscene_playing(&self) -> bool {
        self.cutscene.is_some()
    }

    /// Starts playback from the first token. Each accepted run costs one life; the run that
    /// spends the last one still starts and fails on its first token.
    pub fn run(&mut self) -> bool {
        if self.cutscene.is_some() {
            debug!("run ignored while a cutscene is playing");
            return false;
        }
        let Some(level) = self.level.as_mut() else {
            return false;
        };
        if level.is_cleared() || level.halted().is_some() {
            return false;
        }

        let life = level.spend_life();
        self.events.push(EngineEvent::LifeChanged { life });
        if life == 0 {
            self.events.push(EngineEvent::LifeZero);
        }
        info!(mission = self.mission_index, life, tokens = self.program.used(), "run");
        self.interpreter.run(&self.ctx, &self.program);
        true
    }

    /// Delivers one token right now. Returns the token that was delivered.
    pub fn step(&mut self) -> Option<Command> {
        if self.cutscene.is_some() {
            return None;
        }
        let level = self.level.as_mut()?;
        let def = self.pack.get(self.mission_index)?;
        let mut driver = TickDriver::new(level, &self.mission, def, &mut self.events);
        let command = self.interpreter.step(&mut self.ctx, &self.program, &mut driver);
        let signal = driver.into_signal();
        self.settle(signal);
        command
    }

    /// Cancels the pending firing. The level keeps its current state.
    pub fn stop(&mut self) {
        self.interpreter.stop();
    }

    /// Rebuilds the current mission from scratch. A pending cutscene is dropped.
    ///
    /// Goes through `Interpreter::reset`, whose reset hook asks for the rebuild.
    pub fn reset_level(&mut self) {
        self.drop_cutscene();
        let signal = match (self.level.as_mut(), self.pack.get(self.mission_index)) {
            (Some(level), Some(def)) => {
                let mut driver = TickDriver::new(level, &self.mission, def, &mut self.events);
                self.interpreter.reset(&mut driver);
                driver.into_signal()
            }
            _ => {
                self.interpreter.clear();
                Some(Signal::Reset)
            }
        };
        self.settle(signal);
    }

    pub fn goto_mission(&mut self, index: usize) -> Result<(), LevelError> {
        if index >= self.pack.len() {
            return Err(LevelError::MissionOutOfRange { index, len: self.pack.len() });
        }
        self.drop_cutscene();
        self.mission_index = index;
        self.attempt = 0;
        self.rebuild(true);
        Ok(())
    }

    /// Moves the virtual clock forward and delivers every token that fell due.
    pub fn advance_time(&mut self, elapsed: Duration) -> PlaybackReport {
        let (Some(level), Some(def)) = (self.level.as_mut(), self.pack.get(self.mission_index))
        else {
            let mut idle = |_: Command, _: &mut TickControl| Ok::<(), TickError>(());
            return self.interpreter.advance(&mut self.ctx, elapsed, &mut idle);
        };
        let mut driver = TickDriver::new(level, &self.mission, def, &mut self.events);
        let report = self.interpreter.advance(&mut self.ctx, elapsed, &mut driver);
        let signal = driver.into_signal();
        self.settle(signal);
        report
    }

    /// Dismisses the cutscene on screen. Returns `false` when none was playing.
    pub fn finish_cutscene(&mut self) -> bool {
        let Some(after) = self.cutscene.take() else {
            return false;
        };
        self.release_input();
        match after {
            AfterCutscene::Resume => {}
            AfterCutscene::Advance => self.advance_mission(),
            AfterCutscene::Retry => self.retry(),
        }
        true
    }

    /// Host-side hold on input, e.g. while a dialog is open. Nests with cutscene holds.
    pub fn lock_input(&mut self) {
        self.host_holds += 1;
        self.hold_input();
    }

    /// Releases one host hold. Cutscene holds are only released by the cutscene itself.
    pub fn unlock_input(&mut self) {
        if self.host_holds == 0 {
            debug!("unlock ignored; no host hold outstanding");
            return;
        }
        self.host_holds -= 1;
        self.release_input();
    }

    pub fn drain_events(&mut self) -> Vec<EngineEvent> {
        mem::take(&mut self.events)
    }

    pub fn log(&self) -> &[EngineEvent] {
        &self.events
    }

    /// Hash over the mission position and the current level state.
    pub fn snapshot_hash(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.mission_index as u64);
        hasher.write_u64(self.attempt);
        hasher.write_u64(self.interpreter.pointer() as u64);
        match &self.level {
            Some(level) => hasher.write_u64(level.snapshot_hash()),
            None => hasher.write_u8(0),
        }
        hasher.finish()
    }

    fn current_def(&self) -> Option<&LevelDef> {
        self.pack.get(self.mission_index)
    }
}
