//! Tick sink that feeds delivered tokens to the level and translates what happened.
//! It mutates only the level and the event queue; mission flow runs after playback returns.

use super::*;
use crate::interpreter::TickSink;

/// Something the session must act on once the interpreter hands control back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Signal {
    Reset,
    Cutscene { path: String, purpose: CutscenePurpose },
    Cleared,
    Failed(FailCause),
}

pub(super) struct TickDriver<'a> {
    level: &'a mut Level,
    mission: &'a Mission,
    def: &'a LevelDef,
    events: &'a mut Vec<EngineEvent>,
    signal: Option<Signal>,
}

impl<'a> TickDriver<'a> {
    pub(super) fn new(
        level: &'a mut Level,
        mission: &'a Mission,
        def: &'a LevelDef,
        events: &'a mut Vec<EngineEvent>,
    ) -> Self {
        Self { level, mission, def, events, signal: None }
    }

    pub(super) fn into_signal(self) -> Option<Signal> {
        self.signal
    }

    fn mid_mission_cutscene(&self, outcome: TickOutcome, blueprints_done: bool) -> Option<Signal> {
        let (path, purpose) = match outcome {
            TickOutcome::CombatWon { .. } => {
                (self.def.battle_cutscene(true)?, CutscenePurpose::BattleWon)
            }
            _ if blueprints_done => {
                (self.def.blueprints_cutscene()?, CutscenePurpose::BlueprintsComplete)
            }
            _ => return None,
        };
        Some(Signal::Cutscene { path: path.to_string(), purpose })
    }
}

impl TickSink for TickDriver<'_> {
    fn on_tick(&mut self, command: Command, control: &mut TickControl) -> Result<(), TickError> {
        if self.signal.is_some() {
            control.request_stop();
            return Err(TickError::new("token arrived after a terminal outcome"));
        }

        let cell = self.level.actor();
        self.events.push(EngineEvent::ShowDirection { command, cell });

        let report = self.level.apply(command, self.mission, control.now());
        if matches!(
            report.outcome,
            TickOutcome::Moved { .. }
                | TickOutcome::PickedUp { .. }
                | TickOutcome::CombatWon { .. }
                | TickOutcome::Warped { .. }
                | TickOutcome::GoalReached
        ) {
            self.events.push(EngineEvent::PlayAnimation(Animation::Walk));
        }
        let blueprints_done = report.events.contains(&LevelEvent::BlueprintsComplete);
        self.events.extend(report.events.into_iter().map(EngineEvent::from));

        match report.outcome {
            TickOutcome::Ignored => control.request_stop(),
            TickOutcome::Blocked { .. } => {}
            TickOutcome::GoalReached => {
                control.request_stop();
                self.signal = Some(Signal::Cleared);
            }
            TickOutcome::Fatal(cause) => {
                control.request_stop();
                self.signal = Some(Signal::Failed(cause));
            }
            outcome => {
                self.events.push(EngineEvent::PlayAnimation(Animation::Idle));
                if let Some(cutscene) = self.mid_mission_cutscene(outcome, blueprints_done) {
                    control.request_lock();
                    self.signal = Some(cutscene);
                }
            }
        }
        Ok(())
    }

    /// The queue was cleared on request; the attempt must be rebuilt.
    fn on_reset(&mut self) {
        self.signal = Some(Signal::Reset);
    }
}
