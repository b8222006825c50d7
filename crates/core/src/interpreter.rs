//! Cooperative playback of a flattened program, one token per tick.
//!
//! Time is virtual: the host reports elapsed time through [`Interpreter::advance`] and every
//! firing that falls due inside that window is delivered in order, each one tick delay after
//! the previous. Nothing here sleeps or spawns.

use std::time::Duration;

use tracing::{debug, trace, warn};

use crate::context::EngineContext;
use crate::error::TickError;
use crate::program::Program;
use crate::types::{Command, PlaybackReport, PlaybackStop};

/// Receives tokens from the interpreter.
pub trait TickSink {
    fn on_tick(&mut self, command: Command, control: &mut TickControl) -> Result<(), TickError>;

    /// Called after `Interpreter::reset` has cleared its queue.
    fn on_reset(&mut self) {}
}

impl<F> TickSink for F
where
    F: FnMut(Command, &mut TickControl) -> Result<(), TickError>,
{
    fn on_tick(&mut self, command: Command, control: &mut TickControl) -> Result<(), TickError> {
        self(command, control)
    }
}

/// Requests a tick handler can make about playback. Applied after the handler returns.
#[derive(Debug, Default)]
pub struct TickControl {
    now: Duration,
    stop: bool,
    reset: bool,
    lock: bool,
}

impl TickControl {
    /// Virtual time at which this token fired.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn request_stop(&mut self) {
        self.stop = true;
    }

    pub fn request_reset(&mut self) {
        self.reset = true;
    }

    /// Takes one hold on the input lock; release it with `Interpreter::unlock`.
    pub fn request_lock(&mut self) {
        self.lock = true;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Paused,
}

struct Delivery {
    halted: bool,
}

#[derive(Debug)]
pub struct Interpreter {
    generation: u64,
    tick_delay: Duration,
    sequence: Vec<Command>,
    pointer: usize,
    state: PlaybackState,
    now: Duration,
    due: Option<Duration>,
}

impl Interpreter {
    pub fn new(ctx: &mut EngineContext, tick_delay: Duration) -> Self {
        Self {
            generation: ctx.next_generation(),
            tick_delay,
            sequence: Vec::new(),
            pointer: 0,
            state: PlaybackState::Idle,
            now: Duration::ZERO,
            due: None,
        }
    }

    /// A replacement carries the virtual clock forward so time never runs backwards.
    pub fn replace(&self, ctx: &mut EngineContext) -> Self {
        let mut next = Self::new(ctx, self.tick_delay);
        next.now = self.now;
        next
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self, ctx: &EngineContext) -> bool {
        self.generation == ctx.current_generation()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn sequence(&self) -> &[Command] {
        &self.sequence
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.due
    }

    pub fn tick_delay(&self) -> Duration {
        self.tick_delay
    }

    pub fn run(&mut self, ctx: &EngineContext, program: &Program) {
        if !self.is_current(ctx) {
            debug!(generation = self.generation, "run ignored on stale interpreter");
            return;
        }

        self.stop();
        self.sequence = program.flatten();
        self.pointer = 0;
        debug!(generation = self.generation, tokens = self.sequence.len(), "playback started");

        if ctx.is_locked() {
            self.state = PlaybackState::Paused;
        } else {
            self.schedule();
        }
    }

    /// Delivers exactly one token synchronously and cancels any pending firing.
    pub fn step(
        &mut self,
        ctx: &mut EngineContext,
        program: &Program,
        sink: &mut impl TickSink,
    ) -> Option<Command> {
        if !self.is_current(ctx) || self.state == PlaybackState::Paused || ctx.is_locked() {
            return None;
        }

        if self.sequence.is_empty() || self.pointer >= self.sequence.len() {
            self.sequence = program.flatten();
            self.pointer = 0;
        }

        self.stop();
        let command = self.sequence.get(self.pointer).copied()?;
        self.deliver(ctx, sink);
        Some(command)
    }

    /// Cancels the pending firing. The pointer and sequence are kept.
    pub fn stop(&mut self) {
        self.due = None;
        self.state = PlaybackState::Idle;
    }

    pub fn reset(&mut self, sink: &mut impl TickSink) {
        self.clear();
        sink.on_reset();
    }

    pub fn clear(&mut self) {
        self.stop();
        self.pointer = 0;
        self.sequence.clear();
    }

    pub fn lock(&mut self, ctx: &mut EngineContext) {
        let depth = ctx.acquire_lock();
        trace!(depth, "input lock acquired");
        if self.state == PlaybackState::Running {
            self.due = None;
            self.state = PlaybackState::Paused;
        }
    }

    pub fn unlock(&mut self, ctx: &mut EngineContext) {
        if !ctx.release_lock() {
            return;
        }
        trace!("input lock released");
        if self.state != PlaybackState::Paused || !self.is_current(ctx) {
            return;
        }
        if self.pointer < self.sequence.len() {
            self.schedule();
        } else {
            self.state = PlaybackState::Idle;
        }
    }

    pub fn advance(
        &mut self,
        ctx: &mut EngineContext,
        elapsed: Duration,
        sink: &mut impl TickSink,
    ) -> PlaybackReport {
        let target = self.now + elapsed;

        if !self.is_current(ctx) {
            if self.due.take().is_some() {
                debug!(generation = self.generation, "stale firing dropped");
            }
            self.state = PlaybackState::Idle;
            self.now = target;
            return PlaybackReport { delivered: 0, stop_reason: PlaybackStop::Stale };
        }

        let mut delivered = 0;
        let mut stop_reason = None;

        while let Some(due) = self.due
            && due <= target
        {
            self.now = due;
            self.due = None;

            if ctx.is_locked() {
                self.state = PlaybackState::Paused;
                break;
            }

            if self.pointer >= self.sequence.len() {
                self.state = PlaybackState::Idle;
                stop_reason = Some(PlaybackStop::Finished);
                break;
            }

            let delivery = self.deliver(ctx, sink);
            delivered += 1;
            if delivery.halted {
                stop_reason = Some(PlaybackStop::Stopped);
                break;
            }
            if self.state == PlaybackState::Running {
                self.due = Some(self.now + self.tick_delay);
            }
        }

        self.now = self.now.max(target);

        let stop_reason = stop_reason.unwrap_or(match (self.state, self.due) {
            (PlaybackState::Running, Some(next_due)) => PlaybackStop::Waiting { next_due },
            (PlaybackState::Paused, _) => PlaybackStop::Paused,
            _ => PlaybackStop::Idle,
        });
        PlaybackReport { delivered, stop_reason }
    }

    fn schedule(&mut self) {
        self.state = PlaybackState::Running;
        self.due = Some(self.now + self.tick_delay);
    }

    fn deliver(&mut self, ctx: &mut EngineContext, sink: &mut impl TickSink) -> Delivery {
        let Some(command) = self.sequence.get(self.pointer).copied() else {
            return Delivery { halted: false };
        };
        self.pointer += 1;
        trace!(pointer = self.pointer, command = command.code(), "tick");

        let mut control = TickControl { now: self.now, ..TickControl::default() };
        if let Err(err) = sink.on_tick(command, &mut control) {
            warn!(error = %err, command = command.code(), "tick handler failed; continuing");
        }

        let halted = control.stop || control.reset;
        if control.reset {
            self.reset(sink);
        } else if control.stop {
            self.stop();
        }
        if control.lock {
            self.lock(ctx);
        }
        Delivery { halted }
    }
}
