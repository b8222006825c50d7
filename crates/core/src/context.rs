//! Shared single-threaded engine state: interpreter generations and the input lock.
//! This module exists so that no playback bookkeeping lives in globals.
//! It does not own timers or level data.

#[derive(Debug, Default)]
pub struct EngineContext {
    generation: u64,
    lock_depth: u32,
}

impl EngineContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims a fresh generation. Interpreters holding any older one stop firing.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn current_generation(&self) -> u64 {
        self.generation
    }

    pub fn is_locked(&self) -> bool {
        self.lock_depth > 0
    }

    pub fn lock_depth(&self) -> u32 {
        self.lock_depth
    }

    pub fn acquire_lock(&mut self) -> u32 {
        self.lock_depth += 1;
        self.lock_depth
    }

    /// Returns `true` only when this call released the last outstanding hold.
    pub fn release_lock(&mut self) -> bool {
        if self.lock_depth == 0 {
            return false;
        }
        self.lock_depth -= 1;
        self.lock_depth == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_strictly_increase() {
        let mut ctx = EngineContext::new();
        let first = ctx.next_generation();
        let second = ctx.next_generation();
        assert!(second > first);
        assert_eq!(ctx.current_generation(), second);
    }

    #[test]
    fn lock_is_reference_counted() {
        let mut ctx = EngineContext::new();
        ctx.acquire_lock();
        ctx.acquire_lock();
        assert!(!ctx.release_lock());
        assert!(ctx.is_locked());
        assert!(ctx.release_lock());
        assert!(!ctx.is_locked());
        assert!(!ctx.release_lock(), "extra release is ignored");
        assert_eq!(ctx.lock_depth(), 0);
    }
}
