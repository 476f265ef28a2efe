//! Round clock — the tick counter and phase state machine.
//!
//! One `step()` per timer firing. The schedule is fixed: the window opens
//! at tick 0, locks and resolves at tick 20, re-announces at tick 21, cools
//! down through tick 23, then the counter wraps and the cycle repeats. The
//! clock itself is pure; the engine performs the I/O each step calls for.

use crate::types::RoundPhase;

/// Tick at which intake closes and the outcome is drawn.
pub const LOCK_TICK: u32 = 20;
/// Tick at which the outcome is re-announced.
pub const ANNOUNCE_TICK: u32 = 21;
/// Last tick of the cooldown; the counter wraps past it.
pub const LAST_TICK: u32 = 23;

/// What the engine must do for the step just taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickEvent {
    /// The betting window just opened — announce it.
    OpenBetting,
    /// Intake is closed — draw the outcome and settle the pool.
    Resolve,
    /// Re-announce the drawn outcome.
    Announce,
    /// Nothing externally visible.
    Hold,
}

#[derive(Debug)]
pub struct RoundClock {
    tick: u32,
    phase: RoundPhase,
}

impl Default for RoundClock {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundClock {
    pub fn new() -> Self {
        Self {
            tick: 0,
            phase: RoundPhase::Idle,
        }
    }

    /// Current tick counter. Safe to call from any phase; no side effects.
    pub fn current_tick(&self) -> u32 {
        self.tick
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Mark the resolution in progress. Called by the engine between the
    /// `Resolve` event and the completion of settlement.
    pub fn begin_resolving(&mut self) {
        self.phase = RoundPhase::Resolving;
    }

    /// Process the current tick, advance the counter, and report what the
    /// engine must do. The counter wraps after tick 23, so a full cycle is
    /// exactly 24 steps.
    pub fn step(&mut self) -> TickEvent {
        let event = match self.tick {
            0 => {
                self.phase = RoundPhase::Open;
                TickEvent::OpenBetting
            }
            LOCK_TICK => {
                self.phase = RoundPhase::Locked;
                TickEvent::Resolve
            }
            ANNOUNCE_TICK => {
                self.phase = RoundPhase::Resolved;
                TickEvent::Announce
            }
            t if t > ANNOUNCE_TICK => {
                self.phase = RoundPhase::Cooldown;
                TickEvent::Hold
            }
            _ => TickEvent::Hold,
        };

        self.tick += 1;
        if self.tick > LAST_TICK {
            self.phase = RoundPhase::Idle;
            self.tick = 0;
        }

        event
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_clock_is_idle_at_zero() {
        let clock = RoundClock::new();
        assert_eq!(clock.current_tick(), 0);
        assert_eq!(clock.phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_full_cycle_phase_sequence() {
        let mut clock = RoundClock::new();

        // Step 1 processes tick 0: window opens.
        assert_eq!(clock.step(), TickEvent::OpenBetting);
        assert_eq!(clock.phase(), RoundPhase::Open);
        assert_eq!(clock.current_tick(), 1);

        // Steps 2..20 hold the window open.
        for _ in 1..LOCK_TICK {
            assert_eq!(clock.step(), TickEvent::Hold);
            assert_eq!(clock.phase(), RoundPhase::Open);
        }
        assert_eq!(clock.current_tick(), LOCK_TICK);

        // Step 21 processes tick 20: lock and resolve.
        assert_eq!(clock.step(), TickEvent::Resolve);
        assert_eq!(clock.phase(), RoundPhase::Locked);

        // Step 22 processes tick 21: announce.
        assert_eq!(clock.step(), TickEvent::Announce);
        assert_eq!(clock.phase(), RoundPhase::Resolved);

        // Steps 23 and 24 are cooldown; the second wraps the counter.
        assert_eq!(clock.step(), TickEvent::Hold);
        assert_eq!(clock.phase(), RoundPhase::Cooldown);
        assert_eq!(clock.step(), TickEvent::Hold);

        // After 24 steps the cycle is complete.
        assert_eq!(clock.phase(), RoundPhase::Idle);
        assert_eq!(clock.current_tick(), 0);
    }

    #[test]
    fn test_exactly_one_resolution_per_cycle() {
        let mut clock = RoundClock::new();
        let mut resolutions = 0;
        for _ in 0..72 {
            if clock.step() == TickEvent::Resolve {
                resolutions += 1;
            }
        }
        // Three full 24-step cycles → three resolutions.
        assert_eq!(resolutions, 3);
        assert_eq!(clock.current_tick(), 0);
    }

    #[test]
    fn test_begin_resolving_transitions_phase() {
        let mut clock = RoundClock::new();
        for _ in 0..=LOCK_TICK {
            clock.step();
        }
        assert_eq!(clock.phase(), RoundPhase::Locked);
        clock.begin_resolving();
        assert_eq!(clock.phase(), RoundPhase::Resolving);
    }

    #[test]
    fn test_current_tick_is_passive() {
        let mut clock = RoundClock::new();
        clock.step();
        let before = clock.current_tick();
        for _ in 0..5 {
            assert_eq!(clock.current_tick(), before);
        }
    }
}
