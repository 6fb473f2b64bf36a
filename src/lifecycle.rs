// Controller lifecycle: an explicit state machine plus the process-wide
// "at most one active field" flag. The wasm controller drives this type;
// keeping it platform-free lets the transition rules run under host tests.

use std::sync::atomic::{AtomicBool, Ordering};

static ACTIVE: AtomicBool = AtomicBool::new(false);

/// Claim the process-wide slot. Returns `false` if another controller is
/// already initializing, running or paused; the caller must then do nothing.
pub fn try_acquire() -> bool {
    !ACTIVE.swap(true, Ordering::SeqCst)
}

/// Release the slot so a later mount can re-initialize.
pub fn release() {
    ACTIVE.store(false, Ordering::SeqCst);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initializing,
    Running,
    Paused,
    TearingDown,
    Destroyed,
}

/// Transition rules for one controller instance.
///
/// `Uninitialized -> Initializing -> Running <-> Paused -> TearingDown ->
/// Destroyed`; teardown is reachable from any live phase. Methods return
/// whether the transition (and any side effect tied to it, such as arming or
/// cancelling the frame callback) should happen, so callers never act on a
/// stale phase.
#[derive(Clone, Copy, Debug)]
pub struct Lifecycle {
    phase: Phase,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            phase: Phase::Uninitialized,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn begin_init(&mut self) -> bool {
        if self.phase != Phase::Uninitialized {
            return false;
        }
        self.phase = Phase::Initializing;
        true
    }

    /// First frame's resources are ready; the loop may start.
    pub fn mark_running(&mut self) -> bool {
        if self.phase != Phase::Initializing && self.phase != Phase::Paused {
            return false;
        }
        self.phase = Phase::Running;
        true
    }

    /// Page became hidden. Returns `true` when the scheduled frame callback
    /// must be cancelled. A suspend, not a teardown: no resources change.
    pub fn on_hidden(&mut self) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.phase = Phase::Paused;
        true
    }

    /// Page became visible again. Returns `true` when the loop must be
    /// re-armed (with a fresh delta baseline, so motion does not jump).
    pub fn on_visible(&mut self) -> bool {
        if self.phase != Phase::Paused {
            return false;
        }
        self.phase = Phase::Running;
        true
    }

    /// Unmount or failed init. Returns `false` if teardown already happened.
    pub fn begin_teardown(&mut self) -> bool {
        match self.phase {
            Phase::TearingDown | Phase::Destroyed => false,
            _ => {
                self.phase = Phase::TearingDown;
                true
            }
        }
    }

    pub fn finish_teardown(&mut self) {
        self.phase = Phase::Destroyed;
    }

    /// Gate for every asynchronous continuation: resources arriving once this
    /// is `false` must be dropped, never installed.
    pub fn is_alive(&self) -> bool {
        matches!(
            self.phase,
            Phase::Initializing | Phase::Running | Phase::Paused
        )
    }

    pub fn is_running(&self) -> bool {
        self.phase == Phase::Running
    }
}
