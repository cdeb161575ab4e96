// src/exec/state.rs

use tracing::trace;

/// Lifecycle of one execution.
///
/// States only move forward; `Classified` is terminal. Waiting for exit and
/// draining overlap in time, so `Draining` covers both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExecutionState {
    Created,
    Spawned,
    Draining,
    Terminated,
    Classified,
}

/// Forward-only tracker for [`ExecutionState`].
#[derive(Debug)]
pub struct Lifecycle {
    state: ExecutionState,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            state: ExecutionState::Created,
        }
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Move to `next`. Returns `false` (and stays put) on a backward or
    /// repeated transition.
    pub fn advance(&mut self, next: ExecutionState) -> bool {
        if next <= self.state {
            return false;
        }
        trace!(from = ?self.state, to = ?next, "execution state transition");
        self.state = next;
        true
    }

    pub fn is_terminal(&self) -> bool {
        self.state == ExecutionState::Classified
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}
