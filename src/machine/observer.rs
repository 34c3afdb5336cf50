//! Trace hooks for watching a machine run.

use crate::core::{StateHistory, TransitionRecord};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Why a worker loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The event channel was cancelled
    Cancelled,
    /// The cursor reached the exit state given to `run`
    ExitReached,
    /// A step failed and the loop gave up
    Failed,
}

/// Receives notifications from a machine.
///
/// Observers are registered through the builder and are called on whatever
/// thread drives the machine: the caller for synchronous steps, the worker
/// thread during `run`. Every method has a no-op default.
pub trait Observer: Send + Sync {
    /// The cursor was placed on a start state.
    fn on_start(&self, _state: &str) {}

    /// One event was processed. Called for self-loops as well.
    fn on_transition(&self, _record: &TransitionRecord) {}

    /// The worker loop ended.
    fn on_stop(&self, _reason: StopReason) {}
}

/// Observer that keeps the full [`StateHistory`] of a machine.
///
/// Placing the cursor on a start state begins a fresh history.
///
/// # Example
///
/// ```rust
/// use stateline::{HistoryRecorder, Machine};
/// use std::sync::Arc;
///
/// let recorder = Arc::new(HistoryRecorder::new());
/// let mut machine = Machine::<&str, ()>::builder()
///     .context(Arc::new(()))
///     .observer(Arc::clone(&recorder))
///     .build()
///     .unwrap();
///
/// let idle = machine.create_state("idle").unwrap();
/// let busy = machine.create_state("busy").unwrap();
/// machine.add_rule(idle, busy, |e, _| *e == "work").unwrap();
///
/// machine.set_start_state(idle).unwrap();
/// machine.on_event("work").unwrap();
///
/// assert_eq!(recorder.trace(), "idle, busy");
/// ```
#[derive(Debug, Default)]
pub struct HistoryRecorder {
    history: Mutex<StateHistory>,
}

impl HistoryRecorder {
    /// Create a recorder with an empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the history recorded so far.
    pub fn history(&self) -> StateHistory {
        self.history.lock().clone()
    }

    /// Visited state names, start first.
    pub fn path(&self) -> Vec<String> {
        self.history
            .lock()
            .path()
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    /// Visited state names joined with `", "`.
    pub fn trace(&self) -> String {
        self.history.lock().trace()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        *self.history.lock() = StateHistory::new();
    }
}

impl Observer for HistoryRecorder {
    fn on_start(&self, state: &str) {
        *self.history.lock() = StateHistory::starting_at(state);
    }

    fn on_transition(&self, record: &TransitionRecord) {
        self.history.lock().record(record.clone());
    }
}
