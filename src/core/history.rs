//! Transition history tracking.
//!
//! Records which states a machine visited, in order, so runs can be
//! inspected after the fact or exported for diagnostics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Record of one processed event.
///
/// Self-loops are recorded too: `from` and `to` are then equal.
///
/// # Example
///
/// ```rust
/// use stateline::core::TransitionRecord;
/// use chrono::Utc;
///
/// let record = TransitionRecord {
///     from: "locked".to_string(),
///     to: "unlocked".to_string(),
///     timestamp: Utc::now(),
///     step: 1,
/// };
/// assert!(!record.is_self_loop());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Name of the state the event was evaluated in
    pub from: String,
    /// Name of the state the cursor moved to
    pub to: String,
    /// When the step completed
    pub timestamp: DateTime<Utc>,
    /// 1-based ordinal of the event since the machine started
    pub step: u64,
}

impl TransitionRecord {
    /// True when no edge fired and the cursor stayed in place.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Ordered history of visited states.
///
/// # Example
///
/// ```rust
/// use stateline::core::{StateHistory, TransitionRecord};
/// use chrono::Utc;
///
/// let mut history = StateHistory::starting_at("s0");
/// history.record(TransitionRecord {
///     from: "s0".to_string(),
///     to: "s1".to_string(),
///     timestamp: Utc::now(),
///     step: 1,
/// });
///
/// assert_eq!(history.path(), vec!["s0", "s1"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateHistory {
    start: Option<String>,
    transitions: Vec<TransitionRecord>,
}

impl StateHistory {
    /// Create a new empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history whose path begins at `start`.
    pub fn starting_at(start: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            transitions: Vec::new(),
        }
    }

    /// Append a record.
    pub fn record(&mut self, transition: TransitionRecord) {
        if self.start.is_none() {
            self.start = Some(transition.from.clone());
        }
        self.transitions.push(transition);
    }

    /// Start state, if one was recorded.
    pub fn start(&self) -> Option<&str> {
        self.start.as_deref()
    }

    /// Visited state names: the start state, then the target of every step.
    pub fn path(&self) -> Vec<&str> {
        self.start
            .as_deref()
            .into_iter()
            .chain(self.transitions.iter().map(|t| t.to.as_str()))
            .collect()
    }

    /// The path joined with `", "`, handy for comparing whole traces.
    pub fn trace(&self) -> String {
        self.path().join(", ")
    }

    /// Time between the first and the last recorded step.
    pub fn duration(&self) -> Option<Duration> {
        let first = self.transitions.first()?;
        let last = self.transitions.last()?;
        last.timestamp
            .signed_duration_since(first.timestamp)
            .to_std()
            .ok()
    }

    /// All recorded steps.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// True when no step was recorded.
    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }
}
