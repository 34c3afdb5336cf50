//! State storage and the single-step transition logic shared by the
//! synchronous path and the worker thread.

use super::error::{MachineError, Result};
use super::observer::{Observer, StopReason};
use crate::core::{MachineId, State, StateId, TransitionRecord};
use chrono::Utc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::trace;

const NO_CURSOR: usize = usize::MAX;

/// Owns every state of one machine together with the cursor.
///
/// States are only added while the arena is uniquely owned; once shared
/// with a worker it is read-only apart from the atomic cursor and step
/// counter.
pub(crate) struct Arena<E, C> {
    id: MachineId,
    states: Vec<State<E, C>>,
    cursor: AtomicUsize,
    steps: AtomicU64,
    context: Arc<C>,
    observers: Vec<Arc<dyn Observer>>,
}

impl<E, C> Arena<E, C> {
    pub(crate) fn new(context: Arc<C>, observers: Vec<Arc<dyn Observer>>) -> Self {
        Self {
            id: MachineId::new(),
            states: Vec::new(),
            cursor: AtomicUsize::new(NO_CURSOR),
            steps: AtomicU64::new(0),
            context,
            observers,
        }
    }

    pub(crate) fn id(&self) -> MachineId {
        self.id
    }

    pub(crate) fn context(&self) -> &Arc<C> {
        &self.context
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn states(&self) -> &[State<E, C>] {
        &self.states
    }

    pub(crate) fn steps(&self) -> u64 {
        self.steps.load(Ordering::Acquire)
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>) -> StateId {
        let id = StateId::new(self.id, self.states.len());
        self.states.push(State::new(id, name));
        id
    }

    pub(crate) fn resolve(&self, id: StateId) -> Result<&State<E, C>> {
        if id.machine() != self.id {
            return Err(MachineError::InvalidState(id));
        }
        self.states
            .get(id.index())
            .ok_or(MachineError::InvalidState(id))
    }

    pub(crate) fn resolve_mut(&mut self, id: StateId) -> Result<&mut State<E, C>> {
        if id.machine() != self.id {
            return Err(MachineError::InvalidState(id));
        }
        self.states
            .get_mut(id.index())
            .ok_or(MachineError::InvalidState(id))
    }

    pub(crate) fn cursor(&self) -> Option<StateId> {
        match self.cursor.load(Ordering::Acquire) {
            NO_CURSOR => None,
            index => Some(StateId::new(self.id, index)),
        }
    }

    pub(crate) fn current(&self) -> Option<&State<E, C>> {
        self.cursor().and_then(|id| self.states.get(id.index()))
    }

    /// Place the cursor on `start` and tell observers.
    pub(crate) fn start_at(&self, start: StateId) -> Result<()> {
        self.place(start)?;
        self.notify_start();
        Ok(())
    }

    /// Move the cursor to `start` without notifying anyone. Returns the
    /// previous cursor so a failed launch can put it back.
    pub(crate) fn place(&self, start: StateId) -> Result<Option<StateId>> {
        self.resolve(start)?;
        let previous = self.cursor();
        self.cursor.store(start.index(), Ordering::Release);
        Ok(previous)
    }

    pub(crate) fn restore(&self, cursor: Option<StateId>) {
        let index = cursor.map_or(NO_CURSOR, |id| id.index());
        self.cursor.store(index, Ordering::Release);
    }

    pub(crate) fn notify_start(&self) {
        if let Some(state) = self.current() {
            for observer in &self.observers {
                observer.on_start(state.name());
            }
        }
    }

    /// Evaluate one event against the current state and move the cursor.
    ///
    /// Exactly one edge fires, or none and the cursor stays put. Either way
    /// the event counts as consumed.
    pub(crate) fn step(&self, event: &E) -> Result<StateId> {
        let from = self.current().ok_or(MachineError::NoStartState)?;
        let target = from.evaluate(event, &self.context);
        let to = self.resolve(target)?;

        self.cursor.store(target.index(), Ordering::Release);
        let step = self.steps.fetch_add(1, Ordering::AcqRel) + 1;
        trace!(step, from = from.name(), to = to.name(), "step");

        if !self.observers.is_empty() {
            let record = TransitionRecord {
                from: from.name().to_owned(),
                to: to.name().to_owned(),
                timestamp: Utc::now(),
                step,
            };
            for observer in &self.observers {
                observer.on_transition(&record);
            }
        }

        Ok(target)
    }

    pub(crate) fn notify_stop(&self, reason: StopReason) {
        for observer in &self.observers {
            observer.on_stop(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Guard;

    fn arena() -> Arena<&'static str, ()> {
        Arena::new(Arc::new(()), Vec::new())
    }

    #[test]
    fn step_without_cursor_fails() {
        let mut arena = arena();
        arena.insert("a");

        assert!(matches!(
            arena.step(&"x"),
            Err(MachineError::NoStartState)
        ));
    }

    #[test]
    fn step_moves_cursor_and_counts() {
        let mut arena = arena();
        let a = arena.insert("a");
        let b = arena.insert("b");
        arena
            .resolve_mut(a)
            .unwrap()
            .add_rule(b, Guard::on_event("go"));
        arena.start_at(a).unwrap();

        assert_eq!(arena.step(&"stay").unwrap(), a);
        assert_eq!(arena.step(&"go").unwrap(), b);
        assert_eq!(arena.cursor(), Some(b));
        assert_eq!(arena.steps(), 2);
    }

    #[test]
    fn foreign_target_is_rejected_and_cursor_kept() {
        let mut arena = arena();
        let a = arena.insert("a");
        let foreign = StateId::new(MachineId::new(), 0);
        arena
            .resolve_mut(a)
            .unwrap()
            .add_rule(foreign, Guard::always());
        arena.start_at(a).unwrap();

        assert!(matches!(
            arena.step(&"x"),
            Err(MachineError::InvalidState(id)) if id == foreign
        ));
        assert_eq!(arena.cursor(), Some(a));
    }

    #[test]
    fn out_of_range_handle_is_rejected() {
        let mut arena = arena();
        arena.insert("a");
        let missing = StateId::new(arena.id(), 5);

        assert!(arena.resolve(missing).is_err());
        assert!(arena.start_at(missing).is_err());
        assert_eq!(arena.cursor(), None);
    }

    #[test]
    fn restore_undoes_place() {
        let mut arena = arena();
        let a = arena.insert("a");
        let b = arena.insert("b");

        assert_eq!(arena.place(a).unwrap(), None);
        assert_eq!(arena.place(b).unwrap(), Some(a));
        arena.restore(Some(a));
        assert_eq!(arena.cursor(), Some(a));
        arena.restore(None);
        assert_eq!(arena.cursor(), None);
    }
}
