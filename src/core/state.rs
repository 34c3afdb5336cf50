//! States, state handles and their outgoing edges.
//!
//! States live in the arena owned by a [`Machine`](crate::Machine) and are
//! referenced everywhere else by a [`StateId`]. The transition graph is
//! expected to contain cycles, so edges store handles rather than owning
//! their targets.

use super::guard::Guard;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identity of one machine instance.
///
/// Every machine draws a fresh random id, which keeps handles from one
/// machine from ever resolving inside another machine's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MachineId(Uuid);

impl MachineId {
    /// Generate a new random machine id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MachineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable, non-owning handle to a state in a machine's arena.
///
/// Handles are cheap to copy and compare. A handle is only meaningful to the
/// machine that created it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateId {
    machine: MachineId,
    index: usize,
}

impl StateId {
    pub(crate) fn new(machine: MachineId, index: usize) -> Self {
        Self { machine, index }
    }

    /// The machine that issued this handle.
    pub fn machine(&self) -> MachineId {
        self.machine
    }

    /// Position of the state in its arena, in creation order.
    pub fn index(&self) -> usize {
        self.index
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.machine)
    }
}

/// One outgoing edge: where to go, and when.
struct Rule<E, C> {
    target: StateId,
    guard: Guard<E, C>,
}

/// A named node of the transition graph with its ordered outgoing edges.
///
/// Edges are evaluated in insertion order and the first guard that returns
/// `true` wins. When no guard matches, the state transitions to itself.
pub struct State<E, C> {
    id: StateId,
    name: String,
    rules: Vec<Rule<E, C>>,
}

impl<E, C> State<E, C> {
    pub(crate) fn new(id: StateId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            rules: Vec::new(),
        }
    }

    /// Handle of this state.
    pub fn id(&self) -> StateId {
        self.id
    }

    /// Name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of outgoing edges.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Targets of the outgoing edges, in evaluation order.
    pub fn targets(&self) -> impl Iterator<Item = StateId> + '_ {
        self.rules.iter().map(|rule| rule.target)
    }

    /// Append an edge. Duplicates and cycles are allowed.
    pub fn add_rule(&mut self, target: StateId, guard: Guard<E, C>) {
        self.rules.push(Rule { target, guard });
    }

    /// Pick the next state for `event`.
    ///
    /// Guards run in insertion order until one returns `true`; guards after
    /// the winner are not evaluated. Returns this state's own id when
    /// nothing matches.
    pub fn evaluate(&self, event: &E, context: &C) -> StateId {
        self.rules
            .iter()
            .find(|rule| rule.guard.check(event, context))
            .map(|rule| rule.target)
            .unwrap_or(self.id)
    }
}

impl<E, C> fmt::Debug for State<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("rules", &self.rules.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Context {
        evaluated: AtomicUsize,
    }

    fn ids() -> (StateId, StateId, StateId) {
        let machine = MachineId::new();
        (
            StateId::new(machine, 0),
            StateId::new(machine, 1),
            StateId::new(machine, 2),
        )
    }

    #[test]
    fn unmatched_event_loops_to_self() {
        let (a, b, _) = ids();
        let mut state = State::<&str, Context>::new(a, "a");
        state.add_rule(b, Guard::new(|e, _| *e == "go"));

        assert_eq!(state.evaluate(&"wait", &Context::default()), a);
    }

    #[test]
    fn first_matching_rule_wins() {
        let (a, b, c) = ids();
        let mut state = State::<&str, Context>::new(a, "a");
        state.add_rule(b, Guard::new(|e, _| *e == "go"));
        state.add_rule(c, Guard::new(|e, _| *e == "go"));

        assert_eq!(state.evaluate(&"go", &Context::default()), b);
    }

    #[test]
    fn guards_after_winner_are_not_evaluated() {
        let (a, b, c) = ids();
        let mut state = State::<&str, Context>::new(a, "a");
        state.add_rule(
            b,
            Guard::new(|e, ctx: &Context| {
                ctx.evaluated.fetch_add(1, Ordering::SeqCst);
                *e == "go"
            }),
        );
        state.add_rule(
            c,
            Guard::new(|_, ctx: &Context| {
                ctx.evaluated.fetch_add(1, Ordering::SeqCst);
                true
            }),
        );

        let ctx = Context::default();
        assert_eq!(state.evaluate(&"go", &ctx), b);
        assert_eq!(ctx.evaluated.load(Ordering::SeqCst), 1);

        assert_eq!(state.evaluate(&"other", &ctx), c);
        assert_eq!(ctx.evaluated.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn self_targets_are_allowed() {
        let (a, _, _) = ids();
        let mut state = State::<&str, Context>::new(a, "a");
        state.add_rule(a, Guard::always());
        state.add_rule(a, Guard::always());

        assert_eq!(state.rule_count(), 2);
        assert_eq!(state.targets().collect::<Vec<_>>(), vec![a, a]);
        assert_eq!(state.evaluate(&"x", &Context::default()), a);
    }

    #[test]
    fn handles_from_different_machines_differ() {
        let first = StateId::new(MachineId::new(), 0);
        let second = StateId::new(MachineId::new(), 0);

        assert_eq!(first.index(), second.index());
        assert_ne!(first, second);
    }

    #[test]
    fn state_id_serializes_correctly() {
        let (a, _, _) = ids();
        let json = serde_json::to_string(&a).unwrap();
        let deserialized: StateId = serde_json::from_str(&json).unwrap();
        assert_eq!(a, deserialized);
    }
}
