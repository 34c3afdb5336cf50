//! The machine: arena owner, synchronous driver and worker-thread manager.

use super::arena::Arena;
use super::error::{MachineError, Result};
use super::observer::{Observer, StopReason};
use super::snapshot::MachineSnapshot;
use super::worker;
use crate::builder::{MachineBuilder, MachineConfig};
use crate::channel::{EventChannel, EventSender};
use crate::core::{Guard, MachineId, StateId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, info, info_span, warn};

type WorkerHandle = JoinHandle<Result<StopReason>>;
type WorkerBody = Box<dyn FnOnce() -> Result<StopReason> + Send>;

/// Lifecycle of the machine itself, independent of the modelled states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not started; states and rules may still be added
    Idle,
    /// A worker thread is consuming events
    Running,
    /// Stopped for good; build a new machine to run again
    Stopped,
}

/// Finite state machine over events `E` with a shared context `C`.
///
/// A machine can be driven two ways:
///
/// - synchronously, by calling [`on_event`](Self::on_event) on the owning
///   thread after [`set_start_state`](Self::set_start_state);
/// - asynchronously, by calling [`run`](Self::run), which spawns one worker
///   thread that consumes events pushed with [`push`](Self::push) or through
///   an [`EventSender`].
///
/// The context is shared as `Arc<C>` with every guard. The machine adds no
/// locking around it: guards that mutate it must use interior mutability,
/// and mutation from other threads while a worker runs is the caller's
/// business.
///
/// Dropping a machine stops it, joins the worker and only then releases the
/// states.
///
/// # Example
///
/// ```rust
/// use stateline::Machine;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::sync::Arc;
///
/// #[derive(Default)]
/// struct Turnstile {
///     coins: AtomicU32,
/// }
///
/// let context = Arc::new(Turnstile::default());
/// let mut machine = Machine::new(Arc::clone(&context));
///
/// let locked = machine.create_state("locked").unwrap();
/// let unlocked = machine.create_state("unlocked").unwrap();
/// machine
///     .add_rule(locked, unlocked, |e: &&str, ctx: &Turnstile| {
///         if *e != "coin" {
///             return false;
///         }
///         ctx.coins.fetch_add(1, Ordering::SeqCst);
///         true
///     })
///     .unwrap();
/// machine.add_rule(unlocked, locked, |e, _| *e == "push").unwrap();
///
/// machine.run(locked, Some(unlocked)).unwrap();
/// machine.push("push");
/// machine.push("coin");
/// machine.wait().unwrap();
///
/// assert_eq!(machine.current_state_name(), Some("unlocked"));
/// assert_eq!(context.coins.load(Ordering::SeqCst), 1);
/// ```
pub struct Machine<E, C> {
    arena: Arc<Arena<E, C>>,
    channel: Arc<EventChannel<E>>,
    worker: Option<WorkerHandle>,
    config: MachineConfig,
    started: bool,
    sealed: bool,
}

impl<E, C> Machine<E, C>
where
    E: Send + 'static,
    C: Send + Sync + 'static,
{
    /// Create a machine bound to `context` with the default configuration.
    pub fn new(context: Arc<C>) -> Self {
        Self::from_parts(context, MachineConfig::default(), Vec::new())
    }

    /// Start configuring a machine.
    pub fn builder() -> MachineBuilder<E, C> {
        MachineBuilder::new()
    }

    pub(crate) fn from_parts(
        context: Arc<C>,
        config: MachineConfig,
        observers: Vec<Arc<dyn Observer>>,
    ) -> Self {
        let arena = Arena::new(context, observers);
        debug!(id = %arena.id(), name = %config.name, "machine created");
        Self {
            arena: Arc::new(arena),
            channel: Arc::new(EventChannel::with_policy(config.cancel_policy)),
            worker: None,
            config,
            started: false,
            sealed: false,
        }
    }

    /// Add a state and return its handle.
    ///
    /// Fails with [`MachineError::ArenaFrozen`] once the machine has
    /// processed an event or been started or stopped.
    pub fn create_state(&mut self, name: impl Into<String>) -> Result<StateId> {
        Ok(self.arena_mut()?.insert(name))
    }

    /// Attach an edge `from -> to`, taken when `predicate` returns `true`.
    ///
    /// Edges are tried in the order they were added. The predicate may
    /// mutate the context; it runs every time the edge is considered.
    pub fn add_rule<F>(&mut self, from: StateId, to: StateId, predicate: F) -> Result<()>
    where
        F: Fn(&E, &C) -> bool + Send + Sync + 'static,
    {
        self.add_guarded_rule(from, to, Guard::new(predicate))
    }

    /// Attach an edge with a prebuilt [`Guard`].
    pub fn add_guarded_rule(
        &mut self,
        from: StateId,
        to: StateId,
        guard: Guard<E, C>,
    ) -> Result<()> {
        let arena = self.arena_mut()?;
        arena.resolve(to)?;
        arena.resolve_mut(from)?.add_rule(to, guard);
        Ok(())
    }

    /// Place the cursor on `state` for synchronous driving.
    pub fn set_start_state(&mut self, state: StateId) -> Result<()> {
        self.ensure_sync()?;
        self.arena.start_at(state)
    }

    /// Process one event on the calling thread and return the new state.
    ///
    /// An event that matches no edge leaves the cursor where it is and is
    /// still consumed.
    pub fn on_event(&mut self, event: E) -> Result<StateId> {
        self.ensure_sync()?;
        if self.arena.cursor().is_none() {
            return Err(MachineError::NoStartState);
        }
        self.sealed = true;
        self.arena.step(&event)
    }

    /// Start the worker thread at `start`.
    ///
    /// The worker consumes queued events until the channel is cancelled or,
    /// when `exit` is given, until the cursor lands on `exit` after a step.
    /// A machine runs at most once.
    pub fn run(&mut self, start: StateId, exit: Option<StateId>) -> Result<()> {
        self.launch(start, exit, |builder, body| builder.spawn(body))
    }

    fn launch<S>(&mut self, start: StateId, exit: Option<StateId>, spawn: S) -> Result<()>
    where
        S: FnOnce(thread::Builder, WorkerBody) -> io::Result<WorkerHandle>,
    {
        match self.phase() {
            Phase::Idle => {}
            Phase::Running => return Err(MachineError::AlreadyRunning),
            Phase::Stopped => return Err(MachineError::Stopped),
        }
        if let Some(exit) = exit {
            self.arena.resolve(exit)?;
        }
        let previous = self.arena.place(start)?;

        let arena = Arc::clone(&self.arena);
        let channel = Arc::clone(&self.channel);
        let span = info_span!("machine", id = %arena.id(), name = %self.config.name);
        let body: WorkerBody = Box::new(move || {
            span.in_scope(|| {
                arena.notify_start();
                worker::run_loop(&arena, &channel, exit)
            })
        });
        let builder = thread::Builder::new().name(self.config.worker_thread_name());
        let handle = match spawn(builder, body) {
            Ok(handle) => handle,
            Err(err) => {
                self.arena.restore(previous);
                warn!(id = %self.arena.id(), %err, "worker thread could not be spawned");
                return Err(err.into());
            }
        };

        let start_label = self.state_label(start);
        let exit_label = exit.map(|e| self.state_label(e));
        info!(
            id = %self.arena.id(),
            start = %start_label,
            exit = exit_label.as_deref(),
            "machine running"
        );

        self.worker = Some(handle);
        self.started = true;
        self.sealed = true;
        Ok(())
    }

    /// Enqueue an event for the worker. Callable in any phase; events are
    /// only consumed while running.
    ///
    /// Returns `false` once the machine was stopped; the event is dropped.
    pub fn push(&self, event: E) -> bool {
        self.channel.push(event)
    }

    /// A cloneable producer handle for other threads.
    pub fn sender(&self) -> EventSender<E> {
        self.channel.sender()
    }

    /// Name of the state under the cursor.
    ///
    /// While a worker runs the answer may already be outdated when it
    /// returns; use it for diagnostics.
    pub fn current_state_name(&self) -> Option<&str> {
        self.arena.current().map(|state| state.name())
    }

    /// Handle of the state under the cursor.
    pub fn current_state(&self) -> Option<StateId> {
        self.arena.cursor()
    }

    /// Name of any state in this machine.
    pub fn state_name(&self, state: StateId) -> Result<&str> {
        self.arena.resolve(state).map(|state| state.name())
    }

    /// Look up a state handle by name. Returns the first match.
    pub fn find_state(&self, name: &str) -> Option<StateId> {
        self.arena
            .states()
            .iter()
            .find(|state| state.name() == name)
            .map(|state| state.id())
    }

    /// Number of states in the arena.
    pub fn state_count(&self) -> usize {
        self.arena.len()
    }

    /// Events processed so far, synchronously or by the worker.
    pub fn steps(&self) -> u64 {
        self.arena.steps()
    }

    /// Serializable view of the machine for diagnostics.
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            id: self.arena.id(),
            name: self.config.name.clone(),
            phase: self.phase(),
            current: self.current_state_name().map(str::to_owned),
            steps: self.arena.steps(),
            pending: self.pending(),
            states: self
                .arena
                .states()
                .iter()
                .map(|state| state.name().to_owned())
                .collect(),
        }
    }

    fn ensure_sync(&self) -> Result<()> {
        match self.phase() {
            Phase::Idle => Ok(()),
            Phase::Running => Err(MachineError::WorkerActive),
            Phase::Stopped => Err(MachineError::Stopped),
        }
    }

    fn arena_mut(&mut self) -> Result<&mut Arena<E, C>> {
        if self.sealed || self.phase() != Phase::Idle {
            return Err(MachineError::ArenaFrozen);
        }
        Arc::get_mut(&mut self.arena).ok_or(MachineError::ArenaFrozen)
    }

    fn state_label(&self, state: StateId) -> String {
        self.state_name(state)
            .map(str::to_owned)
            .unwrap_or_else(|_| state.to_string())
    }
}

impl<E, C> Machine<E, C> {
    /// Identity of this machine.
    pub fn id(&self) -> MachineId {
        self.arena.id()
    }

    /// Name from the configuration.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Configuration the machine was built with.
    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// The shared context.
    pub fn context(&self) -> &Arc<C> {
        self.arena.context()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        match &self.worker {
            Some(worker) if !worker.is_finished() => Phase::Running,
            _ if self.started || self.channel.is_cancelled() => Phase::Stopped,
            _ => Phase::Idle,
        }
    }

    /// Events queued but not yet consumed. Diagnostics only.
    pub fn pending(&self) -> usize {
        self.channel.len()
    }

    /// Ask the worker to stop after its current step.
    ///
    /// Never interrupts a step in progress. Idempotent; on a machine that
    /// never ran it simply moves it to [`Phase::Stopped`].
    pub fn stop(&self) {
        if !self.channel.is_cancelled() {
            debug!(id = %self.arena.id(), "stop requested");
        }
        self.channel.cancel();
    }

    /// Block until the worker thread, if any, has finished.
    ///
    /// Returns `Ok(())` when there is nothing to wait for. A worker that
    /// failed reports its error here, once.
    pub fn wait(&mut self) -> Result<()> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        match worker.join() {
            Ok(Ok(reason)) => {
                debug!(id = %self.arena.id(), ?reason, "worker joined");
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(MachineError::WorkerPanicked),
        }
    }
}

impl<E, C> Drop for Machine<E, C> {
    fn drop(&mut self) {
        self.stop();
        if let Err(err) = self.wait() {
            warn!(id = %self.arena.id(), %err, "worker ended with an error");
        }
    }
}

impl<E, C> fmt::Debug for Machine<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.arena.id())
            .field("name", &self.config.name)
            .field("phase", &self.phase())
            .field("states", &self.arena.len())
            .field("cursor", &self.arena.cursor())
            .field("pending", &self.channel.len())
            .finish()
    }
}
