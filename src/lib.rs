//! Stateline: a finite state machine engine with a built-in event channel
//!
//! A machine is a graph of named states joined by guarded edges. Events are
//! evaluated against the current state either synchronously on the caller's
//! thread or on one dedicated worker thread fed by any number of producers.
//!
//! # Core Concepts
//!
//! - **State**: a named node with ordered outgoing edges
//! - **Guard**: a predicate over the event and the shared context; the first
//!   edge whose guard holds wins, otherwise the state loops to itself
//! - **Channel**: a blocking, cancellable multi-producer queue feeding the
//!   worker
//! - **Observer**: an opt-in hook that sees every processed event
//!
//! # Example
//!
//! ```rust
//! use stateline::Machine;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Context {
//!     count: AtomicUsize,
//! }
//!
//! let mut machine = Machine::new(Arc::new(Context::default()));
//! let idle = machine.create_state("idle").unwrap();
//! let busy = machine.create_state("busy").unwrap();
//! machine.add_rule(idle, busy, |e: &&str, ctx: &Context| {
//!     ctx.count.fetch_add(1, Ordering::SeqCst);
//!     *e == "start"
//! }).unwrap();
//! machine.add_rule(busy, idle, |e, _| *e == "done").unwrap();
//!
//! machine.set_start_state(idle).unwrap();
//! for event in ["noise", "start", "done"] {
//!     machine.on_event(event).unwrap();
//! }
//!
//! assert_eq!(machine.current_state_name(), Some("idle"));
//! assert_eq!(machine.context().count.load(Ordering::SeqCst), 2);
//! ```

pub mod builder;
pub mod channel;
pub mod core;
pub mod machine;

// Re-export commonly used types
pub use builder::{MachineBuilder, MachineConfig};
pub use channel::{CancelPolicy, EventChannel, EventSender, Received};
pub use self::core::{Guard, State, StateHistory, StateId, TransitionRecord};
pub use machine::{
    ErrorKind, HistoryRecorder, Machine, MachineError, MachineSnapshot, Observer, Phase, Result,
    StopReason,
};
