//! The execution engine.
//!
//! # Key Concepts
//!
//! - **Machine**: owns the states, the cursor and the event channel
//! - **Worker**: one thread per running machine, consuming the channel
//! - **Observers**: opt-in hooks notified of every processed event
//!
//! # Shutdown
//!
//! `stop()` cancels the channel and `wait()` joins the worker. Dropping a
//! machine does both, in that order, before the states are released.

mod arena;
mod error;
#[allow(clippy::module_inception)]
mod machine;
mod observer;
mod snapshot;
mod worker;

pub use error::{ErrorKind, MachineError, Result};
pub use machine::{Machine, Phase};
pub use observer::{HistoryRecorder, Observer, StopReason};
pub use snapshot::MachineSnapshot;
