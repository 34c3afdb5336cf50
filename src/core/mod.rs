//! Core graph types.
//!
//! This module contains the building blocks the engine evaluates:
//! - `State` nodes with ordered, guarded edges
//! - `Guard` predicates over an event and the shared context
//! - `StateHistory` records of visited states
//!
//! Nothing here spawns threads or takes locks; the machine module drives
//! these types.

mod guard;
mod history;
mod state;

pub use guard::Guard;
pub use history::{StateHistory, TransitionRecord};
pub use state::{MachineId, State, StateId};
