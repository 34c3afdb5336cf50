//! Machine errors.

use crate::core::StateId;
use thiserror::Error;

/// Broad classes of [`MachineError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The machine or its graph was set up incorrectly
    Configuration,
    /// An operation was called in a lifecycle phase that does not allow it
    ConcurrencyMisuse,
    /// Something failed while the machine was operating
    Runtime,
}

/// Errors that can occur when building or driving a machine.
///
/// All of them are precondition failures checked before anything changes;
/// none are retried.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("No context bound to machine. Call .context(ctx) before .build()")]
    MissingContext,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid state {0}: not a member of this machine")]
    InvalidState(StateId),

    #[error("No start state. Call set_start_state() or run() first")]
    NoStartState,

    #[error("Machine is already running")]
    AlreadyRunning,

    #[error("Machine has stopped; build a new machine to run again")]
    Stopped,

    #[error("Worker thread is running; synchronous calls are not allowed")]
    WorkerActive,

    #[error("States and rules cannot change once the machine has started")]
    ArenaFrozen,

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Worker thread panicked")]
    WorkerPanicked,

    #[error("Serialization failed: {0}")]
    Serialization(String),
}

impl MachineError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingContext
            | Self::InvalidConfig(_)
            | Self::InvalidState(_)
            | Self::NoStartState => ErrorKind::Configuration,
            Self::AlreadyRunning | Self::Stopped | Self::WorkerActive | Self::ArenaFrozen => {
                ErrorKind::ConcurrencyMisuse
            }
            Self::Spawn(_) | Self::WorkerPanicked | Self::Serialization(_) => ErrorKind::Runtime,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, MachineError>;
