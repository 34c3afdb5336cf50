//! The worker thread's receive-and-step loop.

use super::arena::Arena;
use super::error::Result;
use super::observer::StopReason;
use crate::channel::{EventChannel, Received};
use crate::core::StateId;
use tracing::{error, info};

/// Consume events until the channel is cancelled or `exit` is reached.
///
/// Cancellation is only observed between steps; a step that has started
/// always finishes.
pub(crate) fn run_loop<E, C>(
    arena: &Arena<E, C>,
    channel: &EventChannel<E>,
    exit: Option<StateId>,
) -> Result<StopReason> {
    info!("worker started");

    let outcome = loop {
        let event = match channel.receive() {
            Received::Value(event) => event,
            Received::Cancelled => break Ok(StopReason::Cancelled),
        };

        match arena.step(&event) {
            Ok(current) if Some(current) == exit => break Ok(StopReason::ExitReached),
            Ok(_) => {}
            Err(err) => {
                error!(%err, "step failed, stopping worker");
                break Err(err);
            }
        }
    };

    let reason = match &outcome {
        Ok(reason) => *reason,
        Err(_) => StopReason::Failed,
    };
    arena.notify_stop(reason);
    info!(
        ?reason,
        steps = arena.steps(),
        pending = channel.len(),
        "worker stopped"
    );

    outcome
}
