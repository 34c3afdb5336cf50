//! Event hand-off between producer threads and the machine's worker.
//!
//! The channel is unbounded and supports exactly one consumer. Cancellation
//! is cooperative: it is observed only when the consumer next receives, and
//! it is reported as [`Received::Cancelled`] rather than as an in-band event
//! value.

mod queue;
mod sender;

pub use queue::{CancelPolicy, EventChannel, Received};
pub use sender::EventSender;
