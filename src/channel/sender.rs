//! Cloneable producer handle.

use super::queue::EventChannel;
use std::fmt;
use std::sync::Arc;

/// Producer side of an [`EventChannel`].
///
/// Cheap to clone and `Send` whenever the event type is, so each producer
/// thread can own its own handle.
pub struct EventSender<E> {
    channel: Arc<EventChannel<E>>,
}

impl<E> EventSender<E> {
    pub(crate) fn new(channel: Arc<EventChannel<E>>) -> Self {
        Self { channel }
    }

    /// Enqueue an event. Never blocks on the consumer; returns `false` when
    /// the channel was already cancelled and the event was dropped.
    pub fn push(&self, event: E) -> bool {
        self.channel.push(event)
    }

    /// Whether the channel behind this handle was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.channel.is_cancelled()
    }
}

impl<E> Clone for EventSender<E> {
    fn clone(&self) -> Self {
        Self {
            channel: Arc::clone(&self.channel),
        }
    }
}

impl<E> fmt::Debug for EventSender<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSender")
            .field("pending", &self.channel.len())
            .finish()
    }
}
