//! Blocking multi-producer, single-consumer event queue.

use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use super::sender::EventSender;

/// What happens to queued events once the channel is cancelled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelPolicy {
    /// Report `Cancelled` as soon as cancellation is requested. Events still
    /// in the queue are dropped.
    #[default]
    Discard,

    /// Keep delivering the events queued at cancellation; report
    /// `Cancelled` once they are gone.
    Drain,
}

/// Outcome of a receive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Received<E> {
    /// An event taken from the head of the queue
    Value(E),

    /// The channel was cancelled; no further events will be delivered
    Cancelled,
}

impl<E> Received<E> {
    /// The event, if one was received.
    pub fn into_value(self) -> Option<E> {
        match self {
            Received::Value(value) => Some(value),
            Received::Cancelled => None,
        }
    }

    /// True for the cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Received::Cancelled)
    }
}

#[derive(Debug)]
struct Inner<E> {
    queue: VecDeque<E>,
    cancelled: bool,
}

impl<E> Inner<E> {
    fn take(&mut self, policy: CancelPolicy) -> Option<Received<E>> {
        match policy {
            CancelPolicy::Discard if self.cancelled => Some(Received::Cancelled),
            CancelPolicy::Discard => self.queue.pop_front().map(Received::Value),
            CancelPolicy::Drain => self
                .queue
                .pop_front()
                .map(Received::Value)
                .or_else(|| self.cancelled.then_some(Received::Cancelled)),
        }
    }
}

/// Thread-safe hand-off buffer between producers and one consumer.
///
/// Any number of threads may [`push`](Self::push); one thread is expected to
/// call [`receive`](Self::receive). Events from a single producer come out
/// in the order they were pushed. Events from different producers are
/// ordered by whoever takes the internal lock first.
///
/// # Example
///
/// ```rust
/// use stateline::channel::{EventChannel, Received};
/// use std::sync::Arc;
/// use std::thread;
///
/// let channel = Arc::new(EventChannel::new());
/// let producer = channel.sender();
///
/// let handle = thread::spawn(move || {
///     for n in 0..3 {
///         producer.push(n);
///     }
/// });
///
/// assert_eq!(channel.receive(), Received::Value(0));
/// assert_eq!(channel.receive(), Received::Value(1));
/// assert_eq!(channel.receive(), Received::Value(2));
/// handle.join().unwrap();
///
/// channel.cancel();
/// assert_eq!(channel.receive(), Received::Cancelled);
/// ```
#[derive(Debug)]
pub struct EventChannel<E> {
    inner: Mutex<Inner<E>>,
    ready: Condvar,
    policy: CancelPolicy,
}

impl<E> EventChannel<E> {
    /// Create an empty channel with the default [`CancelPolicy`].
    pub fn new() -> Self {
        Self::with_policy(CancelPolicy::default())
    }

    /// Create an empty channel with an explicit cancel policy.
    pub fn with_policy(policy: CancelPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                cancelled: false,
            }),
            ready: Condvar::new(),
            policy,
        }
    }

    /// The policy chosen at construction.
    pub fn policy(&self) -> CancelPolicy {
        self.policy
    }

    /// Producer handle sharing this channel.
    pub fn sender(self: &Arc<Self>) -> EventSender<E> {
        EventSender::new(Arc::clone(self))
    }

    /// Append an event at the tail and wake one waiting consumer.
    ///
    /// Never waits for the consumer. Returns `false` and drops the event
    /// once the channel is cancelled, so the queue cannot grow past the
    /// point of cancellation.
    pub fn push(&self, value: E) -> bool {
        let mut inner = self.inner.lock();
        if inner.cancelled {
            return false;
        }
        inner.queue.push_back(value);
        drop(inner);
        self.ready.notify_one();
        true
    }

    /// Block until an event is available or the channel is cancelled.
    pub fn receive(&self) -> Received<E> {
        let mut inner = self.inner.lock();
        loop {
            if let Some(received) = inner.take(self.policy) {
                return received;
            }
            self.ready.wait(&mut inner);
        }
    }

    /// Non-blocking receive. `None` means nothing is queued and the channel
    /// is still open.
    pub fn try_receive(&self) -> Option<Received<E>> {
        self.inner.lock().take(self.policy)
    }

    /// Request cancellation and wake every waiting consumer.
    ///
    /// The flag is permanent. Calling this again is a no-op. Under
    /// [`CancelPolicy::Discard`] the queued events are dropped here.
    pub fn cancel(&self) {
        let mut inner = self.inner.lock();
        if inner.cancelled {
            return;
        }
        inner.cancelled = true;
        let pending = inner.queue.len();
        let discarded = match self.policy {
            CancelPolicy::Discard => std::mem::take(&mut inner.queue),
            CancelPolicy::Drain => VecDeque::new(),
        };
        drop(inner);
        drop(discarded);

        debug!(pending, policy = ?self.policy, "event channel cancelled");
        self.ready.notify_all();
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.inner.lock().cancelled
    }

    /// Number of queued events at the moment of the call.
    ///
    /// The value can be stale by the time it is read; use it for
    /// diagnostics only.
    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    /// Whether the queue was empty at the moment of the call.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }
}

impl<E> Default for EventChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}
