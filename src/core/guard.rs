//! Guard predicates for controlling state transitions.
//!
//! A guard decides whether an edge fires for a given event. Guards see the
//! machine's shared context and may mutate it through interior mutability,
//! so evaluating the same event twice can give different answers.

use std::fmt;

/// Predicate that determines if an edge fires for an event.
///
/// Guards are evaluated in the order their edges were added. Side effects on
/// the context are allowed and are applied on every evaluation, whether or
/// not the guard ends up returning `true`.
///
/// # Example
///
/// ```rust
/// use stateline::core::Guard;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// struct Counter {
///     hits: AtomicUsize,
/// }
///
/// let counting = Guard::new(|event: &&str, ctx: &Counter| {
///     ctx.hits.fetch_add(1, Ordering::SeqCst);
///     *event == "go"
/// });
///
/// let ctx = Counter { hits: AtomicUsize::new(0) };
/// assert!(counting.check(&"go", &ctx));
/// assert!(!counting.check(&"stop", &ctx));
/// assert_eq!(ctx.hits.load(Ordering::SeqCst), 2);
/// ```
pub struct Guard<E, C> {
    predicate: Box<dyn Fn(&E, &C) -> bool + Send + Sync>,
}

impl<E, C> Guard<E, C> {
    /// Create a guard from a predicate over the event and the context.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&E, &C) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Box::new(predicate),
        }
    }

    /// Guard that fires for every event.
    pub fn always() -> Self
    where
        E: 'static,
        C: 'static,
    {
        Guard::new(|_, _| true)
    }

    /// Guard that fires when the event equals `expected`.
    ///
    /// ```rust
    /// use stateline::core::Guard;
    ///
    /// let on_open = Guard::<&str, ()>::on_event("open");
    /// assert!(on_open.check(&"open", &()));
    /// assert!(!on_open.check(&"close", &()));
    /// ```
    pub fn on_event(expected: E) -> Self
    where
        E: PartialEq + Send + Sync + 'static,
        C: 'static,
    {
        Guard::new(move |event, _| *event == expected)
    }

    /// Evaluate the guard.
    pub fn check(&self, event: &E, context: &C) -> bool {
        (self.predicate)(event, context)
    }
}

impl<E, C> fmt::Debug for Guard<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard").finish_non_exhaustive()
    }
}
