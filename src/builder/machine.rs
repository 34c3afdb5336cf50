//! Builder for constructing machines.

use crate::builder::config::MachineConfig;
use crate::channel::CancelPolicy;
use crate::machine::{Machine, MachineError, Observer, Result};
use std::marker::PhantomData;
use std::sync::Arc;

/// Builder for constructing machines with a fluent API.
///
/// A context is required; everything else has a default.
pub struct MachineBuilder<E, C> {
    context: Option<Arc<C>>,
    config: MachineConfig,
    observers: Vec<Arc<dyn Observer>>,
    _phantom: PhantomData<fn(E)>,
}

impl<E, C> MachineBuilder<E, C>
where
    E: Send + 'static,
    C: Send + Sync + 'static,
{
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            context: None,
            config: MachineConfig::default(),
            observers: Vec::new(),
            _phantom: PhantomData,
        }
    }

    /// Bind the shared context (required).
    pub fn context(mut self, context: Arc<C>) -> Self {
        self.context = Some(context);
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: MachineConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the name used in logs and snapshots.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Choose what `stop()` does with events still queued.
    pub fn cancel_policy(mut self, policy: CancelPolicy) -> Self {
        self.config.cancel_policy = policy;
        self
    }

    /// Name the worker thread explicitly.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.config.thread_name = Some(name.into());
        self
    }

    /// Register an observer. Observers are notified in registration order.
    pub fn observer<O>(mut self, observer: Arc<O>) -> Self
    where
        O: Observer + 'static,
    {
        self.observers.push(observer);
        self
    }

    /// Build the machine.
    /// Returns an error if no context was bound or the config is invalid.
    pub fn build(self) -> Result<Machine<E, C>> {
        let context = self.context.ok_or(MachineError::MissingContext)?;
        self.config.validate()?;
        Ok(Machine::from_parts(context, self.config, self.observers))
    }
}

impl<E, C> Default for MachineBuilder<E, C>
where
    E: Send + 'static,
    C: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
