//! Builder API for configuring machines.
//!
//! [`MachineBuilder`] binds the shared context, registers observers and
//! applies a [`MachineConfig`]. The configuration is plain serde data, so it
//! can also be loaded from JSON.

pub mod config;
pub mod machine;

pub use config::MachineConfig;
pub use machine::MachineBuilder;
