//! Machine configuration.

use crate::channel::CancelPolicy;
use crate::machine::{MachineError, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_NAME: &str = "machine";

/// Settings that shape a machine without touching its graph.
///
/// Every field has a default, so a partial JSON document is enough:
///
/// ```rust
/// use stateline::builder::MachineConfig;
/// use stateline::channel::CancelPolicy;
///
/// let config = MachineConfig::from_json(r#"{ "cancel_policy": "drain" }"#).unwrap();
/// assert_eq!(config.name, "machine");
/// assert_eq!(config.cancel_policy, CancelPolicy::Drain);
/// assert_eq!(config.worker_thread_name(), "machine-worker");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineConfig {
    /// Label used in logs and snapshots
    pub name: String,

    /// What `stop()` does to events still queued
    pub cancel_policy: CancelPolicy,

    /// Name of the worker thread; derived from `name` when unset
    pub thread_name: Option<String>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            cancel_policy: CancelPolicy::default(),
            thread_name: None,
        }
    }
}

impl MachineConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| MachineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// The name the worker thread is spawned with.
    pub fn worker_thread_name(&self) -> String {
        self.thread_name
            .clone()
            .unwrap_or_else(|| format!("{}-worker", self.name))
    }

    /// Check the settings before a machine is built from them.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(MachineError::InvalidConfig(
                "machine name must not be empty".to_string(),
            ));
        }
        if self.worker_thread_name().contains('\0') {
            return Err(MachineError::InvalidConfig(
                "thread name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MachineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cancel_policy, CancelPolicy::Discard);
    }

    #[test]
    fn explicit_thread_name_wins() {
        let config = MachineConfig {
            thread_name: Some("fsm".to_string()),
            ..MachineConfig::default()
        };
        assert_eq!(config.worker_thread_name(), "fsm");
    }

    #[test]
    fn empty_name_is_rejected() {
        let config = MachineConfig {
            name: "  ".to_string(),
            ..MachineConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MachineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn nul_in_thread_name_is_rejected() {
        let config = MachineConfig {
            thread_name: Some("bad\0name".to_string()),
            ..MachineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let result = MachineConfig::from_json("{ name: ");
        assert!(matches!(result, Err(MachineError::InvalidConfig(_))));
    }

    #[test]
    fn config_roundtrips_through_json() {
        let config = MachineConfig {
            name: "door".to_string(),
            cancel_policy: CancelPolicy::Drain,
            thread_name: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(MachineConfig::from_json(&json).unwrap(), config);
    }
}
