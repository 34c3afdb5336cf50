//! Point-in-time diagnostic view of a machine.

use super::error::{MachineError, Result};
use super::machine::Phase;
use crate::core::MachineId;
use serde::{Deserialize, Serialize};

/// Serializable picture of a machine at one moment.
///
/// Taken while a worker runs, the fields may disagree with each other by a
/// step or two. The snapshot does not capture guards, so a machine cannot
/// be rebuilt from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// Machine identity
    pub id: MachineId,

    /// Configured name
    pub name: String,

    /// Lifecycle phase
    pub phase: Phase,

    /// Name of the state under the cursor
    pub current: Option<String>,

    /// Events processed so far
    pub steps: u64,

    /// Events queued but not yet consumed
    pub pending: usize,

    /// State names in creation order
    pub states: Vec<String>,
}

impl MachineSnapshot {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| MachineError::Serialization(e.to_string()))
    }

    /// Parse a snapshot previously rendered with [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| MachineError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use crate::machine::{Machine, MachineError, Phase};
    use std::sync::Arc;

    #[test]
    fn snapshot_reflects_machine() {
        let mut machine = Machine::<&str, ()>::builder()
            .context(Arc::new(()))
            .name("door")
            .build()
            .unwrap();
        let closed = machine.create_state("closed").unwrap();
        let open = machine.create_state("open").unwrap();
        machine.add_rule(closed, open, |e, _| *e == "open").unwrap();
        machine.set_start_state(closed).unwrap();
        machine.on_event("open").unwrap();
        machine.push("close");

        let snapshot = machine.snapshot();

        assert_eq!(snapshot.id, machine.id());
        assert_eq!(snapshot.name, "door");
        assert_eq!(snapshot.phase, Phase::Idle);
        assert_eq!(snapshot.current.as_deref(), Some("open"));
        assert_eq!(snapshot.steps, 1);
        assert_eq!(snapshot.pending, 1);
        assert_eq!(snapshot.states, vec!["closed", "open"]);
    }

    #[test]
    fn snapshot_roundtrips_through_json() {
        let mut machine = Machine::<u8, ()>::new(Arc::new(()));
        machine.create_state("only").unwrap();
        machine.stop();

        let snapshot = machine.snapshot();
        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"phase\": \"stopped\""));

        let parsed = super::MachineSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed, snapshot);
    }

    #[test]
    fn malformed_snapshot_is_a_serialization_error() {
        let result = super::MachineSnapshot::from_json("[]");
        assert!(matches!(result, Err(MachineError::Serialization(_))));
    }
}
