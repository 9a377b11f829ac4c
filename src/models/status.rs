use serde::{Deserialize, Serialize};

/// State of the SNMP agent simulator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    /// `H:MM:SS` since start, while running
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<String>,
}

/// State of the trap receiver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverStatus {
    #[serde(default)]
    pub running: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_mibs: Option<bool>,
}

/// Body of `status` and `full_state` messages.
///
/// Either half may be absent; an absent half means "unchanged", not "stopped".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simulator: Option<SimulatorStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traps: Option<ReceiverStatus>,
}

impl StatusSnapshot {
    /// Overlay the halves present in `other`.
    pub fn apply(&mut self, other: &StatusSnapshot) {
        if let Some(simulator) = &other.simulator {
            self.simulator = Some(simulator.clone());
        }
        if let Some(traps) = &other.traps {
            self.traps = Some(traps.clone());
        }
    }
}
