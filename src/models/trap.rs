use serde::{Deserialize, Serialize};

/// One SNMP trap as recorded by the backend receiver.
///
/// `timestamp` is seconds since the epoch with sub-second precision and is
/// unique per received trap, so it doubles as the deduplication identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrapRecord {
    pub timestamp: f64,
    #[serde(default)]
    pub time_str: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trap_type: Option<String>,
    #[serde(default)]
    pub varbinds: serde_json::Value,
    #[serde(default)]
    pub resolved: bool,
}

impl TrapRecord {
    /// Source host without the `:port` suffix.
    pub fn source_host(&self) -> &str {
        match self.source.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
            _ => &self.source,
        }
    }
}
