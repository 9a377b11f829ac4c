use serde::{Deserialize, Serialize};

/// A loaded MIB module as listed by the browser endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MibModule {
    pub name: String,
    /// Number of objects the module defines
    #[serde(default)]
    pub objects: u64,
}
