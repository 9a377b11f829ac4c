//! Bounded, deduplicated, persisted client-side history.
//!
//! | Store | Key | Cap |
//! |-------|-----|-----|
//! | Simulator log | `trishul_sim_logs` | 50 |
//! | Received traps | `trishul_received_traps` | 100 |
//! | Recent walk targets | `trishul_recent_targets` | 10 |
//! | Module UI state | `trishul_ui_state_<module>` | 1 |

mod recent;
mod store;
mod ui_state;

pub use recent::{RecentTarget, RecentTargets, RECENT_TARGETS_CAPACITY, RECENT_TARGETS_KEY};
pub use store::{HistoryRecord, HistoryStore};
pub use ui_state::{UiStateStore, UI_STATE_KEY_PREFIX};

use crate::models::{LogLine, TrapRecord};

pub const TRAP_HISTORY_KEY: &str = "trishul_received_traps";
pub const TRAP_HISTORY_CAPACITY: usize = 100;
pub const LOG_HISTORY_KEY: &str = "trishul_sim_logs";
pub const LOG_HISTORY_CAPACITY: usize = 50;

impl HistoryRecord for TrapRecord {
    /// Bit pattern of the receive timestamp.
    type Id = u64;

    fn identity(&self) -> u64 {
        self.timestamp.to_bits()
    }

    fn recency(&self) -> f64 {
        self.timestamp
    }
}

impl HistoryRecord for LogLine {
    type Id = (u64, String);

    fn identity(&self) -> (u64, String) {
        (self.timestamp.to_bits(), self.message.clone())
    }

    fn recency(&self) -> f64 {
        self.timestamp
    }
}
