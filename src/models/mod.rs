//! Wire models carried by structured channel messages and re-seed responses.

mod log;
mod mib;
mod status;
mod trap;

pub use log::{LogLevel, LogLine};
pub use mib::MibModule;
pub use status::{ReceiverStatus, SimulatorStatus, StatusSnapshot};
pub use trap::TrapRecord;
