//! Real-time transport.
//!
//! One authenticated, heartbeat-monitored, reconnecting channel per process.
//! [`Session`] holds the state machine and [`Transport`] drives it on tokio.

pub mod backoff;
pub mod client;
pub mod messages;
pub mod session;

pub use backoff::Backoff;
pub use client::{Notice, Transport};
pub use messages::{decode_frame, Decoded};
pub use session::{Action, AttemptId, ConnectionState, Connectivity, Session, TimerKind};
