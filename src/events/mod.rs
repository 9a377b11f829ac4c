//! Typed notifications produced by the transport session.
//!
//! An [`Event`] is immutable once built. The closed set of kinds is
//! [`EventKind`]; each kind carries exactly one payload shape.

mod bus;

pub use bus::{EventBus, HandlerError, HandlerResult, Subscription};

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{LogLine, StatusSnapshot, TrapRecord};

/// The closed set of event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Close,
    Status,
    FullState,
    Trap,
    Log,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::Open,
        EventKind::Close,
        EventKind::Status,
        EventKind::FullState,
        EventKind::Trap,
        EventKind::Log,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Open => "open",
            EventKind::Close => "close",
            EventKind::Status => "status",
            EventKind::FullState => "full_state",
            EventKind::Trap => "trap",
            EventKind::Log => "log",
        }
    }

    /// Resolve the `type` field of a structured message.
    ///
    /// `open` and `close` are lifecycle kinds synthesized locally and are
    /// never accepted from the wire.
    pub fn from_message_type(value: &str) -> Option<Self> {
        match value {
            "status" => Some(EventKind::Status),
            "full_state" => Some(EventKind::FullState),
            "trap" => Some(EventKind::Trap),
            "log" => Some(EventKind::Log),
            _ => None,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Code and reason of an observed close.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseInfo {
    pub code: u16,
    pub reason: String,
}

/// Body of a `trap` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrapPush {
    pub trap: TrapRecord,
}

/// Body of a `log` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPush {
    pub line: LogLine,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Open,
    Close(CloseInfo),
    Status(StatusSnapshot),
    FullState(StatusSnapshot),
    Trap(TrapPush),
    Log(LogPush),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            EventPayload::Open => EventKind::Open,
            EventPayload::Close(_) => EventKind::Close,
            EventPayload::Status(_) => EventKind::Status,
            EventPayload::FullState(_) => EventKind::FullState,
            EventPayload::Trap(_) => EventKind::Trap,
            EventPayload::Log(_) => EventKind::Log,
        }
    }
}

/// A notification as delivered to bus subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    payload: EventPayload,
    received_at: DateTime<Utc>,
}

impl Event {
    pub fn new(payload: EventPayload, received_at: DateTime<Utc>) -> Self {
        Self {
            payload,
            received_at,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    pub fn payload(&self) -> &EventPayload {
        &self.payload
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// Status snapshot carried by `status` and `full_state` events.
    pub fn status(&self) -> Option<&StatusSnapshot> {
        match &self.payload {
            EventPayload::Status(s) | EventPayload::FullState(s) => Some(s),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_kinds_not_accepted_from_wire() {
        assert_eq!(EventKind::from_message_type("open"), None);
        assert_eq!(EventKind::from_message_type("close"), None);
        assert_eq!(
            EventKind::from_message_type("full_state"),
            Some(EventKind::FullState)
        );
    }

    #[test]
    fn test_kind_names_round_trip() {
        for kind in EventKind::ALL {
            if matches!(kind, EventKind::Open | EventKind::Close) {
                continue;
            }
            assert_eq!(EventKind::from_message_type(kind.as_str()), Some(kind));
        }
    }

    #[test]
    fn test_status_accessor() {
        let at = Utc::now();
        let status = Event::new(EventPayload::FullState(StatusSnapshot::default()), at);
        assert_eq!(status.kind(), EventKind::FullState);
        assert!(status.status().is_some());

        let open = Event::new(EventPayload::Open, at);
        assert!(open.status().is_none());
        assert_eq!(open.received_at(), at);
    }
}
