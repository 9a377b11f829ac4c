//! Channel frame decoding.
//!
//! A text frame is either the liveness reply marker or a structured JSON
//! message `{type, ...fields}`. Decode failures are dropped here and never
//! leave this module.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::events::{EventKind, EventPayload, LogPush, TrapPush};
use crate::models::StatusSnapshot;

/// Liveness probe sent by the client.
pub const PROBE_FRAME: &str = "ping";
/// Liveness reply sent by the server.
pub const REPLY_FRAME: &str = "pong";

pub const CLOSE_NORMAL: u16 = 1000;
pub const CLOSE_ABNORMAL: u16 = 1006;
pub const CLOSE_PROBE_TIMEOUT: u16 = 4000;
pub const CLOSE_UNAUTHORIZED: u16 = 4001;

pub const REASON_RECONNECT: &str = "reconnect";
pub const REASON_LOGOUT: &str = "logout";
pub const REASON_PROBE_TIMEOUT: &str = "pong timeout";

/// Result of decoding one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// The liveness reply marker.
    Reply,
    /// A recognized structured message.
    Message(EventPayload),
    /// Malformed, untyped or unknown; already logged.
    Dropped,
}

pub fn decode_frame(text: &str) -> Decoded {
    if text == REPLY_FRAME {
        return Decoded::Reply;
    }

    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!("dropping malformed frame: {}", e);
            return Decoded::Dropped;
        }
    };

    let Some(kind) = value
        .get("type")
        .and_then(Value::as_str)
        .and_then(EventKind::from_message_type)
    else {
        debug!("ignoring frame with unrecognized type: {:?}", value.get("type"));
        return Decoded::Dropped;
    };

    let payload = match kind {
        EventKind::Status => body::<StatusSnapshot>(kind, value).map(EventPayload::Status),
        EventKind::FullState => body::<StatusSnapshot>(kind, value).map(EventPayload::FullState),
        EventKind::Trap => body::<TrapPush>(kind, value).map(EventPayload::Trap),
        EventKind::Log => body::<LogPush>(kind, value).map(EventPayload::Log),
        EventKind::Open | EventKind::Close => None,
    };

    payload.map(Decoded::Message).unwrap_or(Decoded::Dropped)
}

fn body<T: DeserializeOwned>(kind: EventKind, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(body) => Some(body),
        Err(e) => {
            warn!("dropping malformed {} message: {}", kind, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_marker() {
        assert_eq!(decode_frame("pong"), Decoded::Reply);
        // The probe marker is never echoed back as an event either.
        assert_eq!(decode_frame("ping"), Decoded::Dropped);
    }

    #[test]
    fn test_status_message() {
        let decoded = decode_frame(r#"{"type":"status","simulator":{"running":true,"port":1161}}"#);
        match decoded {
            Decoded::Message(EventPayload::Status(snapshot)) => {
                let simulator = snapshot.simulator.unwrap();
                assert!(simulator.running);
                assert_eq!(simulator.port, Some(1161));
                assert!(snapshot.traps.is_none());
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_trap_message() {
        let decoded = decode_frame(
            r#"{"type":"trap","trap":{"timestamp":1700000000.5,"source":"10.0.0.9:162","trap_type":"coldStart","varbinds":[]}}"#,
        );
        match decoded {
            Decoded::Message(EventPayload::Trap(push)) => {
                assert_eq!(push.trap.timestamp, 1700000000.5);
                assert_eq!(push.trap.trap_type.as_deref(), Some("coldStart"));
            }
            other => panic!("unexpected decode: {:?}", other),
        }
    }

    #[test]
    fn test_log_message() {
        let decoded =
            decode_frame(r#"{"type":"log","line":{"timestamp":3.0,"level":"error","message":"bind failed"}}"#);
        assert!(matches!(decoded, Decoded::Message(EventPayload::Log(_))));
    }

    #[test]
    fn test_unknown_and_malformed_frames_dropped() {
        assert_eq!(decode_frame(r#"{"type":"walk_progress","pct":40}"#), Decoded::Dropped);
        assert_eq!(decode_frame(r#"{"no_type":true}"#), Decoded::Dropped);
        assert_eq!(decode_frame("{not json"), Decoded::Dropped);
        assert_eq!(decode_frame(r#"{"type":"trap","trap":{"source":"x"}}"#), Decoded::Dropped);
        assert_eq!(decode_frame(r#"{"type":"open"}"#), Decoded::Dropped);
    }
}
