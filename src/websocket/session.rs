//! Transport session state machine.
//!
//! [`Session`] performs no I/O. Every input (a caller request, a dial
//! outcome, an inbound frame, a close, a timer firing) returns the list of
//! [`Action`]s the driver must carry out. Each dial is tagged with an
//! [`AttemptId`]; inputs for any attempt other than the live one are stale
//! and ignored, which is what keeps a superseded or abandoned channel from
//! resurrecting the session.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::backoff::Backoff;
use super::messages::{
    decode_frame, Decoded, CLOSE_ABNORMAL, CLOSE_NORMAL, CLOSE_PROBE_TIMEOUT, CLOSE_UNAUTHORIZED,
    PROBE_FRAME, REASON_LOGOUT, REASON_PROBE_TIMEOUT, REASON_RECONNECT,
};
use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::events::{CloseInfo, Event, EventPayload};
use crate::traits::Clock;

/// Identifies one dial of the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Online,
    Offline,
    Unauthorized,
}

impl ConnectionState {
    pub fn indicator(&self) -> Connectivity {
        match self {
            ConnectionState::Connecting => Connectivity::Connecting,
            ConnectionState::Online => Connectivity::Online,
            ConnectionState::Disconnected | ConnectionState::Offline => Connectivity::Offline,
            ConnectionState::Unauthorized => Connectivity::Unauthorized,
        }
    }
}

/// Connection indicator value surfaced to the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Connectivity {
    Connecting,
    Online,
    Offline,
    Unauthorized,
}

impl Connectivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Connecting => "connecting",
            Connectivity::Online => "online",
            Connectivity::Offline => "offline",
            Connectivity::Unauthorized => "unauthorized",
        }
    }

    /// Short label for a status bar.
    pub fn label(&self) -> &'static str {
        match self {
            Connectivity::Connecting => "WS: Connecting…",
            Connectivity::Online => "WS: Live",
            Connectivity::Offline => "WS: Offline",
            Connectivity::Unauthorized => "WS: Unauthorized",
        }
    }
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Interval between liveness probes.
    Heartbeat,
    /// Deadline for the reply to the last probe.
    ProbeTimeout,
    /// Backoff wait before the next dial.
    Reconnect,
}

/// Effect requested by the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Dial { attempt: AttemptId, url: String },
    Send { attempt: AttemptId, frame: String },
    Close {
        attempt: AttemptId,
        code: u16,
        reason: String,
    },
    /// Arm `timer`, replacing any outstanding instance of the same kind.
    StartTimer { timer: TimerKind, after: Duration },
    CancelTimer(TimerKind),
    Publish(Event),
    Indicate(Connectivity),
}

pub struct Session {
    config: TransportConfig,
    clock: Arc<dyn Clock>,
    state: ConnectionState,
    token: Option<String>,
    backoff: Backoff,
    intentional: bool,
    live: Option<AttemptId>,
    next_attempt: u64,
    armed: HashSet<TimerKind>,
}

impl Session {
    pub fn new(config: TransportConfig, clock: Arc<dyn Clock>) -> Self {
        let backoff = Backoff::new(config.backoff_base, config.backoff_ceiling);
        Self {
            config,
            clock,
            state: ConnectionState::Disconnected,
            token: None,
            backoff,
            intentional: false,
            live: None,
            next_attempt: 1,
            armed: HashSet::new(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether the channel is currently open.
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Online
    }

    pub fn is_intentional(&self) -> bool {
        self.intentional
    }

    /// Delay the next scheduled reconnect will wait.
    pub fn reconnect_delay(&self) -> Duration {
        self.backoff.current()
    }

    pub fn live_attempt(&self) -> Option<AttemptId> {
        self.live
    }

    pub fn is_current(&self, attempt: AttemptId) -> bool {
        self.live == Some(attempt)
    }

    pub fn is_timer_pending(&self, timer: TimerKind) -> bool {
        self.armed.contains(&timer)
    }

    /// Start a fresh attempt chain with `token`, closing any live attempt.
    pub fn connect(&mut self, token: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        if token.is_empty() {
            warn!("connect called without a token, ignoring");
            return actions;
        }

        if let Some(attempt) = self.live.take() {
            debug!("closing attempt {} before reconnecting", attempt);
            actions.push(Action::Close {
                attempt,
                code: CLOSE_NORMAL,
                reason: REASON_RECONNECT.to_string(),
            });
        }
        self.cancel_all_timers(&mut actions);

        self.token = Some(token.to_string());
        self.intentional = false;
        self.backoff.reset();
        self.begin_attempt(&mut actions);
        actions
    }

    /// End the session on request. Nothing reconnects afterwards.
    pub fn disconnect(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        self.intentional = true;
        self.cancel_all_timers(&mut actions);

        let was_online = self.state == ConnectionState::Online;
        if let Some(attempt) = self.live.take() {
            actions.push(Action::Close {
                attempt,
                code: CLOSE_NORMAL,
                reason: REASON_LOGOUT.to_string(),
            });
            if was_online {
                actions.push(self.close_event(CLOSE_NORMAL, REASON_LOGOUT));
            }
        }

        self.token = None;
        self.transition(ConnectionState::Disconnected, &mut actions);
        actions
    }

    /// The dial for `attempt` produced an open channel.
    pub fn on_open(&mut self, attempt: AttemptId) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.is_current(attempt) {
            debug!("ignoring open of stale attempt {}", attempt);
            return actions;
        }

        self.backoff.reset();
        self.transition(ConnectionState::Online, &mut actions);
        self.start_timer(TimerKind::Heartbeat, self.config.heartbeat_interval, &mut actions);
        actions.push(Action::Publish(Event::new(EventPayload::Open, self.clock.now())));
        actions
    }

    /// The dial for `attempt` failed before the channel opened.
    pub fn on_dial_failed(&mut self, attempt: AttemptId, error: &TransportError) -> Vec<Action> {
        if error.is_unauthorized() {
            self.on_closed(attempt, CLOSE_UNAUTHORIZED, &error.to_string())
        } else {
            self.on_closed(attempt, CLOSE_ABNORMAL, &error.to_string())
        }
    }

    pub fn on_frame(&mut self, attempt: AttemptId, text: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.is_current(attempt) {
            debug!("ignoring frame from stale attempt {}", attempt);
            return actions;
        }

        match decode_frame(text) {
            Decoded::Reply => {
                debug!("liveness reply on attempt {}", attempt);
                self.cancel_timer(TimerKind::ProbeTimeout, &mut actions);
            }
            Decoded::Message(payload) => {
                actions.push(Action::Publish(Event::new(payload, self.clock.now())));
            }
            Decoded::Dropped => {}
        }
        actions
    }

    /// The channel of `attempt` closed.
    pub fn on_closed(&mut self, attempt: AttemptId, code: u16, reason: &str) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.is_current(attempt) {
            debug!("ignoring close {} of stale attempt {}", code, attempt);
            return actions;
        }
        self.live = None;
        self.end_attempt(attempt, code, reason, &mut actions);
        actions
    }

    pub fn on_timer(&mut self, timer: TimerKind) -> Vec<Action> {
        let mut actions = Vec::new();
        if !self.armed.remove(&timer) {
            debug!("ignoring {:?} timer that is no longer armed", timer);
            return actions;
        }

        match timer {
            TimerKind::Heartbeat => {
                let Some(attempt) = self.live.filter(|_| self.state == ConnectionState::Online)
                else {
                    return actions;
                };
                debug!("sending liveness probe on attempt {}", attempt);
                actions.push(Action::Send {
                    attempt,
                    frame: PROBE_FRAME.to_string(),
                });
                self.start_timer(TimerKind::ProbeTimeout, self.config.probe_timeout, &mut actions);
                self.start_timer(TimerKind::Heartbeat, self.config.heartbeat_interval, &mut actions);
            }
            TimerKind::ProbeTimeout => {
                let Some(attempt) = self.live.take() else {
                    return actions;
                };
                warn!("no liveness reply on attempt {}, closing", attempt);
                actions.push(Action::Close {
                    attempt,
                    code: CLOSE_PROBE_TIMEOUT,
                    reason: REASON_PROBE_TIMEOUT.to_string(),
                });
                self.end_attempt(attempt, CLOSE_PROBE_TIMEOUT, REASON_PROBE_TIMEOUT, &mut actions);
            }
            TimerKind::Reconnect => {
                if self.intentional || self.live.is_some() {
                    return actions;
                }
                self.begin_attempt(&mut actions);
            }
        }
        actions
    }

    fn begin_attempt(&mut self, actions: &mut Vec<Action>) {
        let Some(token) = self.token.as_deref() else {
            return;
        };
        let attempt = AttemptId(self.next_attempt);
        self.next_attempt += 1;
        let url = self.config.channel_url(token);

        self.live = Some(attempt);
        self.transition(ConnectionState::Connecting, actions);
        actions.push(Action::Dial { attempt, url });
    }

    fn end_attempt(&mut self, attempt: AttemptId, code: u16, reason: &str, actions: &mut Vec<Action>) {
        self.cancel_timer(TimerKind::Heartbeat, actions);
        self.cancel_timer(TimerKind::ProbeTimeout, actions);
        actions.push(self.close_event(code, reason));

        if code == CLOSE_UNAUTHORIZED {
            warn!("attempt {} rejected as unauthorized", attempt);
            self.cancel_timer(TimerKind::Reconnect, actions);
            self.transition(ConnectionState::Unauthorized, actions);
            return;
        }

        self.transition(ConnectionState::Offline, actions);
        if self.intentional || self.token.is_none() {
            return;
        }
        let delay = self.backoff.next_delay();
        info!(
            "attempt {} closed with {} ({}), reconnecting in {:?}",
            attempt, code, reason, delay
        );
        self.start_timer(TimerKind::Reconnect, delay, actions);
    }

    fn close_event(&self, code: u16, reason: &str) -> Action {
        Action::Publish(Event::new(
            EventPayload::Close(CloseInfo {
                code,
                reason: reason.to_string(),
            }),
            self.clock.now(),
        ))
    }

    fn transition(&mut self, next: ConnectionState, actions: &mut Vec<Action>) {
        if self.state == next {
            return;
        }
        info!("transport {:?} -> {:?}", self.state, next);
        self.state = next;
        actions.push(Action::Indicate(next.indicator()));
    }

    fn start_timer(&mut self, timer: TimerKind, after: Duration, actions: &mut Vec<Action>) {
        self.armed.insert(timer);
        actions.push(Action::StartTimer { timer, after });
    }

    fn cancel_timer(&mut self, timer: TimerKind, actions: &mut Vec<Action>) {
        if self.armed.remove(&timer) {
            actions.push(Action::CancelTimer(timer));
        }
    }

    fn cancel_all_timers(&mut self, actions: &mut Vec<Action>) {
        for timer in [TimerKind::Heartbeat, TimerKind::ProbeTimeout, TimerKind::Reconnect] {
            self.cancel_timer(timer, actions);
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("intentional", &self.intentional)
            .field("live", &self.live)
            .field("reconnect_delay", &self.backoff.current())
            .field("armed", &self.armed)
            .finish()
    }
}
