//! Tokio driver for the transport [`Session`].
//!
//! The driver owns the open channel and the timers; the session owns every
//! decision. Caller requests (`connect`, `disconnect`) are applied to the
//! session synchronously under its lock, so by the time `disconnect()`
//! returns the session is already intentional and its timers disarmed. The
//! resulting actions are then handed to the driver task to perform.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, warn};

use super::messages::{CLOSE_ABNORMAL, CLOSE_NORMAL, REASON_RECONNECT};
use super::session::{Action, AttemptId, ConnectionState, Connectivity, Session, TimerKind};
use crate::config::TransportConfig;
use crate::error::TransportError;
use crate::events::Event;
use crate::traits::{ChannelHandle, Clock, Connector, Inbound};

/// Output of the transport, drained by the application root.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Event(Event),
    Connectivity(Connectivity),
}

enum Command {
    Execute(Vec<Action>),
}

struct DialOutcome {
    attempt: AttemptId,
    result: Result<ChannelHandle, TransportError>,
}

struct LiveChannel {
    attempt: AttemptId,
    handle: ChannelHandle,
}

fn lock(session: &Mutex<Session>) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Handle to the single process-wide transport.
///
/// Dropping the handle stops the driver and closes any open channel.
pub struct Transport {
    session: Arc<Mutex<Session>>,
    commands: mpsc::UnboundedSender<Command>,
    connectivity: watch::Receiver<Connectivity>,
    task: JoinHandle<()>,
}

impl Transport {
    /// Start the driver task. Must be called inside a tokio runtime.
    pub fn spawn(
        config: TransportConfig,
        connector: Arc<dyn Connector>,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let session = Arc::new(Mutex::new(Session::new(config, clock)));
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (notices_tx, notices_rx) = mpsc::unbounded_channel();
        let (dial_tx, dial_rx) = mpsc::unbounded_channel();
        let (connectivity_tx, connectivity_rx) = watch::channel(Connectivity::Offline);

        let driver = Driver {
            session: Arc::clone(&session),
            connector,
            commands: commands_rx,
            dial_tx,
            dial_rx,
            notices: notices_tx,
            connectivity: connectivity_tx,
            live: None,
            timers: Timers::default(),
        };
        let task = tokio::spawn(driver.run());

        let transport = Self {
            session,
            commands: commands_tx,
            connectivity: connectivity_rx,
            task,
        };
        (transport, notices_rx)
    }

    pub fn connect(&self, token: &str) {
        let actions = lock(&self.session).connect(token);
        self.execute(actions);
    }

    pub fn disconnect(&self) {
        let actions = lock(&self.session).disconnect();
        self.execute(actions);
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.session).is_connected()
    }

    pub fn state(&self) -> ConnectionState {
        lock(&self.session).state()
    }

    pub fn is_timer_pending(&self, timer: TimerKind) -> bool {
        lock(&self.session).is_timer_pending(timer)
    }

    pub fn reconnect_delay(&self) -> Duration {
        lock(&self.session).reconnect_delay()
    }

    /// Subscribe to indicator changes.
    pub fn connectivity_receiver(&self) -> watch::Receiver<Connectivity> {
        self.connectivity.clone()
    }

    /// Disconnect, then wait for the driver to close the channel and exit.
    pub async fn shutdown(self) {
        self.disconnect();
        let Transport { commands, task, .. } = self;
        drop(commands);
        if let Err(e) = task.await {
            warn!("transport driver ended abnormally: {}", e);
        }
    }

    fn execute(&self, actions: Vec<Action>) {
        if actions.is_empty() {
            return;
        }
        if self.commands.send(Command::Execute(actions)).is_err() {
            warn!("transport driver is gone, dropping actions");
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("session", &*lock(&self.session))
            .finish()
    }
}

/// Deadlines of the armed timers, at most one per kind.
#[derive(Default)]
struct Timers {
    deadlines: HashMap<TimerKind, Instant>,
}

impl Timers {
    fn arm(&mut self, timer: TimerKind, after: Duration) {
        self.deadlines.insert(timer, Instant::now() + after);
    }

    fn cancel(&mut self, timer: TimerKind) {
        self.deadlines.remove(&timer);
    }

    /// Resolves when the earliest armed timer is due.
    async fn next_due(&self) -> TimerKind {
        let earliest = self
            .deadlines
            .iter()
            .min_by_key(|(_, at)| **at)
            .map(|(kind, at)| (*kind, *at));
        match earliest {
            Some((kind, at)) => {
                sleep_until(at).await;
                kind
            }
            None => std::future::pending().await,
        }
    }
}

struct Driver {
    session: Arc<Mutex<Session>>,
    connector: Arc<dyn Connector>,
    commands: mpsc::UnboundedReceiver<Command>,
    dial_tx: mpsc::UnboundedSender<DialOutcome>,
    dial_rx: mpsc::UnboundedReceiver<DialOutcome>,
    notices: mpsc::UnboundedSender<Notice>,
    connectivity: watch::Sender<Connectivity>,
    live: Option<LiveChannel>,
    timers: Timers,
}

impl Driver {
    async fn run(mut self) {
        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(Command::Execute(actions)) => self.execute(actions),
                    None => break,
                },
                Some(outcome) = self.dial_rx.recv() => self.on_dial(outcome),
                (attempt, inbound) = next_inbound(&mut self.live) => {
                    self.on_inbound(attempt, inbound);
                }
                timer = self.timers.next_due() => {
                    self.timers.cancel(timer);
                    let actions = lock(&self.session).on_timer(timer);
                    self.execute(actions);
                }
            }
        }

        if let Some(live) = self.live.take() {
            let _ = live.handle.close(CLOSE_NORMAL, "shutdown");
        }
        debug!("transport driver stopped");
    }

    fn on_dial(&mut self, outcome: DialOutcome) {
        let DialOutcome { attempt, result } = outcome;
        let actions = {
            let mut session = lock(&self.session);
            if !session.is_current(attempt) {
                if let Ok(handle) = result {
                    debug!("closing channel of superseded attempt {}", attempt);
                    let _ = handle.close(CLOSE_NORMAL, REASON_RECONNECT);
                }
                return;
            }
            match result {
                Ok(handle) => {
                    self.live = Some(LiveChannel { attempt, handle });
                    session.on_open(attempt)
                }
                Err(e) => {
                    warn!(
                        "dial of attempt {} failed [{}, {}]: {}",
                        attempt,
                        e.error_code(),
                        e.category(),
                        e
                    );
                    session.on_dial_failed(attempt, &e)
                }
            }
        };
        self.execute(actions);
    }

    fn on_inbound(&mut self, attempt: AttemptId, inbound: Option<Inbound>) {
        let actions = {
            let mut session = lock(&self.session);
            match inbound {
                Some(Inbound::Text(text)) => session.on_frame(attempt, &text),
                Some(Inbound::Closed { code, reason }) => {
                    self.live = None;
                    session.on_closed(attempt, code, &reason)
                }
                None => {
                    self.live = None;
                    session.on_closed(attempt, CLOSE_ABNORMAL, "channel ended")
                }
            }
        };
        self.execute(actions);
    }

    fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::Dial { attempt, url } => {
                    debug!("dialing attempt {}", attempt);
                    let connector = Arc::clone(&self.connector);
                    let dial_tx = self.dial_tx.clone();
                    tokio::spawn(async move {
                        let result = connector.connect(&url).await;
                        let _ = dial_tx.send(DialOutcome { attempt, result });
                    });
                }
                Action::Send { attempt, frame } => match &self.live {
                    Some(live) if live.attempt == attempt => {
                        if let Err(e) = live.handle.send_text(&frame) {
                            warn!("send on attempt {} failed: {}", attempt, e);
                        }
                    }
                    _ => debug!("dropping frame for inactive attempt {}", attempt),
                },
                Action::Close {
                    attempt,
                    code,
                    reason,
                } => {
                    if self.live.as_ref().is_some_and(|l| l.attempt == attempt) {
                        if let Some(live) = self.live.take() {
                            let _ = live.handle.close(code, &reason);
                        }
                    }
                }
                Action::StartTimer { timer, after } => {
                    debug!("arming {:?} timer for {:?}", timer, after);
                    self.timers.arm(timer, after);
                }
                Action::CancelTimer(timer) => self.timers.cancel(timer),
                Action::Publish(event) => {
                    let _ = self.notices.send(Notice::Event(event));
                }
                Action::Indicate(state) => {
                    self.connectivity.send_replace(state);
                    let _ = self.notices.send(Notice::Connectivity(state));
                }
            }
        }
    }
}

async fn next_inbound(live: &mut Option<LiveChannel>) -> (AttemptId, Option<Inbound>) {
    match live {
        Some(channel) => {
            let inbound = channel.handle.inbound.recv().await;
            (channel.attempt, inbound)
        }
        None => std::future::pending().await,
    }
}
