//! Scripted channel connector for testing.
//!
//! Every accepted dial produces a [`MockServer`], the far end of the
//! channel, which the test uses to push frames, close the channel and
//! observe what the client sent.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::lock;
use crate::error::TransportError;
use crate::traits::{ChannelHandle, Connector, Inbound, Outbound};

/// Outcome of one scripted dial.
#[derive(Debug, Clone)]
pub enum DialScript {
    Accept,
    Reject(TransportError),
}

/// Mock [`Connector`].
///
/// Dials consume the script front to back; once it is empty every dial is
/// accepted.
///
/// # Example
///
/// ```ignore
/// use trishul_link::adapters::mock::{DialScript, MockConnector};
///
/// let connector = MockConnector::new();
/// connector.script(DialScript::Reject(TransportError::HandshakeRejected { status: 401 }));
/// ```
pub struct MockConnector {
    script: Mutex<VecDeque<DialScript>>,
    dialed: Mutex<Vec<String>>,
    accepted_tx: mpsc::UnboundedSender<MockServer>,
    accepted_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<MockServer>>,
}

impl MockConnector {
    pub fn new() -> Self {
        let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
        Self {
            script: Mutex::new(VecDeque::new()),
            dialed: Mutex::new(Vec::new()),
            accepted_tx,
            accepted_rx: tokio::sync::Mutex::new(accepted_rx),
        }
    }

    /// Queue the outcome of a future dial.
    pub fn script(&self, outcome: DialScript) {
        lock(&self.script).push_back(outcome);
    }

    /// URLs of every dial so far, accepted or not.
    pub fn dialed_urls(&self) -> Vec<String> {
        lock(&self.dialed).clone()
    }

    pub fn dial_count(&self) -> usize {
        lock(&self.dialed).len()
    }

    /// Wait for the next accepted channel.
    pub async fn accepted(&self) -> Option<MockServer> {
        self.accepted_rx.lock().await.recv().await
    }

    /// Take the next accepted channel if one is already waiting.
    pub fn try_accepted(&self) -> Option<MockServer> {
        self.accepted_rx.try_lock().ok()?.try_recv().ok()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str) -> Result<ChannelHandle, TransportError> {
        lock(&self.dialed).push(url.to_string());

        let outcome = lock(&self.script).pop_front().unwrap_or(DialScript::Accept);
        if let DialScript::Reject(err) = outcome {
            return Err(err);
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let server = MockServer {
            url: url.to_string(),
            to_client: inbound_tx,
            from_client: outbound_rx,
        };
        self.accepted_tx
            .send(server)
            .map_err(|_| TransportError::Closed)?;

        Ok(ChannelHandle::new(outbound_tx, inbound_rx))
    }
}

/// Server end of a mock channel.
///
/// Dropping it looks to the client like the socket vanished.
#[derive(Debug)]
pub struct MockServer {
    pub url: String,
    to_client: mpsc::UnboundedSender<Inbound>,
    from_client: mpsc::UnboundedReceiver<Outbound>,
}

impl MockServer {
    /// Push a text frame to the client.
    pub fn send_text(&self, text: &str) -> bool {
        self.to_client.send(Inbound::Text(text.to_string())).is_ok()
    }

    /// Close the channel from the server side.
    pub fn close(&self, code: u16, reason: &str) -> bool {
        self.to_client
            .send(Inbound::Closed {
                code,
                reason: reason.to_string(),
            })
            .is_ok()
    }

    /// Wait for the next thing the client sent. `None` once the client
    /// dropped its end.
    pub async fn recv(&mut self) -> Option<Outbound> {
        self.from_client.recv().await
    }

    /// Everything the client has sent so far.
    pub fn drain(&mut self) -> Vec<Outbound> {
        let mut sent = Vec::new();
        while let Ok(outbound) = self.from_client.try_recv() {
            sent.push(outbound);
        }
        sent
    }
}
