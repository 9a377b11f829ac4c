//! Real-time channel trait abstraction.
//!
//! A [`Connector`] dials the channel URL and hands back a [`ChannelHandle`]:
//! a pair of queues pumped by the adapter. The transport driver never touches
//! the socket itself, which keeps it testable against a scripted connector.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Frame or instruction written to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Plain text frame.
    Text(String),
    /// Close the channel with the given code and reason.
    Close { code: u16, reason: String },
}

/// Frame or lifecycle notice read from the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Plain text frame.
    Text(String),
    /// The channel closed. Adapters synthesize code 1006 when the socket
    /// ends without a close frame.
    Closed { code: u16, reason: String },
}

/// An open channel, represented by its two pump queues.
///
/// Dropping the handle drops the outbound sender, which makes the adapter
/// close the underlying socket.
#[derive(Debug)]
pub struct ChannelHandle {
    pub outbound: mpsc::UnboundedSender<Outbound>,
    pub inbound: mpsc::UnboundedReceiver<Inbound>,
}

impl ChannelHandle {
    pub fn new(
        outbound: mpsc::UnboundedSender<Outbound>,
        inbound: mpsc::UnboundedReceiver<Inbound>,
    ) -> Self {
        Self { outbound, inbound }
    }

    /// Queue a text frame.
    pub fn send_text(&self, text: &str) -> Result<(), TransportError> {
        self.outbound
            .send(Outbound::Text(text.to_string()))
            .map_err(|_| TransportError::Closed)
    }

    /// Queue a close instruction.
    pub fn close(&self, code: u16, reason: &str) -> Result<(), TransportError> {
        self.outbound
            .send(Outbound::Close {
                code,
                reason: reason.to_string(),
            })
            .map_err(|_| TransportError::Closed)
    }
}

/// Trait for dialing the real-time channel.
///
/// A successful return means the channel is open; the session treats it as
/// the transition to `Online`.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a channel to `url`.
    async fn connect(&self, url: &str) -> Result<ChannelHandle, TransportError>;
}
