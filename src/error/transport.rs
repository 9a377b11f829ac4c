//! Errors raised while dialing or driving the real-time channel.

use thiserror::Error;

use super::category::ErrorCategory;

/// Transport-level failures reported by a [`Connector`](crate::traits::Connector)
/// or an open [`ChannelHandle`](crate::traits::ChannelHandle).
///
/// None of these reach the user directly: the session converts them into a
/// synthesized close and lets the backoff policy decide what happens next.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// TCP/TLS dial or WebSocket handshake failed.
    #[error("failed to connect to {url}: {message}")]
    Dial { url: String, message: String },

    /// The server answered the upgrade request with an HTTP error status.
    #[error("handshake rejected with HTTP {status}")]
    HandshakeRejected { status: u16 },

    /// Writing a frame to the socket failed.
    #[error("send failed: {0}")]
    Send(String),

    /// The channel URL could not be built.
    #[error("invalid channel url: {0}")]
    InvalidUrl(String),

    /// Operation attempted on a channel that is already closed.
    #[error("channel closed")]
    Closed,
}

impl TransportError {
    /// Whether the server refused the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, TransportError::HandshakeRejected { status: 401 | 403 })
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            TransportError::HandshakeRejected { .. } if self.is_unauthorized() => ErrorCategory::Auth,
            TransportError::HandshakeRejected { status } if *status >= 500 => ErrorCategory::Server,
            TransportError::HandshakeRejected { .. } => ErrorCategory::Client,
            TransportError::InvalidUrl(_) => ErrorCategory::Configuration,
            TransportError::Dial { .. } | TransportError::Send(_) | TransportError::Closed => {
                ErrorCategory::Network
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::Dial { .. } => "E_WS_DIAL",
            TransportError::HandshakeRejected { .. } => "E_WS_HANDSHAKE",
            TransportError::Send(_) => "E_WS_SEND",
            TransportError::InvalidUrl(_) => "E_WS_URL",
            TransportError::Closed => "E_WS_CLOSED",
        }
    }
}
