//! Tungstenite-based channel adapter.
//!
//! Each successful dial spawns a pump task that moves frames between the
//! socket and the [`ChannelHandle`] queues. The pump ends when either side
//! closes, reporting a synthesized `1006` if the socket died without a
//! close frame.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::traits::{ChannelHandle, Connector, Inbound, Outbound};
use crate::websocket::messages::CLOSE_ABNORMAL;

/// Code reported when the peer's close frame carried no status.
const CLOSE_NO_STATUS: u16 = 1005;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Production [`Connector`] using tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }

    fn convert_error(url: &str, err: WsError) -> TransportError {
        match err {
            WsError::Http(response) => TransportError::HandshakeRejected {
                status: response.status().as_u16(),
            },
            WsError::Url(e) => TransportError::InvalidUrl(e.to_string()),
            other => TransportError::Dial {
                url: redact(url),
                message: other.to_string(),
            },
        }
    }
}

#[async_trait]
impl Connector for TungsteniteConnector {
    async fn connect(&self, url: &str) -> Result<ChannelHandle, TransportError> {
        let (socket, _response) = connect_async(url)
            .await
            .map_err(|e| Self::convert_error(url, e))?;
        info!("channel open to {}", redact(url));

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        tokio::spawn(pump(socket, outbound_rx, inbound_tx));

        Ok(ChannelHandle::new(outbound_tx, inbound_rx))
    }
}

async fn pump(
    socket: Socket,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    inbound: mpsc::UnboundedSender<Inbound>,
) {
    let (mut sink, mut stream) = socket.split();

    loop {
        tokio::select! {
            command = outbound.recv() => match command {
                Some(Outbound::Text(text)) => {
                    if let Err(e) = sink.send(Message::Text(text)).await {
                        warn!("channel send failed: {}", e);
                        let _ = inbound.send(Inbound::Closed {
                            code: CLOSE_ABNORMAL,
                            reason: e.to_string(),
                        });
                        break;
                    }
                }
                Some(Outbound::Close { code, reason }) => {
                    debug!("closing channel with {} ({})", code, reason);
                    let frame = CloseFrame {
                        code: CloseCode::from(code),
                        reason: reason.into(),
                    };
                    let _ = sink.send(Message::Close(Some(frame))).await;
                    break;
                }
                None => {
                    let _ = sink.close().await;
                    break;
                }
            },
            message = stream.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if inbound.send(Inbound::Text(text)).is_err() {
                        let _ = sink.close().await;
                        break;
                    }
                }
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.into_owned()))
                        .unwrap_or((CLOSE_NO_STATUS, String::new()));
                    debug!("peer closed channel with {} ({})", code, reason);
                    let _ = inbound.send(Inbound::Closed { code, reason });
                    break;
                }
                Some(Ok(_)) => {
                    // Binary and control frames carry nothing for the console.
                }
                Some(Err(e)) => {
                    warn!("channel error: {}", e);
                    let _ = inbound.send(Inbound::Closed {
                        code: CLOSE_ABNORMAL,
                        reason: e.to_string(),
                    });
                    break;
                }
                None => {
                    let _ = inbound.send(Inbound::Closed {
                        code: CLOSE_ABNORMAL,
                        reason: "stream ended".to_string(),
                    });
                    break;
                }
            },
        }
    }
}

/// Strip the query string so the credential never reaches the logs.
fn redact(url: &str) -> String {
    match url.split_once('?') {
        Some((base, _)) => format!("{}?<redacted>", base),
        None => url.to_string(),
    }
}
