//! WebSocket transport using tungstenite.

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};
use url::Url;

use super::error::ChannelError;
use super::transport::{Connection, Transport};

/// Production transport over `ws://` or `wss://`.
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;

    async fn connect(&self, url: &Url) -> Result<WebSocketConnection, ChannelError> {
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Transport(format!("WebSocket connect failed: {e}")))?;
        debug!(url = %url, status = %response.status(), "WebSocket connected");
        Ok(WebSocketConnection { stream })
    }
}

/// An open WebSocket.
pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Connection for WebSocketConnection {
    async fn send(&mut self, text: String) -> Result<(), ChannelError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|e| ChannelError::Transport(format!("WebSocket send failed: {e}")))
    }

    async fn recv(&mut self) -> Option<Result<String, ChannelError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(m) => m,
                Err(e) => {
                    return Some(Err(ChannelError::Transport(format!(
                        "WebSocket receive failed: {e}"
                    ))))
                }
            };

            match message {
                Message::Text(text) => return Some(Ok(text)),
                Message::Binary(data) => {
                    return Some(String::from_utf8(data).map_err(|e| {
                        ChannelError::Protocol(format!("binary frame is not UTF-8: {e}"))
                    }))
                }
                Message::Close(frame) => {
                    debug!(frame = ?frame, "WebSocket closed by peer");
                    return None;
                }
                // Pings are answered by tungstenite on the next write.
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {
                    trace!("Ignoring control frame");
                }
            }
        }
    }

    async fn close(&mut self) {
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "client disconnect".into(),
        };
        if let Err(e) = self.stream.close(Some(frame)).await {
            debug!(error = %e, "WebSocket close failed");
        }
    }
}

/// Convert a server URL to its WebSocket form.
///
/// `http`/`https` map to `ws`/`wss`; `ws`/`wss` pass through.
pub fn websocket_url(server_url: &str) -> Result<Url, ChannelError> {
    let trimmed = server_url.trim();
    if trimmed.is_empty() {
        return Err(ChannelError::Config("server URL is empty".to_string()));
    }

    let mut url = Url::parse(trimmed)
        .map_err(|e| ChannelError::Config(format!("invalid server URL '{}': {}", trimmed, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ChannelError::Config(format!(
                "unsupported URL scheme '{}'",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ChannelError::Config(format!("cannot use scheme '{}'", scheme)))?;
    Ok(url)
}
