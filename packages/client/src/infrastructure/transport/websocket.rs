//! WebSocket connector built on tokio-tungstenite.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async, tungstenite::protocol::Message,
};

use super::{Connection, Connector, TransportError};

/// Connects to a fixed endpoint URL.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: String,
}

impl WebSocketConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    type Connection = WebSocketConnection;

    async fn connect(&self) -> Result<WebSocketConnection, TransportError> {
        tracing::info!("Connecting to {}", self.url);
        let (stream, response) =
            connect_async(self.url.as_str())
                .await
                .map_err(|e| TransportError::Connect {
                    url: self.url.clone(),
                    reason: e.to_string(),
                })?;
        tracing::debug!("WebSocket handshake completed: {}", response.status());

        Ok(WebSocketConnection { stream })
    }
}

/// An open websocket carrying JSON text frames.
pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl Connection for WebSocketConnection {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Close(frame)) => {
                    tracing::debug!("Server sent close frame: {:?}", frame);
                    return None;
                }
                // Ping/pong are answered by tungstenite; binary frames are not part of the protocol.
                Ok(_) => continue,
                Err(e) => return Some(Err(TransportError::Receive(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::Close(e.to_string()))
    }
}
