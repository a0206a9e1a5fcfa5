//! Room transports.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use runwatch_models::RoomId;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

use crate::config::room_url;
use crate::error::{ClientError, ClientResult};

/// Opens connections scoped to a room.
#[async_trait]
pub trait RoomTransport: Send + Sync {
    async fn connect(&self, room: &RoomId) -> ClientResult<Box<dyn RoomConnection>>;
}

/// One open duplex text connection.
#[async_trait]
pub trait RoomConnection: Send {
    async fn send(&mut self, text: String) -> ClientResult<()>;

    /// Next text frame. `None` once the peer has closed.
    async fn recv(&mut self) -> Option<ClientResult<String>>;

    async fn close(&mut self);
}

/// WebSocket transport to `ws(s)://host/ws/{room}`.
#[derive(Debug, Clone)]
pub struct WsTransport {
    server_url: Url,
}

impl WsTransport {
    pub fn new(server_url: Url) -> Self {
        Self { server_url }
    }
}

#[async_trait]
impl RoomTransport for WsTransport {
    async fn connect(&self, room: &RoomId) -> ClientResult<Box<dyn RoomConnection>> {
        let url = room_url(&self.server_url, room)?;
        let (stream, response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(ClientError::transport)?;
        debug!(room_id = %room, status = response.status().as_u16(), "Room socket connected");
        Ok(Box::new(WsConnection { stream }))
    }
}

struct WsConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl RoomConnection for WsConnection {
    async fn send(&mut self, text: String) -> ClientResult<()> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(ClientError::transport)
    }

    async fn recv(&mut self) -> Option<ClientResult<String>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Close(_)) => return None,
                // Pings are answered by tungstenite on the next read/write
                Ok(_) => continue,
                Err(e) => return Some(Err(ClientError::transport(e))),
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}
