//! Listener and connection over `tokio-tungstenite`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{ConnectionId, TransportError};

/// Counter behind [`ConnectionId`] allocation.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type WsStream = WebSocketStream<TcpStream>;

/// Accepts incoming WebSocket connections.
pub struct WsListener {
    listener: TcpListener,
}

impl WsListener {
    /// Binds to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(addr, "WebSocket listener bound");
        Ok(Self { listener })
    }

    /// The bound local address (useful with a `:0` port in tests).
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Waits for the next connection and completes its WebSocket
    /// handshake.
    pub async fn accept(&self) -> Result<WsConnection, TransportError> {
        let (stream, addr) = self.listener.accept().await?;
        let ws = tokio_tungstenite::accept_async(stream).await?;
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %addr, "accepted WebSocket connection");

        let (sink, stream) = ws.split();
        Ok(WsConnection {
            id,
            sink: Arc::new(Mutex::new(sink)),
            stream: Arc::new(Mutex::new(stream)),
        })
    }
}

/// One WebSocket connection, cheap to clone.
///
/// Sink and stream are split: a task pumping outbound events and the
/// inbound receive loop never block each other.
#[derive(Clone)]
pub struct WsConnection {
    id: ConnectionId,
    sink: Arc<Mutex<SplitSink<WsStream, Message>>>,
    stream: Arc<Mutex<SplitStream<WsStream>>>,
}

impl WsConnection {
    /// Sends one text frame.
    pub async fn send(&self, text: String) -> Result<(), TransportError> {
        self.sink.lock().await.send(Message::text(text)).await?;
        Ok(())
    }

    /// Receives the next text frame.
    ///
    /// Returns `Ok(None)` on a clean close. Binary frames are accepted
    /// when they hold UTF-8 (some clients send JSON that way); ping/pong
    /// frames are skipped.
    pub async fn recv(&self) -> Result<Option<String>, TransportError> {
        let mut stream = self.stream.lock().await;
        loop {
            match stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text.to_string())),
                Some(Ok(Message::Binary(data))) => {
                    return String::from_utf8(data.into())
                        .map(Some)
                        .map_err(|_| TransportError::NotText);
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
            }
        }
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<(), TransportError> {
        self.sink.lock().await.send(Message::Close(None)).await?;
        Ok(())
    }

    /// This connection's process-unique id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}
