//! Error type for the transport layer.

/// Errors from listening, accepting, and talking WebSocket.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Binding the listener or accepting a TCP connection failed.
    #[error("accept failed: {0}")]
    Accept(#[from] std::io::Error),

    /// The WebSocket handshake or a frame operation failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The peer sent a frame that is not valid UTF-8 text.
    #[error("non-text frame from peer")]
    NotText,
}
