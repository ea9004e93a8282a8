//! WebSocket transport for Magnate.
//!
//! The wire speaks JSON text frames, so this layer deals in strings:
//! [`WsListener`] accepts sockets, [`WsConnection`] sends and receives
//! one text frame at a time. The sink and stream halves sit behind
//! separate locks, so an outbound pump never contends with the receive
//! loop.

mod error;
mod websocket;

pub use error::TransportError;
pub use websocket::{WsConnection, WsListener};

use std::fmt;

/// Opaque identifier for a connection, unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The underlying `u64`.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
