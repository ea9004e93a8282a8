//! # Magnate
//!
//! Authoritative WebSocket server for a turn-based multiplayer board
//! game. Rooms are keyed by short join codes; every accepted mutation is
//! pushed to all room members as a full snapshot.
//!
//! The layers, bottom up:
//!
//! - `magnate-board` — static board data, roles, card decks
//! - [`magnate_engine`] — the room state machine and economy
//! - [`magnate_session`] — rate limiting, serialized dispatch, teardown
//! - [`magnate_transport`] — WebSocket framing
//! - this crate — the server builder, accept loop, and binary

mod error;
mod handler;
mod server;

pub use error::MagnateError;
pub use server::{MagnateServer, MagnateServerBuilder};
