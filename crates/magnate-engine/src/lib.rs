//! The Magnate game engine: rooms, turns, dice, money, and endings.
//!
//! Everything in this crate is synchronous and deterministic — dice and
//! card draws come from an injected RNG — so the whole rule set is
//! testable without a runtime. The session gateway serializes calls into
//! [`GameHub::handle`]; each call mutates exactly one room to completion
//! and returns an [`Outbox`] of events for the gateway to route.
//!
//! # Key types
//!
//! - [`GameHub`] — the registry and single dispatch entry point
//! - [`Room`] / [`Player`] / [`Property`] — one match's full state
//! - [`ClientEvent`] / [`ServerEvent`] — the wire language
//! - [`MatchHistory`] — the external history collaborator's interface
//!
//! Module map: `economy` is the pure resolver (prices, rents, modifier
//! pipeline), `turn` the roll/turn state machine, `lifecycle` bankruptcy,
//! settlement and the end-vote, `registry` the hub.

mod economy;
mod error;
mod events;
mod history;
mod lifecycle;
mod registry;
mod room;
mod turn;

pub use economy::{
    apply_role_modifiers, estate_value, owns_group, purchase_price, rent, upgrade_cost,
};
pub use error::ActionError;
pub use events::{
    ClientEvent, ConnId, DropReason, ErrorReason, EventKind, Outbox, QuickAction, Recipient,
    ServerEvent,
};
pub use history::{MatchHistory, MatchReport, MatchStarted, NoopHistory, PlayerOutcome, TraceHistory};
pub use registry::GameHub;
pub use room::{
    EndVote, Player, Presence, Property, ReleasedEstate, Room, RoomCode, RoomPhase, Settlement,
    SettlementEntry,
};
