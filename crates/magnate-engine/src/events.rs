//! The wire language: inbound client events, outbound server events, and
//! the identity/recipient types used to route them.
//!
//! Every event serializes as internally tagged JSON with kebab-case tags
//! and camelCase fields, so `roll-dice` is literally
//! `{"type":"roll-dice"}` on the wire and a purchase is
//! `{"type":"buy-property","spaceId":11}`.

use std::fmt;

use magnate_board::Role;
use serde::{Deserialize, Serialize};

use crate::room::Room;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Engine-side identifier for one client connection.
///
/// The transport layer has its own connection counter; the server maps it
/// onto this newtype so the engine never depends on a network crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnId(pub u64);

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// Everything a client can ask for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Open a fresh room and take the host seat.
    CreateRoom { name: String },
    /// Join (or reconnect to) the room with this code.
    JoinRoom { code: String, name: String },
    /// Give up the seat (lobby) or go disconnected (started room).
    LeaveRoom,
    /// Pick a role; lobby only.
    SelectRole { role: Role },
    /// Host only; needs at least two connected seats.
    StartGame,
    RollDice,
    EndTurn,
    /// Buy an unowned space; the target seat defaults to the acting player.
    BuyProperty {
        space_id: u8,
        #[serde(default)]
        player_index: Option<usize>,
    },
    UpgradeProperty { space_id: u8 },
    /// Manual table bookkeeping: move cash between two seats.
    Transfer {
        from_index: usize,
        to_index: usize,
        amount: i64,
    },
    /// Manual table bookkeeping: credit or debit one seat.
    AdjustMoney {
        player_index: usize,
        amount: i64,
        #[serde(default)]
        note: Option<String>,
    },
    /// One-tap shortcuts for the common manual adjustments.
    QuickAction { action: QuickAction },
    /// Affirm or reject the early-settlement vote.
    EndGameVote { confirm: bool },
    SendChat { text: String },
}

impl ClientEvent {
    /// The rate-limiting key for this event.
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::CreateRoom { .. } => EventKind::CreateRoom,
            ClientEvent::JoinRoom { .. } => EventKind::JoinRoom,
            ClientEvent::LeaveRoom => EventKind::LeaveRoom,
            ClientEvent::SelectRole { .. } => EventKind::SelectRole,
            ClientEvent::StartGame => EventKind::StartGame,
            ClientEvent::RollDice => EventKind::RollDice,
            ClientEvent::EndTurn => EventKind::EndTurn,
            ClientEvent::BuyProperty { .. } => EventKind::BuyProperty,
            ClientEvent::UpgradeProperty { .. } => EventKind::UpgradeProperty,
            ClientEvent::Transfer { .. } => EventKind::Transfer,
            ClientEvent::AdjustMoney { .. } => EventKind::AdjustMoney,
            ClientEvent::QuickAction { .. } => EventKind::QuickAction,
            ClientEvent::EndGameVote { .. } => EventKind::EndGameVote,
            ClientEvent::SendChat { .. } => EventKind::SendChat,
        }
    }
}

/// The manual one-tap adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickAction {
    /// Credit the acting player's pass-start bonus.
    PassStart,
    /// Debit the tuition tax.
    TaxA,
    /// Debit the bookstore tax.
    TaxB,
}

/// Event name used as the per-connection rate-limit key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CreateRoom,
    JoinRoom,
    LeaveRoom,
    SelectRole,
    StartGame,
    RollDice,
    EndTurn,
    BuyProperty,
    UpgradeProperty,
    Transfer,
    AdjustMoney,
    QuickAction,
    EndGameVote,
    SendChat,
}

impl EventKind {
    /// The wire name of this event.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::CreateRoom => "create-room",
            EventKind::JoinRoom => "join-room",
            EventKind::LeaveRoom => "leave-room",
            EventKind::SelectRole => "select-role",
            EventKind::StartGame => "start-game",
            EventKind::RollDice => "roll-dice",
            EventKind::EndTurn => "end-turn",
            EventKind::BuyProperty => "buy-property",
            EventKind::UpgradeProperty => "upgrade-property",
            EventKind::Transfer => "transfer",
            EventKind::AdjustMoney => "adjust-money",
            EventKind::QuickAction => "quick-action",
            EventKind::EndGameVote => "end-game-vote",
            EventKind::SendChat => "send-chat",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// Reasons sent back with an `error-msg`; the full surfaced-error set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorReason {
    RoomNotFound,
    RoomFull,
    AlreadyStarted,
    InsufficientBalance,
}

/// Why a `player-dropped` event fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DropReason {
    Bankrupt,
}

/// Everything the server pushes to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Full room snapshot; broadcast after every accepted mutation.
    RoomUpdate { room: Room },
    /// Discrete roll event alongside the snapshot, for client replay.
    DiceRolled {
        dice: [u8; 2],
        player_index: usize,
        from: u8,
        to: u8,
    },
    /// A seat dropped out of the match.
    PlayerDropped { name: String, reason: DropReason },
    /// Stateless chat fan-out.
    ChatMsg {
        from: String,
        text: String,
        color: String,
    },
    /// Surfaced rejection, sent to the caller only.
    ErrorMsg { reason: ErrorReason },
}

/// Where an outbound event goes.
///
/// The engine resolves recipients to concrete connections itself, so the
/// gateway can route without knowing anything about rooms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every currently connected member of the affected room.
    Broadcast(Vec<ConnId>),
    /// One specific connection (surfaced errors, mostly).
    One(ConnId),
}

/// The ordered list of events one engine operation produced.
pub type Outbox = Vec<(Recipient, ServerEvent)>;

// =========================================================================
// Tests
// =========================================================================
