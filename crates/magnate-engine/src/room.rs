//! The room data model: one match instance and its seats.
//!
//! A `Room` is the single source of truth for one match. Seats are never
//! deleted once the match has started — a leaver is marked disconnected so
//! reconnection and settlement keep a stable identity. The whole struct is
//! the `room-update` wire snapshot; the few fields clients must not see
//! (timers, finalize guard) are skipped by serde.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Instant;

use magnate_board::{PLAYER_COLORS, Role, STARTING_MONEY};
use serde::{Deserialize, Serialize};

use crate::events::{ConnId, Recipient, ServerEvent};

/// Characters valid in a join code. No `0`, `O`, `1`, or `I` — codes get
/// read out loud across a table.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a join code.
pub const CODE_LEN: usize = 6;

/// Log entries are capped here…
const LOG_CAP: usize = 200;

/// …and trimmed back to the most recent this-many on overflow.
const LOG_KEEP: usize = 100;

// ---------------------------------------------------------------------------
// Identity & phase
// ---------------------------------------------------------------------------

/// A room's public join code, stable for its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Normalizes user input the way codes are generated: trimmed and
    /// upper-cased.
    pub fn normalized(raw: &str) -> Self {
        RoomCode(raw.trim().to_ascii_uppercase())
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Room lifecycle phase.
///
/// A tagged enum rather than `started`/`finished`/`rolled` booleans, so
/// illegal combinations (rolled before start, settled before finish) are
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum RoomPhase {
    /// Waiting for players; seats join and pick roles.
    Lobby,
    /// Match running. `rolled` gates the acting player's dice.
    Playing { rolled: bool },
    /// Terminal. `settled` means the match ended by unanimous vote.
    Finished { settled: bool },
}

impl RoomPhase {
    pub fn is_lobby(self) -> bool {
        matches!(self, RoomPhase::Lobby)
    }

    pub fn is_playing(self) -> bool {
        matches!(self, RoomPhase::Playing { .. })
    }

    pub fn is_finished(self) -> bool {
        matches!(self, RoomPhase::Finished { .. })
    }
}

/// Whether a seat currently has a live connection behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "conn", rename_all = "kebab-case")]
pub enum Presence {
    Connected(ConnId),
    Disconnected,
}

impl Presence {
    pub fn is_connected(self) -> bool {
        matches!(self, Presence::Connected(_))
    }

    /// The live connection, if any.
    pub fn conn(self) -> Option<ConnId> {
        match self {
            Presence::Connected(c) => Some(c),
            Presence::Disconnected => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Seats and board state
// ---------------------------------------------------------------------------

/// One participant's seat. Persistent for the room's lifetime once the
/// match has started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub name: String,
    pub color: String,
    pub role: Role,
    /// May legally dip below zero only between a debit and the bankruptcy
    /// pass that immediately follows it.
    pub money: i64,
    pub position: u8,
    /// Set by the relocation space, cleared on the seat's next roll.
    pub detained: bool,
    pub bankrupt: bool,
    pub presence: Presence,
    /// Snapshot of the estate released on bankruptcy, for settlement display.
    pub released: Option<ReleasedEstate>,
}

impl Player {
    pub fn new(name: String, color: &str, conn: ConnId) -> Self {
        Player {
            name,
            color: color.to_string(),
            role: Role::default(),
            money: STARTING_MONEY,
            position: 0,
            detained: false,
            bankrupt: false,
            presence: Presence::Connected(conn),
            released: None,
        }
    }

    /// Active seats take turns, pay collect-from-all cards, and vote.
    pub fn is_active(&self) -> bool {
        !self.bankrupt && self.presence.is_connected()
    }
}

/// An owned space on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Seat index of the owner.
    pub owner: usize,
    /// Upgrades purchased, `0..=5`; selects the rent tier.
    pub level: u8,
}

/// What a bankrupt seat gave back to the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleasedEstate {
    pub count: usize,
    pub value: i64,
    pub names: Vec<String>,
}

/// An in-progress unanimous-consent vote to settle early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndVote {
    pub initiator: usize,
    /// Seat indices that affirmed; keyed by index so re-affirming is
    /// idempotent.
    pub votes: BTreeSet<usize>,
}

/// End-of-match ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settlement {
    pub winner: Option<String>,
    /// Sorted by total net worth, descending.
    pub entries: Vec<SettlementEntry>,
}

/// One seat's line in the settlement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementEntry {
    pub name: String,
    pub role: Role,
    pub cash: i64,
    pub estate_value: i64,
    pub total: i64,
    pub bankrupt: bool,
    pub released: Option<ReleasedEstate>,
}

// ---------------------------------------------------------------------------
// Room
// ---------------------------------------------------------------------------

/// One match instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub code: RoomCode,
    /// The connection allowed to start the game; handed down when the
    /// host leaves a lobby.
    pub host: ConnId,
    /// Seat order is fixed at join time; only lobby removal splices it.
    pub players: Vec<Player>,
    pub phase: RoomPhase,
    /// Always a valid index into `players`.
    pub current_turn: usize,
    /// Increments when the turn scan wraps back to an index ≤ the current.
    pub round: u32,
    pub last_dice: [u8; 2],
    /// Owned spaces by position; absent means unowned.
    pub properties: BTreeMap<u8, Property>,
    /// Human-readable event log, capped and trimmed.
    pub log: Vec<String>,
    pub end_vote: Option<EndVote>,
    pub settlement: Option<Settlement>,
    /// When the match started; feeds the history report.
    #[serde(skip)]
    pub started_at: Option<Instant>,
    /// Bumped on reconnect; a teardown timer carrying a stale epoch no-ops.
    #[serde(skip)]
    pub epoch: u64,
    /// At-most-once guard for the history finalize notification.
    #[serde(skip)]
    pub finalized: bool,
}

impl Room {
    /// A fresh lobby room with the host seated.
    pub fn new(code: RoomCode, host: ConnId, host_name: String) -> Self {
        Room {
            code,
            host,
            players: vec![Player::new(host_name, PLAYER_COLORS[0], host)],
            phase: RoomPhase::Lobby,
            current_turn: 0,
            round: 1,
            last_dice: [0, 0],
            properties: BTreeMap::new(),
            log: Vec::new(),
            end_vote: None,
            settlement: None,
            started_at: None,
            epoch: 0,
            finalized: false,
        }
    }

    /// Appends a log line, trimming to the most recent [`LOG_KEEP`] entries
    /// when the cap is exceeded.
    pub fn add_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        if self.log.len() > LOG_CAP {
            let excess = self.log.len() - LOG_KEEP;
            self.log.drain(..excess);
        }
    }

    /// The seat currently attached to this connection.
    pub fn player_by_conn(&self, conn: ConnId) -> Option<usize> {
        self.players
            .iter()
            .position(|p| p.presence == Presence::Connected(conn))
    }

    /// Connections that receive this room's broadcasts right now.
    pub fn broadcast_targets(&self) -> Vec<ConnId> {
        self.players.iter().filter_map(|p| p.presence.conn()).collect()
    }

    /// A `room-update` snapshot addressed to every connected member.
    pub fn update_event(&self) -> (Recipient, ServerEvent) {
        (
            Recipient::Broadcast(self.broadcast_targets()),
            ServerEvent::RoomUpdate { room: self.clone() },
        )
    }

    /// Seat indices that are active (non-bankrupt, connected).
    pub fn active_seats(&self) -> Vec<usize> {
        self.players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_active())
            .map(|(i, _)| i)
            .collect()
    }

    /// Reassigns palette colors by seat index, after a lobby splice.
    pub(crate) fn assign_colors(&mut self) {
        for (i, p) in self.players.iter_mut().enumerate() {
            p.color = PLAYER_COLORS[i % PLAYER_COLORS.len()].to_string();
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_room() -> Room {
        Room::new(RoomCode("TEST42".into()), ConnId(1), "Alice".into())
    }

    #[test]
    fn test_new_room_seats_the_host_in_a_lobby() {
        let room = sample_room();
        assert_eq!(room.phase, RoomPhase::Lobby);
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[0].name, "Alice");
        assert_eq!(room.players[0].money, STARTING_MONEY);
        assert_eq!(room.player_by_conn(ConnId(1)), Some(0));
        assert_eq!(room.host, ConnId(1));
    }

    #[test]
    fn test_log_trims_to_most_recent_on_overflow() {
        let mut room = sample_room();
        for i in 0..=200 {
            room.add_log(format!("line {i}"));
        }
        assert_eq!(room.log.len(), 100);
        assert_eq!(room.log.last().unwrap(), "line 200");
        assert_eq!(room.log.first().unwrap(), "line 101");
    }

    #[test]
    fn test_broadcast_targets_skip_disconnected_seats() {
        let mut room = sample_room();
        room.players.push(Player::new("Bob".into(), PLAYER_COLORS[1], ConnId(2)));
        room.players[0].presence = Presence::Disconnected;
        assert_eq!(room.broadcast_targets(), vec![ConnId(2)]);
    }

    #[test]
    fn test_active_requires_connection_and_solvency() {
        let mut p = Player::new("Bob".into(), "#fff", ConnId(2));
        assert!(p.is_active());
        p.bankrupt = true;
        assert!(!p.is_active());
        p.bankrupt = false;
        p.presence = Presence::Disconnected;
        assert!(!p.is_active());
    }

    #[test]
    fn test_room_snapshot_round_trips_without_private_fields() {
        let mut room = sample_room();
        room.started_at = Some(std::time::Instant::now());
        room.epoch = 7;
        room.finalized = true;
        let json = serde_json::to_value(&room).unwrap();
        assert!(json.get("startedAt").is_none());
        assert!(json.get("epoch").is_none());
        assert!(json.get("finalized").is_none());
        let back: Room = serde_json::from_value(json).unwrap();
        assert_eq!(back.code, room.code);
        assert_eq!(back.epoch, 0);
        assert!(!back.finalized);
    }

    #[test]
    fn test_room_code_normalization() {
        assert_eq!(RoomCode::normalized("  ab3k9q "), RoomCode("AB3K9Q".into()));
    }
}
