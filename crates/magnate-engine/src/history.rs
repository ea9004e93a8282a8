//! The match-history collaborator interface.
//!
//! The engine reports exactly two facts to the outside world: a game
//! started, and a game ended. What the collaborator does with them
//! (statistics endpoint, history file) is its own business — the engine
//! only guarantees the finalize notification fires at most once per room.

use magnate_board::Role;
use serde::Serialize;

use crate::room::RoomCode;

/// Payload of the "a game started" notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStarted {
    pub room: RoomCode,
    /// Participants in seat order, with their chosen roles.
    pub players: Vec<(String, Role)>,
}

/// One seat's final standing in a [`MatchReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerOutcome {
    pub name: String,
    pub role: Role,
    pub total: i64,
    pub bankrupt: bool,
}

/// Payload of the "a game ended" notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchReport {
    pub room: RoomCode,
    pub duration_ms: u64,
    pub rounds: u32,
    /// Absent when a room was torn down before anyone won.
    pub winner: Option<String>,
    pub outcomes: Vec<PlayerOutcome>,
}

/// Receives the two notify-points. Implementations must tolerate being
/// called from the hub's dispatch path, so they should return quickly —
/// spawn if the work is slow.
pub trait MatchHistory: Send + Sync {
    fn game_started(&self, start: &MatchStarted);
    fn game_finished(&self, report: &MatchReport);
}

/// Discards every notification. Handy in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHistory;

impl MatchHistory for NoopHistory {
    fn game_started(&self, _: &MatchStarted) {}
    fn game_finished(&self, _: &MatchReport) {}
}

/// Logs notifications through `tracing`; the binary's default collaborator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceHistory;

impl MatchHistory for TraceHistory {
    fn game_started(&self, start: &MatchStarted) {
        tracing::info!(
            room = %start.room,
            players = start.players.len(),
            "match started"
        );
    }

    fn game_finished(&self, report: &MatchReport) {
        tracing::info!(
            room = %report.room,
            rounds = report.rounds,
            duration_ms = report.duration_ms,
            winner = report.winner.as_deref().unwrap_or("-"),
            "match finished"
        );
    }
}
