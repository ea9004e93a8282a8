//! Lifecycle rules: bankruptcy detection, game-over, settlement, and the
//! unanimous end-vote.
//!
//! The bankruptcy pass runs synchronously after every money-mutating
//! operation, before anything is broadcast, so a mid-roll debit can never
//! leave a negative balance visible to clients.

use magnate_board as board;

use crate::economy;
use crate::error::ActionError;
use crate::events::{ConnId, DropReason, Outbox, Recipient, ServerEvent};
use crate::room::{
    EndVote, ReleasedEstate, Room, RoomPhase, Settlement, SettlementEntry,
};

impl Room {
    /// The bankruptcy pass plus the game-over check.
    ///
    /// Idempotent per seat: a player already marked bankrupt is skipped,
    /// so repeat debits never re-release properties or double-log the
    /// drop.
    pub(crate) fn settle_debts(&mut self) -> Outbox {
        let mut out = Outbox::new();
        for idx in 0..self.players.len() {
            let p = &self.players[idx];
            if !p.is_active() || p.money > 0 {
                continue;
            }
            out.extend(self.declare_bankrupt(idx));
        }
        out.extend(self.check_game_over());
        out
    }

    /// Marks a seat bankrupt: clamp to zero, release the estate back to
    /// the board (keeping a snapshot for settlement display), advance the
    /// turn if the seat held it.
    fn declare_bankrupt(&mut self, idx: usize) -> Outbox {
        let value = economy::estate_value(&self.properties, idx);
        let owned: Vec<u8> = self
            .properties
            .iter()
            .filter(|(_, p)| p.owner == idx)
            .map(|(id, _)| *id)
            .collect();
        let names: Vec<String> = owned
            .iter()
            .map(|id| board::space_name(*id).to_string())
            .collect();
        for id in &owned {
            self.properties.remove(id);
        }

        let player = &mut self.players[idx];
        player.bankrupt = true;
        player.money = 0;
        player.released = Some(ReleasedEstate { count: owned.len(), value, names });
        let name = player.name.clone();

        self.add_log(format!(
            "{name} went bankrupt — {} properties returned to the board",
            owned.len()
        ));
        tracing::info!(room = %self.code, player = %name, "player went bankrupt");

        let out = vec![(
            Recipient::Broadcast(self.broadcast_targets()),
            ServerEvent::PlayerDropped { name, reason: DropReason::Bankrupt },
        )];
        if self.current_turn == idx {
            // The bankrupt seat loses the turn immediately, and whoever
            // inherits it starts fresh at awaiting-roll.
            self.advance_turn();
            self.phase = RoomPhase::Playing { rolled: false };
        }
        out
    }

    /// Finishes the match once at most one seat remains active.
    pub(crate) fn check_game_over(&mut self) -> Outbox {
        if !self.phase.is_playing() {
            return Outbox::new();
        }
        let active = self.active_seats();
        if active.len() > 1 {
            return Outbox::new();
        }
        self.finish(active.first().copied(), false);
        Outbox::new()
    }

    /// Computes the settlement and moves the room to `Finished`.
    ///
    /// With no declared winner the top net worth wins — that is the vote
    /// path, and the all-bankrupt edge of the natural path.
    fn finish(&mut self, winner: Option<usize>, settled: bool) {
        let mut entries: Vec<SettlementEntry> = self
            .players
            .iter()
            .enumerate()
            .map(|(idx, p)| {
                // Bankrupt seats settle at zero net worth; their snapshot
                // shows what they released.
                let (cash, estate_value) = if p.bankrupt {
                    (0, 0)
                } else {
                    (p.money, economy::estate_value(&self.properties, idx))
                };
                SettlementEntry {
                    name: p.name.clone(),
                    role: p.role,
                    cash,
                    estate_value,
                    total: cash + estate_value,
                    bankrupt: p.bankrupt,
                    released: p.released.clone(),
                }
            })
            .collect();
        entries.sort_by(|a, b| b.total.cmp(&a.total));

        let winner_name = winner
            .map(|idx| self.players[idx].name.clone())
            .or_else(|| entries.first().map(|e| e.name.clone()));

        match &winner_name {
            Some(name) => self.add_log(format!("Game over — {name} wins")),
            None => self.add_log("Game over"),
        }
        tracing::info!(room = %self.code, winner = winner_name.as_deref().unwrap_or("-"), "game over");

        self.settlement = Some(Settlement { winner: winner_name, entries });
        self.phase = RoomPhase::Finished { settled };
        self.end_vote = None;
    }

    // -----------------------------------------------------------------
    // Unanimous end-vote
    // -----------------------------------------------------------------

    /// Affirms or rejects the early-settlement vote.
    pub fn end_game_vote(&mut self, conn: ConnId, confirm: bool) -> Result<Outbox, ActionError> {
        if !self.phase.is_playing() {
            return Err(ActionError::Dropped("room is not in play"));
        }
        let ci = self
            .player_by_conn(conn)
            .ok_or(ActionError::Dropped("caller holds no seat here"))?;
        if !self.players[ci].is_active() {
            return Err(ActionError::Dropped("caller is out of the game"));
        }

        if !confirm {
            if self.end_vote.take().is_none() {
                return Err(ActionError::Dropped("no vote in progress"));
            }
            let name = self.players[ci].name.clone();
            self.add_log(format!("{name} rejected the early settlement — vote cancelled"));
            return Ok(vec![self.update_event()]);
        }

        let vote = self
            .end_vote
            .get_or_insert_with(|| EndVote { initiator: ci, votes: Default::default() });
        let fresh = vote.votes.insert(ci);
        let tally = vote.votes.len();
        if fresh {
            let name = self.players[ci].name.clone();
            let active = self.active_seats().len();
            self.add_log(format!("{name} voted to settle early ({tally}/{active})"));
        }

        self.try_complete_vote();
        Ok(vec![self.update_event()])
    }

    /// Settles if every currently active seat has affirmed. Called on each
    /// affirm and whenever a voter drops to inactive, so a mid-vote
    /// disconnect cannot block completion.
    pub(crate) fn try_complete_vote(&mut self) -> bool {
        let Some(vote) = &self.end_vote else {
            return false;
        };
        let all_voted = self
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_active())
            .all(|(i, _)| vote.votes.contains(&i));
        if !all_voted {
            return false;
        }
        self.add_log("All players agreed to settle early");
        self.finish(None, true);
        true
    }
}

// =========================================================================
// Tests
// =========================================================================
