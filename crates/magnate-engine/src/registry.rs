//! The room registry and dispatcher.
//!
//! `GameHub` owns every room and the connection→room index, exactly two
//! maps with one entry point: [`GameHub::handle`]. The caller (the session
//! gateway) serializes access, so nothing in here needs locks, and every
//! rule stays testable by constructing a hub directly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use magnate_board::{MAX_PLAYERS, PLAYER_COLORS, STARTING_MONEY};
use rand::Rng;

use crate::economy;
use crate::error::ActionError;
use crate::events::{ClientEvent, ConnId, Outbox, Recipient, ServerEvent};
use crate::history::{MatchHistory, MatchReport, MatchStarted, PlayerOutcome};
use crate::room::{CODE_ALPHABET, CODE_LEN, Player, Presence, Room, RoomCode, RoomPhase};

/// Owns all rooms and routes connection events to them.
pub struct GameHub {
    /// Active rooms, keyed by join code.
    rooms: HashMap<RoomCode, Room>,
    /// Which room each connection is currently seated in. A connection is
    /// in at most one room at a time; joining another leaves the first.
    conn_rooms: HashMap<ConnId, RoomCode>,
    /// The external match-history collaborator.
    history: Arc<dyn MatchHistory>,
}

impl GameHub {
    pub fn new(history: Arc<dyn MatchHistory>) -> Self {
        GameHub { rooms: HashMap::new(), conn_rooms: HashMap::new(), history }
    }

    /// Dispatches one client event and returns the events it produced.
    ///
    /// Surfaced rejections become an `error-msg` to the caller; everything
    /// else that fails is dropped with a debug log line. After the action
    /// the affected room is finalized toward the history collaborator if
    /// it just finished.
    pub fn handle(&mut self, conn: ConnId, event: ClientEvent, rng: &mut impl Rng) -> Outbox {
        let kind = event.kind();
        let before = self.conn_rooms.get(&conn).cloned();

        let result = self.dispatch(conn, event, rng);

        let out = match result {
            Ok(out) => out,
            Err(err) => match err.surfaced() {
                Some(reason) => {
                    tracing::debug!(%conn, %kind, %err, "rejected");
                    vec![(Recipient::One(conn), ServerEvent::ErrorMsg { reason })]
                }
                None => {
                    tracing::debug!(%conn, %kind, %err, "dropped");
                    Vec::new()
                }
            },
        };

        let after = self.conn_rooms.get(&conn).cloned();
        for code in [before, after].into_iter().flatten() {
            self.finalize(&code, false);
        }
        out
    }

    fn dispatch(
        &mut self,
        conn: ConnId,
        event: ClientEvent,
        rng: &mut impl Rng,
    ) -> Result<Outbox, ActionError> {
        match event {
            ClientEvent::CreateRoom { name } => self.create_room(conn, &name, rng),
            ClientEvent::JoinRoom { code, name } => self.join_room(conn, &code, &name),
            ClientEvent::LeaveRoom => self.leave_room(conn),
            ClientEvent::SelectRole { role } => self.select_role(conn, role),
            ClientEvent::StartGame => self.start_game(conn),
            ClientEvent::RollDice => self.room_mut_of(conn)?.roll_dice(conn, rng),
            ClientEvent::EndTurn => self.room_mut_of(conn)?.end_turn(conn),
            ClientEvent::BuyProperty { space_id, player_index } => {
                self.room_mut_of(conn)?.buy_property(conn, space_id, player_index)
            }
            ClientEvent::UpgradeProperty { space_id } => {
                self.room_mut_of(conn)?.upgrade_property(conn, space_id)
            }
            ClientEvent::Transfer { from_index, to_index, amount } => {
                self.room_mut_of(conn)?.transfer(conn, from_index, to_index, amount)
            }
            ClientEvent::AdjustMoney { player_index, amount, note } => {
                self.room_mut_of(conn)?.adjust_money(conn, player_index, amount, note)
            }
            ClientEvent::QuickAction { action } => {
                self.room_mut_of(conn)?.quick_action(conn, action)
            }
            ClientEvent::EndGameVote { confirm } => {
                self.room_mut_of(conn)?.end_game_vote(conn, confirm)
            }
            ClientEvent::SendChat { text } => self.send_chat(conn, &text),
        }
    }

    fn room_mut_of(&mut self, conn: ConnId) -> Result<&mut Room, ActionError> {
        let code = self
            .conn_rooms
            .get(&conn)
            .ok_or(ActionError::Dropped("caller is not in a room"))?;
        self.rooms
            .get_mut(code)
            .ok_or(ActionError::Dropped("room no longer exists"))
    }

    // -----------------------------------------------------------------
    // Create / join / leave
    // -----------------------------------------------------------------

    fn create_room(
        &mut self,
        conn: ConnId,
        name: &str,
        rng: &mut impl Rng,
    ) -> Result<Outbox, ActionError> {
        // Creating implicitly leaves the current room, like the original
        // lobby flow.
        let mut out = self.leave_room(conn).unwrap_or_default();

        let code = self.alloc_code(rng);
        let name = display_name(name, "Host");
        let mut room = Room::new(code.clone(), conn, name.clone());
        room.add_log(format!("{name} created the room"));
        tracing::info!(%code, %conn, "room created");

        self.conn_rooms.insert(conn, code.clone());
        out.push(room.update_event());
        self.rooms.insert(code, room);
        Ok(out)
    }

    fn join_room(&mut self, conn: ConnId, raw: &str, name: &str) -> Result<Outbox, ActionError> {
        let mut out = self.leave_room(conn).unwrap_or_default();

        let code = RoomCode::normalized(raw);
        let room = self.rooms.get_mut(&code).ok_or(ActionError::RoomNotFound)?;

        if room.phase.is_lobby() {
            if room.players.len() >= MAX_PLAYERS {
                return Err(ActionError::RoomFull);
            }
            let name = display_name(name, &format!("Player {}", room.players.len() + 1));
            let color = PLAYER_COLORS[room.players.len() % PLAYER_COLORS.len()];
            room.players.push(Player::new(name.clone(), color, conn));
            room.add_log(format!("{name} joined the room"));
            tracing::info!(%code, %conn, players = room.players.len(), "player joined");
        } else {
            // Reconnect: a disconnected seat with this display name is
            // reattached, whatever phase the match is in. Identity is the
            // name — a deliberate simplification.
            let name = display_name(name, "");
            let idx = room
                .players
                .iter()
                .position(|p| p.name == name && !p.presence.is_connected())
                .ok_or(ActionError::AlreadyStarted)?;
            room.players[idx].presence = Presence::Connected(conn);
            room.epoch += 1;
            room.add_log(format!("{name} reconnected"));
            tracing::info!(%code, %conn, player = %name, "player reconnected");
        }

        self.conn_rooms.insert(conn, code.clone());
        let room = self.rooms.get_mut(&code).expect("room looked up above");
        out.push(room.update_event());
        Ok(out)
    }

    /// Leaves the caller's room. Doubles as the disconnect path: in a
    /// lobby the seat is spliced out, in a started room it is marked
    /// disconnected and kept for reconnection and settlement.
    fn leave_room(&mut self, conn: ConnId) -> Result<Outbox, ActionError> {
        let code = self
            .conn_rooms
            .remove(&conn)
            .ok_or(ActionError::Dropped("caller is not in a room"))?;
        let Some(room) = self.rooms.get_mut(&code) else {
            return Ok(Outbox::new());
        };
        let Some(idx) = room.player_by_conn(conn) else {
            return Ok(Outbox::new());
        };
        let name = room.players[idx].name.clone();

        let mut out = Outbox::new();
        if room.phase.is_lobby() {
            room.players.remove(idx);
            room.assign_colors();
            if room.players.is_empty() {
                self.rooms.remove(&code);
                tracing::info!(%code, "empty lobby room destroyed");
                return Ok(out);
            }
            if room.host == conn {
                if let Some(next_host) = room.players[0].presence.conn() {
                    room.host = next_host;
                }
            }
            room.add_log(format!("{name} left the room"));
        } else {
            room.players[idx].presence = Presence::Disconnected;
            room.add_log(format!("{name} left the room"));
            if room.phase.is_playing() {
                if room.current_turn == idx {
                    room.advance_turn();
                    room.phase = RoomPhase::Playing { rolled: false };
                }
                // A pending vote must not hang on a seat that just went
                // inactive, and the match may be down to one active seat.
                room.try_complete_vote();
                out.extend(room.check_game_over());
            }
        }
        tracing::info!(%code, %conn, player = %name, "player left");
        out.push(room.update_event());
        Ok(out)
    }

    // -----------------------------------------------------------------
    // Lobby actions
    // -----------------------------------------------------------------

    fn select_role(&mut self, conn: ConnId, role: magnate_board::Role) -> Result<Outbox, ActionError> {
        let room = self.room_mut_of(conn)?;
        if !room.phase.is_lobby() {
            return Err(ActionError::Dropped("roles are fixed once the match starts"));
        }
        let idx = room
            .player_by_conn(conn)
            .ok_or(ActionError::Dropped("caller holds no seat here"))?;
        room.players[idx].role = role;
        let name = room.players[idx].name.clone();
        room.add_log(format!("{name} will play as {role}"));
        Ok(vec![room.update_event()])
    }

    fn start_game(&mut self, conn: ConnId) -> Result<Outbox, ActionError> {
        let room = self.room_mut_of(conn)?;
        if !room.phase.is_lobby() {
            return Err(ActionError::Dropped("match already started"));
        }
        if room.host != conn {
            return Err(ActionError::Dropped("only the host starts the game"));
        }
        // Purge seats whose connection died before the start.
        room.players.retain(|p| p.presence.is_connected());
        room.assign_colors();
        if room.players.len() < 2 {
            return Err(ActionError::Dropped("need at least two players"));
        }

        room.phase = RoomPhase::Playing { rolled: false };
        room.current_turn = 0;
        room.round = 1;
        room.started_at = Some(Instant::now());
        room.add_log(format!("Game on! Everyone starts with ${STARTING_MONEY}"));
        tracing::info!(code = %room.code, players = room.players.len(), "game started");

        let started = MatchStarted {
            room: room.code.clone(),
            players: room.players.iter().map(|p| (p.name.clone(), p.role)).collect(),
        };
        let out = vec![room.update_event()];
        self.history.game_started(&started);
        Ok(out)
    }

    fn send_chat(&mut self, conn: ConnId, text: &str) -> Result<Outbox, ActionError> {
        if text.trim().is_empty() {
            return Err(ActionError::Dropped("empty chat message"));
        }
        let room = self.room_mut_of(conn)?;
        let idx = room
            .player_by_conn(conn)
            .ok_or(ActionError::Dropped("caller holds no seat here"))?;
        let player = &room.players[idx];
        Ok(vec![(
            Recipient::Broadcast(room.broadcast_targets()),
            ServerEvent::ChatMsg {
                from: player.name.clone(),
                text: text.to_string(),
                color: player.color.clone(),
            },
        )])
    }

    // -----------------------------------------------------------------
    // Teardown, sweep, finalize
    // -----------------------------------------------------------------

    /// Whether a started room currently has no connected seats — the
    /// precondition for the grace-window teardown.
    pub fn fully_disconnected(&self, code: &RoomCode) -> bool {
        self.rooms.get(code).is_some_and(|r| {
            !r.phase.is_lobby()
                && !r.players.is_empty()
                && r.players.iter().all(|p| !p.presence.is_connected())
        })
    }

    /// The room's reconnect epoch, for arming a teardown timer.
    pub fn epoch(&self, code: &RoomCode) -> Option<u64> {
        self.rooms.get(code).map(|r| r.epoch)
    }

    /// Codes of started rooms with no connected seats — candidates for
    /// the grace-window teardown.
    pub fn stale_candidates(&self) -> Vec<RoomCode> {
        self.rooms
            .keys()
            .filter(|code| self.fully_disconnected(code))
            .cloned()
            .collect()
    }

    /// Tears the room down if nobody reconnected since the timer was
    /// armed (same epoch) and it is still fully disconnected. Returns
    /// whether the room was removed.
    pub fn teardown_if_stale(&mut self, code: &RoomCode, epoch: u64) -> bool {
        if self.epoch(code) != Some(epoch) || !self.fully_disconnected(code) {
            return false;
        }
        self.teardown(code);
        true
    }

    /// Safety-net sweep: tears down every empty or fully-disconnected
    /// room. Returns the codes removed.
    pub fn sweep(&mut self) -> Vec<RoomCode> {
        let stale: Vec<RoomCode> = self
            .rooms
            .iter()
            .filter(|(_, r)| {
                r.players.is_empty() || r.players.iter().all(|p| !p.presence.is_connected())
            })
            .map(|(code, _)| code.clone())
            .collect();
        for code in &stale {
            self.teardown(code);
        }
        stale
    }

    fn teardown(&mut self, code: &RoomCode) {
        // A started room that dies without finishing still owes the
        // history collaborator its report.
        self.finalize(code, true);
        if self.rooms.remove(code).is_some() {
            self.conn_rooms.retain(|_, c| c != code);
            tracing::info!(%code, "room torn down");
        }
    }

    /// Sends the finalize notification at most once per room.
    fn finalize(&mut self, code: &RoomCode, include_unfinished: bool) {
        let Some(room) = self.rooms.get_mut(code) else {
            return;
        };
        let due = match room.phase {
            RoomPhase::Finished { .. } => true,
            RoomPhase::Playing { .. } => include_unfinished,
            RoomPhase::Lobby => false,
        };
        if !due || room.finalized {
            return;
        }
        room.finalized = true;
        let report = build_report(room);
        self.history.game_finished(&report);
    }

    // -----------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------

    pub fn room(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    pub fn room_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    pub fn room_of(&self, conn: ConnId) -> Option<&RoomCode> {
        self.conn_rooms.get(&conn)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn alloc_code(&self, rng: &mut impl Rng) -> RoomCode {
        // Rejection sampling; collisions are vanishingly rare with 32^6
        // codes but checked anyway.
        loop {
            let code: String = (0..CODE_LEN)
                .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
                .collect();
            let code = RoomCode(code);
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }
}

fn display_name(raw: &str, fallback: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() { fallback.to_string() } else { trimmed.to_string() }
}

fn build_report(room: &Room) -> MatchReport {
    let outcomes = match &room.settlement {
        Some(settlement) => settlement
            .entries
            .iter()
            .map(|e| PlayerOutcome {
                name: e.name.clone(),
                role: e.role,
                total: e.total,
                bankrupt: e.bankrupt,
            })
            .collect(),
        // Torn down mid-match: report the standings as they were.
        None => room
            .players
            .iter()
            .enumerate()
            .map(|(idx, p)| PlayerOutcome {
                name: p.name.clone(),
                role: p.role,
                total: if p.bankrupt {
                    0
                } else {
                    p.money + economy::estate_value(&room.properties, idx)
                },
                bankrupt: p.bankrupt,
            })
            .collect(),
    };
    MatchReport {
        room: room.code.clone(),
        duration_ms: room
            .started_at
            .map(|t| t.elapsed().as_millis() as u64)
            .unwrap_or(0),
        rounds: room.round,
        winner: room.settlement.as_ref().and_then(|s| s.winner.clone()),
        outcomes,
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::events::ErrorReason;
    use crate::history::NoopHistory;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(11)
    }

    /// Records notifications so tests can assert on the notify-points.
    #[derive(Default)]
    struct RecordingHistory {
        started: Mutex<Vec<MatchStarted>>,
        finished: Mutex<Vec<MatchReport>>,
    }

    impl MatchHistory for RecordingHistory {
        fn game_started(&self, start: &MatchStarted) {
            self.started.lock().unwrap().push(start.clone());
        }
        fn game_finished(&self, report: &MatchReport) {
            self.finished.lock().unwrap().push(report.clone());
        }
    }

    fn hub() -> GameHub {
        GameHub::new(Arc::new(NoopHistory))
    }

    fn create(hub: &mut GameHub, conn: u64, name: &str) -> RoomCode {
        hub.handle(
            ConnId(conn),
            ClientEvent::CreateRoom { name: name.into() },
            &mut rng(),
        );
        hub.room_of(ConnId(conn)).cloned().expect("creator is seated")
    }

    fn join(hub: &mut GameHub, conn: u64, code: &RoomCode, name: &str) -> Outbox {
        hub.handle(
            ConnId(conn),
            ClientEvent::JoinRoom { code: code.0.clone(), name: name.into() },
            &mut rng(),
        )
    }

    #[test]
    fn test_create_room_seats_the_host() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        let room = hub.room(&code).unwrap();
        assert_eq!(code.0.len(), CODE_LEN);
        assert!(code.0.bytes().all(|b| CODE_ALPHABET.contains(&b)));
        assert_eq!(room.players[0].name, "Alice");
        assert_eq!(room.host, ConnId(1));
    }

    #[test]
    fn test_codes_are_unique() {
        let mut hub = hub();
        let a = create(&mut hub, 1, "A");
        let b = create(&mut hub, 2, "B");
        assert_ne!(a, b);
        assert_eq!(hub.room_count(), 2);
    }

    #[test]
    fn test_join_unknown_code_surfaces_not_found() {
        let mut hub = hub();
        let out = hub.handle(
            ConnId(1),
            ClientEvent::JoinRoom { code: "NOPE99".into(), name: "X".into() },
            &mut rng(),
        );
        assert_eq!(
            out,
            vec![(
                Recipient::One(ConnId(1)),
                ServerEvent::ErrorMsg { reason: ErrorReason::RoomNotFound }
            )]
        );
    }

    #[test]
    fn test_join_code_is_normalized() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        let lowered = code.0.to_ascii_lowercase();
        join(&mut hub, 2, &RoomCode(format!(" {lowered} ")), "Bob");
        assert_eq!(hub.room(&code).unwrap().players.len(), 2);
    }

    #[test]
    fn test_seventh_join_surfaces_room_full() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "P0");
        for i in 1..6 {
            join(&mut hub, i + 1, &code, &format!("P{i}"));
        }
        let out = join(&mut hub, 8, &code, "P6");
        assert!(out.iter().any(|(_, e)| matches!(
            e,
            ServerEvent::ErrorMsg { reason: ErrorReason::RoomFull }
        )));
        assert_eq!(hub.room(&code).unwrap().players.len(), 6);
    }

    #[test]
    fn test_join_after_start_without_a_seat_is_already_started() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());
        let out = join(&mut hub, 3, &code, "Carol");
        assert!(out.iter().any(|(_, e)| matches!(
            e,
            ServerEvent::ErrorMsg { reason: ErrorReason::AlreadyStarted }
        )));
    }

    #[test]
    fn test_reconnect_reattaches_the_named_seat() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());

        hub.handle(ConnId(2), ClientEvent::LeaveRoom, &mut rng());
        assert!(!hub.room(&code).unwrap().players[1].presence.is_connected());
        let epoch_before = hub.epoch(&code).unwrap();

        // Bob comes back on a brand-new connection.
        join(&mut hub, 9, &code, "Bob");
        let room = hub.room(&code).unwrap();
        assert_eq!(room.players[1].presence, Presence::Connected(ConnId(9)));
        assert_eq!(room.epoch, epoch_before + 1);
        assert_eq!(hub.room_of(ConnId(9)), Some(&code));
    }

    #[test]
    fn test_lobby_leave_splices_and_hands_the_host_down() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        hub.handle(ConnId(1), ClientEvent::LeaveRoom, &mut rng());

        let room = hub.room(&code).unwrap();
        assert_eq!(room.players.len(), 1);
        assert_eq!(room.players[0].name, "Bob");
        assert_eq!(room.host, ConnId(2));
        assert_eq!(room.players[0].color, PLAYER_COLORS[0]);
    }

    #[test]
    fn test_emptied_lobby_room_dies_immediately() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        hub.handle(ConnId(1), ClientEvent::LeaveRoom, &mut rng());
        assert!(hub.room(&code).is_none());
        assert_eq!(hub.room_count(), 0);
    }

    #[test]
    fn test_start_game_requires_host_and_two_players() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        // Alone: dropped.
        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());
        assert!(hub.room(&code).unwrap().phase.is_lobby());

        join(&mut hub, 2, &code, "Bob");
        // Non-host: dropped.
        hub.handle(ConnId(2), ClientEvent::StartGame, &mut rng());
        assert!(hub.room(&code).unwrap().phase.is_lobby());

        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());
        assert!(hub.room(&code).unwrap().phase.is_playing());
    }

    #[test]
    fn test_select_role_works_in_lobby_only() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        hub.handle(
            ConnId(2),
            ClientEvent::SelectRole { role: magnate_board::Role::Tycoon },
            &mut rng(),
        );
        assert_eq!(hub.room(&code).unwrap().players[1].role, magnate_board::Role::Tycoon);

        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());
        hub.handle(
            ConnId(2),
            ClientEvent::SelectRole { role: magnate_board::Role::Scholar },
            &mut rng(),
        );
        assert_eq!(hub.room(&code).unwrap().players[1].role, magnate_board::Role::Tycoon);
    }

    #[test]
    fn test_chat_fans_out_to_the_room() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        let out = hub.handle(
            ConnId(2),
            ClientEvent::SendChat { text: "gl hf".into() },
            &mut rng(),
        );
        assert_eq!(out.len(), 1);
        let (recipient, event) = &out[0];
        assert_eq!(*recipient, Recipient::Broadcast(vec![ConnId(1), ConnId(2)]));
        assert!(matches!(event, ServerEvent::ChatMsg { from, .. } if from == "Bob"));
        // Empty chat is dropped.
        let out = hub.handle(ConnId(2), ClientEvent::SendChat { text: "  ".into() }, &mut rng());
        assert!(out.is_empty());
    }

    #[test]
    fn test_disconnect_of_acting_player_advances_the_turn() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        join(&mut hub, 3, &code, "Carol");
        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());

        hub.handle(ConnId(1), ClientEvent::LeaveRoom, &mut rng());
        let room = hub.room(&code).unwrap();
        assert_eq!(room.current_turn, 1);
        assert!(room.phase.is_playing(), "two active seats keep playing");
    }

    #[test]
    fn test_disconnect_down_to_one_active_seat_ends_the_game() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());

        hub.handle(ConnId(2), ClientEvent::LeaveRoom, &mut rng());
        let room = hub.room(&code).unwrap();
        assert!(room.phase.is_finished());
        assert_eq!(room.settlement.as_ref().unwrap().winner.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_teardown_respects_the_epoch() {
        let mut hub = hub();
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        join(&mut hub, 3, &code, "Carol");
        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());

        hub.handle(ConnId(1), ClientEvent::LeaveRoom, &mut rng());
        hub.handle(ConnId(2), ClientEvent::LeaveRoom, &mut rng());
        hub.handle(ConnId(3), ClientEvent::LeaveRoom, &mut rng());
        assert!(hub.fully_disconnected(&code));
        let epoch = hub.epoch(&code).unwrap();

        // Alice reconnects before the timer fires: the epoch moves on and
        // the stale teardown is a no-op.
        join(&mut hub, 9, &code, "Alice");
        assert!(!hub.teardown_if_stale(&code, epoch));
        assert!(hub.room(&code).is_some());

        // She drops again; a timer armed with the fresh epoch succeeds.
        hub.handle(ConnId(9), ClientEvent::LeaveRoom, &mut rng());
        let epoch = hub.epoch(&code).unwrap();
        assert!(hub.teardown_if_stale(&code, epoch));
        assert!(hub.room(&code).is_none());
    }

    #[test]
    fn test_sweep_collects_fully_disconnected_rooms() {
        let mut hub = hub();
        let dead = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &dead, "Bob");
        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());
        hub.handle(ConnId(1), ClientEvent::LeaveRoom, &mut rng());
        hub.handle(ConnId(2), ClientEvent::LeaveRoom, &mut rng());

        let alive = create(&mut hub, 5, "Eve");

        let swept = hub.sweep();
        assert_eq!(swept, vec![dead.clone()]);
        assert!(hub.room(&dead).is_none());
        assert!(hub.room(&alive).is_some());
    }

    #[test]
    fn test_history_notifications_fire_once() {
        let history = Arc::new(RecordingHistory::default());
        let mut hub = GameHub::new(history.clone());
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());
        assert_eq!(history.started.lock().unwrap().len(), 1);

        // Bob leaves: one active seat left, game over, finalize fires.
        hub.handle(ConnId(2), ClientEvent::LeaveRoom, &mut rng());
        assert_eq!(history.finished.lock().unwrap().len(), 1);
        let report = history.finished.lock().unwrap()[0].clone();
        assert_eq!(report.winner.as_deref(), Some("Alice"));
        assert_eq!(report.outcomes.len(), 2);

        // Teardown afterwards must not double-report.
        hub.handle(ConnId(1), ClientEvent::LeaveRoom, &mut rng());
        hub.sweep();
        assert_eq!(history.finished.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_mid_match_teardown_still_reports() {
        // The sweeper exists for disconnects that never reached
        // leave_room (e.g. a crashed handler). Simulate that: seats go
        // dark without any leave events, so the room is still Playing.
        let history = Arc::new(RecordingHistory::default());
        let mut hub = GameHub::new(history.clone());
        let code = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &code, "Bob");
        join(&mut hub, 3, &code, "Carol");
        hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng());
        for p in &mut hub.room_mut(&code).unwrap().players {
            p.presence = Presence::Disconnected;
        }
        assert!(hub.room(&code).unwrap().phase.is_playing());

        hub.sweep();
        assert!(hub.room(&code).is_none());
        let finished = history.finished.lock().unwrap();
        assert_eq!(finished.len(), 1);
        assert!(finished[0].winner.is_none());
        assert_eq!(finished[0].outcomes.len(), 3);
        // Standings are reported as they were at teardown.
        assert!(finished[0].outcomes.iter().all(|o| o.total == STARTING_MONEY));
    }

    #[test]
    fn test_switching_rooms_leaves_the_first() {
        let mut hub = hub();
        let first = create(&mut hub, 1, "Alice");
        join(&mut hub, 2, &first, "Bob");
        let _second = create(&mut hub, 2, "Bob");
        assert_eq!(hub.room(&first).unwrap().players.len(), 1);
        assert_eq!(hub.room_count(), 2);
    }
}
