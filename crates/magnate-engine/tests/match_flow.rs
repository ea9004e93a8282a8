//! Integration tests driving whole matches through the public hub API.

use std::sync::Arc;

use magnate_board::{BOARD_SIZE, STARTING_MONEY};
use magnate_engine::{
    ClientEvent, ConnId, GameHub, NoopHistory, Outbox, Recipient, RoomCode, RoomPhase, ServerEvent,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

fn rng() -> StdRng {
    StdRng::seed_from_u64(2024)
}

fn hub() -> GameHub {
    GameHub::new(Arc::new(NoopHistory))
}

/// create + join + start, returning the room code.
fn start_match(hub: &mut GameHub, names: &[&str]) -> RoomCode {
    let mut rng = rng();
    hub.handle(ConnId(1), ClientEvent::CreateRoom { name: names[0].into() }, &mut rng);
    let code = hub.room_of(ConnId(1)).cloned().unwrap();
    for (i, name) in names.iter().enumerate().skip(1) {
        hub.handle(
            ConnId(i as u64 + 1),
            ClientEvent::JoinRoom { code: code.0.clone(), name: (*name).into() },
            &mut rng,
        );
    }
    hub.handle(ConnId(1), ClientEvent::StartGame, &mut rng);
    code
}

fn broadcasts(out: &Outbox) -> usize {
    out.iter()
        .filter(|(r, _)| matches!(r, Recipient::Broadcast(_)))
        .count()
}

#[test]
fn test_full_turn_cycle_keeps_invariants() {
    let mut hub = hub();
    let mut rng = rng();
    let code = start_match(&mut hub, &["Alice", "Bob", "Carol"]);

    // Play a few full rounds with random dice; invariants must hold
    // whatever the dice say.
    for turn in 0..12 {
        let room = hub.room(&code).unwrap();
        if room.phase.is_finished() {
            break;
        }
        let acting = room.current_turn;
        let conn = room.players[acting].presence.conn().unwrap();

        let out = hub.handle(conn, ClientEvent::RollDice, &mut rng);
        assert!(
            out.iter().any(|(_, e)| matches!(e, ServerEvent::DiceRolled { .. })),
            "turn {turn}: roll must emit a dice event"
        );
        assert!(
            matches!(out.last(), Some((_, ServerEvent::RoomUpdate { .. }))),
            "turn {turn}: snapshot comes last"
        );

        let room = hub.room(&code).unwrap();
        for p in &room.players {
            assert!(p.position < BOARD_SIZE);
            assert!(p.money >= 0, "no negative balance survives a broadcast");
        }

        // A duplicate roll from the same seat is a silent no-op.
        let dup = hub.handle(conn, ClientEvent::RollDice, &mut rng);
        assert!(dup.is_empty());

        if hub.room(&code).unwrap().phase.is_playing() {
            hub.handle(conn, ClientEvent::EndTurn, &mut rng);
            let room = hub.room(&code).unwrap();
            let current = &room.players[room.current_turn];
            assert!(current.is_active(), "the turn always lands on an active seat");
        }
    }
}

#[test]
fn test_round_counter_over_full_cycles() {
    let mut hub = hub();
    let mut rng = rng();
    let code = start_match(&mut hub, &["Alice", "Bob"]);

    assert_eq!(hub.room(&code).unwrap().round, 1);
    for _ in 0..3 {
        for conn in [ConnId(1), ConnId(2)] {
            hub.handle(conn, ClientEvent::RollDice, &mut rng);
            hub.handle(conn, ClientEvent::EndTurn, &mut rng);
        }
    }
    // Three full cycles after the start: the counter moved exactly three
    // times (money effects cannot finish a match this quickly).
    assert_eq!(hub.room(&code).unwrap().round, 4);
}

#[test]
fn test_buy_upgrade_and_rent_flow() {
    let mut hub = hub();
    let mut rng = rng();
    let code = start_match(&mut hub, &["Alice", "Bob"]);

    // Alice buys Lecture Hall Six and upgrades it twice.
    hub.handle(ConnId(1), ClientEvent::BuyProperty { space_id: 11, player_index: None }, &mut rng);
    hub.handle(ConnId(1), ClientEvent::UpgradeProperty { space_id: 11 }, &mut rng);
    hub.handle(ConnId(1), ClientEvent::UpgradeProperty { space_id: 11 }, &mut rng);

    let room = hub.room(&code).unwrap();
    assert_eq!(room.properties[&11].owner, 0);
    assert_eq!(room.properties[&11].level, 2);
    assert_eq!(room.players[0].money, STARTING_MONEY - 1_400 - 700 - 700);

    // A second upgrade attempt by the wrong seat is ignored.
    hub.handle(ConnId(2), ClientEvent::UpgradeProperty { space_id: 11 }, &mut rng);
    assert_eq!(hub.room(&code).unwrap().properties[&11].level, 2);

    // Buying the same space again is ignored, whoever asks.
    hub.handle(ConnId(2), ClientEvent::BuyProperty { space_id: 11, player_index: Some(1) }, &mut rng);
    let room = hub.room(&code).unwrap();
    assert_eq!(room.properties[&11].owner, 0);
    assert_eq!(room.players[1].money, STARTING_MONEY);
}

#[test]
fn test_unanimous_vote_settles_by_net_worth() {
    let mut hub = hub();
    let mut rng = rng();
    let code = start_match(&mut hub, &["Alice", "Bob", "Carol"]);

    // Give Bob the strongest position.
    hub.handle(ConnId(2), ClientEvent::AdjustMoney { player_index: 1, amount: 5_000, note: None }, &mut rng);
    hub.handle(ConnId(1), ClientEvent::BuyProperty { space_id: 11, player_index: Some(1) }, &mut rng);

    // Two affirm, Carol rejects: the vote is wiped.
    hub.handle(ConnId(1), ClientEvent::EndGameVote { confirm: true }, &mut rng);
    hub.handle(ConnId(2), ClientEvent::EndGameVote { confirm: true }, &mut rng);
    hub.handle(ConnId(3), ClientEvent::EndGameVote { confirm: false }, &mut rng);
    assert!(hub.room(&code).unwrap().phase.is_playing());
    assert!(hub.room(&code).unwrap().end_vote.is_none());

    // All three affirm from scratch: settlement fires.
    hub.handle(ConnId(1), ClientEvent::EndGameVote { confirm: true }, &mut rng);
    hub.handle(ConnId(2), ClientEvent::EndGameVote { confirm: true }, &mut rng);
    hub.handle(ConnId(3), ClientEvent::EndGameVote { confirm: true }, &mut rng);

    let room = hub.room(&code).unwrap();
    assert_eq!(room.phase, RoomPhase::Finished { settled: true });
    let settlement = room.settlement.as_ref().unwrap();
    assert_eq!(settlement.winner.as_deref(), Some("Bob"));
    // Bob: starting cash + 5000 − price, plus the property at board value.
    let bob = &settlement.entries[0];
    assert_eq!(bob.cash, STARTING_MONEY + 5_000 - 1_400);
    assert_eq!(bob.estate_value, 1_400);
    // Totals are sorted descending.
    assert!(settlement.entries.windows(2).all(|w| w[0].total >= w[1].total));
}

#[test]
fn test_actions_after_finish_are_ignored() {
    let mut hub = hub();
    let mut rng = rng();
    let code = start_match(&mut hub, &["Alice", "Bob"]);
    for conn in [ConnId(1), ConnId(2)] {
        hub.handle(conn, ClientEvent::EndGameVote { confirm: true }, &mut rng);
    }
    assert!(hub.room(&code).unwrap().phase.is_finished());

    let snapshot = hub.room(&code).unwrap().clone();
    assert!(hub.handle(ConnId(1), ClientEvent::RollDice, &mut rng).is_empty());
    assert!(
        hub.handle(
            ConnId(1),
            ClientEvent::BuyProperty { space_id: 11, player_index: None },
            &mut rng
        )
        .is_empty()
    );
    assert_eq!(hub.room(&code).unwrap(), &snapshot);
}

#[test]
fn test_every_accepted_mutation_broadcasts_a_snapshot() {
    let mut hub = hub();
    let mut rng = rng();
    let code = start_match(&mut hub, &["Alice", "Bob"]);

    let out = hub.handle(ConnId(1), ClientEvent::RollDice, &mut rng);
    assert!(broadcasts(&out) >= 2, "dice event plus snapshot");
    let out = hub.handle(ConnId(1), ClientEvent::EndTurn, &mut rng);
    assert_eq!(broadcasts(&out), 1);
    let _ = code;
}
