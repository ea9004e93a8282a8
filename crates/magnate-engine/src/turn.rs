//! The turn & dice engine: roll resolution, turn advancement, purchases,
//! upgrades, and the manual table actions.
//!
//! A roll resolves as one atomic step — move, pass-start bonus, landing
//! effect, card draw, rent, bankruptcy pass — with a single snapshot
//! broadcast at the end, so no client ever observes a half-applied roll.

use magnate_board::{self as board, BOARD_SIZE, BOOKSTORE_TAX, Card, CardEffect, TUITION_TAX};
use rand::Rng;

use crate::economy;
use crate::error::ActionError;
use crate::events::{ConnId, Outbox, QuickAction, Recipient, ServerEvent};
use crate::room::{Property, Room, RoomPhase};

impl Room {
    /// The caller's seat, provided the room is in play. Tier-a rejection
    /// otherwise.
    fn member_guard(&self, conn: ConnId) -> Result<usize, ActionError> {
        if !self.phase.is_playing() {
            return Err(ActionError::Dropped("room is not in play"));
        }
        self.player_by_conn(conn)
            .ok_or(ActionError::Dropped("caller holds no seat here"))
    }

    /// Like [`member_guard`], but the caller must also hold the turn.
    ///
    /// [`member_guard`]: Room::member_guard
    fn acting_guard(&self, conn: ConnId) -> Result<usize, ActionError> {
        let ci = self.member_guard(conn)?;
        if ci != self.current_turn {
            return Err(ActionError::Dropped("not the acting player"));
        }
        Ok(ci)
    }

    // -----------------------------------------------------------------
    // Rolling
    // -----------------------------------------------------------------

    /// Rolls for the acting player. The `rolled` gate makes duplicate and
    /// rapid-fire requests no-ops until the turn ends.
    pub fn roll_dice(&mut self, conn: ConnId, rng: &mut impl Rng) -> Result<Outbox, ActionError> {
        let ci = self.acting_guard(conn)?;
        if matches!(self.phase, RoomPhase::Playing { rolled: true }) {
            return Err(ActionError::Dropped("already rolled this turn"));
        }
        let d1: u8 = rng.random_range(1..=6);
        let d2: u8 = rng.random_range(1..=6);
        Ok(self.resolve_roll(ci, d1, d2, rng))
    }

    /// Resolves a known dice pair for seat `ci`. Split from [`roll_dice`]
    /// so every movement rule is testable with chosen dice; the RNG is
    /// only consulted for card draws.
    ///
    /// [`roll_dice`]: Room::roll_dice
    pub(crate) fn resolve_roll(
        &mut self,
        ci: usize,
        d1: u8,
        d2: u8,
        rng: &mut impl Rng,
    ) -> Outbox {
        self.phase = RoomPhase::Playing { rolled: true };
        self.last_dice = [d1, d2];

        let name = self.players[ci].name.clone();
        let role = self.players[ci].role;
        self.players[ci].detained = false;

        // A negative dice bonus can never stall a player: the move total
        // is floored at 2.
        let total = (i64::from(d1 + d2) + role.dice_bonus()).max(2) as u8;
        let from = self.players[ci].position;
        let dest = (from + total) % BOARD_SIZE;
        self.players[ci].position = dest;

        let doubles = if d1 == d2 { " (doubles!)" } else { "" };
        self.add_log(format!(
            "{name} rolled {d1}+{d2}, moved {total} to {}{doubles}",
            board::space_name(dest)
        ));

        // Wraparound pays the pass-start bonus — landing exactly on the
        // start space counts too.
        if dest < from {
            let bonus = role.start_bonus();
            self.players[ci].money += bonus;
            self.add_log(format!("{name} passed Orientation Hall +${bonus}"));
        }

        self.apply_landing(ci, dest);

        if let Some(deck) = board::deck_for(dest) {
            let card = deck[rng.random_range(0..deck.len())];
            self.apply_card(ci, &card);
        }

        self.collect_rent(ci, dest, i64::from(d1 + d2));

        let to = self.players[ci].position;
        let mut out: Outbox = vec![(
            Recipient::Broadcast(self.broadcast_targets()),
            ServerEvent::DiceRolled { dice: [d1, d2], player_index: ci, from, to },
        )];
        out.extend(self.settle_debts());
        out.push(self.update_event());
        out
    }

    /// The destination's landing effect, if any. Effects are mutually
    /// exclusive by space.
    fn apply_landing(&mut self, ci: usize, dest: u8) {
        let name = self.players[ci].name.clone();
        match board::space(dest) {
            board::Space::Tax { amount } => {
                self.players[ci].money -= amount;
                self.add_log(format!("{name} paid {} -${amount}", board::space_name(dest)));
            }
            board::Space::SendToDetention => {
                self.players[ci].position = board::DETENTION_SPACE;
                self.players[ci].detained = true;
                self.add_log(format!("{name} got a dean's summons — off to Makeup Exams"));
            }
            board::Space::Social { fee } => {
                let others: Vec<usize> = self
                    .players
                    .iter()
                    .enumerate()
                    .filter(|(i, p)| *i != ci && p.is_active() && p.position == dest)
                    .map(|(i, _)| i)
                    .collect();
                if !others.is_empty() {
                    // Everyone caught at the knoll pays, the lander included.
                    for i in others.into_iter().chain(std::iter::once(ci)) {
                        self.players[i].money -= fee;
                    }
                    self.add_log(format!(
                        "Awkward run-in at Lovers' Knoll — everyone there pays ${fee}"
                    ));
                }
            }
            _ => {}
        }
    }

    /// Applies a drawn card to seat `ci`. A forced relocation moves the
    /// piece but never re-triggers position-dependent effects.
    pub(crate) fn apply_card(&mut self, ci: usize, card: &Card) {
        let name = self.players[ci].name.clone();
        match card.effect {
            CardEffect::Cash { amount, move_to } => {
                self.players[ci].money += amount;
                if let Some(to) = move_to {
                    self.players[ci].position = to;
                }
                let delta = match amount {
                    0 => String::new(),
                    a if a > 0 => format!(" +${a}"),
                    a => format!(" -${}", -a),
                };
                self.add_log(format!("{name} drew \"{}\"{delta}", card.name));
            }
            CardEffect::CollectFromEach { amount } => {
                let mut collected = 0;
                for i in 0..self.players.len() {
                    if i != ci && self.players[i].is_active() {
                        self.players[i].money -= amount;
                        collected += amount;
                    }
                }
                self.players[ci].money += collected;
                self.add_log(format!(
                    "{name} drew \"{}\" and collected ${amount} from each player",
                    card.name
                ));
            }
        }
    }

    /// Rent settlement for landing on `dest`. A zero computed rent
    /// transfers nothing and logs nothing.
    fn collect_rent(&mut self, ci: usize, dest: u8, dice_total: i64) {
        let Some(prop) = self.properties.get(&dest).copied() else {
            return;
        };
        if prop.owner == ci {
            return;
        }
        let amount = economy::rent(
            &self.properties,
            dest,
            dice_total,
            self.players[prop.owner].role,
            self.players[ci].role,
        );
        if amount == 0 {
            return;
        }
        self.players[ci].money -= amount;
        self.players[prop.owner].money += amount;
        self.add_log(format!(
            "{} paid ${amount} rent to {} for {}",
            self.players[ci].name,
            self.players[prop.owner].name,
            board::space_name(dest)
        ));
    }

    // -----------------------------------------------------------------
    // Turn advancement
    // -----------------------------------------------------------------

    /// Ends the acting player's turn and hands it to the next active seat.
    pub fn end_turn(&mut self, conn: ConnId) -> Result<Outbox, ActionError> {
        self.acting_guard(conn)?;
        self.phase = RoomPhase::Playing { rolled: false };
        self.advance_turn();
        Ok(vec![self.update_event()])
    }

    /// Moves `current_turn` to the next non-bankrupt connected seat.
    /// Wrapping back to an index ≤ the current one bumps the round counter.
    pub(crate) fn advance_turn(&mut self) {
        let n = self.players.len();
        if n == 0 {
            return;
        }
        let mut next = self.current_turn;
        for _ in 0..n {
            next = (next + 1) % n;
            if self.players[next].is_active() {
                break;
            }
        }
        if next <= self.current_turn {
            self.round += 1;
        }
        self.current_turn = next;
    }

    // -----------------------------------------------------------------
    // Purchases and upgrades
    // -----------------------------------------------------------------

    /// Buys an unowned space for the target seat (default: the acting
    /// player). Funds are checked before the debit — an uncovered purchase
    /// is rejected, never patched up by the bankruptcy pass.
    pub fn buy_property(
        &mut self,
        conn: ConnId,
        space_id: u8,
        player_index: Option<usize>,
    ) -> Result<Outbox, ActionError> {
        self.member_guard(conn)?;
        if self.properties.contains_key(&space_id) {
            return Err(ActionError::Dropped("space already owned"));
        }
        let pi = player_index.unwrap_or(self.current_turn);
        let buyer = self
            .players
            .get(pi)
            .ok_or(ActionError::Dropped("no such seat"))?;
        if buyer.bankrupt {
            return Err(ActionError::Dropped("buyer is bankrupt"));
        }
        let price = economy::purchase_price(space_id, buyer.role)
            .ok_or(ActionError::Dropped("space is not for sale"))?;
        if buyer.money < price {
            return Err(ActionError::InsufficientBalance);
        }

        self.players[pi].money -= price;
        self.properties.insert(space_id, Property { owner: pi, level: 0 });
        self.add_log(format!(
            "{} bought {} for ${price}",
            self.players[pi].name,
            board::space_name(space_id)
        ));

        let mut out = self.settle_debts();
        out.push(self.update_event());
        Ok(out)
    }

    /// Upgrades a street the acting player owns, one level at a time.
    pub fn upgrade_property(&mut self, conn: ConnId, space_id: u8) -> Result<Outbox, ActionError> {
        let ci = self.acting_guard(conn)?;
        let prop = self
            .properties
            .get(&space_id)
            .copied()
            .ok_or(ActionError::Dropped("space is unowned"))?;
        if prop.owner != ci {
            return Err(ActionError::Dropped("not the owner"));
        }
        if board::rent_table(space_id).is_none() {
            return Err(ActionError::Dropped("only streets can be upgraded"));
        }
        if prop.level >= board::MAX_LEVEL {
            return Err(ActionError::Dropped("already at the maximum level"));
        }
        let cost = economy::upgrade_cost(space_id, self.players[ci].role)
            .ok_or(ActionError::Dropped("space has no upgrade cost"))?;
        if self.players[ci].money < cost {
            return Err(ActionError::InsufficientBalance);
        }

        self.players[ci].money -= cost;
        let level = {
            let prop = self.properties.get_mut(&space_id).expect("checked above");
            prop.level += 1;
            prop.level
        };
        self.add_log(format!(
            "{} upgraded {} to level {level} for ${cost}",
            self.players[ci].name,
            board::space_name(space_id)
        ));

        let mut out = self.settle_debts();
        out.push(self.update_event());
        Ok(out)
    }

    // -----------------------------------------------------------------
    // Manual table actions
    // -----------------------------------------------------------------

    /// Moves cash between two seats.
    pub fn transfer(
        &mut self,
        conn: ConnId,
        from: usize,
        to: usize,
        amount: i64,
    ) -> Result<Outbox, ActionError> {
        self.member_guard(conn)?;
        if from == to || amount <= 0 {
            return Err(ActionError::Dropped("bad transfer"));
        }
        if from >= self.players.len() || to >= self.players.len() {
            return Err(ActionError::Dropped("seat out of range"));
        }

        self.players[from].money -= amount;
        self.players[to].money += amount;
        self.add_log(format!(
            "{} → {}: ${amount}",
            self.players[from].name, self.players[to].name
        ));

        let mut out = self.settle_debts();
        out.push(self.update_event());
        Ok(out)
    }

    /// Credits or debits one seat, with an optional note for the log.
    pub fn adjust_money(
        &mut self,
        conn: ConnId,
        player_index: usize,
        amount: i64,
        note: Option<String>,
    ) -> Result<Outbox, ActionError> {
        self.member_guard(conn)?;
        let player = self
            .players
            .get_mut(player_index)
            .ok_or(ActionError::Dropped("seat out of range"))?;

        player.money += amount;
        let what = note.unwrap_or_else(|| {
            if amount >= 0 { "received".to_string() } else { "paid".to_string() }
        });
        let line = format!("{} {what} ${}", player.name, amount.abs());
        self.add_log(line);

        let mut out = self.settle_debts();
        out.push(self.update_event());
        Ok(out)
    }

    /// One-tap shortcut applied to the acting player.
    pub fn quick_action(&mut self, conn: ConnId, action: QuickAction) -> Result<Outbox, ActionError> {
        self.member_guard(conn)?;
        let ci = self.current_turn;
        let name = self.players[ci].name.clone();
        match action {
            QuickAction::PassStart => {
                let bonus = self.players[ci].role.start_bonus();
                self.players[ci].money += bonus;
                self.add_log(format!("{name} passed Orientation Hall +${bonus}"));
            }
            QuickAction::TaxA => {
                self.players[ci].money -= TUITION_TAX;
                self.add_log(format!("{name} paid Tuition Due -${TUITION_TAX}"));
            }
            QuickAction::TaxB => {
                self.players[ci].money -= BOOKSTORE_TAX;
                self.add_log(format!("{name} paid Bookstore Fees -${BOOKSTORE_TAX}"));
            }
        }

        let mut out = self.settle_debts();
        out.push(self.update_event());
        Ok(out)
    }
}

// =========================================================================
// Tests
// =========================================================================
