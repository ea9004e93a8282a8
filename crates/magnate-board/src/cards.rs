//! The two card decks and their trigger spaces.
//!
//! A card is immutable deck data: either a direct cash delta (optionally
//! with a forced relocation) or a collect-from-every-other-player effect.
//! Draws are uniform; decks are never exhausted or reshuffled.

/// One deck entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    /// Short description, quoted in the room log.
    pub name: &'static str,
    /// What happens to the player who drew it.
    pub effect: CardEffect,
}

/// The effect of a drawn card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardEffect {
    /// Credit (or debit, when negative) the drawer, optionally relocating
    /// them. The relocation never re-triggers landing effects.
    Cash { amount: i64, move_to: Option<u8> },
    /// Every other active player pays the drawer this amount.
    CollectFromEach { amount: i64 },
}

/// Spaces that draw from [`NOTICE_DECK`].
pub const NOTICE_SPACES: [u8; 3] = [7, 22, 36];

/// Spaces that draw from [`FUND_DECK`].
pub const FUND_SPACES: [u8; 3] = [2, 17, 33];

/// The student-union notice deck: small swings, the occasional relocation.
pub const NOTICE_DECK: [Card; 8] = [
    Card {
        name: "Festival volunteer stipend",
        effect: CardEffect::Cash { amount: 600, move_to: None },
    },
    Card {
        name: "Bike stolen, buy a new one",
        effect: CardEffect::Cash { amount: -800, move_to: None },
    },
    Card {
        name: "Sent straight to makeup exams",
        effect: CardEffect::Cash { amount: 0, move_to: Some(10) },
    },
    Card {
        name: "Club dues collected from everyone",
        effect: CardEffect::CollectFromEach { amount: 200 },
    },
    Card {
        name: "Fined for skipping class",
        effect: CardEffect::Cash { amount: -500, move_to: None },
    },
    Card {
        name: "Shuttle pass refund",
        effect: CardEffect::Cash { amount: 300, move_to: None },
    },
    Card {
        name: "Called back to Orientation Hall",
        effect: CardEffect::Cash { amount: 0, move_to: Some(0) },
    },
    Card {
        name: "Printing quota overrun",
        effect: CardEffect::Cash { amount: -200, move_to: None },
    },
];

/// The scholarship fund deck: mostly credits.
pub const FUND_DECK: [Card; 8] = [
    Card {
        name: "Merit scholarship awarded",
        effect: CardEffect::Cash { amount: 2_000, move_to: None },
    },
    Card {
        name: "Research grant approved",
        effect: CardEffect::Cash { amount: 1_500, move_to: None },
    },
    Card {
        name: "Tuition rebate",
        effect: CardEffect::Cash { amount: 1_000, move_to: None },
    },
    Card {
        name: "Birthday — classmates chip in",
        effect: CardEffect::CollectFromEach { amount: 300 },
    },
    Card {
        name: "Donation drive pledge",
        effect: CardEffect::Cash { amount: -600, move_to: None },
    },
    Card {
        name: "Textbook subsidy",
        effect: CardEffect::Cash { amount: 400, move_to: None },
    },
    Card {
        name: "Exchange program fee",
        effect: CardEffect::Cash { amount: -1_200, move_to: None },
    },
    Card {
        name: "Essay contest prize",
        effect: CardEffect::Cash { amount: 800, move_to: None },
    },
];

/// The deck a space draws from, if it is a card space.
pub fn deck_for(id: u8) -> Option<&'static [Card]> {
    if NOTICE_SPACES.contains(&id) {
        Some(&NOTICE_DECK)
    } else if FUND_SPACES.contains(&id) {
        Some(&FUND_DECK)
    } else {
        None
    }
}
