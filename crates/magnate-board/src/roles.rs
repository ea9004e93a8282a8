//! Player roles and their modifier tables.
//!
//! A role is a fixed per-player modifier profile, chosen in the lobby and
//! immutable once the match starts. All numbers live here; the engine's
//! economic resolver applies them in its documented order.

use serde::{Deserialize, Serialize};

use crate::spaces::PASS_START_BONUS;

/// A player's modifier profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    /// The neutral default: no modifiers.
    #[default]
    Freshman,
    /// Slow but well funded: −1 on dice, a larger pass-start stipend,
    /// cheaper upgrades, and a rent bonus on the academic groups.
    Scholar,
    /// Fast and careless: +1 on dice, pays a premium to buy, and extra
    /// rent on the athletics-side groups.
    Athlete,
    /// Buys at a discount but pays a proportional surcharge on all rent.
    Tycoon,
}

impl Role {
    /// Every selectable role, in lobby display order.
    pub const ALL: [Role; 4] = [Role::Freshman, Role::Scholar, Role::Athlete, Role::Tycoon];

    /// Additive dice modifier. The turn engine floors the move total at 2,
    /// so a negative bonus can never produce a non-positive move.
    pub fn dice_bonus(self) -> i64 {
        match self {
            Role::Athlete => 1,
            Role::Scholar => -1,
            _ => 0,
        }
    }

    /// The pass-start credit for this role.
    pub fn start_bonus(self) -> i64 {
        match self {
            Role::Scholar => 3_000,
            _ => PASS_START_BONUS,
        }
    }

    /// Purchase-price factor. Values above 1.0 are premiums (rounded up by
    /// the resolver), below 1.0 discounts (rounded down).
    pub fn price_factor(self) -> f64 {
        match self {
            Role::Tycoon => 0.9,
            Role::Athlete => 1.1,
            _ => 1.0,
        }
    }

    /// Upgrade-cost factor; discounts are rounded down by the resolver.
    pub fn upgrade_factor(self) -> f64 {
        match self {
            Role::Scholar => 0.8,
            _ => 1.0,
        }
    }

    /// Owner-side rent multiplier for a color group (pipeline step (a)).
    pub fn owner_rent_bonus(self, group: u8) -> f64 {
        match (self, group) {
            (Role::Scholar, 2 | 5) => 1.25,
            _ => 1.0,
        }
    }

    /// Payer-side rent multiplier for a color group (pipeline step (b)).
    pub fn payer_rent_penalty(self, group: u8) -> f64 {
        match (self, group) {
            (Role::Athlete, 3 | 6) => 1.25,
            _ => 1.0,
        }
    }

    /// Payer-side proportional surcharge (pipeline step (c), applied last).
    pub fn payer_surcharge(self) -> f64 {
        match self {
            Role::Tycoon => 1.10,
            _ => 1.0,
        }
    }

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Role::Freshman => "Freshman",
            Role::Scholar => "Scholar",
            Role::Athlete => "Athlete",
            Role::Tycoon => "Tycoon",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
