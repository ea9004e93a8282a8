//! The economic resolver: pure price, cost, and rent computations.
//!
//! Everything here is a side-effect-free function of board state, so the
//! settlement math is reproducible and testable in isolation. The one
//! contract that matters beyond the numbers themselves is the role
//! modifier pipeline in [`apply_role_modifiers`]: steps apply in a fixed
//! order and each step rounds before the next, so reordering changes
//! outcomes for stacked modifiers.

use std::collections::BTreeMap;

use magnate_board::{self as board, Role};

use crate::room::Property;

/// Base upgrade cost of a street: half the purchase price.
pub fn upgrade_base(space: u8) -> Option<i64> {
    board::price(space).map(|p| p / 2)
}

/// What this buyer pays for an unowned space: base price scaled by the
/// role's price factor — premiums round up, discounts round down, so the
/// result is deterministic.
pub fn purchase_price(space: u8, buyer: Role) -> Option<i64> {
    board::price(space).map(|base| scale(base, buyer.price_factor()))
}

/// What this owner pays for one upgrade level on a street.
pub fn upgrade_cost(space: u8, owner: Role) -> Option<i64> {
    upgrade_base(space).map(|base| scale(base, owner.upgrade_factor()))
}

fn scale(base: i64, factor: f64) -> i64 {
    if factor > 1.0 {
        (base as f64 * factor).ceil() as i64
    } else if factor < 1.0 {
        (base as f64 * factor).floor() as i64
    } else {
        base
    }
}

/// Whether one owner holds every space of a color group.
pub fn owns_group(properties: &BTreeMap<u8, Property>, owner: usize, group: u8) -> bool {
    board::group_spaces(group)
        .iter()
        .all(|id| properties.get(id).is_some_and(|p| p.owner == owner))
}

/// The rent due when `payer_role` lands on `space`, given the current
/// ownership map. Returns 0 for unowned or rent-free spaces.
///
/// Base figure: six-tier table for streets (doubled on a monopoly), the
/// count table for transit spaces, dice total × multiplier for utilities.
/// Role modifiers stack on top via [`apply_role_modifiers`].
pub fn rent(
    properties: &BTreeMap<u8, Property>,
    space: u8,
    dice_total: i64,
    owner_role: Role,
    payer_role: Role,
) -> i64 {
    let Some(prop) = properties.get(&space) else {
        return 0;
    };

    let base = match board::space(space) {
        board::Space::Street { group } => {
            let tier = board::rent_table(space).expect("streets have rent tables")
                [prop.level as usize];
            if owns_group(properties, prop.owner, group) {
                tier * 2
            } else {
                tier
            }
        }
        board::Space::Transit => {
            let count = board::TRANSIT_SPACES
                .iter()
                .filter(|id| properties.get(id).is_some_and(|p| p.owner == prop.owner))
                .count();
            board::TRANSIT_RENTS[count]
        }
        board::Space::Utility => {
            let both = board::UTILITY_SPACES
                .iter()
                .all(|id| properties.get(id).is_some_and(|p| p.owner == prop.owner));
            let multiplier = if both {
                board::UTILITY_MULTIPLIER_BOTH
            } else {
                board::UTILITY_MULTIPLIER_SINGLE
            };
            dice_total * multiplier
        }
        _ => return 0,
    };

    apply_role_modifiers(base, board::group_of(space), owner_role, payer_role)
}

/// The role modifier pipeline, applied to a base rent figure in this
/// literal, tested order:
///
/// 1. owner-side group bonus,
/// 2. payer-side group penalty,
/// 3. payer-side proportional surcharge.
///
/// Each step multiplies and rounds to the nearest integer before the next
/// step runs. The order is a correctness contract, not a style choice.
pub fn apply_role_modifiers(base: i64, group: Option<u8>, owner: Role, payer: Role) -> i64 {
    let mut rent = base;
    if let Some(g) = group {
        rent = round_mul(rent, owner.owner_rent_bonus(g));
        rent = round_mul(rent, payer.payer_rent_penalty(g));
    }
    round_mul(rent, payer.payer_surcharge())
}

fn round_mul(value: i64, factor: f64) -> i64 {
    if factor == 1.0 {
        value
    } else {
        (value as f64 * factor).round() as i64
    }
}

/// Board value of one seat's holdings: purchase price plus upgrade cost ×
/// level, summed over owned spaces. Uses base tables — a settlement values
/// the board, not the discounts someone bought it with.
pub fn estate_value(properties: &BTreeMap<u8, Property>, owner: usize) -> i64 {
    properties
        .iter()
        .filter(|(_, p)| p.owner == owner)
        .map(|(id, p)| {
            board::price(*id).unwrap_or(0) + upgrade_base(*id).unwrap_or(0) * i64::from(p.level)
        })
        .sum()
}

// =========================================================================
// Tests
// =========================================================================
