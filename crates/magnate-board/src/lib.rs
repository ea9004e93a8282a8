//! Static board and rules data for Magnate.
//!
//! Everything in this crate is pure data plus lookup functions — no
//! behavior, no I/O, no mutable state. The engine crate consumes these
//! tables; nothing here knows about rooms, players, or connections.
//!
//! # Key items
//!
//! - [`space`] — classify a board position into a [`Space`]
//! - [`price`] / [`rent_table`] — purchase and rent tables for ownable spaces
//! - [`group_of`] / [`group_spaces`] — color-group membership
//! - [`Role`] — the fixed per-player modifier profiles
//! - [`deck_for`] — the two card decks and their trigger spaces

mod cards;
mod roles;
mod spaces;

pub use cards::{Card, CardEffect, FUND_DECK, FUND_SPACES, NOTICE_DECK, NOTICE_SPACES, deck_for};
pub use roles::Role;
pub use spaces::{
    BOARD_SIZE, BOOKSTORE_TAX, COLOR_GROUPS, DETENTION_SPACE, MAX_LEVEL, MAX_PLAYERS,
    PASS_START_BONUS, PLAYER_COLORS, SOCIAL_FEE, SOCIAL_SPACE, SPACE_NAMES, STARTING_MONEY,
    START_SPACE, Space, TRANSIT_RENTS, TRANSIT_SPACES, TUITION_TAX, UTILITY_MULTIPLIER_BOTH,
    UTILITY_MULTIPLIER_SINGLE, UTILITY_SPACES, group_of, group_spaces, price, rent_table, space,
    space_name,
};
