//! The 40-space circular board: names, classification, and price/rent tables.

// ---------------------------------------------------------------------------
// Game constants
// ---------------------------------------------------------------------------

/// Number of spaces on the circular board. Positions are `0..BOARD_SIZE`.
pub const BOARD_SIZE: u8 = 40;

/// The start space; passing it on a wraparound credits the pass-start bonus.
pub const START_SPACE: u8 = 0;

/// Base bonus credited when a move wraps past the start space.
pub const PASS_START_BONUS: i64 = 2_000;

/// Cash every seat starts the match with.
pub const STARTING_MONEY: i64 = 15_000;

/// Maximum upgrade level of a street property (rent tables have 6 tiers).
pub const MAX_LEVEL: u8 = 5;

/// Maximum seats per room.
pub const MAX_PLAYERS: usize = 6;

/// Where the relocation space sends a player.
pub const DETENTION_SPACE: u8 = 10;

/// The social space: co-located active players all pay [`SOCIAL_FEE`].
pub const SOCIAL_SPACE: u8 = 20;

/// Fee charged to every co-located active player on the social space.
pub const SOCIAL_FEE: i64 = 500;

/// Flat debit on the Tuition Due space (position 4).
pub const TUITION_TAX: i64 = 2_000;

/// Flat debit on the Bookstore Fees space (position 38).
pub const BOOKSTORE_TAX: i64 = 1_000;

/// Seat colors, assigned by seat index.
pub const PLAYER_COLORS: [&str; MAX_PLAYERS] = [
    "#e74c3c", "#3498db", "#2ecc71", "#f39c12", "#9b59b6", "#1abc9c",
];

// ---------------------------------------------------------------------------
// Board layout
// ---------------------------------------------------------------------------

/// Display names, indexed by position.
pub const SPACE_NAMES: [&str; BOARD_SIZE as usize] = [
    "Orientation Hall",    // 0  start
    "Wisteria Commons",    // 1
    "Scholarship Fund",    // 2  fund card
    "Lotus Commons",       // 3
    "Tuition Due",         // 4  tax
    "East Gate Shuttle",   // 5  transit
    "Peach Grove Hall",    // 6
    "Student Union Board", // 7  notice card
    "Wavecrest Hall",      // 8
    "Orchid Hall",         // 9
    "Makeup Exams",        // 10 detention
    "Lecture Hall Six",    // 11
    "Campus Network",      // 12 utility
    "Lecture Hall Four",   // 13
    "Lecture Hall Three",  // 14
    "South Gate Shuttle",  // 15 transit
    "West Field",          // 16
    "Scholarship Fund",    // 17 fund card
    "East Field",          // 18
    "Main Gymnasium",      // 19
    "Lovers' Knoll",       // 20 social
    "Library",             // 21
    "Student Union Board", // 22 notice card
    "Arts College",        // 23
    "Innovation Tower",    // 24
    "West Gate Shuttle",   // 25 transit
    "Grand Auditorium",    // 26
    "University Theatre",  // 27
    "Campus Card Office",  // 28 utility
    "Recital Hall",        // 29
    "Dean's Summons",      // 30 sends to detention
    "Main Building",       // 31
    "Old Pavilion",        // 32
    "Scholarship Fund",    // 33 fund card
    "Spring Garden",       // 34
    "North Gate Shuttle",  // 35 transit
    "Student Union Board", // 36 notice card
    "Honors College",      // 37
    "Bookstore Fees",      // 38 tax
    "Old Main Gate",       // 39
];

/// Returns the display name of a position, or `"?"` out of range.
pub fn space_name(id: u8) -> &'static str {
    SPACE_NAMES.get(id as usize).copied().unwrap_or("?")
}

/// Transit (shuttle) spaces; rent scales with how many one owner holds.
pub const TRANSIT_SPACES: [u8; 4] = [5, 15, 25, 35];

/// Transit rent, indexed by the number of transit spaces the owner holds.
pub const TRANSIT_RENTS: [i64; 5] = [0, 250, 500, 1_000, 2_000];

/// Utility spaces; rent is the dice total times a multiplier.
pub const UTILITY_SPACES: [u8; 2] = [12, 28];

/// Utility rent multiplier when the owner holds one utility.
pub const UTILITY_MULTIPLIER_SINGLE: i64 = 4;

/// Utility rent multiplier when the owner holds both utilities.
pub const UTILITY_MULTIPLIER_BOTH: i64 = 10;

/// Street color groups. Owning a whole group doubles base street rent.
pub const COLOR_GROUPS: [&[u8]; 8] = [
    &[1, 3],
    &[6, 8, 9],
    &[11, 13, 14],
    &[16, 18, 19],
    &[21, 23, 24],
    &[26, 27, 29],
    &[31, 32, 34],
    &[37, 39],
];

/// What a board position is, from the turn engine's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Space {
    /// The start space (position 0).
    Start,
    /// An ownable, upgradable street in a color group.
    Street { group: u8 },
    /// An ownable shuttle stop.
    Transit,
    /// An ownable utility.
    Utility,
    /// A flat debit on landing.
    Tax { amount: i64 },
    /// Draws from the notice deck.
    Notice,
    /// Draws from the fund deck.
    Fund,
    /// The detention space itself (no landing effect).
    Detention,
    /// Relocates the lander to [`DETENTION_SPACE`] and flags them detained.
    SendToDetention,
    /// Co-located active players all pay [`SOCIAL_FEE`].
    Social { fee: i64 },
}

/// Classifies a board position.
///
/// # Panics
/// Panics if `id >= BOARD_SIZE`; positions are always reduced modulo the
/// board size before lookup.
pub fn space(id: u8) -> Space {
    assert!(id < BOARD_SIZE, "position {id} off the board");
    match id {
        0 => Space::Start,
        4 => Space::Tax { amount: TUITION_TAX },
        38 => Space::Tax { amount: BOOKSTORE_TAX },
        10 => Space::Detention,
        30 => Space::SendToDetention,
        20 => Space::Social { fee: SOCIAL_FEE },
        7 | 22 | 36 => Space::Notice,
        2 | 17 | 33 => Space::Fund,
        5 | 15 | 25 | 35 => Space::Transit,
        12 | 28 => Space::Utility,
        other => Space::Street {
            group: group_of(other).expect("every remaining space is a grouped street"),
        },
    }
}

/// Returns the color group index of a street, or `None` for non-streets.
pub fn group_of(id: u8) -> Option<u8> {
    COLOR_GROUPS
        .iter()
        .position(|group| group.contains(&id))
        .map(|g| g as u8)
}

/// The member spaces of a color group.
pub fn group_spaces(group: u8) -> &'static [u8] {
    COLOR_GROUPS[group as usize]
}

// ---------------------------------------------------------------------------
// Price and rent tables
// ---------------------------------------------------------------------------

/// Base purchase price of an ownable space. `None` means not for sale.
pub fn price(id: u8) -> Option<i64> {
    let p = match id {
        1 | 3 => 600,
        6 | 8 => 1_000,
        9 => 1_200,
        11 | 13 => 1_400,
        12 | 28 => 1_500,
        14 => 1_600,
        16 | 18 => 1_800,
        5 | 15 | 19 | 25 | 35 => 2_000,
        21 | 23 => 2_200,
        24 => 2_400,
        26 | 27 => 2_600,
        29 => 2_800,
        31 | 32 => 3_000,
        34 => 3_200,
        37 => 3_500,
        39 => 4_000,
        _ => return None,
    };
    Some(p)
}

/// Six-tier street rent table (tier = upgrade level), `None` for non-streets.
pub fn rent_table(id: u8) -> Option<&'static [i64; 6]> {
    let table: &[i64; 6] = match id {
        1 => &[20, 100, 300, 900, 1_600, 2_500],
        3 => &[40, 200, 600, 1_800, 3_200, 4_500],
        6 | 8 => &[60, 300, 900, 2_700, 4_000, 5_500],
        9 => &[80, 400, 1_000, 3_000, 4_500, 6_000],
        11 | 13 => &[100, 500, 1_500, 4_500, 6_250, 7_500],
        14 => &[120, 600, 1_800, 5_000, 7_000, 9_000],
        16 | 18 => &[140, 700, 2_000, 5_500, 7_500, 9_500],
        19 => &[160, 800, 2_200, 6_000, 8_000, 10_000],
        21 | 23 => &[180, 900, 2_500, 7_000, 8_750, 10_500],
        24 => &[200, 1_000, 3_000, 7_500, 9_250, 11_000],
        26 | 27 => &[220, 1_100, 3_300, 8_000, 9_750, 11_500],
        29 => &[240, 1_200, 3_600, 8_500, 10_250, 12_000],
        31 | 32 => &[260, 1_300, 3_900, 9_000, 11_000, 12_750],
        34 => &[280, 1_500, 4_500, 10_000, 12_000, 14_000],
        37 => &[350, 1_750, 5_000, 11_000, 13_000, 15_000],
        39 => &[500, 2_000, 6_000, 14_000, 17_000, 20_000],
        _ => return None,
    };
    Some(table)
}

// =========================================================================
// Tests
// =========================================================================
