//! Error type for engine actions.

use crate::events::ErrorReason;

/// Why an action was rejected.
///
/// Rejections come in two tiers. The four named variants are *surfaced*:
/// the hub turns them into an `error-msg` event for the caller, because
/// the player can act on them. Everything else is [`Dropped`] — stale or
/// out-of-phase input (wrong actor, wrong phase, unknown space, duplicate
/// roll) that gets logged at debug level and otherwise ignored.
///
/// [`Dropped`]: ActionError::Dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// No room exists under the requested code.
    #[error("room not found")]
    RoomNotFound,

    /// The room already holds the maximum number of seats.
    #[error("room is full")]
    RoomFull,

    /// The match has started and the caller has no seat to reconnect to.
    #[error("game already started")]
    AlreadyStarted,

    /// The payer cannot cover a purchase or upgrade.
    #[error("insufficient balance")]
    InsufficientBalance,

    /// Silently ignored input; the string is for the debug log only.
    #[error("dropped: {0}")]
    Dropped(&'static str),
}

impl ActionError {
    /// The error reason to send back to the caller, if this rejection is
    /// surfaced at all.
    pub fn surfaced(&self) -> Option<ErrorReason> {
        match self {
            ActionError::RoomNotFound => Some(ErrorReason::RoomNotFound),
            ActionError::RoomFull => Some(ErrorReason::RoomFull),
            ActionError::AlreadyStarted => Some(ErrorReason::AlreadyStarted),
            ActionError::InsufficientBalance => Some(ErrorReason::InsufficientBalance),
            ActionError::Dropped(_) => None,
        }
    }
}
