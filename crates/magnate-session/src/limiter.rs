//! Per-connection, per-event-kind rate limiting.
//!
//! A fixed window per `(connection, event kind)` pair: a counter and the
//! instant the window resets. Exceeding the quota silently drops the
//! event — no error goes back to the client — so one abusive connection
//! cannot starve the single-threaded room mutator.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use magnate_engine::{ConnId, EventKind};
use serde::{Deserialize, Serialize};

/// Quota configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimits {
    /// Length of one counting window.
    pub window: Duration,
    /// Quota for most event kinds within one window.
    pub default_max: u32,
}

impl Default for RateLimits {
    fn default() -> Self {
        RateLimits { window: Duration::from_secs(1), default_max: 8 }
    }
}

impl RateLimits {
    /// Per-kind quota. Room churn and chat get tighter limits than the
    /// in-game actions a UI legitimately fires in bursts.
    pub fn max_for(&self, kind: EventKind) -> u32 {
        match kind {
            EventKind::CreateRoom | EventKind::JoinRoom | EventKind::StartGame => 2,
            EventKind::SendChat => 4,
            EventKind::RollDice | EventKind::EndGameVote => 4,
            _ => self.default_max,
        }
    }
}

struct Window {
    count: u32,
    resets_at: Instant,
}

/// Tracks one window per `(connection, event kind)` pair.
pub struct RateLimiter {
    limits: RateLimits,
    windows: HashMap<(ConnId, EventKind), Window>,
}

impl RateLimiter {
    pub fn new(limits: RateLimits) -> Self {
        RateLimiter { limits, windows: HashMap::new() }
    }

    /// Whether this event fits in the current window. Counts the event
    /// when it does.
    pub fn allow(&mut self, conn: ConnId, kind: EventKind) -> bool {
        self.allow_at(conn, kind, Instant::now())
    }

    /// [`allow`] with an explicit clock, so tests never sleep.
    ///
    /// [`allow`]: RateLimiter::allow
    pub fn allow_at(&mut self, conn: ConnId, kind: EventKind, now: Instant) -> bool {
        let window = self
            .windows
            .entry((conn, kind))
            .or_insert_with(|| Window { count: 0, resets_at: now + self.limits.window });
        if now >= window.resets_at {
            window.count = 0;
            window.resets_at = now + self.limits.window;
        }
        if window.count >= self.limits.max_for(kind) {
            return false;
        }
        window.count += 1;
        true
    }

    /// Drops all state for a connection; call on disconnect.
    pub fn forget(&mut self, conn: ConnId) {
        self.windows.retain(|(c, _), _| *c != conn);
    }
}

// =========================================================================
// Tests
// =========================================================================
