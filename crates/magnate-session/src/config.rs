//! Gateway configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::limiter::RateLimits;

/// Tunables for the session gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// How long a started room may sit fully disconnected before it is
    /// torn down. Any reconnect cancels the pending teardown.
    pub reconnect_grace: Duration,

    /// Interval of the stale-room sweeper, the safety net for teardown
    /// timers that never fired.
    pub sweep_interval: Duration,

    /// Per-connection rate limiting.
    pub limits: RateLimits,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            reconnect_grace: Duration::from_secs(120),
            sweep_interval: Duration::from_secs(600),
            limits: RateLimits::default(),
        }
    }
}
