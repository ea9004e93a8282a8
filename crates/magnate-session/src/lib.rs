//! Session gateway for Magnate.
//!
//! Sits between the transport and the game engine:
//!
//! 1. **Rate limiting** — a fixed window per `(connection, event kind)`
//!    that silently drops excess events ([`RateLimiter`])
//! 2. **Serialized dispatch** — one lock around the hub, so every room
//!    mutation runs to completion before the next ([`Gateway`])
//! 3. **Scheduled work** — cancellable grace-window teardown timers and
//!    the periodic stale-room sweeper
//!
//! ```text
//! Transport (frames) → Gateway (this crate) → Engine (rules)
//! ```

mod config;
mod gateway;
mod limiter;

pub use config::GatewayConfig;
pub use gateway::{EventReceiver, Gateway};
pub use limiter::{RateLimiter, RateLimits};
