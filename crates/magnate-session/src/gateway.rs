//! The session gateway: the single serialized entrance to the game hub.
//!
//! One tokio `Mutex` guards the hub, the outbound sender registry, and
//! the rate limiter together — that lock is the "single cooperative
//! scheduler": every dispatch runs to completion under it, so no
//! operation ever observes another's partial state, and the per-room
//! event order is exactly the order operations were accepted in.
//!
//! The gateway also owns the scheduled work around rooms: cancellable
//! grace-window teardown timers, and the periodic stale-room sweeper.

use std::collections::HashMap;
use std::sync::Arc;

use magnate_engine::{
    ClientEvent, ConnId, EventKind, GameHub, MatchHistory, Outbox, Recipient, RoomCode,
    ServerEvent,
};
use tokio::sync::{Mutex, mpsc};

use crate::config::GatewayConfig;
use crate::limiter::RateLimiter;

/// Receiving half of a connection's outbound event stream.
pub type EventReceiver = mpsc::UnboundedReceiver<ServerEvent>;

struct GatewayState {
    hub: GameHub,
    senders: HashMap<ConnId, mpsc::UnboundedSender<ServerEvent>>,
    limiter: RateLimiter,
}

/// Routes client events into the hub and hub events out to connections.
pub struct Gateway {
    state: Mutex<GatewayState>,
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig, history: Arc<dyn MatchHistory>) -> Arc<Self> {
        Arc::new(Gateway {
            state: Mutex::new(GatewayState {
                hub: GameHub::new(history),
                senders: HashMap::new(),
                limiter: RateLimiter::new(config.limits),
            }),
            config,
        })
    }

    /// Registers a connection and returns the stream of events addressed
    /// to it. The handler pumps this into the socket.
    pub async fn register(&self, conn: ConnId) -> EventReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.state.lock().await;
        state.senders.insert(conn, tx);
        tracing::debug!(%conn, "connection registered");
        rx
    }

    /// Dispatches one decoded client event.
    ///
    /// Rate-limited events are dropped silently before they reach the
    /// hub. Everything else runs to completion and its outbox is routed
    /// before the lock is released.
    pub async fn dispatch(self: &Arc<Self>, conn: ConnId, event: ClientEvent) {
        let kind = event.kind();
        let mut state = self.state.lock().await;
        if !state.limiter.allow(conn, kind) {
            tracing::debug!(%conn, %kind, "rate limited, dropping event");
            return;
        }

        let out = state.hub.handle(conn, event, &mut rand::rng());
        deliver(&mut state, out);

        self.arm_teardown_if_needed(&state, kind);
    }

    /// Tears the connection's session down: forgets its limiter state and
    /// sender, and turns the drop into a leave-room for the hub.
    pub async fn disconnect(self: &Arc<Self>, conn: ConnId) {
        let mut state = self.state.lock().await;
        state.senders.remove(&conn);
        state.limiter.forget(conn);

        let out = state.hub.handle(conn, ClientEvent::LeaveRoom, &mut rand::rng());
        deliver(&mut state, out);
        tracing::debug!(%conn, "connection dropped");

        self.arm_teardown_if_needed(&state, EventKind::LeaveRoom);
    }

    /// After a leave (or an implicit leave on join/create), the caller's
    /// old room may have gone fully disconnected — arm its deferred
    /// teardown. The timer carries the room epoch; a reconnect bumps the
    /// epoch, so a stale timer no-ops.
    fn arm_teardown_if_needed(self: &Arc<Self>, state: &GatewayState, kind: EventKind) {
        if !matches!(kind, EventKind::LeaveRoom | EventKind::JoinRoom | EventKind::CreateRoom) {
            return;
        }
        let stale: Vec<(RoomCode, u64)> = state
            .hub
            .stale_candidates()
            .into_iter()
            .filter_map(|code| state.hub.epoch(&code).map(|e| (code, e)))
            .collect();
        for (code, epoch) in stale {
            let gateway = Arc::clone(self);
            let grace = self.config.reconnect_grace;
            tracing::info!(%code, grace_secs = grace.as_secs(), "room fully disconnected, teardown armed");
            tokio::spawn(async move {
                tokio::time::sleep(grace).await;
                let mut state = gateway.state.lock().await;
                if state.hub.teardown_if_stale(&code, epoch) {
                    tracing::info!(%code, "grace window elapsed, room torn down");
                }
            });
        }
    }

    /// Spawns the periodic sweeper. The returned handle aborts with the
    /// server; the sweeper holds the gateway alive through its `Arc`.
    pub fn spawn_sweeper(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let gateway = Arc::clone(self);
        let interval = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick of `interval` fires immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let mut state = gateway.state.lock().await;
                let swept = state.hub.sweep();
                if !swept.is_empty() {
                    tracing::info!(rooms = swept.len(), "sweeper tore down stale rooms");
                }
            }
        })
    }

    /// Runs a closure against the hub under the gateway lock. For
    /// inspection — status endpoints, tests.
    pub async fn with_hub<R>(&self, f: impl FnOnce(&GameHub) -> R) -> R {
        let state = self.state.lock().await;
        f(&state.hub)
    }

    /// Like [`with_hub`], but mutable. Tests use this to fabricate states
    /// that have no client-facing path, such as missed disconnects.
    ///
    /// [`with_hub`]: Gateway::with_hub
    pub async fn with_hub_mut<R>(&self, f: impl FnOnce(&mut GameHub) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state.hub)
    }
}

/// Routes an outbox to the registered senders. Dead receivers are dropped
/// silently — the disconnect path cleans them up for real.
fn deliver(state: &mut GatewayState, out: Outbox) {
    for (recipient, event) in out {
        match recipient {
            Recipient::Broadcast(conns) => {
                for conn in conns {
                    if let Some(tx) = state.senders.get(&conn) {
                        let _ = tx.send(event.clone());
                    }
                }
            }
            Recipient::One(conn) => {
                if let Some(tx) = state.senders.get(&conn) {
                    let _ = tx.send(event);
                }
            }
        }
    }
}
